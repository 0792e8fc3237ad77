// Domain layer: table model and ports. Backends live under adapters.

pub mod model;
pub mod ports;
