use crate::config::EtlConfig;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{validate_aws_region, Validate};

/// Lambda settings: the job configuration plus how to reach S3.
///
/// `DATABASE_NAME` must point into a persistent mount (e.g. `/mnt/efs/store.db`);
/// the function sandbox's own filesystem is discarded with the execution environment.
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub etl: EtlConfig,
    pub s3_region: Option<String>,
    pub force_path_style: bool,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let force_path_style = match lookup("S3_FORCE_PATH_STYLE").as_deref() {
            None | Some("") | Some("false") | Some("0") => false,
            Some("true") | Some("1") => true,
            Some(other) => {
                return Err(EtlError::InvalidConfigValueError {
                    field: "S3_FORCE_PATH_STYLE".to_string(),
                    value: other.to_string(),
                    reason: "expected true or false".to_string(),
                })
            }
        };

        Ok(Self {
            s3_region: lookup("S3_REGION").filter(|r| !r.is_empty()),
            force_path_style,
            etl: EtlConfig::from_lookup(lookup)?,
        })
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        self.etl.validate()?;

        if let Some(region) = &self.s3_region {
            validate_aws_region("S3_REGION", region)?;
        }

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lambda_config_from_lookup() {
        let config = LambdaConfig::from_lookup(|name| match name {
            "DATABASE_NAME" => Some("/tmp/store.db".to_string()),
            "WRITE_MODE" => Some("overwrite".to_string()),
            "S3_REGION" => Some("ap-southeast-2".to_string()),
            "S3_FORCE_PATH_STYLE" => Some("true".to_string()),
            _ => None,
        })
        .unwrap();

        assert_eq!(config.s3_region.as_deref(), Some("ap-southeast-2"));
        assert!(config.force_path_style);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_lambda_config_bad_region() {
        let config = LambdaConfig::from_lookup(|name| match name {
            "DATABASE_NAME" => Some("/tmp/store.db".to_string()),
            "WRITE_MODE" => Some("append".to_string()),
            "S3_REGION" => Some("Sydney".to_string()),
            _ => None,
        })
        .unwrap();

        assert!(config.validate().is_err());
    }
}
