//! Column normalizers for the store transaction feed.
//!
//! The normalizers are pure string functions. [`clean_table`] applies them
//! column-wise and is the only way to obtain a [`CleanTable`].

use crate::domain::model::{CleanTable, Table, PRICE_COLUMNS, PRODUCT_ID, STORE_LOCATION};
use crate::utils::error::{EtlError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static NON_WORD_OR_SPACE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^\w\s]").expect("static regex is valid"));

static DIGIT_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").expect("static regex is valid"));

const CURRENCY_SIGN: char = '$';

/// Removes every character that is neither a word character nor whitespace,
/// then trims the result. A value made only of punctuation becomes `""`.
pub fn extract_city_name(value: &str) -> String {
    NON_WORD_OR_SPACE.replace_all(value, "").trim().to_string()
}

/// Concatenates every run of digits in `value`, left to right.
///
/// The result stays a string so leading zeros in codes such as `PRD-007`
/// survive. No digits yields `""`.
pub fn extract_only_numbers(value: &str) -> String {
    DIGIT_RUN.find_iter(value).map(|m| m.as_str()).collect()
}

/// Strips the currency sign and parses the rest as a float.
///
/// Not used by the pipeline, which keeps prices as digit strings.
pub fn extract_floats_without_sign(value: &str) -> Result<f64> {
    let without_sign = value.replace(CURRENCY_SIGN, "");
    without_sign
        .trim()
        .parse::<f64>()
        .map_err(|_| EtlError::ParseError {
            value: value.to_string(),
        })
}

/// Normalizes the six required columns of `table`.
///
/// `STORE_LOCATION` goes through [`extract_city_name`]; `PRODUCT_ID`, `MRP`,
/// `CP`, `DISCOUNT` and `SP` through [`extract_only_numbers`]. Row count, row
/// order and any extra columns are kept as they are.
pub fn clean_table(mut table: Table) -> Result<CleanTable> {
    let location_idx = required_index(&table, STORE_LOCATION)?;
    let mut digit_columns = vec![required_index(&table, PRODUCT_ID)?];
    for column in PRICE_COLUMNS {
        digit_columns.push(required_index(&table, column)?);
    }

    for row in table.rows_mut() {
        row[location_idx] = extract_city_name(&row[location_idx]);
        for &idx in &digit_columns {
            row[idx] = extract_only_numbers(&row[idx]);
        }
    }

    Ok(CleanTable::new(table))
}

fn required_index(table: &Table, column: &str) -> Result<usize> {
    table
        .column_index(column)
        .ok_or_else(|| EtlError::SchemaError {
            column: column.to_string(),
        })
}
