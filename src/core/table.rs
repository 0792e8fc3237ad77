use crate::domain::model::{Table, REQUIRED_COLUMNS};
use crate::utils::error::{EtlError, Result};
use std::collections::HashSet;

/// Parses comma-delimited bytes with a header row into a [`Table`].
///
/// Fails with `FormatError` when the input is empty, is not valid CSV/UTF-8,
/// repeats a header name or lacks one of the required columns.
pub fn parse_csv(bytes: &[u8]) -> Result<Table> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(EtlError::format("source file is empty"));
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b',')
        .has_headers(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| EtlError::format(format!("unreadable CSV header: {}", e)))?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut seen = HashSet::new();
    if let Some(duplicate) = headers.iter().find(|h| !seen.insert(h.as_str())) {
        return Err(EtlError::format(format!(
            "duplicate column `{}` in CSV header",
            duplicate
        )));
    }

    let missing: Vec<&str> = REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|required| !headers.iter().any(|h| h == required))
        .collect();
    if !missing.is_empty() {
        return Err(EtlError::format(format!(
            "CSV header is missing required columns: {}",
            missing.join(", ")
        )));
    }

    let mut table = Table::new(headers);
    for (line, record) in reader.records().enumerate() {
        let record = record
            .map_err(|e| EtlError::format(format!("malformed CSV at record {}: {}", line + 1, e)))?;
        table.push_row(record.iter().map(|field| field.to_string()).collect())?;
    }

    tracing::debug!(
        "Parsed CSV with {} columns and {} rows",
        table.columns().len(),
        table.len()
    );
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "STORE_LOCATION,PRODUCT_ID,MRP,CP,DISCOUNT,SP";

    #[test]
    fn test_parse_quoted_fields() {
        let csv = format!(
            "{}\n\"Chicago, IL!\",PRD-007,$19.99,$10.00,$2.50,$17.49\n",
            HEADER
        );

        let table = parse_csv(csv.as_bytes()).unwrap();

        assert_eq!(table.len(), 1);
        assert_eq!(table.columns()[0], "STORE_LOCATION");
        assert_eq!(table.rows()[0][0], "Chicago, IL!");
        assert_eq!(table.rows()[0][5], "$17.49");
    }

    #[test]
    fn test_parse_header_only() {
        let table = parse_csv(HEADER.as_bytes()).unwrap();
        assert!(table.is_empty());
        assert_eq!(table.columns().len(), 6);
    }

    #[test]
    fn test_parse_empty_input() {
        assert!(matches!(parse_csv(b""), Err(EtlError::FormatError { .. })));
        assert!(matches!(parse_csv(b" \n"), Err(EtlError::FormatError { .. })));
    }

    #[test]
    fn test_parse_missing_column_is_format_error() {
        let err = parse_csv(b"STORE_LOCATION,MRP,CP,DISCOUNT,SP\nA,1,1,1,1\n").unwrap_err();
        match err {
            EtlError::FormatError { message } => assert!(message.contains("PRODUCT_ID")),
            other => panic!("expected FormatError, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_header_is_case_sensitive() {
        let csv = "store_location,PRODUCT_ID,MRP,CP,DISCOUNT,SP\nA,1,1,1,1,1\n";
        assert!(parse_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_ragged_row() {
        let csv = format!("{}\nA,1,1,1,1\n", HEADER);
        assert!(matches!(
            parse_csv(csv.as_bytes()),
            Err(EtlError::FormatError { .. })
        ));
    }

    #[test]
    fn test_parse_duplicate_header() {
        let csv = format!("{},SP\nA,1,1,1,1,1,1\n", HEADER);
        assert!(parse_csv(csv.as_bytes()).is_err());
    }

    #[test]
    fn test_parse_invalid_utf8() {
        let mut bytes = format!("{}\n", HEADER).into_bytes();
        bytes.extend_from_slice(&[0xff, 0xfe, b',', b'1', b',', b'1', b',', b'1', b',', b'1', b',', b'1', b'\n']);
        assert!(matches!(parse_csv(&bytes), Err(EtlError::FormatError { .. })));
    }
}
