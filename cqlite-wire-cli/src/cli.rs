use anyhow::{anyhow, bail, Context, Result};
use clap::ValueEnum;
use cqlite_wire::TypeDescriptor;
use std::fs;
use std::path::Path;

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Plain,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Plain => write!(f, "plain"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Decode hex input, ignoring whitespace and an optional `0x` prefix
pub fn parse_hex(input: &str) -> Result<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let digits = compact
        .strip_prefix("0x")
        .or_else(|| compact.strip_prefix("0X"))
        .unwrap_or(compact.as_str());

    hex::decode(digits).with_context(|| format!("Invalid hex input: {}", input))
}

/// Read raw bytes from a hex argument or a binary file
pub fn read_input(hex_input: Option<&str>, file: Option<&Path>) -> Result<Vec<u8>> {
    match (hex_input, file) {
        (Some(hex_input), None) => parse_hex(hex_input),
        (None, Some(path)) => fs::read(path)
            .with_context(|| format!("Failed to read input file: {}", path.display())),
        (Some(_), Some(_)) => Err(anyhow!("Pass either hex input or --file, not both")),
        (None, None) => Err(anyhow!("No input: pass hex bytes or --file")),
    }
}

/// Parse `;`-separated column type expressions
pub fn parse_columns(spec: &str) -> Result<Vec<TypeDescriptor>> {
    let columns = spec
        .split(';')
        .map(str::trim)
        .filter(|column| !column.is_empty())
        .map(|column| {
            TypeDescriptor::parse(column)
                .with_context(|| format!("Invalid column type: {}", column))
        })
        .collect::<Result<Vec<_>>>()?;

    if columns.is_empty() {
        bail!("At least one column type is required");
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0000002a").unwrap(), vec![0, 0, 0, 42]);
        assert_eq!(parse_hex("0x 00 01\nff").unwrap(), vec![0, 1, 0xff]);
        assert!(parse_hex("abc").is_err());
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_parse_columns() {
        let columns = parse_columns("int; map<text, int> ;").unwrap();
        assert_eq!(columns.len(), 2);
        assert_eq!(columns[1].to_string(), "map<text, int>");
        assert!(parse_columns("int;list<").is_err());
    }

    #[test]
    fn test_parse_columns_rejects_empty_list() {
        for input in ["", ";", " ; ;"] {
            let err = parse_columns(input).unwrap_err();
            assert!(err.to_string().contains("At least one column"), "{}", err);
        }
    }

    #[test]
    fn test_read_input_requires_one_source() {
        assert!(read_input(None, None).is_err());
        assert!(read_input(Some("00"), Some(Path::new("x"))).is_err());
        assert_eq!(read_input(Some("01"), None).unwrap(), vec![1]);
    }
}
