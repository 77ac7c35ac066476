use crate::cli::OutputFormat;
use crate::config::OutputConfig;
use crate::formatter::TableFormatter;
use anyhow::{Context, Result};
use cqlite_wire::type_names::known_type_names;
use cqlite_wire::{Buffer, ResultRowReader, TypeDescriptor, TypeFactory, Value};
use log::{debug, info};

/// Decode one value and render it
pub fn decode_value(
    factory: &TypeFactory,
    type_expr: &str,
    raw: &[u8],
    protocol_version: u8,
    format: OutputFormat,
) -> Result<String> {
    let descriptor = TypeDescriptor::parse(type_expr)
        .with_context(|| format!("Invalid type expression: {}", type_expr))?;
    debug!(
        "Decoding {} bytes as {} (protocol v{})",
        raw.len(),
        descriptor,
        protocol_version
    );

    let value = factory
        .deserialize_one(raw, &descriptor, protocol_version)
        .with_context(|| format!("Failed to decode {}", descriptor))?;

    Ok(match format {
        OutputFormat::Plain => value.to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&value.to_json())?,
    })
}

/// Decode a result set and render it
pub fn decode_rows(
    factory: &TypeFactory,
    columns: &[TypeDescriptor],
    raw: &[u8],
    row_count: usize,
    protocol_version: u8,
    format: OutputFormat,
    output: &OutputConfig,
) -> Result<String> {
    let reader = ResultRowReader::from_descriptors(factory, columns)
        .with_context(|| "Failed to resolve column types")?;

    let mut buffer = Buffer::new(raw);
    let rows = reader
        .read_all(&mut buffer, row_count, protocol_version)
        .with_context(|| format!("Failed to decode {} row(s)", row_count))?;

    if !buffer.is_exhausted() {
        info!("{} trailing byte(s) after the last row", buffer.residual());
    }

    Ok(match format {
        OutputFormat::Plain => {
            let headers = columns.iter().map(ToString::to_string).collect();
            let mut formatter = TableFormatter::new(headers, output.colors);
            formatter.add_rows(&rows, output.max_rows);
            formatter.format()
        }
        OutputFormat::Json => {
            let rows: Vec<serde_json::Value> = rows
                .iter()
                .map(|row| serde_json::Value::Array(row.iter().map(Value::to_json).collect()))
                .collect();
            serde_json::to_string_pretty(&rows)?
        }
    })
}

/// List every type name the resolver accepts
pub fn list_names(format: OutputFormat) -> Result<String> {
    let names = known_type_names();
    Ok(match format {
        OutputFormat::Plain => names.join("\n"),
        OutputFormat::Json => serde_json::to_string_pretty(&names)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{parse_columns, parse_hex};

    #[test]
    fn test_decode_value_plain_and_json() {
        let factory = TypeFactory::native();
        let raw = parse_hex("00000002 0000000400000001 ffffffff").unwrap();

        let plain = decode_value(&factory, "list<int>", &raw, 3, OutputFormat::Plain).unwrap();
        assert_eq!(plain, "[1, NULL]");

        let json = decode_value(&factory, "list<int>", &raw, 3, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!([1, null]));
    }

    #[test]
    fn test_decode_value_errors_carry_context() {
        let factory = TypeFactory::native();
        let err = decode_value(&factory, "int", &[0, 1], 3, OutputFormat::Plain).unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("Failed to decode int"), "{}", message);
        assert!(message.contains("end of buffer"), "{}", message);

        assert!(decode_value(&factory, "list<", &[], 3, OutputFormat::Plain).is_err());
    }

    #[test]
    fn test_decode_rows_json() {
        let factory = TypeFactory::native();
        let columns = parse_columns("int;text").unwrap();
        let raw = parse_hex("00000004 00000007 00000002 6869").unwrap();

        let json = decode_rows(
            &factory,
            &columns,
            &raw,
            1,
            3,
            OutputFormat::Json,
            &OutputConfig::default(),
        )
        .unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, serde_json::json!([[7, "hi"]]));
    }

    #[test]
    fn test_list_names() {
        let plain = list_names(OutputFormat::Plain).unwrap();
        assert!(plain.lines().any(|line| line == "varint"));
        assert!(plain
            .lines()
            .any(|line| line == "'org.apache.cassandra.db.marshal.ReversedType'"));
    }
}
