//! Record parser for seed files: one JSON array, or one object per line.

use std::fmt;

use bson::Document;
use serde_json::Value;
use thiserror::Error;

use super::extjson::{decode_document, ExtJsonError, ExtJsonMode};


/// Where in a file a record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordLocation {
    /// Zero-based index into the top-level array.
    Element(usize),
    /// One-based line number in a newline-delimited file.
    Line(usize),
}


impl fmt::Display for RecordLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Element(i) => write!(f, "array element {i}"),
            Self::Line(n) => write!(f, "line {n}"),
        }
    }
}


/// Why a file's records could not be decoded. Any error rejects the whole file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("file is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    #[error("failed to parse JSON array: {0}")]
    Array(#[source] serde_json::Error),

    #[error("failed to parse line {line} as Extended JSON: {source}")]
    Line {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{at} is not a JSON object")]
    NotAnObject { at: RecordLocation },

    #[error("{at}: {source}")]
    ExtJson {
        at: RecordLocation,
        #[source]
        source: ExtJsonError,
    },
}


/// Parse the raw bytes of one file into documents, in source order.
///
/// A leading `[` selects array mode; anything else is read as NDJSON with
/// blank lines ignored. Whitespace-only input yields no records.
pub fn parse_records(data: &[u8], mode: ExtJsonMode) -> Result<Vec<Document>, ParseError> {
    let text = std::str::from_utf8(data)?;
    let trimmed = text.trim();

    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    if trimmed.starts_with('[') {
        parse_array(trimmed, mode)
    } else {
        parse_lines(text, mode)
    }
}


fn parse_array(text: &str, mode: ExtJsonMode) -> Result<Vec<Document>, ParseError> {
    let items: Vec<Value> = serde_json::from_str(text).map_err(ParseError::Array)?;

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| to_document(item, RecordLocation::Element(i), mode))
        .collect()
}


fn parse_lines(text: &str, mode: ExtJsonMode) -> Result<Vec<Document>, ParseError> {
    let mut records = Vec::new();

    for (line_num, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let value: Value = serde_json::from_str(line).map_err(|source| ParseError::Line {
            line: line_num + 1,
            source,
        })?;
        records.push(to_document(value, RecordLocation::Line(line_num + 1), mode)?);
    }

    Ok(records)
}


fn to_document(value: Value, at: RecordLocation, mode: ExtJsonMode) -> Result<Document, ParseError> {
    match value {
        Value::Object(map) => {
            decode_document(map, mode).map_err(|source| ParseError::ExtJson { at, source })
        }
        _ => Err(ParseError::NotAnObject { at }),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, Bson};

    fn parse(input: &str) -> Result<Vec<Document>, ParseError> {
        parse_records(input.as_bytes(), ExtJsonMode::Canonical)
    }

    #[test]
    fn test_empty_input() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("  \n\t \n").unwrap().is_empty());
    }

    #[test]
    fn test_empty_array() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn test_array_in_order() {
        let records = parse(r#"[{"a":1},{"b":2}]"#).unwrap();
        assert_eq!(records, vec![doc! { "a": 1 }, doc! { "b": 2 }]);
    }

    #[test]
    fn test_array_with_surrounding_whitespace() {
        let records = parse("\n\n  [ {\"a\": 1} ]  \n").unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_ndjson_in_order() {
        let records = parse("{\"a\":1}\n{\"b\":2}\n").unwrap();
        assert_eq!(records, vec![doc! { "a": 1 }, doc! { "b": 2 }]);
    }

    #[test]
    fn test_ndjson_blank_lines_and_crlf() {
        let records = parse("{\"a\":1}\r\n\r\n   \n{\"b\":2}\r\n").unwrap();
        assert_eq!(records, vec![doc! { "a": 1 }, doc! { "b": 2 }]);
    }

    #[test]
    fn test_ndjson_malformed_line_rejects_file() {
        let err = parse("{\"a\":1}\n{\"b\":\n{\"c\":3}\n").unwrap_err();
        match err {
            ParseError::Line { line, .. } => assert_eq!(line, 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_ndjson_line_numbers_count_leading_blank_lines() {
        let err = parse("\n\n{\"a\":1}\nnot json\n").unwrap_err();
        assert!(matches!(err, ParseError::Line { line: 4, .. }));
        assert!(err.to_string().contains("as Extended JSON"));
    }

    #[test]
    fn test_invalid_array() {
        let err = parse(r#"[{"a":1},"#).unwrap_err();
        assert!(matches!(err, ParseError::Array(_)));
        assert!(err.to_string().starts_with("failed to parse JSON array"));
    }

    #[test]
    fn test_array_of_non_objects() {
        let err = parse("[1, 2]").unwrap_err();
        assert!(matches!(
            err,
            ParseError::NotAnObject { at: RecordLocation::Element(0) }
        ));
    }

    #[test]
    fn test_ndjson_non_object_line() {
        let err = parse("{\"a\":1}\n\"text\"\n").unwrap_err();
        assert!(matches!(err, ParseError::NotAnObject { at: RecordLocation::Line(2) }));
    }

    #[test]
    fn test_canonical_date_field() {
        let records = parse(r#"{"d":{"$date":"2020-01-01T00:00:00Z"}}"#).unwrap();
        assert_eq!(
            records[0].get("d"),
            Some(&Bson::DateTime(bson::DateTime::from_millis(1_577_836_800_000)))
        );
    }

    #[test]
    fn test_relaxed_shorthand_rejected_in_canonical_mode() {
        let input = r#"[{"d":{"$date":1577836800000}}]"#;
        let err = parse(input).unwrap_err();
        assert!(matches!(err, ParseError::ExtJson { at: RecordLocation::Element(0), .. }));

        let records = parse_records(input.as_bytes(), ExtJsonMode::Relaxed).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_dollar_field_after_first_key_is_kept() {
        let records = parse(r#"[{"name":"a","$oid":"x"}]"#).unwrap();
        assert_eq!(records, vec![doc! { "name": "a", "$oid": "x" }]);

        let records = parse("{\"a\":{\"x\":1,\"$date\":\"2020-01-01T00:00:00Z\"}}\n").unwrap();
        assert_eq!(
            records,
            vec![doc! { "a": { "x": 1, "$date": "2020-01-01T00:00:00Z" } }]
        );
    }

    #[test]
    fn test_bad_wrapper_in_one_line_rejects_file() {
        let input = "{\"a\":1}\n{\"n\":{\"$numberLong\":5}}\n{\"c\":3}\n";
        assert!(parse(input).is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        let err = parse_records(&[b'{', 0xff, b'}'], ExtJsonMode::Canonical).unwrap_err();
        assert!(matches!(err, ParseError::Utf8(_)));
    }
}
