//! Extended JSON decoding into BSON values.
//!
//! Plain JSON maps straight across. Objects whose keys match one of the
//! type wrappers (`$oid`, `$date`, `$numberLong`, ...) are decoded into the
//! matching BSON type. Canonical mode only accepts the strict encoding of each
//! wrapper; relaxed mode also takes the shorthand forms (numeric `$date`,
//! numeric `$numberLong`, legacy `$binary`/`$type`, legacy `$regex`/`$options`).

use base64::Engine;
use bson::oid::ObjectId;
use bson::spec::BinarySubtype;
use bson::{Binary, Bson, Document, JavaScriptCodeWithScope, Regex, Timestamp};
use chrono::DateTime;
use serde_json::{Map, Number, Value};
use thiserror::Error;


/// Keys that mark an object as a type wrapper rather than a document.
const WRAPPER_KEYS: &[&str] = &[
    "$oid",
    "$date",
    "$numberInt",
    "$numberLong",
    "$numberDouble",
    "$numberDecimal",
    "$binary",
    "$timestamp",
    "$regularExpression",
    "$regex",
    "$minKey",
    "$maxKey",
    "$symbol",
    "$code",
    "$undefined",
];


/// Which encodings of the type wrappers are accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtJsonMode {
    #[default]
    Canonical,
    Relaxed,
}


impl ExtJsonMode {
    pub fn from_relaxed_flag(relaxed: bool) -> Self {
        if relaxed {
            Self::Relaxed
        } else {
            Self::Canonical
        }
    }

    fn is_relaxed(self) -> bool {
        self == Self::Relaxed
    }
}


/// A value that could not be decoded as extended JSON.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid extended JSON at `{path}`: {reason}")]
pub struct ExtJsonError {
    pub path: String,
    pub reason: String,
}


impl ExtJsonError {
    fn new(path: &str, reason: impl Into<String>) -> Self {
        let path = if path.is_empty() { "(root)" } else { path };
        Self {
            path: path.to_string(),
            reason: reason.into(),
        }
    }
}


type DecodeResult<T> = Result<T, ExtJsonError>;


/// Decode a top-level JSON object into a document.
pub fn decode_document(map: Map<String, Value>, mode: ExtJsonMode) -> DecodeResult<Document> {
    if wrapper_key(&map).is_some() {
        return Err(ExtJsonError::new(
            "",
            "a type wrapper cannot be used as a top-level document",
        ));
    }
    decode_fields(map, mode, "")
}


fn decode_at(value: Value, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    match value {
        Value::Null => Ok(Bson::Null),
        Value::Bool(b) => Ok(Bson::Boolean(b)),
        Value::Number(n) => Ok(number_to_bson(&n)),
        Value::String(s) => Ok(Bson::String(s)),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.into_iter().enumerate() {
                out.push(decode_at(item, mode, &child_path(path, &i.to_string()))?);
            }
            Ok(Bson::Array(out))
        }
        Value::Object(map) => {
            if wrapper_key(&map).is_some() {
                decode_wrapper(map, mode, path)
            } else {
                decode_fields(map, mode, path).map(Bson::Document)
            }
        }
    }
}


fn decode_fields(map: Map<String, Value>, mode: ExtJsonMode, path: &str) -> DecodeResult<Document> {
    let mut doc = Document::new();
    for (key, value) in map {
        let bson = decode_at(value, mode, &child_path(path, &key))?;
        doc.insert(key, bson);
    }
    Ok(doc)
}


fn child_path(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}


/// The wrapper key that opens this object, if any. Only the first key counts;
/// a `$` key further along is an ordinary field.
fn wrapper_key(map: &Map<String, Value>) -> Option<&str> {
    map.keys()
        .next()
        .map(String::as_str)
        .filter(|k| WRAPPER_KEYS.contains(k))
}


/// Strict integer text: optional `-`, then digits only.
fn is_integer_text(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}


/// Strict decimal/exponent text. No leading `+`, no `inf`/`infinity` spellings.
fn is_float_text(s: &str) -> bool {
    !s.is_empty()
        && !s.starts_with('+')
        && s.bytes().any(|b| b.is_ascii_digit())
        && s.bytes()
            .all(|b| b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E'))
}


/// Plain JSON numbers: 32-bit ints when they fit, then 64-bit, then double.
fn number_to_bson(n: &Number) -> Bson {
    if let Some(i) = n.as_i64() {
        return i32::try_from(i).map(Bson::Int32).unwrap_or(Bson::Int64(i));
    }
    Bson::Double(n.as_f64().unwrap_or(f64::NAN))
}


fn decode_wrapper(mut map: Map<String, Value>, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    // Two-key wrappers first
    if map.len() == 2 {
        if map.contains_key("$binary") && map.contains_key("$type") {
            return decode_legacy_binary(map, mode, path);
        }
        if map.contains_key("$regex") && map.contains_key("$options") {
            return decode_legacy_regex(map, mode, path);
        }
        if map.contains_key("$code") && map.contains_key("$scope") {
            return decode_code_with_scope(map, mode, path);
        }
    }

    let key = wrapper_key(&map).unwrap_or_default().to_string();
    if map.len() != 1 {
        return Err(ExtJsonError::new(
            path,
            format!("`{key}` wrapper must not have sibling keys"),
        ));
    }

    let value = map.remove(&key).unwrap_or(Value::Null);
    match key.as_str() {
        "$oid" => decode_oid(value, path),
        "$date" => decode_date(value, mode, path),
        "$numberInt" => decode_int32(value, mode, path),
        "$numberLong" => decode_int64(value, mode, path).map(Bson::Int64),
        "$numberDouble" => decode_double(value, mode, path),
        "$numberDecimal" => decode_decimal(value, mode, path),
        "$binary" => decode_binary(value, path),
        "$timestamp" => decode_timestamp(value, path),
        "$regularExpression" => decode_regular_expression(value, path),
        "$minKey" => expect_one(value, path, "$minKey").map(|_| Bson::MinKey),
        "$maxKey" => expect_one(value, path, "$maxKey").map(|_| Bson::MaxKey),
        "$symbol" => expect_string(value, path, "$symbol").map(Bson::Symbol),
        "$code" => expect_string(value, path, "$code").map(Bson::JavaScriptCode),
        "$undefined" => match value {
            Value::Bool(true) => Ok(Bson::Undefined),
            _ => Err(ExtJsonError::new(path, "`$undefined` must be true")),
        },
        "$regex" => Err(ExtJsonError::new(path, "`$regex` requires a sibling `$options`")),
        other => Err(ExtJsonError::new(path, format!("unsupported wrapper `{other}`"))),
    }
}


fn expect_string(value: Value, path: &str, key: &str) -> DecodeResult<String> {
    match value {
        Value::String(s) => Ok(s),
        _ => Err(ExtJsonError::new(path, format!("`{key}` must be a string"))),
    }
}


fn expect_one(value: Value, path: &str, key: &str) -> DecodeResult<()> {
    match value.as_i64() {
        Some(1) => Ok(()),
        _ => Err(ExtJsonError::new(path, format!("`{key}` must be 1"))),
    }
}


fn relaxed_only(path: &str, what: &str) -> ExtJsonError {
    ExtJsonError::new(
        path,
        format!("{what} is relaxed shorthand and is not accepted in canonical mode"),
    )
}


fn decode_oid(value: Value, path: &str) -> DecodeResult<Bson> {
    let hex = expect_string(value, path, "$oid")?;
    ObjectId::parse_str(&hex)
        .map(Bson::ObjectId)
        .map_err(|e| ExtJsonError::new(path, format!("bad object id `{hex}`: {e}")))
}


fn decode_date(value: Value, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    let millis = match value {
        Value::String(s) => DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.timestamp_millis())
            .map_err(|e| ExtJsonError::new(path, format!("bad `$date` string `{s}`: {e}")))?,
        Value::Object(mut inner) => {
            if inner.len() != 1 || !inner.contains_key("$numberLong") {
                return Err(ExtJsonError::new(
                    path,
                    "`$date` object must be {\"$numberLong\": \"<millis>\"}",
                ));
            }
            let long = inner.remove("$numberLong").unwrap_or(Value::Null);
            decode_int64(long, mode, path)?
        }
        Value::Number(n) if mode.is_relaxed() => n
            .as_i64()
            .ok_or_else(|| ExtJsonError::new(path, "numeric `$date` must be an integer"))?,
        Value::Number(_) => return Err(relaxed_only(path, "numeric `$date`")),
        _ => return Err(ExtJsonError::new(path, "`$date` must be a string or object")),
    };
    Ok(Bson::DateTime(bson::DateTime::from_millis(millis)))
}


fn decode_int32(value: Value, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    let parsed = match value {
        Value::String(s) if is_integer_text(&s) => s.parse::<i32>().ok(),
        Value::Number(n) if mode.is_relaxed() => n.as_i64().and_then(|i| i32::try_from(i).ok()),
        Value::Number(_) => return Err(relaxed_only(path, "numeric `$numberInt`")),
        _ => None,
    };
    parsed
        .map(Bson::Int32)
        .ok_or_else(|| ExtJsonError::new(path, "`$numberInt` must hold a 32-bit integer string"))
}


fn decode_int64(value: Value, mode: ExtJsonMode, path: &str) -> DecodeResult<i64> {
    let parsed = match value {
        Value::String(s) if is_integer_text(&s) => s.parse::<i64>().ok(),
        Value::Number(n) if mode.is_relaxed() => n.as_i64(),
        Value::Number(_) => return Err(relaxed_only(path, "numeric `$numberLong`")),
        _ => None,
    };
    parsed.ok_or_else(|| ExtJsonError::new(path, "`$numberLong` must hold a 64-bit integer string"))
}


fn decode_double(value: Value, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    let parsed = match value {
        Value::String(s) => match s.as_str() {
            "Infinity" => Some(f64::INFINITY),
            "-Infinity" => Some(f64::NEG_INFINITY),
            "NaN" => Some(f64::NAN),
            other if is_float_text(other) => other.parse::<f64>().ok(),
            _ => None,
        },
        Value::Number(n) if mode.is_relaxed() => n.as_f64(),
        Value::Number(_) => return Err(relaxed_only(path, "numeric `$numberDouble`")),
        _ => None,
    };
    parsed
        .map(Bson::Double)
        .ok_or_else(|| ExtJsonError::new(path, "`$numberDouble` must hold a numeric string"))
}


fn decode_decimal(value: Value, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    let text = match value {
        Value::String(s) => s,
        Value::Number(n) if mode.is_relaxed() => n.to_string(),
        Value::Number(_) => return Err(relaxed_only(path, "numeric `$numberDecimal`")),
        _ => return Err(ExtJsonError::new(path, "`$numberDecimal` must be a string")),
    };
    // The driver's own parser owns the 128-bit decimal encoding.
    Bson::try_from(serde_json::json!({ "$numberDecimal": text }))
        .map_err(|e| ExtJsonError::new(path, format!("bad `$numberDecimal`: {e}")))
}


fn decode_base64(encoded: &str, path: &str) -> DecodeResult<Vec<u8>> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| ExtJsonError::new(path, format!("bad base64 payload: {e}")))
}


fn decode_subtype(hex: &str, path: &str) -> DecodeResult<BinarySubtype> {
    u8::from_str_radix(hex, 16)
        .map(BinarySubtype::from)
        .map_err(|_| ExtJsonError::new(path, format!("bad binary subtype `{hex}`")))
}


fn decode_binary(value: Value, path: &str) -> DecodeResult<Bson> {
    let Value::Object(body) = value else {
        return Err(ExtJsonError::new(
            path,
            "`$binary` must be {\"base64\": .., \"subType\": ..}",
        ));
    };
    let (Some(Value::String(b64)), Some(Value::String(sub)), 2) =
        (body.get("base64"), body.get("subType"), body.len())
    else {
        return Err(ExtJsonError::new(
            path,
            "`$binary` must be {\"base64\": .., \"subType\": ..}",
        ));
    };
    Ok(Bson::Binary(Binary {
        subtype: decode_subtype(sub, path)?,
        bytes: decode_base64(b64, path)?,
    }))
}


fn decode_legacy_binary(map: Map<String, Value>, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    if !mode.is_relaxed() {
        return Err(relaxed_only(path, "legacy `$binary`/`$type`"));
    }
    let (Some(Value::String(b64)), Some(Value::String(sub))) = (map.get("$binary"), map.get("$type"))
    else {
        return Err(ExtJsonError::new(path, "legacy `$binary` and `$type` must be strings"));
    };
    Ok(Bson::Binary(Binary {
        subtype: decode_subtype(sub, path)?,
        bytes: decode_base64(b64, path)?,
    }))
}


fn decode_timestamp(value: Value, path: &str) -> DecodeResult<Bson> {
    let field = |body: &Map<String, Value>, key: &str| {
        body.get(key)
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
    };
    match value {
        Value::Object(body) if body.len() == 2 => match (field(&body, "t"), field(&body, "i")) {
            (Some(time), Some(increment)) => Ok(Bson::Timestamp(Timestamp { time, increment })),
            _ => Err(ExtJsonError::new(path, "`$timestamp` fields `t` and `i` must be u32")),
        },
        _ => Err(ExtJsonError::new(path, "`$timestamp` must be {\"t\": .., \"i\": ..}")),
    }
}


fn make_regex(pattern: &str, options: &str) -> Bson {
    let mut flags: Vec<char> = options.chars().collect();
    flags.sort_unstable();
    Bson::RegularExpression(Regex {
        pattern: pattern.to_string(),
        options: flags.into_iter().collect(),
    })
}


fn decode_regular_expression(value: Value, path: &str) -> DecodeResult<Bson> {
    match value {
        Value::Object(body) if body.len() == 2 => {
            match (body.get("pattern"), body.get("options")) {
                (Some(Value::String(p)), Some(Value::String(o))) => Ok(make_regex(p, o)),
                _ => Err(ExtJsonError::new(
                    path,
                    "`$regularExpression` fields `pattern` and `options` must be strings",
                )),
            }
        }
        _ => Err(ExtJsonError::new(
            path,
            "`$regularExpression` must be {\"pattern\": .., \"options\": ..}",
        )),
    }
}


fn decode_legacy_regex(map: Map<String, Value>, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    if !mode.is_relaxed() {
        return Err(relaxed_only(path, "legacy `$regex`/`$options`"));
    }
    match (map.get("$regex"), map.get("$options")) {
        (Some(Value::String(p)), Some(Value::String(o))) => Ok(make_regex(p, o)),
        _ => Err(ExtJsonError::new(path, "legacy `$regex` and `$options` must be strings")),
    }
}


fn decode_code_with_scope(mut map: Map<String, Value>, mode: ExtJsonMode, path: &str) -> DecodeResult<Bson> {
    let code = expect_string(map.remove("$code").unwrap_or(Value::Null), path, "$code")?;
    let Some(Value::Object(scope)) = map.remove("$scope") else {
        return Err(ExtJsonError::new(path, "`$scope` must be an object"));
    };
    let scope = decode_fields(scope, mode, &child_path(path, "$scope"))?;
    Ok(Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }))
}
