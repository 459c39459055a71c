//! Cell coercion: raw CSV bytes to typed [`Value`]s.
//!
//! Real-world exports mix locales, so floats are tried in a fixed order:
//! as given, without a `%` (scaled by 1/100), with a decimal comma, and with
//! both. Booleans use a loose yes/true/1 heuristic. Integers are strict.

use std::str::FromStr;

use crate::error::{ConvertError, ConvertResult};
use crate::schema::{FieldType, Value};

/// Convert one cell into a value of `field_type`.
///
/// With `fail_on_unparseable` unset, an unparseable float becomes NaN.
pub fn coerce_cell(raw: &[u8], field_type: &FieldType, fail_on_unparseable: bool) -> ConvertResult<Value> {
    match field_type {
        FieldType::String => Ok(Value::Str(valid_utf8(raw))),
        FieldType::Bool => Ok(Value::Bool(to_bool(&valid_utf8(raw)))),
        FieldType::I8 => signed::<i8>(raw, field_type),
        FieldType::I16 => signed::<i16>(raw, field_type),
        FieldType::I32 => signed::<i32>(raw, field_type),
        FieldType::I64 => signed::<i64>(raw, field_type),
        FieldType::Isize => signed::<isize>(raw, field_type),
        FieldType::U8 => unsigned::<u8>(raw, field_type),
        FieldType::U16 => unsigned::<u16>(raw, field_type),
        FieldType::U32 => unsigned::<u32>(raw, field_type),
        FieldType::U64 => unsigned::<u64>(raw, field_type),
        FieldType::Usize => unsigned::<usize>(raw, field_type),
        FieldType::F32 => {
            let text = valid_utf8(raw);
            match parse_float::<f32>(&text) {
                Some(f) => Ok(Value::F32(f)),
                None if fail_on_unparseable => Err(invalid_float(text, field_type)),
                None => Ok(Value::F32(f32::NAN)),
            }
        }
        FieldType::F64 => {
            let text = valid_utf8(raw);
            match parse_float::<f64>(&text) {
                Some(f) => Ok(Value::F64(f)),
                None if fail_on_unparseable => Err(invalid_float(text, field_type)),
                None => Ok(Value::F64(f64::NAN)),
            }
        }
        FieldType::Unsupported(name) => Err(ConvertError::UnsupportedFieldType(name.clone())),
    }
}

/// Text with invalid UTF-8 sequences dropped.
pub fn valid_utf8(raw: &[u8]) -> String {
    raw.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Loose boolean reading.
///
/// True when the first two characters contain one of `YyTt1`, or the
/// lowercased text contains "true" or "yes". Note that "untrue" is true.
pub fn to_bool(text: &str) -> bool {
    let prefix_hit = text.chars().take(2).any(|c| matches!(c, 'Y' | 'y' | 'T' | 't' | '1'));
    if prefix_hit {
        return true;
    }
    let lower = text.to_lowercase();
    lower.contains("true") || lower.contains("yes")
}

/// Float parse with the percent and decimal-comma fallbacks.
pub fn parse_float<F>(text: &str) -> Option<F>
where
    F: FromStr + std::ops::Div<Output = F> + From<u8>,
{
    let hundred = F::from(100u8);

    if let Ok(f) = text.parse::<F>() {
        return Some(f);
    }
    let no_percent = text.replacen('%', "", 1);
    if let Ok(f) = no_percent.parse::<F>() {
        return Some(f / hundred);
    }
    let decimal_point = text.replacen(',', ".", 1);
    if let Ok(f) = decimal_point.parse::<F>() {
        return Some(f);
    }
    let both = decimal_point.replacen('%', "", 1);
    if let Ok(f) = both.parse::<F>() {
        return Some(f / hundred);
    }
    None
}

fn signed<T>(raw: &[u8], field_type: &FieldType) -> ConvertResult<Value>
where
    T: FromStr + TryInto<i64>,
{
    let text = valid_utf8(raw);
    let parsed: T = text.parse().map_err(|_| invalid_integer(&text, field_type))?;
    parsed
        .try_into()
        .map(Value::Int)
        .map_err(|_| invalid_integer(&text, field_type))
}

fn unsigned<T>(raw: &[u8], field_type: &FieldType) -> ConvertResult<Value>
where
    T: FromStr + TryInto<u64>,
{
    let text = valid_utf8(raw);
    let parsed: T = text.parse().map_err(|_| invalid_integer(&text, field_type))?;
    parsed
        .try_into()
        .map(Value::UInt)
        .map_err(|_| invalid_integer(&text, field_type))
}

fn invalid_integer(text: &str, field_type: &FieldType) -> ConvertError {
    ConvertError::InvalidInteger {
        value: text.to_string(),
        target: field_type.name().to_string(),
    }
}

fn invalid_float(text: String, field_type: &FieldType) -> ConvertError {
    ConvertError::InvalidFloat {
        value: text,
        target: field_type.name().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn f64_of(text: &str) -> f64 {
        match coerce_cell(text.as_bytes(), &FieldType::F64, true).unwrap() {
            Value::F64(f) => f,
            other => panic!("expected f64, got {other:?}"),
        }
    }

    #[test]
    fn test_float_fallbacks() {
        assert_eq!(f64_of("3.25"), 3.25);
        assert_eq!(f64_of("45%"), 0.45);
        assert_eq!(f64_of("3,5"), 3.5);
        assert_eq!(f64_of("12,5%"), 0.125);
        assert_eq!(f64_of("-1e3"), -1000.0);
    }

    #[test]
    fn test_percent_scaled_once() {
        // only the % branches divide
        assert_eq!(f64_of("50%"), 0.5);
        assert_eq!(f64_of("7,0"), 7.0);
    }

    #[test]
    fn test_unparseable_float_policy() {
        match coerce_cell(b"abc", &FieldType::F64, false).unwrap() {
            Value::F64(f) => assert!(f.is_nan()),
            other => panic!("expected NaN, got {other:?}"),
        }
        let err = coerce_cell(b"abc", &FieldType::F64, true).unwrap_err();
        assert!(matches!(err, ConvertError::InvalidFloat { .. }));
    }

    #[test]
    fn test_f32() {
        assert_eq!(
            coerce_cell(b"2,5", &FieldType::F32, true).unwrap(),
            Value::F32(2.5)
        );
    }

    #[test]
    fn test_bool_heuristic() {
        assert!(to_bool("yes"));
        assert!(to_bool("True"));
        assert!(to_bool("1"));
        assert!(to_bool("Y"));
        assert!(to_bool("oh yes"));
        assert!(!to_bool("No"));
        assert!(!to_bool("N"));
        assert!(!to_bool(""));
        assert!(!to_bool("0"));
        // legacy substring behaviour
        assert!(to_bool("untrue"));
    }

    #[test]
    fn test_bool_never_fails() {
        let v = coerce_cell(b"N", &FieldType::Bool, true).unwrap();
        assert_eq!(v, Value::Bool(false));
        let v = coerce_cell(&[0xff], &FieldType::Bool, true).unwrap();
        assert_eq!(v, Value::Bool(false));
    }

    #[test]
    fn test_integers() {
        assert_eq!(coerce_cell(b"-12", &FieldType::I8, true).unwrap(), Value::Int(-12));
        assert_eq!(coerce_cell(b"1998", &FieldType::U32, true).unwrap(), Value::UInt(1998));
        assert_eq!(coerce_cell(b"+7", &FieldType::Usize, true).unwrap(), Value::UInt(7));
    }

    #[test]
    fn test_integer_failures() {
        for (text, ty) in [
            ("", FieldType::I32),
            ("1.5", FieldType::I64),
            ("300", FieldType::U8),
            ("-1", FieldType::U16),
        ] {
            let err = coerce_cell(text.as_bytes(), &ty, false).unwrap_err();
            assert!(
                matches!(err, ConvertError::InvalidInteger { .. }),
                "'{text}' as {ty} should fail"
            );
        }
    }

    #[test]
    fn test_string_strips_invalid_utf8() {
        let raw = b"Soci\xe9t\xc3\xa9";
        assert_eq!(
            coerce_cell(raw, &FieldType::String, true).unwrap(),
            Value::Str("Socité".to_string())
        );
    }

    #[test]
    fn test_unsupported_type() {
        let err = coerce_cell(b"2024-01-01", &FieldType::Unsupported("date".into()), false).unwrap_err();
        assert_eq!(err, ConvertError::UnsupportedFieldType("date".into()));
    }
}
