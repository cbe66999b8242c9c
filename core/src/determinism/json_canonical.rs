use crate::error::{CoreError, CoreResult};
use serde::Serialize;
use serde_json::{Number, Value};
use std::collections::BTreeMap;

// Canonical form used for fingerprints:
// - UTF-8 JSON, keys sorted lexicographically
// - no insignificant whitespace
// - integral floats collapse to integers (2.0 -> 2), -0.0 -> 0
pub fn to_canonical_bytes<T: Serialize>(value: &T) -> CoreResult<Vec<u8>> {
    let v = serde_json::to_value(value)?;
    let normalized = normalize_value(v)?;
    let s = serde_json::to_string(&normalized)?;
    Ok(s.into_bytes())
}

fn normalize_value(v: Value) -> CoreResult<Value> {
    match v {
        Value::Object(map) => {
            let mut btm: BTreeMap<String, Value> = BTreeMap::new();
            for (k, vv) in map {
                btm.insert(k, normalize_value(vv)?);
            }
            let mut out = serde_json::Map::new();
            for (k, vv) in btm {
                out.insert(k, vv);
            }
            Ok(Value::Object(out))
        }
        Value::Array(arr) => {
            let mut out = Vec::with_capacity(arr.len());
            for vv in arr {
                out.push(normalize_value(vv)?);
            }
            Ok(Value::Array(out))
        }
        Value::Number(n) => normalize_number(n).map(Value::Number),
        other => Ok(other),
    }
}

fn normalize_number(n: Number) -> CoreResult<Number> {
    if n.is_i64() || n.is_u64() {
        return Ok(n);
    }
    let f = n.as_f64().ok_or_else(|| {
        CoreError::DeterminismViolation(format!("number {} has no f64 form", n))
    })?;
    if !f.is_finite() {
        return Err(CoreError::DeterminismViolation(
            "canonical JSON forbids non-finite numbers".to_string(),
        ));
    }
    if f.fract() == 0.0 && f.abs() < 9.0e15 {
        return Ok(Number::from(f as i64));
    }
    Number::from_f64(f).ok_or_else(|| {
        CoreError::DeterminismViolation(format!("number {} is not representable", f))
    })
}
