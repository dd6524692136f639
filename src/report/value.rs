//! Report sections as `serde_json::Value` trees.
//!
//! Every typed section passes through [`lower`] exactly once before it
//! leaves the pipeline. `serde_json` writes NaN and infinities as `null`
//! during that pass, so a lowered tree is always JSON-safe.

use serde::Serialize;
use serde_json::Value;

/// Lower a typed section into a JSON value tree, nulling non-finite floats.
pub fn lower<T: Serialize + ?Sized>(section: &T) -> serde_json::Result<Value> {
    serde_json::to_value(section)
}

/// True when every number in the tree is finite.
pub fn is_json_safe(value: &Value) -> bool {
    match value {
        Value::Number(n) => n.as_f64().map_or(true, f64::is_finite),
        Value::Array(items) => items.iter().all(is_json_safe),
        Value::Object(entries) => entries.values().all(is_json_safe),
        _ => true,
    }
}

/// Follow a dotted path of object keys and array indices, e.g. `rankings.overall_efficiency.0`.
pub fn pointer<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |node, segment| match node {
        Value::Object(entries) => entries.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[derive(Serialize)]
    enum Shape {
        Dot,
        Circle(f64),
        Rect { w: u64, h: u64 },
    }

    #[derive(Serialize)]
    struct Sample {
        count: usize,
        ratio: f64,
        missing: Option<f64>,
        label: char,
        shapes: Vec<Shape>,
        by_id: BTreeMap<u32, &'static str>,
        #[serde(flatten)]
        extra: BTreeMap<String, i32>,
    }

    fn sample() -> Sample {
        let mut extra = BTreeMap::new();
        extra.insert("flat".to_string(), 7);
        let mut by_id = BTreeMap::new();
        by_id.insert(3, "three");
        Sample {
            count: 4,
            ratio: f64::NAN,
            missing: None,
            label: 'x',
            shapes: vec![Shape::Dot, Shape::Circle(f64::INFINITY), Shape::Rect { w: 2, h: 3 }],
            by_id,
            extra,
        }
    }

    #[test]
    fn test_lowering_keeps_shape() {
        let v = lower(&sample()).unwrap();
        assert_eq!(pointer(&v, "count"), Some(&json!(4)));
        assert_eq!(pointer(&v, "label"), Some(&json!("x")));
        assert_eq!(pointer(&v, "missing"), Some(&Value::Null));
        assert_eq!(pointer(&v, "shapes.0"), Some(&json!("Dot")));
        assert_eq!(pointer(&v, "shapes.2.Rect.h"), Some(&json!(3)));
        assert_eq!(pointer(&v, "by_id.3"), Some(&json!("three")));
        assert_eq!(pointer(&v, "flat"), Some(&json!(7)));
        assert!(pointer(&v, "shapes.9").is_none());
    }

    #[test]
    fn test_large_integers_stay_exact() {
        assert_eq!(lower(&u64::MAX).unwrap().as_u64(), Some(u64::MAX));
    }

    #[test]
    fn test_non_finite_floats_become_null() {
        let v = lower(&sample()).unwrap();
        assert!(is_json_safe(&v));
        assert_eq!(pointer(&v, "ratio"), Some(&Value::Null));
        assert_eq!(pointer(&v, "shapes.1.Circle"), Some(&Value::Null));
    }

    #[test]
    fn test_json_round_trip() {
        let v = lower(&sample()).unwrap();
        let back: Value = serde_json::from_str(&serde_json::to_string(&v).unwrap()).unwrap();
        assert_eq!(back, v);
    }
}
