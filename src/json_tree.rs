use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

static KEYED_OBJECT_ROOT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^\s*\{\s*".+?"\s*:\s*\{"#).expect("static regex")
});

pub fn at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    Some(current)
}

pub fn object_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Map<String, Value>> {
    at(value, path).and_then(Value::as_object)
}

/// Array at `path`, or an empty slice when missing or not an array.
pub fn items_at<'a>(value: &'a Value, path: &[&str]) -> &'a [Value] {
    items(at(value, path))
}

pub fn items(value: Option<&Value>) -> &[Value] {
    value
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    at(value, path).and_then(Value::as_str)
}

/// Integer view that also accepts integral floats and digit strings.
pub fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn i64_at(value: &Value, path: &[&str]) -> Option<i64> {
    at(value, path).and_then(as_i64)
}

pub fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "None".to_string(),
        other => other.to_string(),
    }
}

/// Loose truthiness used when several optional containers are tried in turn.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

pub fn root_entry(document: &Value) -> Option<(&str, &Value)> {
    document
        .as_object()?
        .iter()
        .next()
        .map(|(key, value)| (key.as_str(), value))
}

/// Cheap check that text looks like `{"SOME_KEY": { ... } }` before parsing.
pub fn looks_like_keyed_object(text: &str) -> bool {
    KEYED_OBJECT_ROOT.is_match(text)
}

/// Depth-first search over objects and arrays.
///
/// `visit` sees every `(key, value)` object member. Returning `Some` records
/// the result and stops descent below that member; `None` keeps walking into
/// the value.
pub fn collect_members<'a, T>(
    root: &'a Value,
    visit: &mut impl FnMut(&'a str, &'a Value) -> Option<T>,
) -> Vec<T> {
    let mut out = Vec::new();
    walk(root, visit, &mut out);
    out
}

fn walk<'a, T>(
    node: &'a Value,
    visit: &mut impl FnMut(&'a str, &'a Value) -> Option<T>,
    out: &mut Vec<T>,
) {
    match node {
        Value::Object(map) => {
            for (key, value) in map {
                match visit(key.as_str(), value) {
                    Some(found) => out.push(found),
                    None => walk(value, visit, out),
                }
            }
        }
        Value::Array(list) => {
            for item in list {
                walk(item, visit, out);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn missing_paths_degrade_to_empty() {
        let doc = json!({"a": {"b": [1, 2]}, "c": 5});
        assert_eq!(items_at(&doc, &["a", "b"]).len(), 2);
        assert!(items_at(&doc, &["a", "missing"]).is_empty());
        assert!(items_at(&doc, &["c", "b"]).is_empty());
        assert!(object_at(&doc, &["c"]).is_none());
    }

    #[test]
    fn lenient_integers() {
        assert_eq!(as_i64(&json!(7)), Some(7));
        assert_eq!(as_i64(&json!(7.0)), Some(7));
        assert_eq!(as_i64(&json!(" 12 ")), Some(12));
        assert_eq!(as_i64(&json!(7.5)), None);
        assert_eq!(as_i64(&json!(null)), None);
    }

    #[test]
    fn collect_members_stops_at_hits_and_descends_elsewhere() {
        let doc = json!({
            "outer": [{"Target": [1]}, {"inner": {"Target": [2, 3]}}],
            "Target": "not a list",
        });
        let found = collect_members(&doc, &mut |key, value| {
            (key == "Target" && value.is_array()).then(|| value.clone())
        });
        assert_eq!(found, vec![json!([1]), json!([2, 3])]);
    }

    #[test]
    fn keyed_object_sniff() {
        assert!(looks_like_keyed_object("  {\n \"EVENT_1\" : {\"x\": 1}}"));
        assert!(!looks_like_keyed_object("[1, 2]"));
        assert!(!looks_like_keyed_object("{\"EVENT_1\": 3}"));
    }
}
