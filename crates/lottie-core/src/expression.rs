//! Static fallback for expression-driven properties.
//!
//! There is no script engine here. A property fragment carrying an `"x"`
//! script is reduced to something the keyframe evaluator can run: a script that
//! only assigns a literal to `$bm_rt` becomes a static value, anything else is
//! dropped in favour of the fragment's own `"k"` value.

use serde_json::{Map, Value};

const RESULT_VAR: &str = "$bm_rt";

pub fn resolve_expression(fragment: &Value) -> Value {
    let Some(script) = fragment.get("x").and_then(Value::as_str) else {
        return fragment.clone();
    };

    let mut resolved = fragment.clone();
    let Some(obj) = resolved.as_object_mut() else {
        return resolved;
    };
    obj.remove("x");

    match literal_result(script) {
        Some(literal) => {
            tracing::debug!(%script, "expression reduced to a static value");
            make_static(obj, literal);
        }
        None => tracing::debug!(%script, "unsupported expression, keeping base value"),
    }

    resolved
}

fn make_static(obj: &mut Map<String, Value>, literal: Value) {
    obj.insert("a".to_string(), Value::from(0));
    obj.insert("k".to_string(), literal);
}

/// The literal assigned to the result variable, when that is all the script does.
fn literal_result(script: &str) -> Option<Value> {
    let mut literal = None;

    for statement in script.split([';', '\n']).map(str::trim).filter(|s| !s.is_empty()) {
        let statement = statement.strip_prefix("var ").map(str::trim).unwrap_or(statement);
        if statement == RESULT_VAR {
            continue;
        }

        let rhs = statement.strip_prefix(RESULT_VAR)?.trim_start().strip_prefix('=')?;
        let value: Value = serde_json::from_str(rhs.trim()).ok()?;
        if !is_numeric_literal(&value) {
            return None;
        }
        literal = Some(value);
    }

    literal
}

fn is_numeric_literal(value: &Value) -> bool {
    match value {
        Value::Number(_) => true,
        Value::Array(items) => !items.is_empty() && items.iter().all(Value::is_number),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fragments_without_script_pass_through() {
        let fragment = json!({ "a": 0, "k": 3 });
        assert_eq!(resolve_expression(&fragment), fragment);
    }

    #[test]
    fn literal_assignment_becomes_static() {
        let fragment = json!({
            "a": 1,
            "k": [{ "t": 0, "s": [1] }, { "t": 10, "s": [2] }],
            "x": "var $bm_rt;\n$bm_rt = [0, 0, 1, 1];"
        });
        assert_eq!(
            resolve_expression(&fragment),
            json!({ "a": 0, "k": [0, 0, 1, 1] })
        );

        let scalar = json!({ "a": 0, "k": 1, "x": "$bm_rt = 4;" });
        assert_eq!(resolve_expression(&scalar), json!({ "a": 0, "k": 4 }));
    }

    #[test]
    fn unsupported_script_keeps_base_value() {
        let fragment = json!({
            "a": 0,
            "k": 7,
            "x": "var $bm_rt;\n$bm_rt = wiggle(2, 10);"
        });
        assert_eq!(resolve_expression(&fragment), json!({ "a": 0, "k": 7 }));
    }

    #[test]
    fn script_with_other_statements_is_not_static() {
        assert_eq!(literal_result("var a = 3; $bm_rt = 4;"), None);
        assert_eq!(literal_result("$bm_rt = 'red';"), None);
        assert_eq!(literal_result("var $bm_rt;"), None);
    }
}
