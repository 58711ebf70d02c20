//! 按字段宽松读取上游 JSON
//!
//! 单个字段为 `null` 或类型不符时只丢弃该字段，其余字段照常读取。

use serde_json::Value;

/// 字符串字段；数字转为字符串，其余类型视为空
pub fn text(obj: &Value, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// 非空字符串字段
pub fn opt_text(obj: &Value, key: &str) -> Option<String> {
    Some(text(obj, key)).filter(|s| !s.is_empty())
}

/// 字符串列表；元素为对象时取其 `name`
pub fn names(obj: &Value, key: &str) -> Vec<String> {
    let Some(Value::Array(items)) = obj.get(key) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(s) => Some(s.clone()),
            Value::Object(_) => opt_text(item, "name"),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// 非负整数字段，接受数字或数字字符串
pub fn count(obj: &Value, key: &str) -> Option<u32> {
    match obj.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// 对象列表；非数组视为空
pub fn objects<'a>(obj: &'a Value, key: &str) -> impl Iterator<Item = &'a Value> {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|item| item.is_object())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn mistyped_fields_fall_back_to_empty() {
        let obj = json!({"a": null, "b": 7, "c": ["x", {"name": "Olli"}, {"link": "l"}, 3], "d": "12", "e": {"k": 1}});
        assert_eq!(text(&obj, "a"), "");
        assert_eq!(text(&obj, "b"), "7");
        assert_eq!(text(&obj, "e"), "");
        assert_eq!(opt_text(&obj, "missing"), None);
        assert_eq!(names(&obj, "c"), vec!["x", "Olli"]);
        assert!(names(&obj, "a").is_empty());
        assert_eq!(count(&obj, "b"), Some(7));
        assert_eq!(count(&obj, "d"), Some(12));
        assert_eq!(count(&obj, "a"), None);
        assert_eq!(objects(&obj, "c").count(), 2);
    }
}
