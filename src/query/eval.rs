use serde_json::Value;

use super::types::Filter;

const MAX_PATH_DEPTH: usize = 32;

pub fn eval_filter(doc: &Value, filter: &Filter) -> bool {
    match filter {
        Filter::And(fs) => fs.iter().all(|f| eval_filter(doc, f)),
        Filter::Eq { path, value } => get_path(doc, path).is_some_and(|v| v == value),
    }
}

/// Resolve a dotted path (`a.b.c`) inside a JSON object.
pub fn get_path<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() || path.len() > 1024 {
        return None;
    }
    let mut cur = doc;
    for (depth, seg) in path.split('.').enumerate() {
        if depth >= MAX_PATH_DEPTH {
            return None;
        }
        cur = cur.as_object()?.get(seg)?;
    }
    Some(cur)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn and_of_equalities() {
        let doc = json!({"inboxId": "joe", "readStatus": "READ"});
        let f = Filter::And(vec![Filter::eq("inboxId", "joe"), Filter::eq("readStatus", "READ")]);
        assert!(eval_filter(&doc, &f));
        let f = Filter::And(vec![Filter::eq("inboxId", "joe"), Filter::eq("readStatus", "UNREAD")]);
        assert!(!eval_filter(&doc, &f));
    }

    #[test]
    fn missing_field_never_matches() {
        assert!(!eval_filter(&json!({"id": "1"}), &Filter::eq("inboxId", "joe")));
        assert!(eval_filter(&json!({}), &Filter::And(vec![])));
    }

    #[test]
    fn nested_paths_resolve() {
        let doc = json!({"meta": {"owner": {"name": "joe"}}});
        assert_eq!(get_path(&doc, "meta.owner.name"), Some(&json!("joe")));
        assert_eq!(get_path(&doc, "meta.missing"), None);
        assert_eq!(get_path(&doc, ""), None);
    }
}
