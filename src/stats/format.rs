//! Generic helpers for turning loosely-shaped API JSON into embed fields.

use serde_json::Value;

/// Leaf-name tokens worth showing when an API's shape is unknown.
const INTERESTING_TOKENS: &[&str] = &[
    "rank",
    "mmr",
    "rating",
    "wins",
    "losses",
    "matches",
    "match",
    "win",
    "loss",
    "goal",
    "goals",
    "assist",
    "assists",
    "save",
    "saves",
    "shot",
    "shots",
    "mvps",
    "mvp",
    "tier",
    "division",
    "playlist",
    "league",
    "season",
    "rankpoints",
    "rank_points",
];

const MAX_DEPTH: usize = 4;
const MAX_LIST_ITEMS: usize = 10;
const MAX_STRING_LEN: usize = 120;

/// Walk an unknown JSON payload and collect up to `limit` scalar leaves
/// whose names look stat-like. When nothing matches, fall back to any
/// scalar leaves so the user at least sees something.
pub fn pick_scalar_stats(payload: &Value, limit: usize) -> Vec<(String, String)> {
    let mut items = Vec::new();
    walk(payload, "", 0, true, limit, &mut items);
    if items.is_empty() {
        walk(payload, "", 0, false, limit, &mut items);
    }
    items
}

fn walk(
    value: &Value,
    path: &str,
    depth: usize,
    only_interesting: bool,
    limit: usize,
    items: &mut Vec<(String, String)>,
) {
    if items.len() >= limit || depth > MAX_DEPTH {
        return;
    }

    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let child_path = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                walk(child, &child_path, depth + 1, only_interesting, limit, items);
                if items.len() >= limit {
                    return;
                }
            }
        }
        Value::Array(list) => {
            for (i, child) in list.iter().take(MAX_LIST_ITEMS).enumerate() {
                let child_path = if path.is_empty() {
                    format!("[{}]", i)
                } else {
                    format!("{}[{}]", path, i)
                };
                walk(child, &child_path, depth + 1, only_interesting, limit, items);
                if items.len() >= limit {
                    return;
                }
            }
        }
        Value::String(s) => {
            if s.len() <= MAX_STRING_LEN {
                push_scalar(path, s.clone(), only_interesting, items);
            }
        }
        Value::Number(n) => push_scalar(path, n.to_string(), only_interesting, items),
        Value::Bool(b) => push_scalar(path, b.to_string(), only_interesting, items),
        Value::Null => {}
    }
}

fn push_scalar(
    path: &str,
    value: String,
    only_interesting: bool,
    items: &mut Vec<(String, String)>,
) {
    if path.is_empty() {
        return;
    }
    let leaf = leaf_name(path).to_lowercase();
    if !only_interesting || INTERESTING_TOKENS.iter().any(|t| leaf.contains(t)) {
        items.push((path.to_string(), value));
    }
}

/// Last dotted segment of a path, for use as a field name.
pub fn leaf_name(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
