//! Advisory text → typed plan.

use super::types::{CleanupItem, CleanupPlan, RiskLevel, unique_id};
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;
use tracing::{debug, warn};

/// Summary used when the advisory text cannot be turned into a plan.
pub const PARSE_FAILURE_SUMMARY: &str = "The cleanup plan could not be parsed, so no actions are proposed. \
     Review disk usage manually or run the analysis again.";

const MISSING_SUMMARY: &str = "No root cause summary was provided.";
const DEFAULT_TITLE: &str = "Cleanup item";

/// Keys that may hold the item array, in preference order.
const ITEM_KEYS: [&str; 3] = ["cleaning_plan", "items", "plan"];
/// Keys that may hold the summary, in preference order.
const SUMMARY_KEYS: [&str; 2] = ["root_cause_analysis", "root_cause_summary"];

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```[ \t]*([A-Za-z0-9_-]*)[ \t]*\r?\n?(.*?)```").expect("Invalid fence regex")
});

/// Normalize untrusted advisory text into a plan.
///
/// Never fails: on any parse problem the returned plan is empty, carries
/// [`PARSE_FAILURE_SUMMARY`], and records the cause in `parse_error`.
pub fn normalize(raw: &str) -> CleanupPlan {
    match try_normalize(raw) {
        Ok(plan) => {
            debug!(items = plan.items.len(), "normalized cleanup plan");
            plan
        }
        Err(reason) => {
            warn!(reason = %reason, "advisory plan could not be parsed");
            CleanupPlan {
                root_cause_summary: PARSE_FAILURE_SUMMARY.to_string(),
                items: Vec::new(),
                parse_error: Some(reason),
            }
        }
    }
}

fn try_normalize(raw: &str) -> Result<CleanupPlan, String> {
    let payload = extract_payload(raw).ok_or_else(|| "no JSON object found".to_string())?;

    let value: Value =
        serde_json::from_str(payload).map_err(|e| format!("invalid JSON payload: {}", e))?;
    let object = value
        .as_object()
        .ok_or_else(|| "payload is not a JSON object".to_string())?;

    let entries = ITEM_KEYS
        .iter()
        .find_map(|key| object.get(*key))
        .ok_or_else(|| "payload has no cleaning_plan array".to_string())?
        .as_array()
        .ok_or_else(|| "cleaning_plan is not an array".to_string())?;

    let summary = SUMMARY_KEYS
        .iter()
        .find_map(|key| object.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(MISSING_SUMMARY);

    let mut items: Vec<CleanupItem> = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let Some(fields) = entry.as_object() else {
            warn!(position = index + 1, "skipping plan entry that is not an object");
            continue;
        };
        let mut item = normalize_item(fields, index);
        item.id = unique_id(&item.id, |candidate| items.iter().any(|i| i.id == candidate));
        items.push(item);
    }

    Ok(CleanupPlan::new(summary, items))
}

/// Locate the structured payload inside advisory text.
///
/// Prefers a fenced block whose content is an object (a `json`-tagged fence
/// wins over an untagged one); otherwise takes the first `{` and its matching
/// `}`. Returns `None` when no complete object is present.
pub fn extract_payload(raw: &str) -> Option<&str> {
    let fenced: Vec<(bool, &str)> = FENCE_RE
        .captures_iter(raw)
        .filter_map(|caps| {
            let tag = caps.get(1).map(|m| m.as_str()).unwrap_or("");
            let body = caps.get(2)?.as_str().trim();
            body.starts_with('{')
                .then_some((tag.eq_ignore_ascii_case("json"), body))
        })
        .collect();

    if let Some((_, body)) = fenced
        .iter()
        .find(|(is_json, _)| *is_json)
        .or_else(|| fenced.first())
    {
        return Some(*body);
    }

    first_balanced_object(raw)
}

/// Find the first top-level `{ ... }` span, skipping braces inside strings.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

fn normalize_item(fields: &Map<String, Value>, index: usize) -> CleanupItem {
    let id = match fields.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => format!("cleanup_{}", index + 1),
    };

    let risk_level = match fields.get("risk_level").and_then(Value::as_str) {
        Some(raw) => RiskLevel::from_str(raw).unwrap_or_else(|| {
            warn!(id = %id, risk_level = raw, "unknown risk level, defaulting to low");
            RiskLevel::Low
        }),
        None => RiskLevel::Low,
    };

    CleanupItem {
        title: string_field(fields, "title").unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        description: string_field(fields, "description").unwrap_or_default(),
        estimated_size_gb: size_field(fields.get("estimated_size_gb")),
        command: string_field(fields, "command").unwrap_or_default(),
        risk_level,
        // Only an explicit `false` deselects an item.
        checked: !matches!(fields.get("checked"), Some(Value::Bool(false))),
        involves_file_deletion: fields.get("involves_file_deletion").and_then(Value::as_bool),
        id,
    }
}

fn string_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields
        .get(key)
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn size_field(value: Option<&Value>) -> f64 {
    let gb = match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    if gb.is_finite() && gb > 0.0 { gb } else { 0.0 }
}
