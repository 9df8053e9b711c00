//! Tests for plan normalization.

use super::normalize::{PARSE_FAILURE_SUMMARY, extract_payload, normalize};
use super::types::{CleanupItem, CleanupPlan, RiskLevel};

// =========================================================================
// Payload extraction
// =========================================================================

#[test]
fn fenced_json_block_is_preferred() {
    let raw = "Here is the plan:\n```json\n{\"a\": 1}\n```\nand also {\"b\": 2}";
    assert_eq!(extract_payload(raw), Some("{\"a\": 1}"));
}

#[test]
fn json_tagged_fence_beats_untagged_fence() {
    let raw = "```\n{\"untagged\": true}\n```\n```json\n{\"tagged\": true}\n```";
    assert_eq!(extract_payload(raw), Some("{\"tagged\": true}"));
}

#[test]
fn untagged_fence_is_used_when_alone() {
    let raw = "```\n{\"x\": [1, 2]}\n```";
    assert_eq!(extract_payload(raw), Some("{\"x\": [1, 2]}"));
}

#[test]
fn fence_without_object_falls_back_to_braces() {
    let raw = "```bash\nrm -rf ~/.Trash/*\n```\nPlan: {\"k\": \"v\"} done";
    assert_eq!(extract_payload(raw), Some("{\"k\": \"v\"}"));
}

#[test]
fn bare_object_with_surrounding_prose() {
    let raw = "Sure! {\"outer\": {\"inner\": 1}} Let me know if you need more.";
    assert_eq!(extract_payload(raw), Some("{\"outer\": {\"inner\": 1}}"));
}

#[test]
fn braces_inside_strings_are_ignored() {
    let raw = r#"{"cmd": "echo \"}\" {", "n": 1} trailing }"#;
    assert_eq!(extract_payload(raw), Some(r#"{"cmd": "echo \"}\" {", "n": 1}"#));
}

#[test]
fn truncated_object_has_no_payload() {
    assert_eq!(extract_payload("{\"cleaning_plan\": [ {\"id\": 1"), None);
    assert_eq!(extract_payload("no structure here"), None);
}

// =========================================================================
// Normalization
// =========================================================================

#[test]
fn trailing_prose_without_fence_still_parses_and_defaults_checked() {
    let raw = r#"{
        "root_cause_analysis": "Caches are large.",
        "cleaning_plan": [
            {"id": "clear_user_caches", "title": "Clear caches", "command": "rm -rf ~/Library/Caches/*", "risk_level": "low", "estimated_size_gb": 5.4},
            {"id": "empty_trash", "title": "Empty trash", "command": "rm -rf ~/.Trash/*", "risk_level": "low", "estimated_size_gb": 2.1}
        ]
    }
    I hope this helps! Let me know if you want a more aggressive plan."#;

    let plan = normalize(raw);

    assert!(!plan.parse_error.is_some());
    assert_eq!(plan.root_cause_summary, "Caches are large.");
    assert_eq!(plan.items.len(), 2);
    assert!(plan.items.iter().all(|i| i.checked));
    assert_eq!(plan.items[0].id, "clear_user_caches");
    assert_eq!(plan.items[1].estimated_size_gb, 2.1);
}

#[test]
fn missing_fields_get_safe_defaults() {
    let raw = r#"```json
{"root_cause_analysis": "x", "cleaning_plan": [{"command": "rm -rf ~/.Trash/*"}, {}]}
```"#;

    let plan = normalize(raw);

    assert_eq!(plan.items.len(), 2);
    let first = &plan.items[0];
    assert_eq!(first.id, "cleanup_1");
    assert!(first.checked);
    assert_eq!(first.risk_level, RiskLevel::Low);
    assert_eq!(first.estimated_size_gb, 0.0);
    assert_eq!(first.title, "Cleanup item");
    assert_eq!(first.description, "");
    assert_eq!(plan.items[1].id, "cleanup_2");
    assert_eq!(plan.items[1].command, "");
}

#[test]
fn explicit_false_unchecks_but_other_values_do_not() {
    let raw = r#"{"cleaning_plan": [
        {"id": "a", "checked": false},
        {"id": "b", "checked": "no"},
        {"id": "c", "checked": null}
    ]}"#;

    let plan = normalize(raw);
    let checked: Vec<bool> = plan.items.iter().map(|i| i.checked).collect();
    assert_eq!(checked, vec![false, true, true]);
}

#[test]
fn risk_level_is_case_insensitive_and_unknown_defaults_to_low() {
    let raw = r#"{"cleaning_plan": [
        {"risk_level": "HIGH"},
        {"risk_level": "Medium"},
        {"risk_level": "catastrophic"}
    ]}"#;

    let plan = normalize(raw);
    let risks: Vec<RiskLevel> = plan.items.iter().map(|i| i.risk_level).collect();
    assert_eq!(risks, vec![RiskLevel::High, RiskLevel::Medium, RiskLevel::Low]);
}

#[test]
fn estimates_are_clamped_and_coerced() {
    let raw = r#"{"cleaning_plan": [
        {"estimated_size_gb": -4},
        {"estimated_size_gb": "3.5"},
        {"estimated_size_gb": "lots"},
        {"estimated_size_gb": 1e3}
    ]}"#;

    let plan = normalize(raw);
    let sizes: Vec<f64> = plan.items.iter().map(|i| i.estimated_size_gb).collect();
    assert_eq!(sizes, vec![0.0, 3.5, 0.0, 1000.0]);
}

#[test]
fn numeric_ids_are_stringified_and_duplicates_disambiguated() {
    let raw = r#"{"cleaning_plan": [{"id": 7}, {"id": "x"}, {"id": "x"}, {"id": "  "}]}"#;

    let plan = normalize(raw);
    let ids: Vec<&str> = plan.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["7", "x", "x_2", "cleanup_4"]);
}

#[test]
fn non_object_entries_are_skipped_but_keep_positions() {
    let raw = r#"{"cleaning_plan": ["oops", {"title": "real"}]}"#;

    let plan = normalize(raw);
    assert_eq!(plan.items.len(), 1);
    assert_eq!(plan.items[0].id, "cleanup_2");
    assert_eq!(plan.items[0].title, "real");
}

#[test]
fn alternate_keys_are_accepted() {
    let raw = r#"{"root_cause_summary": "from a saved plan", "items": [{"id": "a"}]}"#;

    let plan = normalize(raw);
    assert_eq!(plan.root_cause_summary, "from a saved plan");
    assert_eq!(plan.items.len(), 1);
}

#[test]
fn missing_summary_gets_placeholder() {
    let plan = normalize(r#"{"cleaning_plan": []}"#);
    assert!(!plan.parse_error.is_some());
    assert_eq!(plan.root_cause_summary, "No root cause summary was provided.");
}

#[test]
fn malformed_json_yields_labeled_empty_plan() {
    let plan = normalize("```json\n{\"cleaning_plan\": [,]}\n```");
    assert!(plan.parse_error.is_some());
    assert!(plan.items.is_empty());
    assert_eq!(plan.root_cause_summary, PARSE_FAILURE_SUMMARY);
}

#[test]
fn missing_plan_array_is_a_parse_failure() {
    let plan = normalize(r#"{"root_cause_analysis": "only prose"}"#);
    assert!(plan.parse_error.is_some());
    assert!(plan.items.is_empty());

    let plan = normalize(r#"{"cleaning_plan": "not a list"}"#);
    assert!(plan.parse_error.is_some());
}

#[test]
fn plain_prose_is_a_parse_failure() {
    let plan = normalize("I could not analyze your disk, sorry.");
    assert!(plan.parse_error.is_some());
    assert_eq!(plan.parse_error.as_deref(), Some("no JSON object found"));
}

#[test]
fn normalized_plan_survives_serialization() {
    let plan = normalize(r#"{"cleaning_plan": [{"id": "a", "risk_level": "medium"}]}"#);
    let json = serde_json::to_string(&plan).unwrap();
    assert!(json.contains("\"risk_level\":\"medium\""));
    assert!(!json.contains("parse_error"));

    let reparsed = normalize(&json);
    assert_eq!(reparsed.items, plan.items);
}

// =========================================================================
// Plan selection helpers
// =========================================================================

fn sample_plan() -> CleanupPlan {
    CleanupPlan::new(
        "summary",
        vec![
            CleanupItem::new("a", "A", "echo a", RiskLevel::Low).with_estimate_gb(1.0),
            CleanupItem::new("b", "B", "echo b", RiskLevel::Medium).with_estimate_gb(2.5),
            CleanupItem::new("c", "C", "echo c", RiskLevel::High).with_estimate_gb(4.0),
        ],
    )
}

#[test]
fn select_only_reports_unknown_ids() {
    let mut plan = sample_plan();
    let unknown = plan.select_only(&["b".to_string(), "zzz".to_string()]);

    assert_eq!(unknown, vec!["zzz".to_string()]);
    let checked: Vec<&str> = plan.checked_items().map(|i| i.id.as_str()).collect();
    assert_eq!(checked, vec!["b"]);
}

#[test]
fn estimated_selection_sums_checked_items() {
    let mut plan = sample_plan();
    assert_eq!(plan.estimated_selection_gb(), 7.5);
    assert!(plan.set_checked("c", false));
    assert!(!plan.set_checked("missing", false));
    assert_eq!(plan.estimated_selection_gb(), 3.5);
}

#[test]
fn extend_unique_renames_colliding_ids() {
    let mut plan = sample_plan();
    plan.extend_unique(vec![CleanupItem::new("a", "Again", "echo", RiskLevel::Low)]);
    assert_eq!(plan.items.last().unwrap().id, "a_2");
}

#[test]
fn negative_builder_estimate_is_clamped() {
    let item = CleanupItem::new("x", "X", "echo", RiskLevel::Low).with_estimate_gb(-1.0);
    assert_eq!(item.estimated_size_gb, 0.0);
}
