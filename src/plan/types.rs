//! Plan data types.

use serde::{Deserialize, Serialize};

/// Operator-facing classification of how safe or reversible an action is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Parse a risk level, case-insensitively.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
        }
    }
}

/// A single proposed cleanup action.
///
/// Only `checked` changes after creation, during operator review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupItem {
    /// Unique within a plan.
    pub id: String,
    pub title: String,
    pub description: String,
    /// Planner's estimate of reclaimable space, never negative.
    pub estimated_size_gb: f64,
    /// Shell command to run. Always validated before execution.
    pub command: String,
    pub risk_level: RiskLevel,
    pub checked: bool,
    /// Planner hint that the command deletes user-visible files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub involves_file_deletion: Option<bool>,
}

impl CleanupItem {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        command: impl Into<String>,
        risk_level: RiskLevel,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: String::new(),
            estimated_size_gb: 0.0,
            command: command.into(),
            risk_level,
            checked: true,
            involves_file_deletion: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_estimate_gb(mut self, gb: f64) -> Self {
        self.estimated_size_gb = if gb.is_finite() { gb.max(0.0) } else { 0.0 };
        self
    }

    /// Label used in progress output and failure reasons.
    pub fn label(&self) -> &str {
        if self.description.is_empty() {
            &self.title
        } else {
            &self.description
        }
    }
}

/// A normalized plan: summary plus typed items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanupPlan {
    pub root_cause_summary: String,
    pub items: Vec<CleanupItem>,
    /// Set when the advisory text could not be parsed; the plan is then empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

impl CleanupPlan {
    pub fn new(root_cause_summary: impl Into<String>, items: Vec<CleanupItem>) -> Self {
        Self {
            root_cause_summary: root_cause_summary.into(),
            items,
            parse_error: None,
        }
    }

    /// Items the operator has selected, in plan order.
    pub fn checked_items(&self) -> impl Iterator<Item = &CleanupItem> {
        self.items.iter().filter(|i| i.checked)
    }

    /// Set the `checked` flag of one item. Returns false when the id is unknown.
    pub fn set_checked(&mut self, id: &str, checked: bool) -> bool {
        match self.items.iter_mut().find(|i| i.id == id) {
            Some(item) => {
                item.checked = checked;
                true
            }
            None => false,
        }
    }

    /// Check exactly the listed ids and uncheck everything else.
    ///
    /// Returns the ids that matched no item.
    pub fn select_only(&mut self, ids: &[String]) -> Vec<String> {
        for item in &mut self.items {
            item.checked = ids.iter().any(|id| *id == item.id);
        }
        ids.iter()
            .filter(|id| !self.items.iter().any(|i| &i.id == *id))
            .cloned()
            .collect()
    }

    /// Sum of `estimated_size_gb` over checked items.
    pub fn estimated_selection_gb(&self) -> f64 {
        self.checked_items().map(|i| i.estimated_size_gb).sum()
    }

    /// Append items, renaming ids that collide with existing ones.
    pub fn extend_unique(&mut self, items: impl IntoIterator<Item = CleanupItem>) {
        for mut item in items {
            item.id = unique_id(&item.id, |candidate| {
                self.items.iter().any(|i| i.id == candidate)
            });
            self.items.push(item);
        }
    }
}

/// Return `base`, or `base_<n>` for the smallest n ≥ 2 that is not taken.
pub(crate) fn unique_id(base: &str, taken: impl Fn(&str) -> bool) -> String {
    if !taken(base) {
        return base.to_string();
    }
    (2..)
        .map(|n| format!("{}_{}", base, n))
        .find(|candidate| !taken(candidate))
        .unwrap_or_else(|| base.to_string())
}
