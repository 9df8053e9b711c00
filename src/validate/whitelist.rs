//! Protected paths.
//!
//! A whitelist entry protects a path from every cleanup command. A command
//! is caught when its text contains the path as a substring, or when one of
//! its words refers to the same location in another spelling (`~` versus
//! the absolute home path, a glob entry like `/Users/*/Documents`, or a
//! glob argument like `~/Pro*` that would expand onto a protected path).

use super::shape::{CommandShape, expand_home, is_glob, normalize_path};
use globset::{Glob, GlobBuilder, GlobMatcher};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A user-protected path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    pub id: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl WhitelistEntry {
    pub fn new(id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Paths worth protecting on a typical macOS host.
///
/// Offered to the operator by `whitelist suggest`; nothing is protected
/// until the operator adds them.
pub fn suggested_whitelist() -> Vec<WhitelistEntry> {
    [
        ("system", "/System", "Operating system files"),
        ("usr_bin", "/usr/bin", "System binaries"),
        ("usr_sbin", "/usr/sbin", "System administration binaries"),
        ("applications", "/Applications", "Installed applications"),
        ("library", "/Library", "System-wide application support"),
        ("documents", "/Users/*/Documents", "User documents"),
        ("desktop", "/Users/*/Desktop", "User desktop"),
        ("pictures", "/Users/*/Pictures", "User photos and pictures"),
    ]
    .into_iter()
    .map(|(id, path, description)| WhitelistEntry::new(id, path).with_description(description))
    .collect()
}

/// Return the first entry the command touches, if any.
///
/// `shape` is `None` when the command could not be tokenized; only the
/// plain substring check applies then.
pub fn find_protected<'a>(
    command: &str,
    shape: Option<&CommandShape>,
    whitelist: &'a [WhitelistEntry],
    home: Option<&str>,
) -> Option<&'a WhitelistEntry> {
    whitelist.iter().find(|entry| {
        let path = entry.path.trim();
        if path.is_empty() {
            return false;
        }
        if command.contains(path) {
            return true;
        }
        match shape {
            Some(shape) => touches_entry(path, shape, home),
            None => false,
        }
    })
}

fn touches_entry(entry_path: &str, shape: &CommandShape, home: Option<&str>) -> bool {
    let entry_norm = normalize_path(entry_path, home);
    let words: Vec<String> = shape.words().map(|w| normalize_path(w, home)).collect();

    if is_glob(entry_path) {
        let Some(matchers) = entry_matchers(entry_path, &entry_norm) else {
            return false;
        };
        return words.iter().any(|word| {
            let expanded = expand_home(word, home);
            matchers.iter().any(|m| {
                m.is_match(word) || expanded.as_deref().is_some_and(|e| m.is_match(e))
            })
        });
    }

    if words.iter().any(|w| w.contains(&entry_norm)) {
        return true;
    }

    // Deleting or globbing over an ancestor reaches the protected path.
    shape
        .mutation_targets()
        .iter()
        .map(|t| normalize_path(t, home))
        .any(|target| {
            let ancestor = entry_norm
                .strip_prefix(target.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
                || target == "/";
            ancestor || glob_covers(&target, &entry_norm)
        })
}

/// Matchers for the entry itself and everything beneath it, in both the
/// written and home-normalized spellings.
fn entry_matchers(raw: &str, normalized: &str) -> Option<Vec<GlobMatcher>> {
    let mut matchers = Vec::new();
    for pattern in [raw, normalized] {
        for candidate in [pattern.to_string(), format!("{}/**", pattern.trim_end_matches('/'))] {
            match GlobBuilder::new(&candidate).literal_separator(true).build() {
                Ok(glob) => matchers.push(glob.compile_matcher()),
                Err(e) => {
                    warn!(pattern = %candidate, error = %e, "invalid whitelist glob");
                    return None;
                }
            }
        }
    }
    Some(matchers)
}

/// Whether a glob argument would expand onto the protected path or one of
/// its ancestors.
fn glob_covers(target: &str, entry: &str) -> bool {
    if !is_glob(target) {
        return false;
    }
    let Ok(glob) = Glob::new(target) else {
        return false;
    };
    let matcher = glob.compile_matcher();
    let mut current = entry;
    loop {
        if matcher.is_match(current) {
            return true;
        }
        match current.rfind('/') {
            Some(i) if i > 0 => current = &current[..i],
            _ => return false,
        }
    }
}
