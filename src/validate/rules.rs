//! Safety rules.
//!
//! Each rule is a variant of [`SafetyRule`] and is evaluated against a
//! single [`Segment`] (allow rules) or a whole [`CommandShape`] (deny
//! rules). Allow rules describe the few command shapes known to be safe;
//! deny rules describe shapes that are never safe and are always evaluated.

use super::shape::{
    CommandShape, Segment, has_parent_component, is_glob, literal_prefix, normalize_path,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Matches a privilege-escalation tool name as a standalone word anywhere
/// in the raw command, including inside quoted nested scripts.
static PRIVILEGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(^|[^\w.-])(sudo|doas|pkexec|runas)($|[^\w.-])")
        .expect("Invalid privilege escalation regex")
});

static ADMIN_PRIVILEGES_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)with\s+administrator\s+privileges")
        .expect("Invalid administrator privileges regex")
});

/// Local snapshot names as produced by `tmutil`.
static SNAPSHOT_DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}-\d{6}$").expect("Invalid snapshot date regex")
});

static NUMERIC_MODE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-7]{1,4}$").expect("Invalid numeric mode regex"));

static SYMBOLIC_CLAUSE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([ugoa]*)([-+=])([rwxXst]*)$").expect("Invalid symbolic mode regex")
});

/// System locations that must never be deleted, overwritten, or re-permissioned.
const CRITICAL_SYSTEM_PATHS: &[&str] = &[
    "/System",
    "/usr",
    "/bin",
    "/sbin",
    "/etc",
    "/var",
    "/private",
    "/Library",
    "/Applications",
    "/dev",
    "/boot",
    "/lib",
    "/lib64",
    "/opt",
    "/proc",
    "/sys",
    "/Volumes",
    "/cores",
];

/// Locations in the home directory that hold irreplaceable user data.
const CRITICAL_HOME_PATHS: &[&str] = &[
    "~/Documents",
    "~/Desktop",
    "~/Pictures",
    "~/Movies",
    "~/Music",
    "~/Library/Application Support",
    "~/Library/Keychains",
    "~/Library/Mobile Documents",
    "~/Library/Mail",
    "~/Library/Messages",
    "~/Library/Preferences",
    "~/.ssh",
    "~/.gnupg",
];

/// Targets that name the whole filesystem, the whole home directory, or
/// everything in the working directory.
const ROOT_TARGETS: &[&str] = &[
    "/", "/*", "/.*", "~", "~/*", "~/.*", ".", "./*", "*", ".*", "..", "../*",
];

const CACHE_BASES: &[&str] = &["~/Library/Caches", "~/.cache"];
const LOG_BASES: &[&str] = &["~/Library/Logs"];
const TRASH_BASES: &[&str] = &["~/.Trash"];
const DOWNLOADS_BASES: &[&str] = &["~/Downloads"];

/// Extensions that `open` launches instead of showing.
const LAUNCHABLE_EXTENSIONS: &[&str] = &[
    "app", "command", "tool", "terminal", "workflow", "sh", "pkg", "mpkg", "dmg", "scpt",
    "applescript", "jar",
];

/// `rm` options accepted inside an allow-listed subtree.
const SAFE_RM_FLAGS: &str = "rRfvdI";
const SAFE_RM_LONG_FLAGS: &[&str] = &["--recursive", "--force", "--verbose", "--dir"];

/// `find` predicates that narrow what a `-delete` removes.
const FIND_FILTERS: &[&str] = &[
    "-name", "-iname", "-type", "-mtime", "-atime", "-ctime", "-mmin", "-size", "-newer",
    "-path", "-ipath",
];

/// Accounts whose ownership makes a file effectively system-owned.
const PRIVILEGED_OWNERS: &[&str] = &["root", "0", "wheel"];

/// Whether commands outside the allow list may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyPolicy {
    /// Only commands whose every segment matches an allow rule are approved.
    #[default]
    DefaultDeny,
    /// Commands that trip no deny rule and touch no whitelisted path are approved.
    DefaultAllow,
}

impl fmt::Display for SafetyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SafetyPolicy::DefaultDeny => write!(f, "default_deny"),
            SafetyPolicy::DefaultAllow => write!(f, "default_allow"),
        }
    }
}

/// An individually testable safety rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SafetyRule {
    AllowSnapshotThinning,
    AllowSnapshotDeletion,
    AllowCacheSubtree,
    AllowLogSubtree,
    AllowTrashSubtree,
    AllowDownloadsSubtree,
    AllowOpenFolder,
    AllowEcho,
    DenyRootPath,
    DenyCriticalPath,
    DenyPrivilegeEscalation,
    DenyWorldWritable,
    DenyRootOwnership,
    DenyDiskFormat,
    DenyParentTraversal,
}

/// Allow rules in evaluation order.
pub const ALLOW_RULES: &[SafetyRule] = &[
    SafetyRule::AllowSnapshotThinning,
    SafetyRule::AllowSnapshotDeletion,
    SafetyRule::AllowCacheSubtree,
    SafetyRule::AllowLogSubtree,
    SafetyRule::AllowTrashSubtree,
    SafetyRule::AllowDownloadsSubtree,
    SafetyRule::AllowOpenFolder,
    SafetyRule::AllowEcho,
];

/// Deny rules in evaluation order. The first match is the reported reason.
pub const DENY_RULES: &[SafetyRule] = &[
    SafetyRule::DenyPrivilegeEscalation,
    SafetyRule::DenyDiskFormat,
    SafetyRule::DenyRootPath,
    SafetyRule::DenyCriticalPath,
    SafetyRule::DenyParentTraversal,
    SafetyRule::DenyWorldWritable,
    SafetyRule::DenyRootOwnership,
];

impl SafetyRule {
    /// Operator-facing description of what the rule covers.
    pub fn description(self) -> &'static str {
        match self {
            SafetyRule::AllowSnapshotThinning => "local snapshot thinning with bounded arguments",
            SafetyRule::AllowSnapshotDeletion => "deletion of a single dated local snapshot",
            SafetyRule::AllowCacheSubtree => "deletion inside a user cache directory",
            SafetyRule::AllowLogSubtree => "deletion inside the user log directory",
            SafetyRule::AllowTrashSubtree => "deletion inside the user trash",
            SafetyRule::AllowDownloadsSubtree => "deletion inside the downloads directory",
            SafetyRule::AllowOpenFolder => "opening a folder for manual review",
            SafetyRule::AllowEcho => "informational output",
            SafetyRule::DenyRootPath => "targets the filesystem root, the home directory, or a top-level directory",
            SafetyRule::DenyCriticalPath => "targets an operating-system or user-data location",
            SafetyRule::DenyPrivilegeEscalation => "requests elevated privileges",
            SafetyRule::DenyWorldWritable => "makes files world-writable",
            SafetyRule::DenyRootOwnership => "hands ownership to a privileged account",
            SafetyRule::DenyDiskFormat => "erases, partitions, or writes raw devices",
            SafetyRule::DenyParentTraversal => "escapes its target with '..'",
        }
    }

    /// Whether this allow rule approves the segment.
    ///
    /// Always false for deny rules.
    pub fn allows(self, segment: &Segment, home: Option<&str>) -> bool {
        match self {
            SafetyRule::AllowSnapshotThinning => allows_thinning(segment),
            SafetyRule::AllowSnapshotDeletion => allows_snapshot_deletion(segment),
            SafetyRule::AllowCacheSubtree => allows_subtree_delete(segment, CACHE_BASES, home),
            SafetyRule::AllowLogSubtree => allows_subtree_delete(segment, LOG_BASES, home),
            SafetyRule::AllowTrashSubtree => allows_subtree_delete(segment, TRASH_BASES, home),
            SafetyRule::AllowDownloadsSubtree => {
                allows_subtree_delete(segment, DOWNLOADS_BASES, home)
            }
            SafetyRule::AllowOpenFolder => allows_open_folder(segment, home),
            SafetyRule::AllowEcho => segment.program() == Some("echo"),
            _ => false,
        }
    }

    /// Whether this deny rule rejects the command.
    ///
    /// Always false for allow rules.
    pub fn denies(self, raw: &str, shape: &CommandShape, home: Option<&str>) -> bool {
        match self {
            SafetyRule::DenyPrivilegeEscalation => {
                PRIVILEGE_RE.is_match(raw)
                    || ADMIN_PRIVILEGES_RE.is_match(raw)
                    || shape.segments.iter().any(|s| s.program() == Some("su"))
            }
            SafetyRule::DenyDiskFormat => shape.segments.iter().any(formats_disk),
            SafetyRule::DenyRootPath => normalized_targets(shape, home)
                .iter()
                .any(|t| is_root_target(t)),
            SafetyRule::DenyCriticalPath => normalized_targets(shape, home)
                .iter()
                .any(|t| touches_critical_path(t)),
            SafetyRule::DenyParentTraversal => normalized_targets(shape, home)
                .iter()
                .any(|t| has_parent_component(t)),
            SafetyRule::DenyWorldWritable => shape.segments.iter().any(makes_world_writable),
            SafetyRule::DenyRootOwnership => shape.segments.iter().any(grants_privileged_owner),
            _ => false,
        }
    }
}

impl fmt::Display for SafetyRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Mirrors the serde names so log lines and JSON agree.
        let name = match self {
            SafetyRule::AllowSnapshotThinning => "allow_snapshot_thinning",
            SafetyRule::AllowSnapshotDeletion => "allow_snapshot_deletion",
            SafetyRule::AllowCacheSubtree => "allow_cache_subtree",
            SafetyRule::AllowLogSubtree => "allow_log_subtree",
            SafetyRule::AllowTrashSubtree => "allow_trash_subtree",
            SafetyRule::AllowDownloadsSubtree => "allow_downloads_subtree",
            SafetyRule::AllowOpenFolder => "allow_open_folder",
            SafetyRule::AllowEcho => "allow_echo",
            SafetyRule::DenyRootPath => "deny_root_path",
            SafetyRule::DenyCriticalPath => "deny_critical_path",
            SafetyRule::DenyPrivilegeEscalation => "deny_privilege_escalation",
            SafetyRule::DenyWorldWritable => "deny_world_writable",
            SafetyRule::DenyRootOwnership => "deny_root_ownership",
            SafetyRule::DenyDiskFormat => "deny_disk_format",
            SafetyRule::DenyParentTraversal => "deny_parent_traversal",
        };
        f.write_str(name)
    }
}

/// Whether a segment may be approved at all by an allow rule.
///
/// Substitutions, file redirections and `xargs` can change what a command
/// does without changing its visible shape. Under `xargs` the real targets
/// arrive on stdin and are unknown here.
pub(crate) fn segment_is_plain(segment: &Segment) -> bool {
    !segment.has_substitution
        && !segment.reads_input
        && !segment.runs_under_xargs()
        && segment.writes_only_to_null()
}

fn normalized_targets(shape: &CommandShape, home: Option<&str>) -> Vec<String> {
    shape
        .mutation_targets()
        .iter()
        .map(|t| normalize_path(t, home))
        .collect()
}

// =============================================================================
// Allow rules
// =============================================================================

/// `tmutil thinlocalsnapshots <mount> [<bytes> [<urgency 1-4>]]`
fn allows_thinning(segment: &Segment) -> bool {
    if segment.program() != Some("tmutil") {
        return false;
    }
    let args = segment.args();
    let Some((verb, rest)) = args.split_first() else {
        return false;
    };
    if verb != "thinlocalsnapshots" || rest.is_empty() || rest.len() > 3 {
        return false;
    }
    let mount = &rest[0];
    if !mount.starts_with('/') || has_parent_component(mount) || is_glob(mount) {
        return false;
    }
    if let Some(bytes) = rest.get(1)
        && (bytes.is_empty() || !bytes.chars().all(|c| c.is_ascii_digit()))
    {
        return false;
    }
    match rest.get(2) {
        Some(urgency) => matches!(urgency.as_str(), "1" | "2" | "3" | "4"),
        None => true,
    }
}

/// `tmutil deletelocalsnapshots <YYYY-MM-DD-HHMMSS>`
fn allows_snapshot_deletion(segment: &Segment) -> bool {
    segment.program() == Some("tmutil")
        && matches!(
            segment.args(),
            [verb, date] if verb == "deletelocalsnapshots" && SNAPSHOT_DATE_RE.is_match(date)
        )
}

/// `rm` or `find ... -delete` confined to one of `bases`.
fn allows_subtree_delete(segment: &Segment, bases: &[&str], home: Option<&str>) -> bool {
    match segment.program() {
        Some("rm") => {
            let flags_ok = segment.flags().iter().all(|f| {
                SAFE_RM_LONG_FLAGS.contains(f)
                    || (!f.starts_with("--") && f[1..].chars().all(|c| SAFE_RM_FLAGS.contains(c)))
            });
            let targets = segment.positional_args();
            flags_ok
                && !targets.is_empty()
                && targets
                    .iter()
                    .all(|t| strictly_inside_any(&normalize_path(t, home), bases))
        }
        Some("find") => {
            let args = segment.args();
            let deletes = args.iter().any(|a| a == "-delete");
            let execs = args.iter().any(|a| a.starts_with("-exec") || a == "-ok");
            let filtered = args.iter().any(|a| FIND_FILTERS.contains(&a.as_str()));
            let roots = segment.deletion_targets();
            deletes
                && !execs
                && filtered
                && !roots.is_empty()
                && roots
                    .iter()
                    .all(|r| inside_or_at_any(&normalize_path(r, home), bases))
        }
        _ => false,
    }
}

/// `open [-R] <dir>` where the directory is one of the cleanup bases or
/// inside one, and is not something `open` would launch.
fn allows_open_folder(segment: &Segment, home: Option<&str>) -> bool {
    if segment.program() != Some("open") || !segment.flags().iter().all(|f| *f == "-R") {
        return false;
    }
    let targets = segment.positional_args();
    let [target] = targets.as_slice() else {
        return false;
    };
    let path = normalize_path(target, home);
    let bases = CACHE_BASES
        .iter()
        .chain(LOG_BASES)
        .chain(TRASH_BASES)
        .chain(DOWNLOADS_BASES)
        .copied()
        .collect::<Vec<_>>();
    inside_or_at_any(&path, &bases) && !is_launchable(&path)
}

fn is_launchable(path: &str) -> bool {
    let name = path.rsplit('/').next().unwrap_or(path);
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => LAUNCHABLE_EXTENSIONS
            .iter()
            .any(|l| l.eq_ignore_ascii_case(ext)),
        _ => false,
    }
}

fn strictly_inside_any(path: &str, bases: &[&str]) -> bool {
    !has_parent_component(path)
        && bases.iter().any(|base| {
            path.strip_prefix(base)
                .is_some_and(|rest| rest.len() > 1 && rest.starts_with('/'))
        })
}

fn inside_or_at_any(path: &str, bases: &[&str]) -> bool {
    !has_parent_component(path)
        && !is_glob(path)
        && bases
            .iter()
            .any(|base| path == *base || strictly_inside_any(path, &[base]))
}

// =============================================================================
// Deny rules
// =============================================================================

fn is_root_target(target: &str) -> bool {
    if ROOT_TARGETS.contains(&target) {
        return true;
    }
    // A top-level directory such as `/tmp`, `/Users` or `/home`.
    match target.strip_prefix('/') {
        Some(rest) => !rest.is_empty() && !rest.contains('/'),
        None => false,
    }
}

fn touches_critical_path(target: &str) -> bool {
    let prefix = literal_prefix(target);
    if prefix.is_empty() {
        return false;
    }
    CRITICAL_SYSTEM_PATHS
        .iter()
        .chain(CRITICAL_HOME_PATHS.iter())
        .any(|critical| {
            let inside = prefix == *critical
                || prefix
                    .strip_prefix(critical)
                    .is_some_and(|rest| rest.starts_with('/'));
            // Deleting an ancestor deletes the critical path too.
            let ancestor = prefix == "/"
                || critical
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with('/'));
            inside || ancestor
        })
}

fn formats_disk(segment: &Segment) -> bool {
    let raw_device = |t: &str| {
        ["/dev/disk", "/dev/rdisk", "/dev/sd", "/dev/hd", "/dev/nvme", "/dev/mmcblk"]
            .iter()
            .any(|d| t.starts_with(d))
    };
    if segment.output_targets.iter().any(|t| raw_device(t)) {
        return true;
    }

    let Some(program) = segment.program() else {
        return false;
    };
    let args = segment.args();
    match program {
        "dd" => args
            .iter()
            .any(|a| a.strip_prefix("of=").is_some_and(|t| t.starts_with("/dev/"))),
        "fdisk" | "gdisk" | "sfdisk" | "parted" | "wipefs" | "gpt" | "asr" => true,
        p if p.starts_with("mkfs") || p.starts_with("newfs") || p.starts_with("mke2fs") => true,
        "diskutil" => {
            let verbs: Vec<String> = positional_lower(args);
            let destructive = |v: &str| {
                ["erase", "zero", "random", "secure", "reformat", "partition", "delete"]
                    .iter()
                    .any(|prefix| v.starts_with(prefix))
            };
            match verbs.first().map(String::as_str) {
                Some("apfs") | Some("cs") | Some("ar") => {
                    verbs.get(1).is_some_and(|v| destructive(v))
                }
                Some(verb) => destructive(verb),
                None => false,
            }
        }
        _ => false,
    }
}

fn makes_world_writable(segment: &Segment) -> bool {
    if segment.program() != Some("chmod") {
        return false;
    }
    let Some(mode) = segment.positional_args().first().copied() else {
        return false;
    };

    if NUMERIC_MODE_RE.is_match(mode) {
        return mode
            .chars()
            .last()
            .and_then(|c| c.to_digit(8))
            .is_some_and(|other| other & 0o2 != 0);
    }

    mode.split(',').any(|clause| {
        SYMBOLIC_CLAUSE_RE.captures(clause).is_some_and(|caps| {
            let who = &caps[1];
            let op = &caps[2];
            let perms = &caps[3];
            (who.is_empty() || who.contains('a') || who.contains('o'))
                && op != "-"
                && perms.contains('w')
        })
    })
}

fn grants_privileged_owner(segment: &Segment) -> bool {
    let Some(program) = segment.program() else {
        return false;
    };
    let Some(spec) = segment.positional_args().first().copied() else {
        return false;
    };
    let privileged = |name: &str| PRIVILEGED_OWNERS.contains(&name.to_ascii_lowercase().as_str());
    match program {
        "chown" => spec.split([':', '.']).any(privileged),
        "chgrp" => privileged(spec),
        _ => false,
    }
}

fn positional_lower(args: &[String]) -> Vec<String> {
    args.iter()
        .filter(|a| !a.starts_with('-'))
        .map(|a| a.to_ascii_lowercase())
        .collect()
}
