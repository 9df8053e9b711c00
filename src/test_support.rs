//! Shared fixtures for unit tests.

use crate::disk::DiskProbe;
use crate::error::{ReclaimError, Result};
use crate::exec::{CommandExecutor, ExecutionError};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Scripted stand-in for the host: a command executor and a disk probe
/// sharing one simulated "used bytes" counter.
///
/// - Unscripted commands succeed with empty output.
/// - `frees(cmd, bytes)` makes a successful run of `cmd` lower usage.
/// - `df` reports usage as raw bytes so accounting is exact.
#[derive(Default)]
pub(crate) struct FakeHost {
    state: Mutex<HostState>,
}

#[derive(Default)]
struct HostState {
    responses: HashMap<String, String>,
    failures: HashSet<String>,
    effects: HashMap<String, u64>,
    calls: Vec<String>,
    used_bytes: u64,
    total_bytes: u64,
    probe_failures_after: Option<usize>,
    probe_calls: usize,
    probe_override: Option<(usize, String)>,
    grow_after_each_probe: u64,
}

impl FakeHost {
    pub(crate) fn new() -> Self {
        Self::default().with_usage(100 * 1024 * 1024 * 1024, 500 * 1024 * 1024 * 1024)
    }

    pub(crate) fn with_usage(self, used_bytes: u64, total_bytes: u64) -> Self {
        {
            let mut s = self.lock();
            s.used_bytes = used_bytes;
            s.total_bytes = total_bytes;
        }
        self
    }

    pub(crate) fn respond(self, command: &str, output: &str) -> Self {
        self.lock()
            .responses
            .insert(command.to_string(), output.to_string());
        self
    }

    pub(crate) fn fail(self, command: &str) -> Self {
        self.lock().failures.insert(command.to_string());
        self
    }

    pub(crate) fn frees(self, command: &str, bytes: u64) -> Self {
        self.lock().effects.insert(command.to_string(), bytes);
        self
    }

    /// Fail every probe after the first `n` succeed.
    pub(crate) fn probe_fails_after(self, n: usize) -> Self {
        self.lock().probe_failures_after = Some(n);
        self
    }

    /// Return this text from every probe instead of the simulated report.
    pub(crate) fn probe_returns(self, report: &str) -> Self {
        self.probe_returns_after(0, report)
    }

    /// Simulated reports for the first `n` probes, then this text.
    pub(crate) fn probe_returns_after(self, n: usize, report: &str) -> Self {
        self.lock().probe_override = Some((n, report.to_string()));
        self
    }

    /// Background writes: usage grows by `bytes` after every probe.
    pub(crate) fn grows_between_probes(self, bytes: u64) -> Self {
        self.lock().grow_after_each_probe = bytes;
        self
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HostState> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }
}

impl CommandExecutor for FakeHost {
    fn execute(&self, command: &str) -> std::result::Result<String, ExecutionError> {
        let mut s = self.lock();
        s.calls.push(command.to_string());

        if s.failures.contains(command) {
            return Err(ExecutionError::NonZeroExit {
                command: command.to_string(),
                code: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }

        if let Some(bytes) = s.effects.get(command).copied() {
            s.used_bytes = s.used_bytes.saturating_sub(bytes);
        }

        Ok(s.responses.get(command).cloned().unwrap_or_default())
    }
}

impl DiskProbe for FakeHost {
    fn usage_report(&self) -> Result<String> {
        let mut s = self.lock();
        s.probe_calls += 1;
        if let Some(limit) = s.probe_failures_after
            && s.probe_calls > limit
        {
            return Err(ReclaimError::MeasurementParse(
                "scripted probe failure".to_string(),
            ));
        }
        if let Some((after, report)) = &s.probe_override
            && s.probe_calls > *after
        {
            return Ok(report.clone());
        }

        let used = s.used_bytes;
        let total = s.total_bytes;
        let available = total.saturating_sub(used);
        let pct = if total == 0 { 0 } else { used * 100 / total };
        s.used_bytes += s.grow_after_each_probe;

        Ok(format!(
            "Filesystem Size Used Avail Use% Mounted on\n/dev/fake {}B {}B {}B {}% /\n",
            total, used, available, pct
        ))
    }
}
