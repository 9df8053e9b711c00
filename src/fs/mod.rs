//! Filesystem helpers for reclaim.
//!
//! Config and plan files are rewritten through a temp file so an interrupted
//! save never leaves a half-written whitelist behind.

pub mod atomic;

pub use atomic::atomic_write_file;
