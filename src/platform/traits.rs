//! Platform-specific operation traits
//!
//! These traits define the interface for platform-specific operations,
//! allowing for clean abstraction and easier testing.

use crate::error::Result;
use std::path::PathBuf;

/// How hard to ask a process to go away
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// SIGTERM, lets the process clean up
    Graceful,
    /// SIGKILL
    Forced,
}

/// Platform-specific process tree operations
pub trait ProcessTreeOps: Send + Sync {
    /// Get all direct child process IDs of a given parent PID
    fn get_child_pids(&self, parent_pid: u32) -> Result<Vec<u32>>;

    /// Signal a single process
    fn signal(&self, pid: u32, termination: Termination) -> Result<()>;

    /// Terminate a process and all its descendants, children first
    fn terminate_tree(&self, root_pid: u32, termination: Termination) -> Result<()>;
}

/// Platform-specific path operations
pub trait PathOps: Send + Sync {
    /// Get configuration directory
    fn config_dir(&self) -> Result<PathBuf>;
}
