//! Unix process tree operations

use crate::error::{Error, Result};
use crate::platform::traits::{ProcessTreeOps, Termination};
use nix::errno::Errno;
use nix::sys::signal::{kill, Signal as NixSignal};
use nix::unistd::Pid;
use std::collections::HashSet;
#[cfg(target_os = "linux")]
use std::fs;

pub struct UnixProcessTree;

impl UnixProcessTree {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessTreeOps for UnixProcessTree {
    fn get_child_pids(&self, parent_pid: u32) -> Result<Vec<u32>> {
        #[cfg(target_os = "linux")]
        {
            self.get_child_pids_linux(parent_pid)
        }

        #[cfg(not(target_os = "linux"))]
        {
            self.get_child_pids_ps(parent_pid)
        }
    }

    fn signal(&self, pid: u32, termination: Termination) -> Result<()> {
        let signal = match termination {
            Termination::Graceful => NixSignal::SIGTERM,
            Termination::Forced => NixSignal::SIGKILL,
        };

        match kill(Pid::from_raw(pid as i32), signal) {
            // Already gone
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(Error::SignalSendFailed {
                signal: signal.as_str().to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn terminate_tree(&self, root_pid: u32, termination: Termination) -> Result<()> {
        let descendants = self.get_all_descendant_pids(root_pid);
        debug!(
            "Terminating process {} and {} descendant(s) ({:?})",
            root_pid,
            descendants.len(),
            termination
        );

        // Deepest first so nothing gets re-parented mid-walk
        for pid in descendants.iter().rev() {
            if let Err(e) = self.signal(*pid, termination) {
                warn!("Failed to signal descendant {}: {}", pid, e);
            }
        }

        self.signal(root_pid, termination)
    }
}

impl UnixProcessTree {
    /// Get child PIDs on Linux using /proc filesystem
    #[cfg(target_os = "linux")]
    fn get_child_pids_linux(&self, parent_pid: u32) -> Result<Vec<u32>> {
        let children = fs::read_dir("/proc")?
            .flatten()
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| name.parse::<u32>().ok())
            .filter(|pid| {
                fs::read_to_string(format!("/proc/{}/stat", pid))
                    .ok()
                    .and_then(|stat| parse_ppid_from_stat(&stat))
                    == Some(parent_pid)
            })
            .collect();

        Ok(children)
    }

    /// Get child PIDs from `ps` where /proc is unavailable
    #[cfg(not(target_os = "linux"))]
    fn get_child_pids_ps(&self, parent_pid: u32) -> Result<Vec<u32>> {
        use std::process::Command;

        let output = Command::new("ps").args(["-eo", "pid,ppid"]).output()?;

        if !output.status.success() {
            return Err(Error::Other("ps command failed".to_string()));
        }

        let children = String::from_utf8_lossy(&output.stdout)
            .lines()
            .skip(1)
            .filter_map(|line| {
                let mut parts = line.split_whitespace();
                let pid = parts.next()?.parse::<u32>().ok()?;
                let ppid = parts.next()?.parse::<u32>().ok()?;
                (ppid == parent_pid).then_some(pid)
            })
            .collect();

        Ok(children)
    }

    /// Depth-first walk of every descendant, grandchildren included
    fn get_all_descendant_pids(&self, root_pid: u32) -> Vec<u32> {
        let mut descendants = Vec::new();
        let mut to_check = vec![root_pid];
        let mut checked = HashSet::new();

        while let Some(pid) = to_check.pop() {
            if !checked.insert(pid) {
                continue;
            }

            if let Ok(children) = self.get_child_pids(pid) {
                for child in children {
                    descendants.push(child);
                    to_check.push(child);
                }
            }
        }

        descendants
    }
}

/// Parse parent PID from /proc/[pid]/stat content
///
/// Format is `pid (comm) state ppid ...`; `comm` may itself contain spaces
/// and parentheses, so parsing starts after the last `)`.
#[cfg(target_os = "linux")]
fn parse_ppid_from_stat(stat_content: &str) -> Option<u32> {
    let close_paren = stat_content.rfind(')')?;
    stat_content[close_paren + 1..]
        .split_whitespace()
        .nth(1)?
        .parse()
        .ok()
}
