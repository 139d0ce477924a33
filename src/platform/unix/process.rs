//! Unix process tree operations
//!
//! Children are spawned as process-group leaders, so the group is killed
//! with one `killpg`. Descendants that left the group (`setsid`, daemons)
//! are found through the parent-pid table and killed one by one.

use crate::error::{Error, Result};
use crate::platform::traits::ProcessTreeOps;
use nix::errno::Errno;
use nix::sys::signal::{kill, killpg, Signal as NixSignal};
use nix::unistd::Pid;
#[cfg(not(target_os = "macos"))]
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

        #[cfg(target_os = "macos")]
        {
            self.get_child_pids_macos(parent_pid)
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos")))]
        {
            self.get_child_pids_linux(parent_pid)
        }
    }

    fn kill_process_tree(&self, root_pid: u32) -> Result<()> {
        // Snapshot before killing: once the root dies its children are
        // reparented and can no longer be found by parent pid
        let descendants = self.get_all_descendant_pids(root_pid);
        let root = Pid::from_raw(root_pid as i32);

        let _ = killpg(root, NixSignal::SIGKILL);

        for pid in descendants.iter().rev() {
            let _ = kill(Pid::from_raw(*pid as i32), NixSignal::SIGKILL);
        }

        match kill(root, NixSignal::SIGKILL) {
            Ok(()) | Err(Errno::ESRCH) => Ok(()),
            Err(e) => Err(Error::ProcessTreeKillFailed {
                pid: root_pid,
                reason: e.to_string(),
            }),
        }
    }
}

impl UnixProcessTree {
    /// Get child PIDs using the /proc filesystem
    #[cfg(not(target_os = "macos"))]
    fn get_child_pids_linux(&self, parent_pid: u32) -> Result<Vec<u32>> {
        let mut children = Vec::new();
        let proc_dir = fs::read_dir("/proc").map_err(Error::Io)?;

        for entry in proc_dir.flatten() {
            let Ok(file_name) = entry.file_name().into_string() else {
                continue;
            };
            let Ok(pid) = file_name.parse::<u32>() else {
                continue;
            };

            let stat_path = format!("/proc/{}/stat", pid);
            if let Ok(stat_content) = fs::read_to_string(&stat_path) {
                if parse_ppid_from_stat(&stat_content) == Some(parent_pid) {
                    children.push(pid);
                }
            }
        }

        Ok(children)
    }

    /// Get child PIDs on macOS using ps command
    #[cfg(target_os = "macos")]
    fn get_child_pids_macos(&self, parent_pid: u32) -> Result<Vec<u32>> {
        use std::process::Command;

        let output = Command::new("ps").args(["-eo", "pid,ppid"]).output()?;

        if !output.status.success() {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "ps command failed",
            )));
        }

        let output_str = String::from_utf8_lossy(&output.stdout);
        Ok(parse_ps_children(&output_str, parent_pid))
    }
}

/// Parse parent PID from /proc/[pid]/stat content
///
/// Format: `pid (comm) state ppid ...`, where comm may contain spaces and
/// parentheses, so fields are counted from the last `)`.
#[cfg_attr(target_os = "macos", allow(dead_code))]
fn parse_ppid_from_stat(stat_content: &str) -> Option<u32> {
    let close_paren = stat_content.rfind(')')?;
    let mut fields = stat_content[close_paren + 1..].split_whitespace();
    fields.next()?;
    fields.next()?.parse::<u32>().ok()
}

/// Children of `parent_pid` in `ps -eo pid,ppid` output (header skipped)
#[cfg_attr(not(target_os = "macos"), allow(dead_code))]
fn parse_ps_children(output: &str, parent_pid: u32) -> Vec<u32> {
    output
        .lines()
        .skip(1)
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let pid = parts.next()?.parse::<u32>().ok()?;
            let ppid = parts.next()?.parse::<u32>().ok()?;
            (ppid == parent_pid).then_some(pid)
        })
        .collect()
}
