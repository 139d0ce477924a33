//! Platform-specific operation traits

use crate::error::Result;
use std::collections::HashSet;

/// Platform-specific process tree operations
pub trait ProcessTreeOps: Send + Sync {
    /// Get all child process IDs of a given parent PID
    fn get_child_pids(&self, parent_pid: u32) -> Result<Vec<u32>>;

    /// Hard-kill a process and all its descendants
    fn kill_process_tree(&self, root_pid: u32) -> Result<()>;

    /// Recursively get all descendant PIDs (children, grandchildren, etc.),
    /// parents before their children
    fn get_all_descendant_pids(&self, root_pid: u32) -> Vec<u32> {
        let mut all_descendants = Vec::new();
        let mut to_check = vec![root_pid];
        let mut checked = HashSet::new();

        while let Some(pid) = to_check.pop() {
            if !checked.insert(pid) {
                continue;
            }

            if let Ok(children) = self.get_child_pids(pid) {
                for child in children {
                    all_descendants.push(child);
                    to_check.push(child);
                }
            }
        }

        all_descendants
    }
}
