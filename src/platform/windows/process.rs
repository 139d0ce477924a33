//! Windows process tree operations

use crate::error::{Error, Result};
use crate::platform::traits::ProcessTreeOps;

pub struct WindowsProcessTree;

impl WindowsProcessTree {
    pub fn new() -> Self {
        Self
    }
}

impl ProcessTreeOps for WindowsProcessTree {
    fn get_child_pids(&self, parent_pid: u32) -> Result<Vec<u32>> {
        use windows_sys::Win32::Foundation::{CloseHandle, GetLastError, INVALID_HANDLE_VALUE};
        use windows_sys::Win32::System::Diagnostics::ToolHelp::{
            CreateToolhelp32Snapshot, Process32FirstW, Process32NextW, PROCESSENTRY32W,
            TH32CS_SNAPPROCESS,
        };

        let mut children = Vec::new();

        unsafe {
            let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0);
            if snapshot == INVALID_HANDLE_VALUE {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("CreateToolhelp32Snapshot failed: {}", GetLastError()),
                )));
            }

            let mut entry: PROCESSENTRY32W = std::mem::zeroed();
            entry.dwSize = std::mem::size_of::<PROCESSENTRY32W>() as u32;

            if Process32FirstW(snapshot, &mut entry) != 0 {
                loop {
                    if entry.th32ParentProcessID == parent_pid {
                        children.push(entry.th32ProcessID);
                    }

                    if Process32NextW(snapshot, &mut entry) == 0 {
                        break;
                    }
                }
            }

            CloseHandle(snapshot);
        }

        Ok(children)
    }

    fn kill_process_tree(&self, root_pid: u32) -> Result<()> {
        // Snapshot first: parent pids of orphans are never updated on Windows
        // but can be reused once the root is gone
        let descendants = self.get_all_descendant_pids(root_pid);

        for pid in descendants.iter().rev() {
            let _ = terminate_pid(*pid);
        }

        terminate_pid(root_pid).map_err(|reason| Error::ProcessTreeKillFailed {
            pid: root_pid,
            reason,
        })
    }
}

/// TerminateProcess by pid. A pid that cannot be opened is treated as
/// already gone.
fn terminate_pid(pid: u32) -> std::result::Result<(), String> {
    use windows_sys::Win32::Foundation::{CloseHandle, GetLastError};
    use windows_sys::Win32::System::Threading::{OpenProcess, TerminateProcess, PROCESS_TERMINATE};

    unsafe {
        let handle = OpenProcess(PROCESS_TERMINATE, 0, pid);
        if handle.is_null() {
            return Ok(());
        }

        let terminated = TerminateProcess(handle, 1);
        let error = GetLastError();
        CloseHandle(handle);

        if terminated == 0 {
            return Err(format!("TerminateProcess failed: {}", error));
        }
    }

    Ok(())
}
