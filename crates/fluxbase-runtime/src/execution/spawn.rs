use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

/// Builds the child command: wrapped-source path as the sole argument,
/// the assembled environment, cwd pinned to the per-execution scratch
/// directory, and (on unix) an address-space rlimit capping memory to
/// `memory_limit_mb` (spec §4.E step 5, §6 "Resource caps").
pub fn build_command(
    interpreter: &str,
    script_path: &Path,
    cwd: &Path,
    env: &[(String, String)],
    memory_limit_mb: u32,
) -> Command {
    let mut cmd = Command::new(interpreter);
    cmd.arg(script_path);
    cmd.current_dir(cwd);
    cmd.env_clear();
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.stdin(Stdio::null());
    cmd.stdout(Stdio::piped());
    cmd.stderr(Stdio::piped());

    #[cfg(unix)]
    {
        let bytes = (memory_limit_mb as u64) * 1024 * 1024;
        unsafe {
            cmd.pre_exec(move || {
                rlimit::setrlimit(rlimit::Resource::AS, bytes, bytes)?;
                Ok(())
            });
        }
    }
    #[cfg(not(unix))]
    {
        let _ = memory_limit_mb;
    }

    cmd
}

/// Sends a termination signal distinct from a hard kill, so the child
/// gets a chance to flush before the final `SIGKILL` (spec §5
/// "terminate, then kill after a further grace").
#[cfg(unix)]
pub fn send_sigterm(pid: u32) {
    unsafe {
        libc::kill(pid as libc::pid_t, libc::SIGTERM);
    }
}

#[cfg(not(unix))]
pub fn send_sigterm(_pid: u32) {}
