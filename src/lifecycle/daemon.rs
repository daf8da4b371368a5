//! Daemonization
//!
//! Classic double fork: the first child becomes a session leader, the
//! second child can never reacquire a controlling terminal.

use std::fs::OpenOptions;
use std::io;
use std::os::unix::io::AsRawFd;

use crate::error::{PacketLogError, Result};

/// Detach the current process from its terminal
///
/// Must run after listen succeeds, so bind errors still reach the user, and
/// before the first accept. Both intermediate parents exit with status 0
/// without running cleanup; only the final child returns.
pub fn daemonize() -> Result<()> {
    fork_and_exit_parent("fork")?;

    // SAFETY: plain syscall, no memory is touched.
    if unsafe { libc::setsid() } < 0 {
        return Err(PacketLogError::Os {
            op: "setsid",
            source: io::Error::last_os_error(),
        });
    }

    fork_and_exit_parent("fork2")?;

    // SAFETY: plain syscall.
    unsafe { libc::umask(0) };
    std::env::set_current_dir("/").map_err(PacketLogError::os("chdir"))?;

    redirect_std_streams()?;

    tracing::debug!(pid = std::process::id(), "Daemonized");
    Ok(())
}

fn fork_and_exit_parent(op: &'static str) -> Result<()> {
    // SAFETY: the process is single-threaded at this point, so the child
    // inherits a consistent address space.
    match unsafe { libc::fork() } {
        -1 => Err(PacketLogError::Os {
            op,
            source: io::Error::last_os_error(),
        }),
        0 => Ok(()),
        _ => std::process::exit(0),
    }
}

/// Point stdin, stdout and stderr at /dev/null
fn redirect_std_streams() -> Result<()> {
    let null = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(PacketLogError::os("open /dev/null"))?;

    for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        // SAFETY: both descriptors are valid for the duration of the call.
        if unsafe { libc::dup2(null.as_raw_fd(), fd) } < 0 {
            return Err(PacketLogError::Os {
                op: "dup2",
                source: io::Error::last_os_error(),
            });
        }
    }
    Ok(())
}
