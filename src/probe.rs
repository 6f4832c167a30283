use std::os::unix::io::RawFd;

use log::debug;
use nix::fcntl::{self, OFlag};
use nix::sys::stat::Mode;
use nix::unistd;

use crate::error::{Error, Outcome, Result};

/// Slot the `/dev/tty` fallback is pinned to, first number past stderr.
pub const FALLBACK_FD: RawFd = 3;

/// Find a descriptor the injector works on: stdin, stdout, stderr in that
/// order, then `/dev/tty` opened fresh with the mode's access rights.
///
/// The injector runs in full on each candidate; its first operation doubles
/// as the capability check, so a candidate that was never a terminal fails
/// cheaply and silently. The fallback descriptor is deliberately never
/// closed; process exit reclaims it.
pub fn probe<F>(inject: F, flags: OFlag) -> Result<()>
where
    F: FnMut(RawFd) -> Result<Outcome>,
{
    probe_with(inject, || open_fallback(flags))
}

fn open_fallback(flags: OFlag) -> Result<RawFd> {
    let tty = fcntl::open("/dev/tty", flags, Mode::empty())
        .map_err(|errno| Error::sys("/dev/tty", errno))?;
    unistd::dup2(tty, FALLBACK_FD).map_err(|errno| Error::sys("dup2", errno))
}

fn probe_with<F, G>(mut inject: F, fallback: G) -> Result<()>
where
    F: FnMut(RawFd) -> Result<Outcome>,
    G: FnOnce() -> Result<RawFd>,
{
    for fd in 0..FALLBACK_FD {
        match inject(fd)? {
            Outcome::Done => return Ok(()),
            Outcome::Unsupported => debug!("fd {}: unsupported, trying next candidate", fd),
        }
    }
    let fd = fallback()?;
    debug!("falling back to /dev/tty on fd {}", fd);
    match inject(fd)? {
        Outcome::Done => Ok(()),
        // Injectors escalate first-operation failures on the fallback fd
        // themselves; a well-behaved one never lands here.
        Outcome::Unsupported => Err(Error::sys("/dev/tty", nix::errno::Errno::ENOTTY)),
    }
}
