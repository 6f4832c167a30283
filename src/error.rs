use nix::errno::Errno;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Result of running an injector against one candidate descriptor.
///
/// `Unsupported` may only be reported when the very first operation on the
/// descriptor failed; once anything has reached the terminal, failures are
/// `Error`s instead, because moving on would leave partial injected input
/// behind on the victim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Done,
    Unsupported,
}

#[derive(Debug, Error)]
pub enum Error {
    /// A syscall failed after the point of no return; `op` names the failing
    /// operation the way perror would be prefixed.
    #[error("{op}: {errno}")]
    Sys { op: &'static str, errno: Errno },

    /// Paste mode reached a descriptor that is not a legacy virtual console.
    /// The selection ioctls act on the globally active console, so running
    /// them from anywhere else would paste into the wrong terminal.
    #[error("-L only works on a virtual console; run it on /dev/ttyN")]
    ConsoleRequired,
}

impl Error {
    pub fn sys(op: &'static str, errno: Errno) -> Self {
        Error::Sys { op, errno }
    }
}
