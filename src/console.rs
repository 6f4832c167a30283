use std::os::unix::io::RawFd;

use libc::c_uint;
use nix::ioctl_read_bad;
use nix::sys::stat::{self, fstat};

use crate::error::{Error, Result};

/// Major of the legacy virtual console family (`/dev/ttyN`), linux/major.h.
const TTY_MAJOR: u64 = 4;
/// Major of `/dev/tty`, the controlling-terminal alias.
const TTYAUX_MAJOR: u64 = 5;
/// Highest console number the kernel supports, linux/vt.h. Minors above it
/// on TTY_MAJOR are serial lines, not consoles.
const MAX_NR_CONSOLES: u64 = 63;

ioctl_read_bad!(tiocgdev, libc::TIOCGDEV, c_uint);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TtyClass {
    /// A legacy virtual console; 0 means "the currently active one".
    Console(u16),
    /// `/dev/tty`, resolves to whatever terminal the process controls.
    CurrentAlias,
    /// Pseudo-terminal, serial line, or not a terminal device at all.
    Other,
}

fn classify(major: u64, minor: u64) -> TtyClass {
    if major == TTY_MAJOR && minor <= MAX_NR_CONSOLES {
        TtyClass::Console(minor as u16)
    } else if major == TTYAUX_MAJOR && minor == 0 {
        TtyClass::CurrentAlias
    } else {
        TtyClass::Other
    }
}

/// Decide whether `fd` refers to a legacy virtual console and which one.
///
/// `/dev/tty` stats as (5, 0) no matter what it is attached to, so that case
/// is resolved to the real underlying device with TIOCGDEV and the resolved
/// (major, minor) pair is classified instead. The resolution is not repeated:
/// a device that resolves to the alias again is not a console.
pub fn console_number(fd: RawFd) -> Result<Option<u16>> {
    let st = fstat(fd).map_err(|errno| Error::sys("fstat", errno))?;
    if st.st_mode & libc::S_IFMT != libc::S_IFCHR {
        return Ok(None);
    }
    match classify(stat::major(st.st_rdev), stat::minor(st.st_rdev)) {
        TtyClass::Console(n) => Ok(Some(n)),
        TtyClass::CurrentAlias => {
            let mut dev: c_uint = 0;
            unsafe { tiocgdev(fd, &mut dev) }.map_err(|errno| Error::sys("TIOCGDEV", errno))?;
            let dev = libc::dev_t::from(dev);
            match classify(stat::major(dev), stat::minor(dev)) {
                TtyClass::Console(n) => Ok(Some(n)),
                _ => Ok(None),
            }
        }
        TtyClass::Other => Ok(None),
    }
}
