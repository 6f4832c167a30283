//! Paste-mode delivery. The real mechanism only exists on the Linux virtual
//! console, so the entry point has two build-selected bodies with one
//! signature: the console implementation on Linux, an unconditional
//! "unsupported" everywhere else.

#[cfg(target_os = "linux")]
pub use self::linux::run;
#[cfg(not(target_os = "linux"))]
pub use self::unsupported::run;

#[cfg(target_os = "linux")]
mod linux {
    use std::os::unix::io::RawFd;
    use std::ptr;

    use nix::errno::Errno;
    use nix::fcntl::OFlag;
    use nix::ioctl_read_bad;
    use nix::unistd;

    use crate::console;
    use crate::error::{Error, Outcome, Result};
    use crate::probe;

    // TIOCLINUX subcodes and selection modes, linux/tiocl.h.
    const TIOCL_SETSEL: u8 = 2;
    const TIOCL_PASTESEL: u8 = 3;
    const TIOCL_GETMOUSEREPORTING: u8 = 7;
    const TIOCL_SELLINE: u16 = 2;

    ioctl_read_bad!(tioclinux, libc::TIOCLINUX, u8);

    #[repr(C)]
    struct TioclSelection {
        xs: u16,
        ys: u16,
        xe: u16,
        ye: u16,
        sel_mode: u16,
    }

    /// TIOCL_SETSEL argument: the kernel reads the subcode at the passed
    /// pointer and the selection struct immediately after it, so the layout
    /// must be packed.
    #[repr(C, packed)]
    struct SelectionRequest {
        subcode: u8,
        sel: TioclSelection,
    }

    /// The console operations the paste sequence is built on. The one real
    /// implementation wraps the TIOCLINUX ioctls on a descriptor; tests
    /// substitute a recording fake.
    trait PasteTarget {
        fn probe(&mut self) -> nix::Result<()>;
        fn emit(&mut self, bytes: &[u8]) -> Result<()>;
        fn console_number(&mut self) -> Result<Option<u16>>;
        fn select_line_one(&mut self) -> nix::Result<()>;
        fn paste_selection(&mut self) -> nix::Result<()>;
    }

    struct Vc {
        fd: RawFd,
    }

    impl PasteTarget for Vc {
        fn probe(&mut self) -> nix::Result<()> {
            // Cheapest TIOCLINUX query that changes nothing.
            let mut sub = TIOCL_GETMOUSEREPORTING;
            unsafe { tioclinux(self.fd, &mut sub) }.map(drop)
        }

        fn emit(&mut self, bytes: &[u8]) -> Result<()> {
            let mut rest = bytes;
            while !rest.is_empty() {
                match unistd::write(self.fd, rest) {
                    Ok(0) => return Err(Error::sys("write", Errno::EIO)),
                    Ok(n) => rest = &rest[n..],
                    Err(errno) => return Err(Error::sys("write", errno)),
                }
            }
            Ok(())
        }

        fn console_number(&mut self) -> Result<Option<u16>> {
            console::console_number(self.fd)
        }

        fn select_line_one(&mut self) -> nix::Result<()> {
            let mut request = SelectionRequest {
                subcode: TIOCL_SETSEL,
                sel: TioclSelection {
                    xs: 1,
                    ys: 1,
                    xe: 1,
                    ye: 1,
                    sel_mode: TIOCL_SELLINE,
                },
            };
            unsafe { tioclinux(self.fd, ptr::addr_of_mut!(request.subcode)) }.map(drop)
        }

        fn paste_selection(&mut self) -> nix::Result<()> {
            let mut sub = TIOCL_PASTESEL;
            unsafe { tioclinux(self.fd, &mut sub) }.map(drop)
        }
    }

    /// Paste-inject `argv` via the first console descriptor that answers
    /// TIOCLINUX. Needs read-write access: the command text is written to the
    /// screen before being selected and pasted back as input.
    pub fn run(argv: &[String]) -> Result<()> {
        probe::probe(|fd| paste_fd(fd, argv), OFlag::O_RDWR)
    }

    fn paste_fd(fd: RawFd, argv: &[String]) -> Result<Outcome> {
        let mut target = Vc { fd };
        inject(&mut target, argv, fd >= probe::FALLBACK_FD)
    }

    fn inject<T: PasteTarget>(target: &mut T, argv: &[String], fallback: bool) -> Result<Outcome> {
        // Capability probe; on the fallback descriptor even this is fatal.
        if let Err(errno) = target.probe() {
            if fallback {
                return Err(Error::sys("TIOCLINUX", errno));
            }
            return Ok(Outcome::Unsupported);
        }

        // Home the cursor and clear the screen so the command lands on line 1.
        target.emit(b"\x1b[H\x1b[2J")?;

        // A TIOCLINUX answer is not proof of a console (the probe can succeed
        // on devices that merely forward the ioctl); the select/paste calls
        // below act on whichever console is globally active, so the fd must
        // denote a real /dev/ttyN before going further.
        let console = target.console_number()?.ok_or(Error::ConsoleRequired)?;
        if console != 0 {
            target.emit(format!("\x1b[12;{}]", console).as_bytes())?;
        }

        for (i, arg) in argv.iter().enumerate() {
            target.emit(arg.as_bytes())?;
            target.emit(if i + 1 == argv.len() { b"\n" } else { b" " })?;
        }

        target
            .select_line_one()
            .map_err(|errno| Error::sys("TIOCL_SETSEL", errno))?;
        target
            .paste_selection()
            .map_err(|errno| Error::sys("TIOCL_PASTESEL", errno))?;
        Ok(Outcome::Done)
    }

}

#[cfg(not(target_os = "linux"))]
mod unsupported {
    use nix::errno::Errno;

    use crate::error::{Error, Result};

    pub fn run(_argv: &[String]) -> Result<()> {
        Err(Error::sys("-L", Errno::ENOTSUP))
    }
}
