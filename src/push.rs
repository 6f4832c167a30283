use std::os::unix::io::RawFd;

use libc::c_char;
use nix::fcntl::OFlag;
use nix::ioctl_write_ptr_bad;

use crate::error::{Error, Outcome, Result};
use crate::probe;

ioctl_write_ptr_bad!(tiocsti, libc::TIOCSTI, c_char);

/// Push-inject `argv` into the first terminal descriptor that accepts
/// TIOCSTI. Only read access is needed; TIOCSTI works on any open terminal
/// descriptor regardless of mode.
pub fn run(argv: &[String]) -> Result<()> {
    probe::probe(|fd| push_fd(fd, argv), OFlag::O_RDONLY)
}

fn push_fd(fd: RawFd, argv: &[String]) -> Result<Outcome> {
    let mut sink = Tiocsti { fd };
    // The fallback descriptor already proved it is a terminal by opening, so
    // failures on it are fatal from the first byte.
    let sent = if fd >= probe::FALLBACK_FD { 1 } else { 0 };
    inject(&mut sink, argv, sent)
}

/// Destination for injected bytes. The one real implementation is TIOCSTI;
/// tests substitute recording and failing sinks.
trait ByteSink {
    fn put(&mut self, byte: u8) -> nix::Result<()>;
}

struct Tiocsti {
    fd: RawFd,
}

impl ByteSink for Tiocsti {
    fn put(&mut self, byte: u8) -> nix::Result<()> {
        let c = byte as c_char;
        unsafe { tiocsti(self.fd, &c) }.map(drop)
    }
}

/// Inject each argument byte by byte, separated by spaces and terminated by a
/// newline, exactly the bytes a human would type. `sent` counts bytes already
/// delivered on this descriptor: a failure at `sent == 0` means "not a usable
/// terminal, try the next candidate", a failure any later is fatal because
/// the victim has already received part of the command.
fn inject<S: ByteSink>(sink: &mut S, argv: &[String], mut sent: usize) -> Result<Outcome> {
    for (i, arg) in argv.iter().enumerate() {
        for &byte in arg.as_bytes() {
            match put_counted(sink, byte, &mut sent)? {
                Outcome::Done => {}
                Outcome::Unsupported => return Ok(Outcome::Unsupported),
            }
        }
        let sep = if i + 1 == argv.len() { b'\n' } else { b' ' };
        match put_counted(sink, sep, &mut sent)? {
            Outcome::Done => {}
            Outcome::Unsupported => return Ok(Outcome::Unsupported),
        }
    }
    Ok(Outcome::Done)
}

fn put_counted<S: ByteSink>(sink: &mut S, byte: u8, sent: &mut usize) -> Result<Outcome> {
    match sink.put(byte) {
        Ok(()) => {
            *sent += 1;
            Ok(Outcome::Done)
        }
        Err(_) if *sent == 0 => Ok(Outcome::Unsupported),
        Err(errno) => Err(Error::sys("TIOCSTI", errno)),
    }
}

#[cfg(test)]
mod tests {
    use nix::errno::Errno;

    use super::*;

    struct Recorder {
        bytes: Vec<u8>,
        fail_from: Option<usize>,
    }

    impl Recorder {
        fn new() -> Self {
            Recorder { bytes: Vec::new(), fail_from: None }
        }

        fn failing_from(n: usize) -> Self {
            Recorder { bytes: Vec::new(), fail_from: Some(n) }
        }
    }

    impl ByteSink for Recorder {
        fn put(&mut self, byte: u8) -> nix::Result<()> {
            if self.fail_from == Some(self.bytes.len()) {
                return Err(Errno::EIO);
            }
            self.bytes.push(byte);
            Ok(())
        }
    }

    fn args(words: &[&str]) -> Vec<String> {
        words.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn joins_arguments_with_spaces_and_trailing_newline() {
        let mut sink = Recorder::new();
        let outcome = inject(&mut sink, &args(&["echo", "hi"]), 0).unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert_eq!(sink.bytes, b"echo hi\n");
    }

    #[test]
    fn single_argument_gets_only_the_newline() {
        let mut sink = Recorder::new();
        inject(&mut sink, &args(&["ls"]), 0).unwrap();
        assert_eq!(sink.bytes, b"ls\n");
    }

    #[test]
    fn embedded_spaces_are_not_requoted() {
        let mut sink = Recorder::new();
        inject(&mut sink, &args(&["echo", "a b"]), 0).unwrap();
        assert_eq!(sink.bytes, b"echo a b\n");
    }

    #[test]
    fn empty_argv_injects_nothing_and_succeeds() {
        let mut sink = Recorder::new();
        let outcome = inject(&mut sink, &[], 0).unwrap();
        assert_eq!(outcome, Outcome::Done);
        assert!(sink.bytes.is_empty());
    }

    #[test]
    fn first_byte_failure_is_retryable() {
        let mut sink = Recorder::failing_from(0);
        let outcome = inject(&mut sink, &args(&["echo", "hi"]), 0).unwrap();
        assert_eq!(outcome, Outcome::Unsupported);
        assert!(sink.bytes.is_empty());
    }

    #[test]
    fn failure_after_first_byte_is_fatal() {
        let mut sink = Recorder::failing_from(3);
        let result = inject(&mut sink, &args(&["echo", "hi"]), 0);
        assert!(matches!(result, Err(Error::Sys { op: "TIOCSTI", .. })));
        assert_eq!(sink.bytes, b"ech");
    }

    #[test]
    fn fallback_descriptor_fails_fatally_even_on_first_byte() {
        let mut sink = Recorder::failing_from(0);
        let result = inject(&mut sink, &args(&["id"]), 1);
        assert!(matches!(result, Err(Error::Sys { op: "TIOCSTI", .. })));
    }
}
