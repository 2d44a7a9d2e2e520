//! Byte sources the input gate drains.

use std::collections::VecDeque;
use std::io;

pub trait ByteSource {
    /// Number of bytes that can be read without blocking.
    fn available(&mut self) -> io::Result<usize>;

    /// Reads up to `buf.len()` already-available bytes.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Drops everything currently available.
    fn discard(&mut self) -> io::Result<()> {
        let mut scratch = [0u8; 256];
        while self.available()? > 0 {
            if self.read(&mut scratch)? == 0 {
                break;
            }
        }
        Ok(())
    }
}

/// The controlling terminal's stdin, queried with `FIONREAD`.
///
/// Expects the terminal to already be in raw mode.
#[derive(Debug, Default)]
pub struct Stdin;

impl ByteSource for Stdin {
    fn available(&mut self) -> io::Result<usize> {
        let mut pending: libc::c_int = 0;
        let result = unsafe { libc::ioctl(libc::STDIN_FILENO, libc::FIONREAD, &mut pending) };
        if result == -1 {
            return Err(io::Error::last_os_error());
        }
        Ok(pending.max(0) as usize)
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

/// In-memory source; every pushed chunk is immediately available.
#[derive(Debug, Default, Clone)]
pub struct Scripted {
    pending: VecDeque<u8>,
}

impl Scripted {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: impl AsRef<[u8]>) {
        self.pending.extend(bytes.as_ref());
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl ByteSource for Scripted {
    fn available(&mut self) -> io::Result<usize> {
        Ok(self.pending.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.pending.len());
        for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_reads_in_order() {
        let mut source = Scripted::new();
        source.push(b"abc");
        let mut buf = [0u8; 2];
        assert_eq!(source.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf, b"ab");
        assert_eq!(source.available().unwrap(), 1);
    }

    #[test]
    fn test_discard_empties_source() {
        let mut source = Scripted::new();
        source.push(vec![b'x'; 1000]);
        source.discard().unwrap();
        assert_eq!(source.remaining(), 0);
    }
}
