use std::io::{ErrorKind, Read, Result};

/// Reads until `buf` is full or the reader reports EOF, retrying on EINTR.
///
/// Unlike `Read::read_exact()`, a short read is not an error: the number of
/// bytes placed at the start of `buf` is returned, and anything less than
/// `buf.len()` means the reader is exhausted.
pub(crate) fn read_fill(reader: &mut impl Read, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod test {
    use std::io::Error;

    use similar_asserts::assert_eq;

    use super::*;

    /// Hands out at most three bytes per call and interrupts every other call.
    struct Trickle<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(ErrorKind::Interrupted.into());
            }
            let n = buf.len().min(3).min(self.data.len());
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_read_fill() {
        // empty returns 0 immediately
        let mut r = b"" as &[u8];
        assert_eq!(read_fill(&mut r, &mut [0; 9]).unwrap(), 0);

        // full buffer, then the remainder, then EOF
        r = b"twelve bytes";
        let mut buf = [0; 9];
        assert_eq!(read_fill(&mut r, &mut buf).unwrap(), 9);
        assert_eq!(&buf, b"twelve by");
        assert_eq!(read_fill(&mut r, &mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"tes");
        assert_eq!(read_fill(&mut r, &mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_fill_trickle() {
        let mut r = Trickle {
            data: b"eighteen(18) bytes",
            interrupt: false,
        };
        let mut buf = [0; 16];
        assert_eq!(read_fill(&mut r, &mut buf).unwrap(), 16);
        assert_eq!(&buf, b"eighteen(18) byt");
        assert_eq!(read_fill(&mut r, &mut buf).unwrap(), 2);
    }

    #[test]
    fn test_read_fill_broken_reader() {
        struct BrokenReader;
        impl Read for BrokenReader {
            fn read(&mut self, _buffer: &mut [u8]) -> Result<usize> {
                Err(Error::from(ErrorKind::BrokenPipe))
            }
        }

        assert_eq!(
            read_fill(&mut BrokenReader, &mut [0; 9])
                .unwrap_err()
                .kind(),
            ErrorKind::BrokenPipe
        );
    }
}
