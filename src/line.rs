use std::io::{BufRead, BufReader, ErrorKind, Read};

/// Longest line accepted from a peer during parsing.
pub const MAX_LINE_LENGTH: usize = 4096;

/// Buffered line-at-a-time reader over a byte stream.
///
/// Lines are returned with their terminator intact so they can be written
/// back out verbatim. At end of stream, unterminated trailing bytes come
/// back as a final line.
pub struct LineReader<R> {
    inner: BufReader<R>,
}

impl<R: Read> LineReader<R> {
    pub fn new(stream: R) -> Self {
        Self {
            inner: BufReader::new(stream),
        }
    }

    /// Read the next newline-terminated line for parsing.
    ///
    /// Returns `None` at end of stream. A line longer than
    /// `MAX_LINE_LENGTH` is an `InvalidData` error; callers treat it as a
    /// malformed request rather than buffering without bound.
    pub fn read_line(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        match self.read_fragment()? {
            Some(line) if !line.ends_with(b"\n") && line.len() == MAX_LINE_LENGTH => {
                Err(std::io::Error::new(
                    ErrorKind::InvalidData,
                    "line exceeds maximum length",
                ))
            }
            other => Ok(other),
        }
    }

    /// Read up to `MAX_LINE_LENGTH` bytes, stopping after a newline if one
    /// turns up. Oversized runs come back in chunks instead of failing,
    /// for content that is passed along verbatim.
    pub fn read_fragment(&mut self) -> std::io::Result<Option<Vec<u8>>> {
        let mut fragment = Vec::new();
        let read = (&mut self.inner)
            .take(MAX_LINE_LENGTH as u64)
            .read_until(b'\n', &mut fragment)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(fragment))
    }
}
