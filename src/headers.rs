use std::io::{Read, Write};

use crate::line::LineReader;

/// Header lines the relay never forwards; it speaks for itself on these.
const FILTERED_HEADERS: &[&str] = &["Connection:", "Proxy-Connection:", "User-Agent:"];

/// The blank line ending the header section.
pub fn is_terminator(line: &[u8]) -> bool {
    line == b"\r\n" || line == b"\n"
}

fn is_filtered(line: &[u8]) -> bool {
    FILTERED_HEADERS.iter().any(|name| {
        line.len() >= name.len() && line[..name.len()].eq_ignore_ascii_case(name.as_bytes())
    })
}

/// Copy header lines from `reader` to `out` until the blank terminator,
/// dropping the filtered set, then append the relay's own Connection,
/// Proxy-Connection, and User-Agent lines and the terminator.
///
/// Consumes exactly the header portion of the inbound stream; for a GET
/// there is no body to leave behind.
pub fn forward_filtered<R: Read, W: Write>(
    reader: &mut LineReader<R>,
    out: &mut W,
    user_agent: &str,
) -> std::io::Result<()> {
    while let Some(line) = reader.read_line()? {
        if is_terminator(&line) {
            break;
        }
        if is_filtered(&line) {
            continue;
        }
        out.write_all(&line)?;
    }
    write!(out, "Connection: close\r\n")?;
    write!(out, "Proxy-Connection: close\r\n")?;
    write!(out, "User-Agent: {}\r\n\r\n", user_agent)?;
    Ok(())
}

/// Read and discard header lines up to the blank terminator. Their content
/// does not affect the dispatch decision.
pub fn discard<R: Read>(reader: &mut LineReader<R>) -> std::io::Result<()> {
    while let Some(line) = reader.read_line()? {
        if is_terminator(&line) {
            break;
        }
    }
    Ok(())
}
