use std::io::Write;
use std::net::TcpStream;

use crate::error::HttpError;
use crate::headers;
use crate::line::LineReader;
use crate::log::RequestLog;
use crate::request::RequestLine;
use crate::target::RelayTarget;

/// User-Agent presented to origins in place of whatever the client sent.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:10.0.3) Gecko/20120305 Firefox/10.0.3";

/// Relay configuration shared by every connection.
#[derive(Debug)]
pub struct Relay {
    pub user_agent: String,
}

impl Default for Relay {
    fn default() -> Self {
        Self {
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Relay {
    /// Forward one client request to its origin and stream the answer back.
    ///
    /// Anything that fails before the origin responds (a short or non-GET
    /// request line, an unparseable target, a refused connection) closes
    /// the client connection without a response.
    pub fn handle(&self, stream: &TcpStream) -> std::io::Result<RequestLog> {
        let mut reader = LineReader::new(stream);
        let line = match reader.read_line()? {
            Some(line) => line,
            None => return Ok(RequestLog::closed()),
        };
        let request = match RequestLine::parse(&line) {
            Some(request) => request,
            None => return Ok(RequestLog::closed()),
        };
        if let Err(error) = request.check_method() {
            eprintln!("warning: {}", error);
            return Ok(RequestLog::closed());
        }
        let target = match RelayTarget::parse(&request.target) {
            Ok(target) => target,
            Err(error) => {
                eprintln!("warning: {}", error);
                return Ok(RequestLog::closed());
            }
        };

        let origin_addr = format!("{}:{}", target.host, target.port);
        let origin = match TcpStream::connect(origin_addr.as_str()) {
            Ok(origin) => origin,
            Err(error) => {
                eprintln!(
                    "warning: {}: {}",
                    HttpError::OriginUnreachable(origin_addr),
                    error
                );
                return Ok(RequestLog::closed());
            }
        };

        let mut origin_out = &origin;
        write!(origin_out, "GET {} HTTP/1.0\r\n", target.path)?;
        headers::forward_filtered(&mut reader, &mut origin_out, &self.user_agent)?;

        // Relay the answer verbatim until the origin closes the connection;
        // that close is the only completion signal HTTP/1.0 gives us.
        let mut origin_reader = LineReader::new(&origin);
        let mut client_out = stream;
        let mut status = 0;
        let mut bytes_sent = 0u64;
        while let Some(fragment) = origin_reader.read_fragment()? {
            if bytes_sent == 0 {
                status = response_status(&fragment);
            }
            client_out.write_all(&fragment)?;
            bytes_sent += fragment.len() as u64;
        }
        Ok(RequestLog::responded(request, status, bytes_sent))
    }
}

/// Pull the status code out of the first line the origin sent back, for the
/// access log. Zero if it doesn't look like a status line.
fn response_status(line: &[u8]) -> u16 {
    std::str::from_utf8(line)
        .ok()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|code| code.parse().ok())
        .unwrap_or(0)
}
