use crate::error::HttpError;

/// First line of an HTTP request, split into its three tokens.
#[derive(Debug, PartialEq)]
pub struct RequestLine {
    pub method: String,
    pub target: String,
    pub version: String,
}

impl RequestLine {
    /// Parse a request line like `GET /index.html HTTP/1.0`.
    ///
    /// Returns `None` unless the line holds three whitespace-separated
    /// tokens; a peer that sends less gets its connection closed without
    /// ceremony.
    pub fn parse(line: &[u8]) -> Option<Self> {
        let line = std::str::from_utf8(line).ok()?;
        let mut tokens = line.split_whitespace();
        let method = tokens.next()?.to_string();
        let target = tokens.next()?.to_string();
        let version = tokens.next()?.to_string();
        Some(Self {
            method,
            target,
            version,
        })
    }

    /// Only GET is honored, in any case mixture.
    pub fn check_method(&self) -> Result<(), HttpError> {
        if self.method.eq_ignore_ascii_case("GET") {
            Ok(())
        } else {
            Err(HttpError::MethodNotImplemented(self.method.clone()))
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use test_case::test_case;

    #[test_case(b"GET /a HTTP/1.0\r\n", "GET", "/a", "HTTP/1.0" ; "plain path")]
    #[test_case(b"get http://h/a HTTP/1.0\r\n", "get", "http://h/a", "HTTP/1.0" ; "absolute target")]
    #[test_case(b"GET   /a   HTTP/1.0\r\n", "GET", "/a", "HTTP/1.0" ; "extra whitespace")]
    fn parse_works(line: &[u8], method: &str, target: &str, version: &str) {
        let request = RequestLine::parse(line).unwrap();
        assert_eq!(request.method, method);
        assert_eq!(request.target, target);
        assert_eq!(request.version, version);
    }

    #[test_case(b"GET /a\r\n" ; "two tokens")]
    #[test_case(b"GET\r\n" ; "one token")]
    #[test_case(b"\r\n" ; "empty line")]
    #[test_case(b"\xff\xfe\r\n" ; "not utf-8")]
    fn parse_rejects_short_lines(line: &[u8]) {
        assert_eq!(RequestLine::parse(line), None);
    }

    #[test]
    fn only_get_is_implemented() {
        let get = RequestLine::parse(b"gEt / HTTP/1.0\r\n").unwrap();
        assert!(get.check_method().is_ok());

        let post = RequestLine::parse(b"POST / HTTP/1.0\r\n").unwrap();
        let error = post.check_method().unwrap_err();
        assert_eq!(error.status().0, 501);
    }
}
