use crate::error::HttpError;

/// Substring of a target that marks a request for dynamic content.
pub const CGI_MARKER: &str = "cgi-bin";

/// Origin coordinates recovered from an absolute `http://` target.
#[derive(Debug, PartialEq)]
pub struct RelayTarget {
    pub host: String,
    pub port: String,
    pub path: String,
}

impl RelayTarget {
    /// Decompose `http://host[:port]/path` into its parts.
    ///
    /// Extraction with an explicit `:port` segment is attempted first; if
    /// that fails, the port defaults to "80" and the host runs to the first
    /// slash. A target missing the scheme, host, or path fails outright.
    /// The port is kept as a string; a value no resolver accepts surfaces
    /// later as a connect failure.
    pub fn parse(target: &str) -> Result<Self, HttpError> {
        let rest = target
            .strip_prefix("http://")
            .ok_or_else(|| HttpError::InvalidTarget(target.to_string()))?;
        Self::split_with_port(rest)
            .or_else(|| Self::split_default_port(rest))
            .ok_or_else(|| HttpError::InvalidTarget(target.to_string()))
    }

    fn split_with_port(rest: &str) -> Option<Self> {
        let colon = rest.find(':')?;
        let host = &rest[..colon];
        if host.is_empty() || host.contains('/') {
            return None;
        }
        let after_colon = &rest[colon + 1..];
        let slash = after_colon.find('/')?;
        let port = &after_colon[..slash];
        if port.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port: port.to_string(),
            path: after_colon[slash..].to_string(),
        })
    }

    fn split_default_port(rest: &str) -> Option<Self> {
        let slash = rest.find('/')?;
        let host = &rest[..slash];
        if host.is_empty() {
            return None;
        }
        Some(Self {
            host: host.to_string(),
            port: "80".to_string(),
            path: rest[slash..].to_string(),
        })
    }
}

/// Local resolution of a request target: a file to stream, or a program to
/// run with its query arguments.
#[derive(Debug, PartialEq)]
pub enum DispatchTarget {
    Static { path: String },
    Dynamic { path: String, query: String },
}

impl DispatchTarget {
    /// Map a target onto the filesystem below `root`.
    ///
    /// Targets containing the CGI marker split at the first `?` into a
    /// program path and its query arguments. Anything else is a plain
    /// file, with directory targets falling back to `index_name`.
    pub fn parse(target: &str, root: &str, index_name: &str) -> Self {
        if target.contains(CGI_MARKER) {
            let mut parts = target.splitn(2, '?');
            let path = parts.next().unwrap();
            let query = parts.next().unwrap_or("");
            Self::Dynamic {
                path: format!("{}{}", root, path),
                query: query.to_string(),
            }
        } else {
            let mut path = format!("{}{}", root, target);
            if path.ends_with('/') {
                path.push_str(index_name);
            }
            Self::Static { path }
        }
    }
}
