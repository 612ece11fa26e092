//! Shared request pipeline for the `minihttpd' dispatcher and the
//! `minirelay' forwarding relay.
//!
//! Both programs accept HTTP/1.0 GET requests, one connection at a time.
//! The dispatcher answers locally, streaming a file or running a CGI
//! program; the relay re-emits the request toward the origin server named
//! in the target and pipes the origin's answer straight back.

pub mod dispatch;
pub mod error;
pub mod headers;
pub mod line;
pub mod log;
pub mod mime;
pub mod relay;
pub mod request;
pub mod target;

/// Filename served when a directory is requested.
pub const DEFAULT_INDEX_NAME: &str = "index.html";

/// `Server:' header line attached to every locally generated response.
pub fn server_header() -> String {
    format!(
        "Server: {}/{}\r\n",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )
}
