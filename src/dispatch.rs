use std::fs::File;
use std::io::{ErrorKind, Write};
use std::net::TcpStream;
use std::os::unix::fs::PermissionsExt;
use std::os::unix::io::{AsRawFd, FromRawFd, IntoRawFd};
use std::process::{Command, Stdio};

use crate::error::HttpError;
use crate::headers;
use crate::line::LineReader;
use crate::log::RequestLog;
use crate::mime::MimeMap;
use crate::request::RequestLine;
use crate::target::DispatchTarget;

/// Dispatcher configuration shared by every connection.
#[derive(Debug)]
pub struct Dispatcher {
    pub root: String,
    pub index_name: String,
    pub mime_map: MimeMap,
    server_hdr: String,
}

/// A request-scoped failure: either a protocol error that still gets an
/// error page, or a transport fault that just kills the connection.
enum Failure {
    Http(HttpError),
    Io(std::io::Error),
}

impl From<HttpError> for Failure {
    fn from(error: HttpError) -> Self {
        Self::Http(error)
    }
}

impl From<std::io::Error> for Failure {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error)
    }
}

impl Dispatcher {
    pub fn new(root: String, index_name: String, mime_map: MimeMap) -> Self {
        Self {
            root,
            index_name,
            mime_map,
            server_hdr: crate::server_header(),
        }
    }

    /// Answer one connection: parse the request line, resolve the target,
    /// and stream back a file, a program's output, or an error page.
    pub fn handle(&self, stream: &TcpStream) -> std::io::Result<RequestLog> {
        let mut reader = LineReader::new(stream);
        let line = match reader.read_line() {
            Ok(Some(line)) => line,
            Ok(None) => return Ok(RequestLog::closed()),
            Err(error) if error.kind() == ErrorKind::InvalidData => {
                let error = HttpError::InvalidTarget("an oversized request line".to_string());
                let bytes_sent = self.error_page(stream, &error)?;
                return Ok(RequestLog::closed_with(error.status().0, bytes_sent));
            }
            Err(error) => return Err(error),
        };
        let request = match RequestLine::parse(&line) {
            Some(request) => request,
            None => return Ok(RequestLog::closed()),
        };
        if let Err(error) = request.check_method() {
            let bytes_sent = self.error_page(stream, &error)?;
            return Ok(RequestLog::responded(request, error.status().0, bytes_sent));
        }
        headers::discard(&mut reader)?;

        let target = DispatchTarget::parse(&request.target, &self.root, &self.index_name);
        match self.respond(stream, &target) {
            Ok(bytes_sent) => Ok(RequestLog::responded(request, 200, bytes_sent)),
            Err(Failure::Http(error)) => {
                let bytes_sent = self.error_page(stream, &error)?;
                Ok(RequestLog::responded(request, error.status().0, bytes_sent))
            }
            Err(Failure::Io(error)) => Err(error),
        }
    }

    fn respond(&self, stream: &TcpStream, target: &DispatchTarget) -> Result<u64, Failure> {
        match target {
            DispatchTarget::Static { path } => self.send_file(stream, path),
            DispatchTarget::Dynamic { path, query } => self.run_program(stream, path, query),
        }
    }

    /// Stream a regular, owner-readable file with a synthesized header.
    fn send_file(&self, stream: &TcpStream, path: &str) -> Result<u64, Failure> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| HttpError::ResourceNotFound(path.to_string()))?;
        if !metadata.is_file() || (metadata.permissions().mode() & libc::S_IRUSR) == 0 {
            return Err(HttpError::ResourceForbidden(path.to_string()).into());
        }
        let size = metadata.len();
        let header = format!(
            "HTTP/1.0 200 OK\r\n\
            {}\
            Connection: close\r\n\
            Content-length: {}\r\n\
            Content-type: {}\r\n\
            \r\n",
            self.server_hdr,
            size,
            self.mime_map.content_type(path),
        );
        let mut out = stream;
        out.write_all(header.as_bytes())?;
        if size > 0 {
            let file = File::open(path)?;
            let map = FileMap::new(&file, size as usize)?;
            out.write_all(&map)?;
        }
        Ok(header.len() as u64 + size)
    }

    /// Run an owner-executable program with the query arguments in its
    /// environment and its standard output wired to the client.
    ///
    /// Only the status line and Server header are sent first; the program's
    /// own output supplies the rest of the response.
    fn run_program(&self, stream: &TcpStream, path: &str, query: &str) -> Result<u64, Failure> {
        let metadata = std::fs::metadata(path)
            .map_err(|_| HttpError::ResourceNotFound(path.to_string()))?;
        if !metadata.is_file() || (metadata.permissions().mode() & libc::S_IXUSR) == 0 {
            return Err(HttpError::ResourceForbidden(path.to_string()).into());
        }
        let header = format!("HTTP/1.0 200 OK\r\n{}", self.server_hdr);
        let mut out = stream;
        out.write_all(header.as_bytes())?;

        // The child owns the duplicated socket descriptor from here on.
        let socket = stream.try_clone()?.into_raw_fd();
        let status = Command::new(path)
            .env("QUERY_STRING", query)
            .stdout(unsafe { Stdio::from_raw_fd(socket) })
            .spawn()?
            .wait()?;
        if !status.success() {
            eprintln!("warning: `{}' exited with {}", path, status);
        }
        Ok(header.len() as u64)
    }

    /// A small HTML page for any request that can't be answered.
    fn error_page(&self, stream: &TcpStream, error: &HttpError) -> std::io::Result<u64> {
        let (code, reason) = error.status();
        let body = format!(
            "<html><head><title>{} {}</title></head><body>\n\
            <h1>{}</h1>\n\
            {}.\n\
            <hr>\n\
            <em>{}/{}</em>\n\
            </body></html>\n",
            code,
            reason,
            reason,
            error,
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
        );
        let header = format!(
            "HTTP/1.0 {} {}\r\n\
            {}\
            Connection: close\r\n\
            Content-length: {}\r\n\
            Content-type: text/html\r\n\
            \r\n",
            code,
            reason,
            self.server_hdr,
            body.len(),
        );
        let mut out = stream;
        out.write_all(header.as_bytes())?;
        out.write_all(body.as_bytes())?;
        Ok((header.len() + body.len()) as u64)
    }
}

/// Safe wrapper for a read-only `libc::mmap` of a whole file, unmapped
/// exactly once on drop. Zero-length files must not be mapped.
struct FileMap {
    addr: *mut libc::c_void,
    len: usize,
}

impl FileMap {
    fn new(file: &File, len: usize) -> std::io::Result<Self> {
        let addr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_PRIVATE,
                file.as_raw_fd(),
                0,
            )
        };
        if addr == libc::MAP_FAILED {
            return Err(std::io::Error::last_os_error());
        }
        Ok(Self { addr, len })
    }
}

impl std::ops::Deref for FileMap {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        unsafe { std::slice::from_raw_parts(self.addr as *const u8, self.len) }
    }
}

impl Drop for FileMap {
    fn drop(&mut self) {
        unsafe { libc::munmap(self.addr, self.len) };
    }
}
