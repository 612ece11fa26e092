use std::fs::File;
use std::io::{BufWriter, Write};
use std::net::IpAddr;
use std::time::SystemTime;

use chrono::{DateTime, Local};

use crate::request::RequestLine;

/// Where to put the access log.
#[derive(Debug)]
pub enum LogSink {
    Stdout,
    File(BufWriter<File>),
}

impl LogSink {
    fn log(&mut self, message: &str) -> std::io::Result<()> {
        match self {
            Self::Stdout => {
                print!("{}", message);
            }
            Self::File(file) => {
                write!(file, "{}", message)?;
                file.flush()?;
            }
        }
        Ok(())
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::Stdout
    }
}

/// Common Log Format (CLF) formatted date in local timezone.
struct ClfDate(SystemTime);

impl std::fmt::Display for ClfDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let datetime = DateTime::<Local>::from(self.0);
        write!(f, "{}", datetime.format("[%d/%b/%Y:%H:%M:%S %z]"))
    }
}

/// Outcome of one connection, for the access log and run totals.
#[derive(Debug)]
pub struct RequestLog {
    pub request: Option<RequestLine>,
    pub status: u16,
    pub bytes_sent: u64,
}

impl RequestLog {
    /// The connection was dropped without a response.
    pub fn closed() -> Self {
        Self {
            request: None,
            status: 0,
            bytes_sent: 0,
        }
    }

    /// A response was sent before a full request line could be read.
    pub fn closed_with(status: u16, bytes_sent: u64) -> Self {
        Self {
            request: None,
            status,
            bytes_sent,
        }
    }

    pub fn responded(request: RequestLine, status: u16, bytes_sent: u64) -> Self {
        Self {
            request: Some(request),
            status,
            bytes_sent,
        }
    }
}

/// Add a connection's details to the logfile.
pub fn log_connection(sink: &mut LogSink, client: IpAddr, entry: &RequestLog) {
    let request = match &entry.request {
        Some(request) if entry.status != 0 => request,
        _ => return, // died without a response
    };
    let message = format!(
        "{} - - {} \"{} {}\" {} {}\n",
        client,
        ClfDate(SystemTime::now()),
        request.method,
        request.target,
        entry.status,
        entry.bytes_sent,
    );
    sink.log(&message).expect("failed to write log message");
}

/// Totals printed when the server shuts down.
#[derive(Debug, Default)]
pub struct ServerStats {
    pub num_requests: u64,
    pub total_out: u64,
}

impl ServerStats {
    pub fn record(&mut self, entry: &RequestLog) {
        if entry.status == 0 {
            return;
        }
        self.num_requests += 1;
        self.total_out += entry.bytes_sent;
    }

    pub fn print(&self) {
        println!("Requests: {}", self.num_requests);
        println!("Bytes: {} out", self.total_out);
    }
}
