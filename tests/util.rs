use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::{Child, Command, Stdio};
use std::thread::sleep;
use std::time::Duration;

pub fn get_unused_port() -> Option<u16> {
    TcpListener::bind(("localhost", 0))
        .ok()
        .map(|listener| listener.local_addr().unwrap().port())
}

pub fn wait_for_port(port: u16) -> bool {
    for _ in 0..1000 {
        if TcpStream::connect(("localhost", port)).is_ok() {
            return true;
        }
        sleep(Duration::from_millis(1));
    }
    false
}

pub struct ScopedChild(Child);

impl Drop for ScopedChild {
    fn drop(&mut self) {
        self.0.kill().ok();
    }
}

impl From<Child> for ScopedChild {
    fn from(child: Child) -> Self {
        ScopedChild(child)
    }
}

/// Spawn one of the package binaries listening on an unused port.
///
/// Assumes the port won't be reused before the server claims it.
pub fn spawn_server(binary: &str, args: &[&str]) -> (ScopedChild, u16) {
    let port = get_unused_port().expect("failed to get unused port");

    let child = Command::new(binary)
        .arg(format!("{}", port))
        .args(args)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to spawn server")
        .into();

    // Wait until the socket is open.
    assert!(wait_for_port(port), "failed to connect to server");

    (child, port)
}

/// Send a raw request and collect the whole response until the server
/// closes the connection.
pub fn roundtrip(port: u16, request: &str) -> Vec<u8> {
    let mut stream = TcpStream::connect(("localhost", port)).expect("failed to connect");
    // Set timeouts to prevent tests from hanging
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream
        .set_write_timeout(Some(Duration::from_secs(5)))
        .unwrap();
    stream.write_all(request.as_bytes()).unwrap();
    let mut buf = Vec::new();
    stream
        .read_to_end(&mut buf)
        .expect("failed to read response");
    buf
}

/// Split a response into its status line, header map, and body.
pub fn parse_response(response: &[u8]) -> (String, HashMap<String, String>, Vec<u8>) {
    let split = response
        .windows(4)
        .position(|window| window == b"\r\n\r\n")
        .expect("no header terminator in response");
    let head = std::str::from_utf8(&response[..split]).expect("header is not valid UTF-8");
    let body = response[split + 4..].to_vec();

    let mut lines = head.split("\r\n");
    let status_line = lines.next().expect("no status line").to_string();
    let mut headers = HashMap::new();
    for line in lines {
        let mut parts = line.splitn(2, ": ");
        let key = parts.next().expect("invalid header").to_string();
        let value = parts.next().expect("invalid header").to_string();
        headers.insert(key, value);
    }
    (status_line, headers, body)
}
