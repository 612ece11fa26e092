use std::ffi::OsString;
use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Context, Result};
use nix::sys::signal::{signal, SigHandler, Signal};

use minihttpd::dispatch::Dispatcher;
use minihttpd::log::{log_connection, LogSink, ServerStats};
use minihttpd::mime::{MimeMap, DEFAULT_MIME_TYPE};
use minihttpd::DEFAULT_INDEX_NAME;

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn stop_running(_signal: libc::c_int) {
    RUNNING.store(false, Ordering::Relaxed);
}

fn main() -> Result<()> {
    println!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let (port, dispatcher, mut log_sink) = from_command_line()?;

    let listener = TcpListener::bind(("0.0.0.0", port))
        .with_context(|| format!("failed to create listening socket for port {}", port))?;
    println!("listening on: http://0.0.0.0:{}/", port);

    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }
        .context("failed to set SIGPIPE handler")?;
    unsafe { signal(Signal::SIGINT, SigHandler::Handler(stop_running)) }
        .context("failed to set SIGINT handler")?;
    unsafe { signal(Signal::SIGTERM, SigHandler::Handler(stop_running)) }
        .context("failed to set SIGTERM handler")?;

    let mut stats = ServerStats::default();

    // One connection is fully answered before the next is accepted.
    while RUNNING.load(Ordering::Relaxed) {
        let (stream, addr) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("warning: accept() failed: {}", e);
                continue;
            }
        };
        match dispatcher.handle(&stream) {
            Ok(entry) => {
                stats.record(&entry);
                log_connection(&mut log_sink, addr.ip(), &entry);
            }
            Err(e) => eprintln!("warning: request from {} failed: {}", addr, e),
        }
    }

    stats.print();
    Ok(())
}

fn from_command_line() -> Result<(u16, Dispatcher, LogSink)> {
    let mut args = std::env::args();
    let name = args.next().expect("expected at least one argument");
    let port = match args.next().as_deref() {
        None => {
            usage(&name);
            std::process::exit(1);
        }
        Some("--help") => {
            usage(&name);
            std::process::exit(0);
        }
        Some(port) => port
            .parse()
            .with_context(|| format!("port number {} is invalid", port))?,
    };

    let mut root = String::from(".");
    let mut index_name = String::from(DEFAULT_INDEX_NAME);
    let mut mime_map = MimeMap::default();
    let mut log_sink = LogSink::default();
    while let Some(arg) = args.next().as_deref() {
        match arg {
            "--root" => {
                root = args.next().context("missing directory after --root")?;
                // Strip ending slash.
                if root.ends_with('/') {
                    root.pop();
                }
            }
            "--index" => {
                index_name = args.next().context("missing filename after --index")?;
            }
            "--mimetypes" => {
                let filename = args.next().context("missing filename after --mimetypes")?;
                mime_map.parse_extension_map_file(&OsString::from(filename))?;
            }
            "--default-mimetype" => {
                mime_map.default_mimetype = args
                    .next()
                    .context("missing string after --default-mimetype")?;
            }
            "--log" => {
                let filename = args.next().context("missing filename after --log")?;
                log_sink = LogSink::File(BufWriter::new(
                    OpenOptions::new()
                        .append(true)
                        .create(true)
                        .open(&filename)
                        .with_context(|| format!("failed to open log file {}", filename))?,
                ));
            }
            _ => {
                return Err(anyhow!("unknown argument `{}'", arg));
            }
        }
    }
    Ok((port, Dispatcher::new(root, index_name, mime_map), log_sink))
}

fn usage(argv0: &str) {
    eprint!(
        "usage:\t{} port [flags]\n\n\
        flags:\t--root directory (default: .)\n\
        \t\tServe files relative to this directory.\n\n\
        \t--index filename (default: {})\n\
        \t\tDefault file to serve when a directory is requested.\n\n\
        \t--mimetypes filename (optional)\n\
        \t\tParses specified file for extension-MIME associations.\n\n\
        \t--default-mimetype string (optional, default: {})\n\
        \t\tFiles with unknown extensions are served as this mimetype.\n\n\
        \t--log filename (default: stdout)\n\
        \t\tSpecifies which file to append the request log to.\n\n",
        argv0, DEFAULT_INDEX_NAME, DEFAULT_MIME_TYPE,
    );
}
