use std::fs::OpenOptions;
use std::io::{BufWriter, ErrorKind};
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{anyhow, Context, Result};
use nix::sys::signal::{signal, SigHandler, Signal};

use minihttpd::log::{log_connection, LogSink, ServerStats};
use minihttpd::relay::Relay;

static RUNNING: AtomicBool = AtomicBool::new(true);

extern "C" fn stop_running(_signal: libc::c_int) {
    RUNNING.store(false, Ordering::Relaxed);
}

fn main() -> Result<()> {
    println!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));

    let (port, mut log_sink) = from_command_line()?;
    let relay = Relay::default();

    let listener = TcpListener::bind(("0.0.0.0", port))
        .with_context(|| format!("failed to create listening socket for port {}", port))?;
    println!("relaying on: http://0.0.0.0:{}/", port);

    unsafe { signal(Signal::SIGPIPE, SigHandler::SigIgn) }
        .context("failed to set SIGPIPE handler")?;
    unsafe { signal(Signal::SIGINT, SigHandler::Handler(stop_running)) }
        .context("failed to set SIGINT handler")?;
    unsafe { signal(Signal::SIGTERM, SigHandler::Handler(stop_running)) }
        .context("failed to set SIGTERM handler")?;

    let mut stats = ServerStats::default();

    // One connection is fully relayed before the next is accepted.
    while RUNNING.load(Ordering::Relaxed) {
        let (stream, addr) = match listener.accept() {
            Ok(accepted) => accepted,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => {
                eprintln!("warning: accept() failed: {}", e);
                continue;
            }
        };
        match relay.handle(&stream) {
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

fn from_command_line() -> Result<(u16, LogSink)> {
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

    let mut log_sink = LogSink::default();
    while let Some(arg) = args.next().as_deref() {
        match arg {
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
    Ok((port, log_sink))
}

fn usage(argv0: &str) {
    eprint!(
        "usage:\t{} port [flags]\n\n\
        flags:\t--log filename (default: stdout)\n\
        \t\tSpecifies which file to append the request log to.\n\n",
        argv0,
    );
}
