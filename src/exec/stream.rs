// src/exec/stream.rs

//! Output multiplexing.
//!
//! A process's stdout and stderr share the write end of one pipe
//! ([`merged_output`]), so the parent reads them back as a single byte
//! stream in the order the child wrote them. That stream is pumped line by
//! line into a channel ([`read_lines`]), and [`forward_lines`] writes every
//! line to the console behind a `PID: <pid>, <rig>> ` prefix. Line bytes are
//! passed through untouched. Lines from different rigs interleave freely.

use std::io::{self, PipeReader, Write};
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::debug;

use super::registry::ShutdownSignal;

/// Lines buffered between the pipe readers and the console writer.
const LINE_CHANNEL_CAPACITY: usize = 256;

/// Where multiplexed output ends up.
///
/// `emit` receives one complete, already-prefixed line including its
/// trailing newline, and must write it in one piece so lines from
/// concurrent rigs never tear.
pub trait ConsoleSink: Send + Sync {
    fn emit(&self, line: &[u8]);
}

/// Production console: the process's stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutConsole;

impl ConsoleSink for StdoutConsole {
    fn emit(&self, line: &[u8]) {
        let mut out = std::io::stdout().lock();
        if let Err(e) = out.write_all(line).and_then(|()| out.flush()) {
            debug!(error = %e, "failed to write to stdout");
        }
    }
}

/// Why [`forward_lines`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEnd {
    /// The output pipe reached end of input.
    Eof,
    /// The registry started its kill sweep.
    Cancelled,
}

/// Prefix put in front of every console line of one process.
pub fn line_prefix(pid: Option<u32>, rig: &str) -> String {
    match pid {
        Some(pid) => format!("PID: {pid}, {rig}> "),
        None => format!("PID: ?, {rig}> "),
    }
}

/// `prefix` + `line`, with a newline appended if `line` lacks one.
pub fn format_line(prefix: &str, line: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(prefix.len() + line.len() + 1);
    out.extend_from_slice(prefix.as_bytes());
    out.extend_from_slice(line);
    if !line.ends_with(b"\n") {
        out.push(b'\n');
    }
    out
}

/// Read end of a pipe, registered with the tokio reactor.
#[cfg(unix)]
pub type OutputPipe = tokio::net::unix::pipe::Receiver;
#[cfg(windows)]
pub type OutputPipe = tokio::fs::File;

/// Point both stdout and stderr of `cmd` at the write end of one new pipe
/// and return its read end.
///
/// The parent's copies of the write end live inside `cmd`; drop `cmd` right
/// after spawning or the reader never sees end of input.
pub fn merged_output(cmd: &mut Command) -> io::Result<PipeReader> {
    let (reader, writer) = io::pipe()?;
    cmd.stdout(Stdio::from(writer.try_clone()?))
        .stderr(Stdio::from(writer));
    Ok(reader)
}

/// Hand a blocking pipe reader over to the runtime. Must be called from
/// within a tokio runtime.
pub fn into_async(reader: PipeReader) -> io::Result<OutputPipe> {
    #[cfg(unix)]
    {
        tokio::net::unix::pipe::Receiver::from_owned_fd(std::os::fd::OwnedFd::from(reader))
    }
    #[cfg(windows)]
    {
        let handle = std::os::windows::io::OwnedHandle::from(reader);
        Ok(tokio::fs::File::from_std(std::fs::File::from(handle)))
    }
}

/// Spawn a reader for `reader` feeding the returned channel. The channel
/// closes once the reader hits end of input.
pub fn read_lines<R>(reader: R) -> mpsc::Receiver<Vec<u8>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(LINE_CHANNEL_CAPACITY);
    tokio::spawn(pump_lines(reader, tx));
    rx
}

/// Read `reader` line by line (raw bytes, newline kept) into `tx`.
pub async fn pump_lines<R>(reader: R, tx: mpsc::Sender<Vec<u8>>)
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);

    loop {
        let mut line = Vec::new();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                if tx.send(line).await.is_err() {
                    // Console side is gone (cancelled); stop reading.
                    break;
                }
            }
            Err(e) => {
                debug!(error = %e, "output pipe read failed");
                break;
            }
        }
    }
}

/// Write every received line to `console` until the channel closes or the
/// shutdown signal fires, whichever comes first.
pub async fn forward_lines(
    mut lines: mpsc::Receiver<Vec<u8>>,
    prefix: &str,
    console: &dyn ConsoleSink,
    mut shutdown: ShutdownSignal,
) -> StreamEnd {
    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => return StreamEnd::Cancelled,

            line = lines.recv() => match line {
                Some(line) => console.emit(&format_line(prefix, &line)),
                None => return StreamEnd::Eof,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use crate::exec::registry::ProcessRegistry;

    #[derive(Default)]
    struct Captured(Mutex<Vec<Vec<u8>>>);

    impl ConsoleSink for Captured {
        fn emit(&self, line: &[u8]) {
            self.0.lock().unwrap().push(line.to_vec());
        }
    }

    #[test]
    fn prefix_matches_audit_format() {
        assert_eq!(line_prefix(Some(42), "rig-a"), "PID: 42, rig-a> ");
        assert_eq!(format_line("p> ", b"done"), b"p> done\n".to_vec());
        assert_eq!(format_line("p> ", b"done\r\n"), b"p> done\r\n".to_vec());
    }

    #[tokio::test]
    async fn forwards_single_stream_in_order() {
        let registry = ProcessRegistry::new();
        let console = Captured::default();
        let input = Cursor::new(b"one\ntwo\nthree".to_vec());

        let rx = read_lines(input);
        let end = forward_lines(rx, "PID: 7, r> ", &console, registry.shutdown_signal()).await;

        assert_eq!(end, StreamEnd::Eof);
        let lines = console.0.lock().unwrap().clone();
        assert_eq!(
            lines,
            vec![
                b"PID: 7, r> one\n".to_vec(),
                b"PID: 7, r> two\n".to_vec(),
                b"PID: 7, r> three\n".to_vec(),
            ]
        );
    }

    #[tokio::test]
    async fn cancellation_stops_forwarding() {
        let registry = Arc::new(ProcessRegistry::new());
        let console = Arc::new(Captured::default());

        // A channel that never closes on its own.
        let (_tx, rx) = mpsc::channel::<Vec<u8>>(1);
        let signal = registry.shutdown_signal();
        let sink = Arc::clone(&console);
        let task = tokio::spawn(async move { forward_lines(rx, "x> ", sink.as_ref(), signal).await });

        registry.kill_all();
        let end = tokio::time::timeout(std::time::Duration::from_secs(1), task)
            .await
            .expect("forward_lines did not react to shutdown")
            .unwrap();

        assert_eq!(end, StreamEnd::Cancelled);
    }
}
