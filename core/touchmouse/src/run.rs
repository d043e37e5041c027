//! `touchmouse run`: input lines → ring channel → pipeline → stdout.
//!
//! A producer thread reads the input and writes one line per message. The
//! calling thread owns the read session and the pipeline. End of input and
//! SIGINT/SIGTERM both surface to the consumer as `Interrupted`.

use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use touch_core::{
    ChannelError, Pipeline, ReadSession, Result, RingChannel, TouchConfig, TouchError,
    WriteSession, FRAME_CAPACITY,
};
use tracing::{debug, info, warn};

use crate::output::{self, OutputFormat};
use crate::shutdown;

const NONBLOCKING_IDLE: Duration = Duration::from_millis(1);

pub struct RunOptions {
    /// `None` or `-` reads stdin.
    pub input: Option<PathBuf>,
    pub format: OutputFormat,
    pub config: TouchConfig,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub lines_read: u64,
    pub lines_rejected: u64,
    pub bundles: u64,
    pub records: u64,
    pub dropped: u64,
}

enum Input {
    Stdin,
    File(fs_err::File),
}

impl Input {
    fn open(path: Option<&PathBuf>) -> Result<Self> {
        match path {
            None => Ok(Input::Stdin),
            Some(path) if path.as_os_str() == "-" => Ok(Input::Stdin),
            Some(path) => fs_err::File::open(path)
                .map(Input::File)
                .map_err(|err| TouchError::io("open input", err)),
        }
    }
}

pub fn run(options: RunOptions) -> Result<RunSummary> {
    let RunOptions {
        input,
        format,
        config,
    } = options;

    let input = Input::open(input.as_ref())?;
    let channel = Arc::new(RingChannel::new(config.channel.depth));
    let writer = channel.open_writer()?;
    let mut reader = channel.open_reader()?;
    reader.set_nonblocking(config.channel.nonblocking);
    shutdown::install(&channel);

    info!(
        depth = channel.depth(),
        mode = ?config.gesture.mode,
        nonblocking = config.channel.nonblocking,
        "Starting replay"
    );

    let producer = thread::spawn(move || produce(input, writer));

    let mut pipeline = Pipeline::new(&config);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut summary = consume(&mut reader, &mut pipeline, format, &mut out)?;
    summary.dropped = channel.dropped();

    if shutdown::requested() {
        // The producer may be parked on a read that never returns.
        info!("Stopped by signal");
    } else {
        let (lines_read, lines_rejected) = producer
            .join()
            .map_err(|_| TouchError::io("join producer", io::Error::other("producer panicked")))??;
        summary.lines_read = lines_read;
        summary.lines_rejected = lines_rejected;
    }

    info!(
        lines = summary.lines_read,
        rejected = summary.lines_rejected,
        bundles = summary.bundles,
        records = summary.records,
        dropped = summary.dropped,
        "Replay finished"
    );
    Ok(summary)
}

/// Returns `(lines written, lines rejected)`.
fn produce(input: Input, mut writer: WriteSession) -> Result<(u64, u64)> {
    let source: Box<dyn BufRead> = match input {
        Input::Stdin => Box::new(io::stdin().lock()),
        Input::File(file) => Box::new(BufReader::new(file)),
    };

    let mut written = 0;
    let mut rejected = 0;
    let mut result = Ok(());
    for line in source.lines() {
        if shutdown::requested() {
            break;
        }
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                result = Err(TouchError::io("read input", err));
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        match writer.write(line.as_bytes()) {
            Ok(()) => written += 1,
            Err(err) => {
                rejected += 1;
                warn!(error = %err, "Skipping input line");
            }
        }
    }

    let channel = Arc::clone(writer.channel());
    writer.close();
    channel.interrupt();
    debug!(written, rejected, "Producer finished");
    result.map(|()| (written, rejected))
}

fn consume<W: Write>(
    reader: &mut ReadSession,
    pipeline: &mut Pipeline,
    format: OutputFormat,
    out: &mut W,
) -> Result<RunSummary> {
    let mut summary = RunSummary::default();
    let mut buf = [0u8; FRAME_CAPACITY];

    loop {
        let len = match reader.read(&mut buf) {
            Ok(len) => len,
            Err(ChannelError::WouldBlock) => {
                // The producer may have queued its last lines between the
                // empty read and the interrupt.
                if reader.channel().is_interrupted() {
                    drain(reader, pipeline, format, out, &mut buf, &mut summary)?;
                    break;
                }
                thread::sleep(NONBLOCKING_IDLE);
                continue;
            }
            Err(ChannelError::Interrupted) => {
                drain(reader, pipeline, format, out, &mut buf, &mut summary)?;
                break;
            }
            Err(err) => return Err(err.into()),
        };
        handle(&buf[..len], pipeline, format, out, &mut summary)?;
    }

    Ok(summary)
}

/// Empties whatever is still queued without blocking.
fn drain<W: Write>(
    reader: &mut ReadSession,
    pipeline: &mut Pipeline,
    format: OutputFormat,
    out: &mut W,
    buf: &mut [u8],
    summary: &mut RunSummary,
) -> Result<()> {
    reader.set_nonblocking(true);
    loop {
        match reader.read(buf) {
            Ok(len) => handle(&buf[..len], pipeline, format, out, summary)?,
            Err(ChannelError::WouldBlock) => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
}

fn handle<W: Write>(
    message: &[u8],
    pipeline: &mut Pipeline,
    format: OutputFormat,
    out: &mut W,
    summary: &mut RunSummary,
) -> Result<()> {
    let line = String::from_utf8_lossy(message);
    let Some(report) = pipeline.process_line(&line) else {
        return Ok(());
    };
    summary.bundles += 1;
    let written = output::write_bundle(out, format, &report)
        .map_err(|err| TouchError::io("write output", err))?;
    summary.records += written as u64;
    Ok(())
}
