//! IQ sample sources

use std::fs::File;
use std::io::{self, BufReader, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Context};
use log::info;

use crate::cli::STDIO_FILE;

/// A source of raw IQ sample bytes
///
/// This is the upstream contract the decoder consumes: a synchronous
/// byte read plus an idempotent cancellation request. The SDR driver
/// that would normally sit behind it is out of scope of this build;
/// [`FileSource`] serves files, pipes and captures instead.
pub trait SampleSource {
    /// Read up to `buf.len()` bytes, returning the count read
    ///
    /// Returns `Ok(0)` at end of input or after cancellation.
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Request cancellation (idempotent)
    ///
    /// After cancellation, subsequent reads return `Ok(0)`.
    fn cancel(&self);

    /// True once cancellation has been requested
    fn is_cancelled(&self) -> bool;
}

/// IQ samples from a file or standard input
pub struct FileSource {
    input: Box<dyn Read>,
    cancelled: Arc<AtomicBool>,
}

impl FileSource {
    /// Open the given path, with `"-"` selecting standard input
    pub fn open(path: &str) -> Result<FileSource, anyhow::Error> {
        let input: Box<dyn Read> = if path == STDIO_FILE {
            if stdin_is_terminal() {
                return Err(anyhow!(
                    "cowardly refusing to read IQ samples from a terminal.

Pipe a source of raw interleaved unsigned I/Q bytes from rtl_sdr
or similar into this program."
                ));
            }
            info!("reading IQ samples from standard input");
            Box::new(BufReader::new(io::stdin().lock()))
        } else {
            info!("reading IQ samples from file: \"{}\"", path);
            Box::new(BufReader::new(
                File::open(path).with_context(|| format!("unable to open \"{}\"", path))?,
            ))
        };

        Ok(FileSource {
            input,
            cancelled: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Shared cancellation flag, for wiring into a signal handler
    pub fn cancel_token(&self) -> Arc<AtomicBool> {
        self.cancelled.clone()
    }
}

impl SampleSource for FileSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.is_cancelled() {
            return Ok(0);
        }
        self.input.read(buf)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Relaxed)
    }
}

/// True if standard input is a terminal rather than a pipe or file
///
/// Stdin is the only stream the source ever probes: a terminal cannot
/// supply raw IQ bytes, so reading one is always a mistake.
fn stdin_is_terminal() -> bool {
    let stdin = io::stdin();
    #[cfg(not(target_os = "windows"))]
    {
        use std::os::fd::AsRawFd;
        terminal_size::terminal_size_using_fd(stdin.as_raw_fd()).is_some()
    }
    #[cfg(target_os = "windows")]
    {
        use std::os::windows::io::AsRawHandle;
        terminal_size::terminal_size_using_handle(stdin.as_raw_handle()).is_some()
    }
}
