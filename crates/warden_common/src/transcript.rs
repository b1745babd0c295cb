//! Session transcript
//!
//! Duplicates every console line into the session log file. The terminal gets
//! the styled line, the file gets it with ANSI codes stripped. Clones share one
//! file handle, so lines stay in the order they were produced.

use crate::error::{WardenError, WardenResult};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

/// Whether transcript lines are also shown on the terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Echo {
    Console,
    Silent,
}

struct Inner {
    file: File,
    echo: Echo,
    terminal: Box<dyn Write + Send>,
}

/// Append-only session log shared by the pipeline and the diagnostic logger
#[derive(Clone)]
pub struct Transcript {
    inner: Arc<Mutex<Inner>>,
    path: Arc<PathBuf>,
}

impl fmt::Debug for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcript")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl Transcript {
    /// Create the session log. The file must not exist yet: two sessions never
    /// share a log.
    pub fn create(path: &Path, echo: Echo) -> WardenResult<Self> {
        Self::open(path, echo, Box::new(io::stdout()))
    }

    /// Like [`Transcript::create`] with echo on, sending terminal lines to
    /// `terminal` instead of stdout
    pub fn with_terminal(path: &Path, terminal: Box<dyn Write + Send>) -> WardenResult<Self> {
        Self::open(path, Echo::Console, terminal)
    }

    fn open(path: &Path, echo: Echo, terminal: Box<dyn Write + Send>) -> WardenResult<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(path)
            .map_err(|e| match e.kind() {
                ErrorKind::AlreadyExists => WardenError::SessionClash(path.to_path_buf()),
                _ => WardenError::Io(e),
            })?;

        Ok(Self {
            inner: Arc::new(Mutex::new(Inner {
                file,
                echo,
                terminal,
            })),
            path: Arc::new(path.to_path_buf()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write one line to the terminal (stdout) and the log.
    ///
    /// Neither a failing log write nor a closed terminal interrupts the run;
    /// each side gets the line if it can take it.
    pub fn line(&self, styled: &str) {
        let mut inner = self.lock();
        if inner.echo == Echo::Console {
            let _ = writeln!(inner.terminal, "{}", styled);
        }
        let plain = console::strip_ansi_codes(styled);
        let _ = writeln!(inner.file, "{}", plain);
    }

    /// Write a line to the log only (for text the terminal already shows,
    /// such as an answered prompt)
    pub fn record(&self, text: &str) {
        let mut inner = self.lock();
        let _ = writeln!(inner.file, "{}", console::strip_ansi_codes(text));
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Raw writer used by the diagnostic logger: terminal stderr plus the log.
impl Write for Transcript {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut inner = self.lock();
        if inner.echo == Echo::Console {
            let _ = io::stderr().write_all(buf);
        }
        let text = String::from_utf8_lossy(buf);
        inner
            .file
            .write_all(console::strip_ansi_codes(&text).as_bytes())?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.lock().file.flush()
    }
}
