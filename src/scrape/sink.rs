//! Output sink seam between the scraper and downstream transformation
//!
//! The orchestrator hands each enriched issue to an [`IssueSink`] and knows
//! nothing about how records are serialized or where they end up. The bundled
//! [`JsonlSink`] appends one JSON object per line.

use crate::client::EnrichedIssue;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Receives enriched issues as they are scraped
pub trait IssueSink {
    /// Hands off one issue. The caller marks the issue scraped only after
    /// this returns Ok, so implementations must have durably accepted the
    /// record by then.
    fn emit(&mut self, issue: &EnrichedIssue) -> io::Result<()>;

    /// Flushes any buffered records
    fn flush(&mut self) -> io::Result<()>;
}

/// Sink appending one JSON object per line to a file
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Opens the output file in append mode, creating parent directories
    pub fn open(path: &Path) -> io::Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl IssueSink for JsonlSink {
    fn emit(&mut self, issue: &EnrichedIssue) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, issue)?;
        self.writer.write_all(b"\n")?;
        // Flush per record: the checkpoint marks this issue scraped right
        // after emit returns, and a marked-but-lost record would never be
        // re-fetched.
        self.writer.flush()
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}
