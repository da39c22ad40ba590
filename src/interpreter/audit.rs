use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

/// Header line of a fresh audit log
pub const AUDIT_HEADER: &str = "timestamp,operation,status";

/// Append-only CSV trail of processed operations:
/// `<unix seconds>,<operation line>,<success|failure>`.
pub struct AuditLog<W: Write> {
    writer: W,
}

impl AuditLog<std::fs::File> {
    /// Opens `path` for appending, writing the header if the file is new.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let is_new = !path.as_ref().exists();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        let mut log = Self::new(file);
        if is_new {
            writeln!(log.writer, "{}", AUDIT_HEADER)?;
        }
        Ok(log)
    }
}

impl<W: Write> AuditLog<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Appends one entry stamped with the current time.
    pub fn record(&mut self, operation: &str, success: bool) -> io::Result<()> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        self.record_at(timestamp, operation, success)
    }

    pub fn record_at(&mut self, timestamp: u64, operation: &str, success: bool) -> io::Result<()> {
        let status = if success { "success" } else { "failure" };
        writeln!(self.writer, "{},{},{}", timestamp, operation.trim(), status)?;
        self.writer.flush()
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}
