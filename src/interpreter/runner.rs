use std::io::{self, BufRead, Write};

use log::{debug, warn};

use crate::archive::Archive;
use crate::common::Result as ArchiveResult;

use super::{AuditLog, Command};

/// What happened to one script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Blank line or comment
    Skipped,
    Success,
    /// The archive rejected the operation or found nothing
    Failure(String),
    /// The line names no known operation
    Malformed(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

/// Counts of line outcomes over a whole script.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub succeeded: usize,
    pub failed: usize,
    pub malformed: usize,
    pub skipped: usize,
}

/// Executes script lines against an archive.
///
/// Found records go to `output`, one per line, values separated by spaces.
/// Lines that name no known operation are reported to `output` with their
/// line number. Every other failure only shows up in the audit log, which
/// gets one entry per line that is not skipped.
pub struct Interpreter<O: Write, A: Write> {
    archive: Archive,
    output: O,
    audit: AuditLog<A>,
}

impl<O: Write, A: Write> Interpreter<O, A> {
    pub fn new(archive: Archive, output: O, audit: AuditLog<A>) -> Self {
        Self {
            archive,
            output,
            audit,
        }
    }

    /// Runs every line of `input`. Only failures to read the script or to
    /// write the output and audit sinks stop the run.
    pub fn run<R: BufRead>(&mut self, input: R) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();
        for (i, line) in input.lines().enumerate() {
            match self.run_line(i + 1, &line?)? {
                Outcome::Skipped => summary.skipped += 1,
                Outcome::Success => summary.succeeded += 1,
                Outcome::Failure(_) => summary.failed += 1,
                Outcome::Malformed(_) => summary.malformed += 1,
            }
        }
        self.output.flush()?;
        Ok(summary)
    }

    /// Runs a single script line.
    pub fn run_line(&mut self, line_num: usize, line: &str) -> io::Result<Outcome> {
        if Command::is_skippable(line) {
            return Ok(Outcome::Skipped);
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) if e.is_malformed() => {
                let message = format!("Invalid operation format: {}", e);
                warn!("Line {}: {}", line_num, message);
                writeln!(self.output, "Line {}: Failed - {}", line_num, message)?;
                self.audit.record(line, false)?;
                return Ok(Outcome::Malformed(message));
            }
            Err(e) => {
                warn!("Line {}: {}", line_num, e);
                self.audit.record(line, false)?;
                return Ok(Outcome::Failure(e.to_string()));
            }
        };

        debug!("Line {}: {:?}", line_num, command);
        let outcome = match self.execute(&command) {
            Ok(Some(record)) => {
                writeln!(self.output, "{}", record)?;
                Outcome::Success
            }
            Ok(None) => Outcome::Success,
            Err(message) => {
                warn!("Line {}: {}", line_num, message);
                Outcome::Failure(message)
            }
        };
        self.audit.record(line, outcome.is_success())?;
        Ok(outcome)
    }

    /// Returns the output line of a successful search, `Ok(None)` for other
    /// successes and the failure message otherwise.
    fn execute(&mut self, command: &Command) -> Result<Option<String>, String> {
        let result: ArchiveResult<std::result::Result<Option<String>, String>> = match command {
            Command::CreateType {
                type_name,
                primary_key,
                fields,
            } => self
                .archive
                .create_type(type_name, fields.as_slice(), primary_key - 1)
                .map(|_| Ok(None)),
            Command::CreateRecord { type_name, values } => self
                .archive
                .create_record_tokens(type_name, values.as_slice())
                .map(|_| Ok(None)),
            Command::SearchRecord { type_name, key } => {
                self.archive
                    .search_record_token(type_name, key)
                    .map(|found| match found {
                        Some(values) => Ok(Some(
                            values
                                .iter()
                                .map(|v| v.to_string())
                                .collect::<Vec<_>>()
                                .join(" "),
                        )),
                        None => Err("No matching records found".to_string()),
                    })
            }
            Command::DeleteRecord { type_name, key } => self
                .archive
                .delete_record_token(type_name, key)
                .map(|removed| {
                    if removed {
                        Ok(None)
                    } else {
                        Err("No matching record found".to_string())
                    }
                }),
        };
        result.map_err(|e| e.to_string())?
    }
}
