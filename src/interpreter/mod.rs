//! Line-oriented command interpreter driving an [`Archive`](crate::Archive).
//!
//! The interpreter tokenizes each script line, hands the tokens to the
//! archive, writes found records to an output sink and appends one line per
//! operation to an audit log.

mod audit;
mod command;
mod runner;

pub use audit::AuditLog;
pub use command::{Command, CommandError};
pub use runner::{Interpreter, Outcome, RunSummary};
