#![doc = include_str!("../README.md")]

mod castext;
pub mod entry;
pub mod error;
pub mod options;
pub mod session;
pub mod transport;

pub use entry::CasEntry;
pub use error::{ErrorReport, ReportKind};
pub use options::{CasCommands, SessionOptions};
pub use session::{Instantiation, Session, Validity};
pub use transport::{Reply, ReplyRecord, Transport, TransportError};
