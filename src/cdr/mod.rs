// src/cdr/mod.rs
pub mod framer;
pub mod parser;
pub mod recorder;
pub mod server;

pub use framer::LineFramer;
pub use parser::{parse_cdr_line, ParsedCdr};
pub use recorder::{CdrRecorder, PersistOutcome};
pub use server::{CdrServer, CdrServerHandle};
