// src/models/mod.rs
pub mod call;

pub use call::{CallRecord, Direction};
