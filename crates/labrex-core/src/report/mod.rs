//! Heuristic lab-report parsing: field probes plus a line
//! classification state machine.

mod classify;
mod parser;
mod patterns;

pub use classify::{LineClass, classify};
pub use parser::ReportParser;
