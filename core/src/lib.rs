//! Core data model for usage-document argument parsing.
//!
//! This crate defines the foundational types shared by the parser and the
//! CLI front-end:
//!
//! - [`Range`] — a half-open view into the usage document's text. The
//!   document is stored once and every record refers into it by range, so
//!   no substring is ever duplicated.
//! - [`Argument`] — the value bound to one name after matching: an
//!   occurrence count plus the list of captured value strings.
//! - [`ParseFlags`] — per-call switches (prefix resolution, strict
//!   separators, suggestion generation, empty-argument synthesis,
//!   incomplete matching).
//! - [`Diagnostic`] / [`ErrorCode`] — non-fatal findings recorded while
//!   parsing the document or the argv.
//! - [`DocumentError`] — the fatal preflight failures (no `Usage:`
//!   section, several of them, or an unparseable usage pattern).

mod error;
mod range;
mod types;

pub use error::{Diagnostic, DocumentError, ErrorCode};
pub use range::Range;
pub use types::{Argument, ArgumentStatus, ParseFlags};
