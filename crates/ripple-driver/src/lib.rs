//! Ripple Driver Library
//!
//! Loading of JSON-encoded programs, diagnostic rendering and the host
//! bindings used by the `ripple` binary.

pub mod host;
pub mod load;
pub mod report;

pub use host::{bind_printing_hosts, parse_args};
pub use load::{load_program, load_source};
pub use report::{render_diagnostics, DiagnosticRenderer};
