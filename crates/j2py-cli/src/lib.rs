//! Command-line driver for the j2py emitter.
//!
//! Reads a JSON event stream, replays it onto a `BuildStack` under the
//! layered configuration named on the command line, and writes the rendered
//! module (or a debug dump of the template tree).

pub mod args;
pub mod driver;
pub mod events;
pub mod tracing_config;
