//! I/O utilities for message scripts.
//!
//! Provides functions for reading and writing the line-oriented script files
//! that feed the demo driver. A script lists the messages a producer pushes,
//! each with the policy used for its push.

/// File loading utilities for message scripts.
///
/// Reads a script from disk and hands its text to the parser, attaching the
/// file path to any error so a bad script is easy to locate.
pub mod loader;

/// Parser for message script lines.
///
/// Parses `push <block|nowait> <type> "<body>"` lines into script entries,
/// skipping blank lines and `#` comments, and renders entries back to text.
pub mod parser;
