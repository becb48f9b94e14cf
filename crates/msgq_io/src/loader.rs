use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::parser::{self, ScriptEntry};

/// Loads a message script from disk.
pub fn load_script<P: AsRef<Path>>(path: P) -> Result<Vec<ScriptEntry>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to open script {}", path.display()))?;
    parser::parse_script(&text).with_context(|| format!("Invalid script {}", path.display()))
}

/// Writes entries as a script, one line each, preceded by a header comment.
pub fn save_script<P: AsRef<Path>>(path: P, entries: &[ScriptEntry]) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create script {}", path.display()))?;
    let mut out = BufWriter::new(file);
    writeln!(out, "# {} messages", entries.len())?;
    for entry in entries {
        writeln!(out, "{}", parser::render_line(entry))?;
    }
    out.flush()?;
    Ok(())
}
