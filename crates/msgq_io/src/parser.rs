//! Parser for message script files.
//!
//! Each non-blank, non-comment line describes one push:
//!
//! ```text
//! # comment
//! push block 1 "hello, world!"
//! push nowait 2 "byebye"
//! ```
//!
//! Bodies are double-quoted and may contain `\"` and `\\` escapes.

use anyhow::{Context, Result, anyhow};
use msgq_common::message::Message;
use msgq_core::Policy;
use nom::IResult;
use nom::branch::alt;
use nom::bytes::complete::{escaped_transform, is_not, tag, tag_no_case};
use nom::character::complete::{char, i32 as int32, space0, space1};
use nom::combinator::{all_consuming, map, opt, value};
use nom::sequence::delimited;

/// One push described by a script line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    pub policy: Policy,
    pub message: Message,
}

fn policy(input: &str) -> IResult<&str, Policy> {
    alt((
        value(Policy::Block, tag_no_case("block")),
        value(Policy::NoWait, tag_no_case("nowait")),
    ))(input)
}

fn quoted_body(input: &str) -> IResult<&str, String> {
    delimited(
        char('"'),
        map(
            opt(escaped_transform(
                is_not("\\\""),
                '\\',
                alt((value("\\", tag("\\")), value("\"", tag("\"")))),
            )),
            Option::unwrap_or_default,
        ),
        char('"'),
    )(input)
}

fn push_line(input: &str) -> IResult<&str, (Policy, i32, String)> {
    let (input, _) = tag("push")(input)?;
    let (input, _) = space1(input)?;
    let (input, policy) = policy(input)?;
    let (input, _) = space1(input)?;
    let (input, msg_type) = int32(input)?;
    let (input, _) = space1(input)?;
    let (input, body) = quoted_body(input)?;
    let (input, _) = space0(input)?;
    Ok((input, (policy, msg_type, body)))
}

/// Parses a single script line.
///
/// # Returns
///
/// `Ok(None)` for blank and comment lines, the entry for a push line, or an
/// error for anything else (including a body over the length limit).
pub fn parse_line(line: &str) -> Result<Option<ScriptEntry>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }

    let (_, (policy, msg_type, body)) = all_consuming(push_line)(trimmed)
        .map_err(|err| anyhow!("malformed push line: {err}"))?;
    let message = Message::new(msg_type, body)?;
    Ok(Some(ScriptEntry { policy, message }))
}

/// Parses a whole script, reporting the 1-based number of the first bad line.
pub fn parse_script(text: &str) -> Result<Vec<ScriptEntry>> {
    let mut entries = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if let Some(entry) = parse_line(line).with_context(|| format!("line {}", idx + 1))? {
            entries.push(entry);
        }
    }
    Ok(entries)
}

/// Renders an entry as a script line that [`parse_line`] accepts.
pub fn render_line(entry: &ScriptEntry) -> String {
    let policy = match entry.policy {
        Policy::Block => "block",
        Policy::NoWait => "nowait",
    };
    let body = entry
        .message
        .body()
        .replace('\\', "\\\\")
        .replace('"', "\\\"");
    format!("push {} {} \"{}\"", policy, entry.message.msg_type, body)
}
