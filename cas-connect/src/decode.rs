//! Decoding the engine's printed output into a positional [`Reply`].
//!
//! The batch command makes its own reply self-describing: every clause
//! prints a `{i}=[ error= [` delimiter before the engine's stringified
//! result, and the whole batch is framed by `[TimeStamp= [ {seed} ],
//! Locals= [ ... ] ]`. This module is the other half of that contract and
//! must stay bit-compatible with the command construction in `cas-session`.
//!
//! Record grammar, all fields after `error` optional and in any order:
//!
//! ```text
//! {i}=[ error= [ {text} ], value= [ {text} ], display= [ {text} ],
//!       valid= [ true|false ], answernote= [ {text} ], feedback= [ {text} ] ]
//! ```
//!
//! Field contents are bracket-balanced, so values containing nested
//! brackets (matrices, lists) decode intact. A malformed record is dropped
//! and becomes a missing position — a per-entry failure, never a fatal
//! decode error. Only a reply with no `Locals` frame at all is rejected.

use cas_session::{Reply, ReplyRecord, TransportError};
use tracing::debug;

const LOCALS_FRAME: &str = "], Locals= [";
const RECORD_TAG: &str = "=[ error= [";

/// Decodes raw engine output into positional records.
pub fn decode_reply(raw: &str) -> Result<Reply, TransportError> {
    let frame = raw
        .find(LOCALS_FRAME)
        .ok_or_else(|| TransportError::Decode("output carries no Locals frame".to_string()))?;
    let body = &raw[frame + LOCALS_FRAME.len()..];

    let mut reply = Reply::new();
    let mut pos = 0;
    while let Some(found) = body[pos..].find(RECORD_TAG) {
        let at = pos + found;
        let after = at + RECORD_TAG.len();

        // The position index is the run of digits immediately before the tag.
        let digits_start = body[..at]
            .as_bytes()
            .iter()
            .rposition(|b| !b.is_ascii_digit())
            .map(|i| i + 1)
            .unwrap_or(0);
        let Ok(index) = body[digits_start..at].parse::<usize>() else {
            pos = after;
            continue;
        };

        match decode_record(&body[after..]) {
            Some((record, consumed)) => {
                reply.insert(index, record);
                pos = after + consumed;
            }
            None => {
                debug!(index, "dropping malformed CAS record");
                pos = after;
            }
        }
    }
    Ok(reply)
}

/// Decodes one record starting just inside its `error= [` bracket. Returns
/// the record and how many bytes of `rest` it consumed, through the
/// record's own closing bracket.
fn decode_record(rest: &str) -> Option<(ReplyRecord, usize)> {
    let (error, mut tail) = balanced(rest)?;
    let mut record = ReplyRecord { error: error.trim().to_string(), ..ReplyRecord::default() };

    loop {
        let trimmed = tail.trim_start();
        let Some((name, inner)) = field_start(trimmed) else {
            tail = trimmed;
            break;
        };
        let (content, after) = balanced(inner)?;
        let content = content.trim();
        match name {
            "value" => record.value = Some(content.to_string()),
            "display" => record.display = Some(content.to_string()),
            "valid" => record.valid = content.parse().ok(),
            "answernote" => record.answernote = Some(content.to_string()),
            "feedback" => record.feedback = Some(content.to_string()),
            _ => unreachable!("field_start only yields known names"),
        }
        tail = after;
    }

    let closed = tail.strip_prefix(']')?;
    Some((record, rest.len() - closed.len()))
}

/// Matches the opening of a known field, returning its name and the text
/// just inside its bracket.
fn field_start(rest: &str) -> Option<(&'static str, &str)> {
    for name in ["value", "display", "valid", "answernote", "feedback"] {
        let tag = format!(", {name}= [");
        if let Some(inner) = rest.strip_prefix(&tag) {
            return Some((name, inner));
        }
    }
    None
}

/// Splits `s` at the `]` matching an already-open bracket, returning the
/// content before it and the text after it. `None` when the bracket never
/// closes.
fn balanced(s: &str) -> Option<(&str, &str)> {
    let mut depth = 1usize;
    for (i, c) in s.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}
