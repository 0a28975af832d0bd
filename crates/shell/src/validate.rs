// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Structural sanity checks for shell command strings, run before a
//! command is persisted in a workflow definition or handed to the
//! execution facility.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("command is empty")]
    Empty,
    #[error("command contains a NUL byte at offset {0}")]
    NulByte(usize),
    #[error("command has an unterminated {0} quote")]
    UnterminatedQuote(char),
}

/// Reject commands that are obviously malformed before they ever reach a
/// shell: empty strings, embedded NUL bytes (which `sh -c` would choke
/// on or silently truncate), and unbalanced quoting. Anything that
/// passes this check is still free to fail at actual execution time —
/// this is a cheap pre-filter, not a shell grammar.
pub fn validate(command: &str) -> Result<(), ValidationError> {
    if command.trim().is_empty() {
        return Err(ValidationError::Empty);
    }
    if let Some(offset) = command.find('\0') {
        return Err(ValidationError::NulByte(offset));
    }

    let mut quote: Option<char> = None;
    let mut escaped = false;
    for ch in command.chars() {
        if escaped {
            escaped = false;
            continue;
        }
        match quote {
            Some(q) if ch == q => quote = None,
            Some('"') if ch == '\\' => escaped = true,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => quote = Some(ch),
                '\\' => escaped = true,
                _ => {}
            },
        }
    }
    if let Some(q) = quote {
        return Err(ValidationError::UnterminatedQuote(q));
    }
    Ok(())
}
