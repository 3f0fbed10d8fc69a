// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Quoting-aware command-line tokenizer with no shell interpretation.
//!
//! This tokenizes *before* validating, per the redesigned command-safety
//! model: a command is split into argv first, then checked for dangerous
//! metacharacters appearing *unquoted*, rather than scanning the raw
//! string (which can be fooled by characters inside quotes).

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TokenizeError {
    #[error("unbalanced quote in command")]
    UnbalancedQuote,
}

const DANGEROUS: &[char] = &[';', '&', '|', '`', '$', '(', ')', '<', '>'];

/// Split `command` into argv, honoring single and double quotes. Returns
/// an error on an unterminated quote. Unquoted occurrences of shell
/// metacharacters are rejected by the caller via [`contains_unquoted_metachar`].
pub fn tokenize(command: &str) -> Result<Vec<String>, TokenizeError> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = command.chars().peekable();

    while let Some(c) = chars.next() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None => match c {
                '\'' | '"' => {
                    quote = Some(c);
                    in_token = true;
                }
                c if c.is_whitespace() => {
                    if in_token {
                        tokens.push(std::mem::take(&mut current));
                        in_token = false;
                    }
                }
                c => {
                    current.push(c);
                    in_token = true;
                }
            },
        }
    }

    if quote.is_some() {
        return Err(TokenizeError::UnbalancedQuote);
    }
    if in_token {
        tokens.push(current);
    }
    Ok(tokens)
}

/// True if `command`'s *unquoted* text contains a shell metacharacter.
/// Quoted occurrences (inside `'...'` or `"..."`) are not flagged, since
/// they are inert once tokenized into argv.
pub fn contains_unquoted_metachar(command: &str) -> bool {
    let mut quote: Option<char> = None;
    for c in command.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None => {
                if c == '\'' || c == '"' {
                    quote = Some(c);
                } else if DANGEROUS.contains(&c) {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
#[path = "tokenize_tests.rs"]
mod tests;
