//! Textual formatting options accepted by the schema compiler.
//!
//! Options arrive either from a YAML schema file (camelCase keys) or as
//! `key=value` pairs from the command line. Unknown keys are ignored. Values
//! are kept as raw text here; [`crate::schema::compile`] resolves and validates
//! them.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

pub const FIELD_DELIMITER: &str = "fieldDelimiter";
pub const QUOTE_CHARACTER: &str = "quoteCharacter";
pub const QUOTING_DISABLED: &str = "quotingDisabled";
pub const DISABLE_QUOTE_CHARACTER: &str = "disableQuoteCharacter";
pub const ESCAPE_CHARACTER: &str = "escapeCharacter";
pub const ALLOW_COMMENTS: &str = "allowComments";
pub const ARRAY_ELEMENT_DELIMITER: &str = "arrayElementDelimiter";
pub const NULL_LITERAL: &str = "nullLiteral";
pub const IGNORE_PARSE_ERRORS: &str = "ignoreParseErrors";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormatOptions {
    /// Raw delimiter text; backslash escapes such as `\t` are resolved on compile.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quote_character: Option<String>,
    /// Takes precedence over `quote_character`.
    #[serde(alias = "disableQuoteCharacter")]
    pub quoting_disabled: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub escape_character: Option<String>,
    pub allow_comments: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array_element_delimiter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub null_literal: Option<String>,
    pub ignore_parse_errors: bool,
}

impl FormatOptions {
    /// Builds options from `(key, value)` pairs, later pairs overriding earlier ones.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut options = FormatOptions::default();
        for (key, value) in pairs {
            options.set(key.as_ref(), value)?;
        }
        Ok(options)
    }

    /// Applies a single textual option. Unknown keys are ignored.
    pub fn set(&mut self, key: &str, value: impl Into<String>) -> Result<()> {
        let value = value.into();
        match key {
            FIELD_DELIMITER => self.field_delimiter = Some(value),
            QUOTE_CHARACTER => self.quote_character = Some(value),
            QUOTING_DISABLED | DISABLE_QUOTE_CHARACTER => {
                self.quoting_disabled = parse_flag(key, &value)?
            }
            ESCAPE_CHARACTER => self.escape_character = Some(value),
            ALLOW_COMMENTS => self.allow_comments = parse_flag(key, &value)?,
            ARRAY_ELEMENT_DELIMITER => self.array_element_delimiter = Some(value),
            NULL_LITERAL => self.null_literal = Some(value),
            IGNORE_PARSE_ERRORS => self.ignore_parse_errors = parse_flag(key, &value)?,
            other => debug!("Ignoring unknown format option '{other}'"),
        }
        Ok(())
    }

    /// Parses a `key=value` assignment as accepted on the command line.
    pub fn set_assignment(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment.split_once('=').ok_or_else(|| {
            CodecError::configuration(assignment, "expected an assignment of the form key=value")
        })?;
        self.set(key.trim(), value)
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        other => Err(CodecError::configuration(
            key,
            format!("expected a boolean, found '{other}'"),
        )),
    }
}

/// Resolves backslash escape sequences (`\t`, `\n`, `\\`, `\u0009`, ...) in a
/// configured option string. Unknown sequences are kept verbatim.
pub fn unescape_backslashes(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('b') => out.push('\u{8}'),
            Some('f') => out.push('\u{c}'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) if hex.len() == 4 => out.push(decoded),
                    _ => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}
