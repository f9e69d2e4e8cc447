//! Macro replacement over source text and condition expressions.
//!
//! Replacement walks the registry in its definition order and splices each
//! expansion into the text, resuming the scan after the inserted fragment so
//! a macro never re-expands inside its own output. Object-like macros sit
//! newest first in the registry, so a body that mentions an earlier
//! definition is spliced in before that earlier name is scanned, and the
//! chain resolves fully.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::directives::Registry;
use crate::error::ErrorKind;

/// Where a piece of text came from, which decides how it is rewritten.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    /// Ordinary source lines and directive bodies.
    Source,
    /// `#if` / `#elif` condition text, where `defined` is resolved first.
    Expression,
}

static DEFINED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bdefined\b[ \t]*(?:\([ \t]*(\w+)[ \t]*\)|(\w+))")
        .expect("valid defined pattern")
});

/// Applies every registered macro to `body` and returns the rewritten text.
pub fn replace(body: &str, context: Context, registry: &Registry) -> Result<String, ErrorKind> {
    let mut text = if context == Context::Expression {
        resolve_defined(body, registry)
    } else {
        body.to_string()
    };

    for (name, directive) in registry.snapshot() {
        let mut cursor = 0;
        while let Some(found) = text[cursor..].find(name.as_str()) {
            let start = cursor + found;
            let end = start + name.len();
            if !at_identifier_boundary(&text, start, end) {
                cursor = end;
                continue;
            }
            if directive.max_args() == 0 {
                let replacement = directive.invoke(&name, &[])?;
                text.replace_range(start..end, &replacement);
                cursor = start + replacement.len();
                continue;
            }
            match extract_arguments(&text, end) {
                Some((args, call_end)) => {
                    let replacement = directive.invoke(&name, &args)?;
                    text.replace_range(start..call_end, &replacement);
                    cursor = start + replacement.len();
                }
                // Bare name or an unterminated call, leave it intact.
                None => cursor = end,
            }
        }
    }
    Ok(text)
}

/// Looks up `name` and invokes it, for call sites already parsed elsewhere.
///
/// An unknown name used with arguments is an error, while a bare unknown
/// name passes through untouched so ordinary identifiers survive.
pub fn execute(name: &str, args: &[String], registry: &Registry) -> Result<String, ErrorKind> {
    match registry.find(name) {
        Some(directive) => directive.invoke(name, args),
        None if args.is_empty() => Ok(name.to_string()),
        None => Err(ErrorKind::UnresolvedDirective(name.to_string())),
    }
}

/// Rewrites `defined NAME` and `defined(NAME)` into boolean literals.
fn resolve_defined(body: &str, registry: &Registry) -> String {
    DEFINED
        .replace_all(body, |caps: &Captures| {
            let name = caps
                .get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str())
                .unwrap_or_default();
            if registry.defined(name) {
                "true"
            } else {
                "false"
            }
        })
        .into_owned()
}

fn is_identifier_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

fn at_identifier_boundary(text: &str, start: usize, end: usize) -> bool {
    let bytes = text.as_bytes();
    let clear_before = start == 0 || !is_identifier_byte(bytes[start - 1]);
    let clear_after = end == bytes.len() || !is_identifier_byte(bytes[end]);
    clear_before && clear_after
}

/// Parses a parenthesized argument list starting at `from`, skipping any
/// leading whitespace. Commas split arguments only at the top paren depth.
/// Returns the trimmed arguments and the offset just past the closing paren,
/// or `None` when there is no call or the call never closes.
fn extract_arguments(text: &str, from: usize) -> Option<(Vec<String>, usize)> {
    let bytes = text.as_bytes();
    let mut pos = from;
    while pos < bytes.len() && (bytes[pos] == b' ' || bytes[pos] == b'\t') {
        pos += 1;
    }
    if pos >= bytes.len() || bytes[pos] != b'(' {
        return None;
    }
    pos += 1;

    let mut args = Vec::new();
    let mut depth = 1usize;
    let mut arg_start = pos;
    while pos < bytes.len() {
        match bytes[pos] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    args.push(text[arg_start..pos].trim().to_string());
                    return Some((args, pos + 1));
                }
            }
            b',' if depth == 1 => {
                args.push(text[arg_start..pos].trim().to_string());
                arg_start = pos + 1;
            }
            _ => {}
        }
        pos += 1;
    }
    None
}
