//! Line-oriented directive recognizer.
//!
//! Raw text is first simplified (line endings normalized, comments stripped)
//! and then matched line by line against the directive patterns in priority
//! order. Anything that is not a directive becomes a [`TokenKind::SourceLine`]
//! token; consecutive source tokens are coalesced into one, which changes
//! nothing observable and just shrinks the stream.
//!
//! A line starting with `#` followed by an unrecognized directive word falls
//! through to the source catch-all rather than failing: the executor decides
//! what to do with unknown text.

use once_cell::sync::Lazy;
use regex::Regex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    QuotedInclude,
    AngleInclude,
    FunctionMacroDecl,
    ObjectMacroDecl,
    Undef,
    IfDef,
    IfNDef,
    EndIf,
    If,
    ElseIf,
    Else,
    Error,
    Warning,
    SourceLine,
    EndOfInput,
}

/// One lexed token. Directive tokens carry their ordered sub-captures
/// (name, parameters, body) in `captures`; source tokens carry none.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub captures: Vec<String>,
    pub offset: usize,
}

impl Token {
    /// The n-th sub-capture, or `""` when it did not participate.
    pub fn capture(&self, index: usize) -> &str {
        self.captures.get(index).map(String::as_str).unwrap_or("")
    }
}

static COMMENTS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)[ \t]*/\*.*?\*/|[ \t]*//[^\n]*").expect("valid comment pattern"));

/// Directive patterns, in priority order. All are anchored to the start of
/// the remaining input and only tried at line starts. The `\\\n` alternation
/// lets a directive's argument text continue across physical lines.
static DIRECTIVES: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    [
        (
            TokenKind::QuotedInclude,
            r#"\A[ \t]*#[ \t]*include[ \t]+"([^"\\\n]*(?:\\.[^"\\\n]*)*)""#,
        ),
        (
            TokenKind::AngleInclude,
            r"\A[ \t]*#[ \t]*include[ \t]+<[ \t]*([^\n]+)[ \t]*>",
        ),
        (
            TokenKind::FunctionMacroDecl,
            r"\A[ \t]*#[ \t]*define[ \t]+(\w+)\(([^\n]+?)\)[ \t]*((?:\\\n|[^\n])+)?",
        ),
        (
            TokenKind::ObjectMacroDecl,
            r"\A[ \t]*#[ \t]*define[ \t]+(\w+)[ \t]*((?:\\\n|[^\n])+)?",
        ),
        (TokenKind::Undef, r"\A[ \t]*#[ \t]*undef[ \t]+(\w+)"),
        (TokenKind::IfDef, r"\A[ \t]*#[ \t]*ifdef\b[ \t]*((?:\\\n|[^\n])+)"),
        (TokenKind::IfNDef, r"\A[ \t]*#[ \t]*ifndef\b[ \t]*((?:\\\n|[^\n])+)"),
        (TokenKind::EndIf, r"\A[ \t]*#[ \t]*endif\b[ \t]*"),
        (TokenKind::If, r"\A[ \t]*#[ \t]*if\b[ \t]*((?:\\\n|[^\n])+)"),
        (TokenKind::ElseIf, r"\A[ \t]*#[ \t]*elif\b[ \t]*((?:\\\n|[^\n])+)"),
        (TokenKind::Else, r"\A[ \t]*#[ \t]*else"),
        (TokenKind::Error, r"\A[ \t]*#[ \t]*error[ \t]+((?:\\\n|[^\n])+)"),
        (TokenKind::Warning, r"\A[ \t]*#[ \t]*warning[ \t]+((?:\\\n|[^\n])+)"),
    ]
    .into_iter()
    .map(|(kind, pattern)| (kind, Regex::new(pattern).expect("valid directive pattern")))
    .collect()
});

/// Normalize line endings and strip comments. This runs before directive
/// matching so that commented-out directives are inert. All later token
/// offsets are relative to the simplified text.
pub fn simplify(content: &str) -> String {
    let content = content.replace("\r\n", "\n").replace('\r', "\n");
    COMMENTS.replace_all(&content, "").into_owned()
}

/// Lex already-simplified text into a gap-free token sequence terminated by
/// [`TokenKind::EndOfInput`].
pub fn lex(content: &str) -> Vec<Token> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut pos = 0;
    let mut at_line_start = true;

    while pos < content.len() {
        let rest = &content[pos..];

        if at_line_start {
            if let Some((kind, end, captures)) = match_directive(rest) {
                tokens.push(Token {
                    kind,
                    value: rest[..end].to_owned(),
                    captures,
                    offset: pos,
                });
                pos += end;
                // Directives stop before their trailing newline; the newline
                // run that follows becomes a source token.
                at_line_start = false;
                continue;
            }
        }

        let (end, next_is_line_start) = match rest.find('\n') {
            Some(0) => (rest.len() - rest.trim_start_matches('\n').len(), true),
            Some(nl) => (nl, false),
            None => (rest.len(), false),
        };
        push_source(&mut tokens, &rest[..end], pos);
        pos += end;
        at_line_start = next_is_line_start;
    }

    tokens.push(Token {
        kind: TokenKind::EndOfInput,
        value: String::new(),
        captures: Vec::new(),
        offset: content.len(),
    });
    tokens
}

fn match_directive(rest: &str) -> Option<(TokenKind, usize, Vec<String>)> {
    for (kind, pattern) in DIRECTIVES.iter() {
        let Some(captures) = pattern.captures(rest) else {
            continue;
        };
        let full = captures.get(0).expect("whole match");

        // `#undef NAME` must span the whole line; trailing garbage falls
        // through to the source catch-all.
        if *kind == TokenKind::Undef {
            let tail = &rest[full.end()..];
            if !(tail.is_empty() || tail.starts_with('\n')) {
                continue;
            }
        }

        let groups = captures
            .iter()
            .skip(1)
            .flatten()
            .map(|m| m.as_str().to_owned())
            .collect();
        return Some((*kind, full.end(), groups));
    }
    None
}

fn push_source(tokens: &mut Vec<Token>, value: &str, offset: usize) {
    if let Some(previous) = tokens.last_mut() {
        if previous.kind == TokenKind::SourceLine {
            previous.value.push_str(value);
            return;
        }
    }
    tokens.push(Token {
        kind: TokenKind::SourceLine,
        value: value.to_owned(),
        captures: Vec::new(),
        offset,
    });
}
