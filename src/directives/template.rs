//! Compilation of function-like macro bodies.
//!
//! Each formal parameter occurrence in the body is rewritten into a NUL-framed
//! positional placeholder. The forms are attempted in order: stringize
//! (`#param`), left token-paste (`##param`, optionally followed by another
//! `##`), right token-paste (`param##`), and finally a bare reference. Paste
//! markers are removed entirely so that the substituted argument text ends up
//! directly adjacent to the neighboring source text: the adjacency *is* the
//! paste, no further processing is required.

/// A compiled macro body. Rendering is a plain text substitution of each
/// placeholder with the corresponding actual argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
}

impl Template {
    pub fn compile(body: &str, params: &[String]) -> Self {
        let mut text = body.to_owned();
        for (index, name) in params.iter().enumerate() {
            text = replace_param(&text, index, name);
        }
        Self { text }
    }

    pub fn render(&self, args: &[String]) -> String {
        let mut out = self.text.clone();
        for (index, arg) in args.iter().enumerate() {
            out = out.replace(&placeholder(index), arg.trim());
        }
        out
    }
}

fn placeholder(index: usize) -> String {
    format!("\u{0}{index}\u{0}")
}

fn is_name_char(c: Option<char>) -> bool {
    matches!(c, Some(c) if c.is_ascii_alphanumeric() || c == '_')
}

fn replace_param(body: &str, index: usize, name: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut pos = 0;
    while pos < body.len() {
        match match_form(body, pos, name) {
            Some((consumed, Form::Stringize)) => {
                out.push('"');
                out.push_str(&placeholder(index));
                out.push('"');
                pos += consumed;
            }
            Some((consumed, _)) => {
                out.push_str(&placeholder(index));
                pos += consumed;
            }
            None => {
                let c = body[pos..].chars().next().expect("in-bounds char");
                out.push(c);
                pos += c.len_utf8();
            }
        }
    }
    out
}

#[derive(Clone, Copy)]
enum Form {
    Stringize,
    ConcatLeft,
    ConcatRight,
    Bare,
}

/// Try to match one parameter form at `pos`, returning the matched byte
/// length. Matches are rejected when the parameter name is embedded in a
/// longer identifier.
fn match_form(body: &str, pos: usize, name: &str) -> Option<(usize, Form)> {
    let rest = &body[pos..];
    let before = body[..pos].chars().next_back();

    if let Some(rest) = rest.strip_prefix("##") {
        let after_ws = skip_blank(rest);
        // `## #param` still stringizes; the paste marker adds nothing.
        if let Some(stringized) = after_ws.strip_prefix('#') {
            let inner = skip_blank(stringized);
            if let Some(tail) = after_ws_name(inner, name) {
                if !is_name_char(tail.chars().next()) {
                    let consumed = 2 + (rest.len() - after_ws.len()) + 1
                        + (stringized.len() - inner.len())
                        + name.len();
                    return Some((consumed, Form::Stringize));
                }
            }
            return None;
        }
        if let Some(tail) = after_ws_name(after_ws, name) {
            // An optional trailing `##` is swallowed together with the name.
            let mut consumed = 2 + (rest.len() - after_ws.len()) + name.len();
            let tail_ws = skip_blank(tail);
            if tail_ws.starts_with("##") {
                consumed += (tail.len() - tail_ws.len()) + 2;
                return Some((consumed, Form::ConcatLeft));
            }
            if !is_name_char(tail.chars().next()) {
                return Some((consumed, Form::ConcatLeft));
            }
        }
        return None;
    }

    if let Some(rest) = rest.strip_prefix('#') {
        let after_ws = skip_blank(rest);
        if let Some(tail) = after_ws_name(after_ws, name) {
            if !is_name_char(tail.chars().next()) {
                let consumed = 1 + (rest.len() - after_ws.len()) + name.len();
                return Some((consumed, Form::Stringize));
            }
        }
        return None;
    }

    if let Some(tail) = rest.strip_prefix(name) {
        if is_name_char(before) {
            return None;
        }
        let tail_ws = skip_blank(tail);
        if tail_ws.starts_with("##") {
            let consumed = name.len() + (tail.len() - tail_ws.len()) + 2;
            return Some((consumed, Form::ConcatRight));
        }
        if !is_name_char(tail.chars().next()) {
            return Some((name.len(), Form::Bare));
        }
    }

    None
}

fn skip_blank(input: &str) -> &str {
    input.trim_start_matches([' ', '\t'])
}

fn after_ws_name<'a>(input: &'a str, name: &str) -> Option<&'a str> {
    input.strip_prefix(name)
}
