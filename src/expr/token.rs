//! Tokenizer for the `#if`/`#elif` condition sublanguage.

use nom::branch::alt;
use nom::bytes::complete::{tag, take_while, take_while1};
use nom::character::complete::{digit1, hex_digit1, oct_digit1};
use nom::combinator::map;
use nom::IResult;

#[derive(Debug, Clone, PartialEq)]
pub enum ExprToken {
    Int(i64),
    Str(String),
    Bool(bool),
    Ident(String),
    Punct(Punct),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    OrOr,
    AndAnd,
    Shl,
    Shr,
    EqEq,
    NotEq,
    Ge,
    Le,
    Gt,
    Lt,
    PlusPlus,
    MinusMinus,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    Not,
    OpenParen,
    CloseParen,
}

pub fn tokenize(input: &str) -> Result<Vec<ExprToken>, String> {
    let mut tokens = Vec::new();
    let mut rest = input.trim_start();
    while !rest.is_empty() {
        match token(rest) {
            Ok((remaining, token)) => {
                tokens.push(token);
                rest = remaining.trim_start();
            }
            Err(_) => {
                return Err(format!("unexpected input at {rest:?}"));
            }
        }
    }
    Ok(tokens)
}

fn token(input: &str) -> IResult<&str, ExprToken> {
    alt((constant, string_literal, char_constant, word, punct))(input)
}

/// Integer constants in hex, binary, octal or decimal notation. An optional
/// case-insensitive `u`/`l` suffix run is recognized but does not change the
/// evaluated value.
fn constant(input: &str) -> IResult<&str, ExprToken> {
    let (rest, value) = alt((hex_constant, bin_constant, oct_constant, dec_constant))(input)?;
    let (rest, _suffix) = integer_suffix(rest)?;
    Ok((rest, ExprToken::Int(value)))
}

fn hex_constant(input: &str) -> IResult<&str, i64> {
    let (rest, _) = tag("0x")(input)?;
    let (rest, digits) = hex_digit1(rest)?;
    Ok((rest, from_radix(digits, 16, input)?))
}

fn bin_constant(input: &str) -> IResult<&str, i64> {
    let (rest, _) = tag("0b")(input)?;
    let (rest, digits) = take_while1(|c| c == '0' || c == '1')(rest)?;
    Ok((rest, from_radix(digits, 2, input)?))
}

fn oct_constant(input: &str) -> IResult<&str, i64> {
    let (rest, _) = tag("0")(input)?;
    let (rest, digits) = oct_digit1(rest)?;
    Ok((rest, from_radix(digits, 8, input)?))
}

fn dec_constant(input: &str) -> IResult<&str, i64> {
    let (rest, digits) = digit1(input)?;
    Ok((rest, from_radix(digits, 10, input)?))
}

fn from_radix<'a>(
    digits: &str,
    radix: u32,
    input: &'a str,
) -> Result<i64, nom::Err<nom::error::Error<&'a str>>> {
    i64::from_str_radix(digits, radix).map_err(|_| {
        nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Digit))
    })
}

fn integer_suffix(input: &str) -> IResult<&str, &str> {
    take_while(|c| matches!(c, 'u' | 'U' | 'l' | 'L'))(input)
}

/// `"..."` with the C simple-escape sequences resolved. A leading `L` wide
/// marker is accepted and ignored.
fn string_literal(input: &str) -> IResult<&str, ExprToken> {
    let rest = input.strip_prefix('L').unwrap_or(input);
    let (rest, body) = quoted(rest, '"')?;
    Ok((rest, ExprToken::Str(resolve_escapes(&body))))
}

/// `'c'`, evaluating to the character's code as in C.
fn char_constant(input: &str) -> IResult<&str, ExprToken> {
    let rest = input.strip_prefix('L').unwrap_or(input);
    let (rest, body) = quoted(rest, '\'')?;
    let resolved = resolve_escapes(&body);
    let value = resolved.chars().next().map(|c| c as i64).unwrap_or(0);
    Ok((rest, ExprToken::Int(value)))
}

fn quoted(input: &str, delimiter: char) -> IResult<&str, String> {
    let error = || nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag));
    let mut chars = input.char_indices();
    match chars.next() {
        Some((_, c)) if c == delimiter => {}
        _ => return Err(error()),
    }
    let mut body = String::new();
    let mut escaped = false;
    for (i, c) in chars {
        if escaped {
            body.push('\\');
            body.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == delimiter {
            return Ok((&input[i + c.len_utf8()..], body));
        } else {
            body.push(c);
        }
    }
    Err(error())
}

fn resolve_escapes(body: &str) -> String {
    const SEQUENCES: &[(&str, &str)] = &[
        ("\\\\", "\\"),
        ("\\\"", "\""),
        ("\\'", "'"),
        ("\\?", "?"),
        ("\\a", "\u{0007}"),
        ("\\b", "\u{0008}"),
        ("\\f", "\u{000C}"),
        ("\\n", "\n"),
        ("\\r", "\r"),
        ("\\t", "\t"),
        ("\\v", "\u{000B}"),
    ];
    let mut out = body.to_owned();
    for (from, to) in SEQUENCES {
        out = out.replace(from, to);
    }
    out
}

/// Identifiers and the keyword literals `true`/`false`. Unknown identifiers
/// survive tokenization; the evaluator treats them as `0`.
fn word(input: &str) -> IResult<&str, ExprToken> {
    let (rest, start) = take_while1(|c: char| c.is_ascii_alphabetic() || c == '_')(input)?;
    let (rest, tail) = take_while(|c: char| c.is_ascii_alphanumeric() || c == '_')(rest)?;
    let name = &input[..start.len() + tail.len()];
    let token = match name {
        "true" => ExprToken::Bool(true),
        "false" => ExprToken::Bool(false),
        _ => ExprToken::Ident(name.to_owned()),
    };
    Ok((rest, token))
}

fn punct(input: &str) -> IResult<&str, ExprToken> {
    use Punct::*;
    map(
        alt((
            alt((
                map(tag("||"), |_| OrOr),
                map(tag("&&"), |_| AndAnd),
                map(tag("<<"), |_| Shl),
                map(tag(">>"), |_| Shr),
                map(tag("=="), |_| EqEq),
                map(tag("!="), |_| NotEq),
                map(tag(">="), |_| Ge),
                map(tag("<="), |_| Le),
                map(tag("++"), |_| PlusPlus),
                map(tag("--"), |_| MinusMinus),
            )),
            alt((
                map(tag(">"), |_| Gt),
                map(tag("<"), |_| Lt),
                map(tag("+"), |_| Plus),
                map(tag("-"), |_| Minus),
                map(tag("*"), |_| Star),
                map(tag("/"), |_| Slash),
                map(tag("%"), |_| Percent),
                map(tag("&"), |_| Amp),
                map(tag("|"), |_| Pipe),
                map(tag("^"), |_| Caret),
                map(tag("~"), |_| Tilde),
                map(tag("!"), |_| Not),
                map(tag("("), |_| OpenParen),
                map(tag(")"), |_| CloseParen),
            )),
        )),
        ExprToken::Punct,
    )(input)
}
