//! Hand-written recursive-descent parser for condition expressions.
//!
//! Binding, tightest first: primary, unary prefix, cast, multiplicative,
//! additive, shift, relational-and-equality (one shared level), `&`, `^`,
//! `|`, `&&`, `||`. Relational and equality operators sharing a level is a
//! deliberate deviation from strict C precedence, kept for compatibility
//! with the grammar this evaluator replaces.

use crate::error::ErrorKind;

use super::ast::{BinaryOp, CastType, Expr, UnaryOp};
use super::token::{ExprToken, Punct};

pub fn parse(tokens: &[ExprToken]) -> Result<Expr, ErrorKind> {
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression()?;
    if parser.pos != tokens.len() {
        return Err(ErrorKind::Evaluation(format!(
            "unexpected trailing tokens at position {}",
            parser.pos
        )));
    }
    Ok(expr)
}

struct Parser<'a> {
    tokens: &'a [ExprToken],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn peek(&self) -> Option<&'a ExprToken> {
        self.tokens.get(self.pos)
    }

    fn peek_punct(&self) -> Option<Punct> {
        match self.peek() {
            Some(ExprToken::Punct(p)) => Some(*p),
            _ => None,
        }
    }

    fn bump(&mut self) -> Option<&'a ExprToken> {
        let token = self.tokens.get(self.pos);
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, punct: Punct) -> bool {
        if self.peek_punct() == Some(punct) {
            self.pos += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, punct: Punct) -> Result<(), ErrorKind> {
        if self.eat(punct) {
            Ok(())
        } else {
            Err(ErrorKind::Evaluation(format!(
                "expected {punct:?} at position {}",
                self.pos
            )))
        }
    }

    fn expression(&mut self) -> Result<Expr, ErrorKind> {
        self.logical_or()
    }

    fn logical_or(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.logical_and()?;
        while self.eat(Punct::OrOr) {
            let rhs = self.logical_and()?;
            expr = Expr::Binary(BinaryOp::Or, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn logical_and(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.bitwise_or()?;
        while self.eat(Punct::AndAnd) {
            let rhs = self.bitwise_or()?;
            expr = Expr::Binary(BinaryOp::And, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn bitwise_or(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.bitwise_xor()?;
        while self.eat(Punct::Pipe) {
            let rhs = self.bitwise_xor()?;
            expr = Expr::Binary(BinaryOp::BitOr, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn bitwise_xor(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.bitwise_and()?;
        while self.eat(Punct::Caret) {
            let rhs = self.bitwise_and()?;
            expr = Expr::Binary(BinaryOp::BitXor, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    fn bitwise_and(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.comparison()?;
        while self.eat(Punct::Amp) {
            let rhs = self.comparison()?;
            expr = Expr::Binary(BinaryOp::BitAnd, Box::new(expr), Box::new(rhs));
        }
        Ok(expr)
    }

    /// Relational and equality operators, folded at one precedence level.
    fn comparison(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.shift()?;
        loop {
            let op = match self.peek_punct() {
                Some(Punct::EqEq) => BinaryOp::Eq,
                Some(Punct::NotEq) => BinaryOp::Ne,
                Some(Punct::Lt) => BinaryOp::Lt,
                Some(Punct::Le) => BinaryOp::Le,
                Some(Punct::Gt) => BinaryOp::Gt,
                Some(Punct::Ge) => BinaryOp::Ge,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.shift()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
    }

    fn shift(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.additive()?;
        loop {
            let op = match self.peek_punct() {
                Some(Punct::Shl) => BinaryOp::Shl,
                Some(Punct::Shr) => BinaryOp::Shr,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.additive()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
    }

    fn additive(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.multiplicative()?;
        loop {
            let op = match self.peek_punct() {
                Some(Punct::Plus) => BinaryOp::Add,
                Some(Punct::Minus) => BinaryOp::Sub,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.multiplicative()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
    }

    fn multiplicative(&mut self) -> Result<Expr, ErrorKind> {
        let mut expr = self.cast()?;
        loop {
            let op = match self.peek_punct() {
                Some(Punct::Star) => BinaryOp::Mul,
                Some(Punct::Slash) => BinaryOp::Div,
                Some(Punct::Percent) => BinaryOp::Mod,
                _ => return Ok(expr),
            };
            self.pos += 1;
            let rhs = self.cast()?;
            expr = Expr::Binary(op, Box::new(expr), Box::new(rhs));
        }
    }

    /// `(type) expr`, distinguished from a parenthesized expression by the
    /// parenthesized single identifier being followed by an operand.
    fn cast(&mut self) -> Result<Expr, ErrorKind> {
        if self.peek_punct() == Some(Punct::OpenParen) {
            if let Some((name, after)) = self.cast_prefix() {
                let ty = CastType::from_name(&name)
                    .ok_or_else(|| ErrorKind::Evaluation(format!("can not cast to {name}")))?;
                self.pos = after;
                let value = self.cast()?;
                return Ok(Expr::Cast(ty, Box::new(value)));
            }
        }
        self.unary()
    }

    /// Lookahead for `( IDENT )` followed by the start of an operand.
    fn cast_prefix(&self) -> Option<(String, usize)> {
        let name = match self.tokens.get(self.pos + 1) {
            Some(ExprToken::Ident(name)) => name.clone(),
            _ => return None,
        };
        match self.tokens.get(self.pos + 2) {
            Some(ExprToken::Punct(Punct::CloseParen)) => {}
            _ => return None,
        }
        let operand_start = match self.tokens.get(self.pos + 3) {
            Some(ExprToken::Punct(p)) => matches!(
                p,
                Punct::OpenParen
                    | Punct::Plus
                    | Punct::Minus
                    | Punct::Not
                    | Punct::Tilde
                    | Punct::PlusPlus
                    | Punct::MinusMinus
            ),
            Some(_) => true,
            None => false,
        };
        operand_start.then_some((name, self.pos + 3))
    }

    fn unary(&mut self) -> Result<Expr, ErrorKind> {
        let op = match self.peek_punct() {
            Some(Punct::PlusPlus) => Some(UnaryOp::PrefixIncrement),
            Some(Punct::MinusMinus) => Some(UnaryOp::PrefixDecrement),
            Some(Punct::Plus) => Some(UnaryOp::Plus),
            Some(Punct::Minus) => Some(UnaryOp::Minus),
            Some(Punct::Not) => Some(UnaryOp::Not),
            Some(Punct::Tilde) => Some(UnaryOp::BitNot),
            _ => None,
        };
        if let Some(op) = op {
            self.pos += 1;
            let value = self.unary()?;
            return Ok(Expr::Unary(op, Box::new(value)));
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<Expr, ErrorKind> {
        match self.bump() {
            Some(ExprToken::Int(v)) => Ok(Expr::Int(*v)),
            Some(ExprToken::Str(v)) => Ok(Expr::Str(v.clone())),
            Some(ExprToken::Bool(v)) => Ok(Expr::Bool(*v)),
            Some(ExprToken::Ident(name)) => Ok(Expr::Ident(name.clone())),
            Some(ExprToken::Punct(Punct::OpenParen)) => {
                let expr = self.expression()?;
                self.expect(Punct::CloseParen)?;
                Ok(expr)
            }
            other => Err(ErrorKind::Evaluation(format!(
                "expected an operand, found {other:?}"
            ))),
        }
    }
}

#[cfg(test)]
mod test {
    use super::super::evaluate;
    use super::super::Value;

    fn eval(input: &str) -> Value {
        evaluate(input).expect("expression should evaluate")
    }

    #[test]
    fn test_precedence_of_arithmetic() {
        assert_eq!(eval("(1+2)*3"), Value::Int(9));
        assert_eq!(eval("1+2*3"), Value::Int(7));
    }

    #[test]
    fn test_shift_binds_tighter_than_comparison() {
        // (1 << 3) == 8
        assert_eq!(eval("1 << 3 == 8"), Value::Bool(true));
    }

    #[test]
    fn test_relational_and_equality_share_a_level() {
        // Folded level, left associative: (((1 < 2) == true) != false)
        assert_eq!(eval("1 < 2 == true != false"), Value::Bool(true));
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(eval("1 && 0"), Value::Bool(false));
        assert_eq!(eval("1 || 0"), Value::Bool(true));
        assert_eq!(eval("!0 && !!1"), Value::Bool(true));
    }

    #[test]
    fn test_bitwise_levels() {
        // & tighter than ^ tighter than |
        assert_eq!(eval("1 | 2 ^ 3 & 5"), Value::Int(3));
    }

    #[test]
    fn test_unary_operators() {
        assert_eq!(eval("-3 + +5"), Value::Int(2));
        assert_eq!(eval("~0"), Value::Int(-1));
        assert_eq!(eval("++4"), Value::Int(5));
        assert_eq!(eval("--4"), Value::Int(3));
    }

    #[test]
    fn test_casts() {
        assert_eq!(eval("(int)true"), Value::Int(1));
        assert_eq!(eval("(bool)3"), Value::Bool(true));
        assert_eq!(eval("(long)'A'"), Value::Int(65));
    }

    #[test]
    fn test_unsupported_cast_type_is_an_error() {
        assert!(evaluate("(struct)1").is_err());
    }

    #[test]
    fn test_parenthesized_identifier_is_not_a_cast() {
        assert_eq!(eval("(UNKNOWN)"), Value::Int(0));
    }

    #[test]
    fn test_unknown_identifier_is_zero() {
        assert_eq!(eval("UNKNOWN + 1"), Value::Int(1));
    }

    #[test]
    fn test_string_comparison() {
        assert_eq!(eval("\"abc\" == \"abc\""), Value::Bool(true));
        assert_eq!(eval("\"abc\" < \"abd\""), Value::Bool(true));
    }

    #[test]
    fn test_trailing_garbage_is_rejected() {
        assert!(evaluate("1 2").is_err());
        assert!(evaluate("(1").is_err());
    }
}
