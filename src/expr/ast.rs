//! Condition expression AST and its evaluator.
//!
//! Evaluation produces a dynamically typed scalar. Unknown identifiers
//! evaluate to `0`, matching the C preprocessor convention for identifiers
//! left unexpanded in conditions.

use crate::error::ErrorKind;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Str(String),
}

impl Value {
    pub fn truthy(&self) -> bool {
        match self {
            Value::Int(v) => *v != 0,
            Value::Float(v) => *v != 0.0,
            Value::Bool(v) => *v,
            Value::Str(v) => !v.is_empty(),
        }
    }

    fn as_int(&self) -> Result<i64, ErrorKind> {
        match self {
            Value::Int(v) => Ok(*v),
            Value::Float(v) => Ok(*v as i64),
            Value::Bool(v) => Ok(*v as i64),
            Value::Str(s) => Err(ErrorKind::Evaluation(format!(
                "string {s:?} used in numeric context"
            ))),
        }
    }

    fn as_float(&self) -> Result<f64, ErrorKind> {
        match self {
            Value::Int(v) => Ok(*v as f64),
            Value::Float(v) => Ok(*v),
            Value::Bool(v) => Ok(*v as i64 as f64),
            Value::Str(s) => Err(ErrorKind::Evaluation(format!(
                "string {s:?} used in numeric context"
            ))),
        }
    }

    fn is_float(&self) -> bool {
        matches!(self, Value::Float(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Plus,
    Minus,
    Not,
    BitNot,
    PrefixIncrement,
    PrefixDecrement,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Mul,
    Div,
    Mod,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
    BitAnd,
    BitXor,
    BitOr,
    And,
    Or,
}

/// Cast target types. Anything else is rejected at parse time with an
/// evaluation fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    Integer,
    Float,
    Boolean,
    String,
}

impl CastType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "char" | "short" | "int" | "long" => Some(Self::Integer),
            "float" | "double" => Some(Self::Float),
            "bool" => Some(Self::Boolean),
            "string" => Some(Self::String),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Int(i64),
    Str(String),
    Bool(bool),
    Ident(String),
    Unary(UnaryOp, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
    Cast(CastType, Box<Expr>),
}

impl Expr {
    pub fn eval(&self) -> Result<Value, ErrorKind> {
        match self {
            Expr::Int(v) => Ok(Value::Int(*v)),
            Expr::Str(v) => Ok(Value::Str(v.clone())),
            Expr::Bool(v) => Ok(Value::Bool(*v)),
            // Unknown-macro-as-zero.
            Expr::Ident(_) => Ok(Value::Int(0)),
            Expr::Unary(op, value) => eval_unary(*op, &value.eval()?),
            Expr::Binary(op, a, b) => eval_binary(*op, &a.eval()?, &b.eval()?),
            Expr::Cast(ty, value) => eval_cast(*ty, &value.eval()?),
        }
    }
}

fn eval_unary(op: UnaryOp, value: &Value) -> Result<Value, ErrorKind> {
    Ok(match op {
        UnaryOp::Plus => value.clone(),
        UnaryOp::Minus => match value {
            Value::Float(v) => Value::Float(-v),
            _ => Value::Int(-value.as_int()?),
        },
        UnaryOp::Not => Value::Bool(!value.truthy()),
        UnaryOp::BitNot => Value::Int(!value.as_int()?),
        UnaryOp::PrefixIncrement => match value {
            Value::Float(v) => Value::Float(v + 1.0),
            _ => Value::Int(value.as_int()? + 1),
        },
        UnaryOp::PrefixDecrement => match value {
            Value::Float(v) => Value::Float(v - 1.0),
            _ => Value::Int(value.as_int()? - 1),
        },
    })
}

fn eval_binary(op: BinaryOp, a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    Ok(match op {
        BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod | BinaryOp::Add | BinaryOp::Sub => {
            arithmetic(op, a, b)?
        }
        // Shift counts are masked to the operand width, as on common hardware.
        BinaryOp::Shl => Value::Int(a.as_int()?.wrapping_shl(b.as_int()? as u32)),
        BinaryOp::Shr => Value::Int(a.as_int()?.wrapping_shr(b.as_int()? as u32)),
        BinaryOp::BitAnd => Value::Int(a.as_int()? & b.as_int()?),
        BinaryOp::BitXor => Value::Int(a.as_int()? ^ b.as_int()?),
        BinaryOp::BitOr => Value::Int(a.as_int()? | b.as_int()?),
        BinaryOp::And => Value::Bool(a.truthy() && b.truthy()),
        BinaryOp::Or => Value::Bool(a.truthy() || b.truthy()),
        // Equality is type-strict; values of different kinds are unequal.
        BinaryOp::Eq => Value::Bool(a == b),
        BinaryOp::Ne => Value::Bool(a != b),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => compare(op, a, b)?,
    })
}

fn arithmetic(op: BinaryOp, a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    if a.is_float() || b.is_float() {
        let (x, y) = (a.as_float()?, b.as_float()?);
        return Ok(Value::Float(match op {
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
            BinaryOp::Mod => x % y,
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            _ => unreachable!("non-arithmetic operator"),
        }));
    }
    let (x, y) = (a.as_int()?, b.as_int()?);
    Ok(Value::Int(match op {
        BinaryOp::Mul => x * y,
        BinaryOp::Div => x / y,
        BinaryOp::Mod => x % y,
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        _ => unreachable!("non-arithmetic operator"),
    }))
}

fn compare(op: BinaryOp, a: &Value, b: &Value) -> Result<Value, ErrorKind> {
    let ordering = match (a, b) {
        (Value::Str(x), Value::Str(y)) => x.cmp(y),
        _ => {
            let (x, y) = (a.as_float()?, b.as_float()?);
            x.partial_cmp(&y).ok_or_else(|| {
                ErrorKind::Evaluation("incomparable floating point values".to_owned())
            })?
        }
    };
    Ok(Value::Bool(match op {
        BinaryOp::Lt => ordering.is_lt(),
        BinaryOp::Le => ordering.is_le(),
        BinaryOp::Gt => ordering.is_gt(),
        BinaryOp::Ge => ordering.is_ge(),
        _ => unreachable!("non-comparison operator"),
    }))
}

fn eval_cast(ty: CastType, value: &Value) -> Result<Value, ErrorKind> {
    Ok(match ty {
        CastType::Integer => Value::Int(value.as_int()?),
        CastType::Float => Value::Float(value.as_float()?),
        CastType::Boolean => Value::Bool(value.truthy()),
        CastType::String => Value::Str(match value {
            Value::Str(s) => s.clone(),
            Value::Int(v) => v.to_string(),
            Value::Float(v) => v.to_string(),
            Value::Bool(v) => if *v { "1" } else { "" }.to_owned(),
        }),
    })
}
