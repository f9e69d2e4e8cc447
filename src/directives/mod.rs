//! Macro definitions: the three directive variants and the ordered registry
//! they live in.

mod registry;
mod template;

pub use registry::Registry;

use once_cell::unsync::OnceCell;

use crate::error::ErrorKind;
use template::Template;

pub type NativeCallback = dyn Fn(&[String]) -> String;

/// A registered macro. Which variant a `#define` produces is decided by the
/// caller at definition time; there is no runtime value inspection.
pub enum Directive {
    ObjectLike(ObjectLike),
    FunctionLike(FunctionLike),
    Native(Native),
}

impl Directive {
    pub fn object_like(body: &str) -> Self {
        Self::ObjectLike(ObjectLike::new(body))
    }

    pub fn function_like(params: Vec<String>, body: &str) -> Self {
        Self::FunctionLike(FunctionLike::new(params, body))
    }

    pub fn native<F>(min_args: usize, max_args: usize, callback: F) -> Self
    where
        F: Fn(&[String]) -> String + 'static,
    {
        Self::Native(Native {
            min_args,
            max_args,
            callback: Box::new(callback),
        })
    }

    pub fn min_args(&self) -> usize {
        match self {
            Self::ObjectLike(_) => 0,
            Self::FunctionLike(d) => d.params.len(),
            Self::Native(d) => d.min_args,
        }
    }

    pub fn max_args(&self) -> usize {
        match self {
            Self::ObjectLike(_) => 0,
            Self::FunctionLike(d) => d.params.len(),
            Self::Native(d) => d.max_args,
        }
    }

    /// Invoke the macro with already-extracted argument texts. `name` is only
    /// used to report argument-count faults.
    pub fn invoke(&self, name: &str, args: &[String]) -> Result<String, ErrorKind> {
        self.assert_args(name, args.len())?;
        Ok(match self {
            Self::ObjectLike(d) => d.body.clone(),
            Self::FunctionLike(d) => d
                .compiled
                .get_or_init(|| Template::compile(&d.body, &d.params))
                .render(args),
            Self::Native(d) => (d.callback)(args),
        })
    }

    fn assert_args(&self, name: &str, given: usize) -> Result<(), ErrorKind> {
        let (min, max) = (self.min_args(), self.max_args());
        if given < min || given > max {
            return Err(ErrorKind::ArgumentCount {
                name: name.to_owned(),
                min,
                max,
                given,
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for Directive {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ObjectLike(d) => f.debug_struct("ObjectLike").field("body", &d.body).finish(),
            Self::FunctionLike(d) => f
                .debug_struct("FunctionLike")
                .field("params", &d.params)
                .field("body", &d.body)
                .finish(),
            Self::Native(d) => f
                .debug_struct("Native")
                .field("min_args", &d.min_args)
                .field("max_args", &d.max_args)
                .finish(),
        }
    }
}

/// Fixed replacement text, e.g. `#define X 1`.
pub struct ObjectLike {
    body: String,
}

impl ObjectLike {
    fn new(body: &str) -> Self {
        Self {
            body: normalize_body(body),
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

/// Parameterized replacement, e.g. `#define F(a,b) a+b`. The compiled
/// template is built on first invocation and cached.
pub struct FunctionLike {
    params: Vec<String>,
    body: String,
    compiled: OnceCell<Template>,
}

impl FunctionLike {
    fn new(params: Vec<String>, body: &str) -> Self {
        let params = params
            .into_iter()
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .collect();
        Self {
            params,
            body: normalize_body(body),
            compiled: OnceCell::new(),
        }
    }
}

/// An environment-injected callback, e.g. an incrementing `__COUNTER__`.
pub struct Native {
    min_args: usize,
    max_args: usize,
    callback: Box<NativeCallback>,
}

/// A backslash-newline inside a directive body marks a continuation; the
/// backslash itself is not significant.
fn normalize_body(body: &str) -> String {
    body.replace("\\\n", "\n")
}
