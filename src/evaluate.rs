//! The dispatch loop driving one preprocessing run.
//!
//! Tokens are consumed one by one. While the conditional stack is enabled
//! the matching mutation or emission happens; while disabled, everything is
//! a no-op except the conditional directives themselves, which still push
//! and pop frames so nesting stays balanced. `#include` recursively
//! re-enters the loop on the resolved source and splices its fragments in
//! place.

use log::{error, warn};

use crate::directives::{Directive, Registry};
use crate::error::{Error, ErrorKind, Result};
use crate::executor::{self, Context};
use crate::expr;
use crate::io::{self, Directories, Source, SourceOverrides};
use crate::lexer::{self, Token, TokenKind};
use crate::stack::ConditionalStack;
use crate::Options;

pub struct SourceExecutor<'a> {
    registry: &'a mut Registry,
    directories: &'a Directories,
    overrides: &'a SourceOverrides,
    options: &'a Options,
    stack: ConditionalStack,
}

impl<'a> SourceExecutor<'a> {
    pub fn new(
        registry: &'a mut Registry,
        directories: &'a Directories,
        overrides: &'a SourceOverrides,
        options: &'a Options,
    ) -> Self {
        Self {
            registry,
            directories,
            overrides,
            options,
            stack: ConditionalStack::new(),
        }
    }

    /// Runs `source` through the dispatch loop, appending output fragments.
    /// The conditional stack is shared with recursively included sources so
    /// their `#if` nesting participates in the enclosing balance.
    pub fn execute(&mut self, source: &Source, fragments: &mut Vec<String>) -> Result<()> {
        let content = lexer::simplify(source.content());
        for token in lexer::lex(&content) {
            self.dispatch(&token, source, &content, fragments)
                .map_err(|e| e.locate(source.name(), token.offset, &content))?;
        }
        Ok(())
    }

    fn dispatch(
        &mut self,
        token: &Token,
        source: &Source,
        content: &str,
        fragments: &mut Vec<String>,
    ) -> Result<()> {
        match token.kind {
            TokenKind::Error => self.do_error(token, source, content, fragments),
            TokenKind::Warning => self.do_warning(token, source, content, fragments),
            TokenKind::QuotedInclude | TokenKind::AngleInclude => {
                self.do_include(token, source, content, fragments)
            }
            TokenKind::IfDef => self.do_ifdef(token, false),
            TokenKind::IfNDef => self.do_ifdef(token, true),
            TokenKind::EndIf => self.do_endif(),
            TokenKind::If => self.do_if(token),
            TokenKind::ElseIf => self.do_elseif(token),
            TokenKind::Else => self.do_else(),
            TokenKind::ObjectMacroDecl => self.do_object_macro(token),
            TokenKind::FunctionMacroDecl => self.do_function_macro(token),
            TokenKind::Undef => self.do_undef(token),
            TokenKind::SourceLine => self.do_render_code(token, fragments),
            TokenKind::EndOfInput => Ok(()),
        }
    }

    fn do_error(
        &mut self,
        token: &Token,
        source: &Source,
        content: &str,
        fragments: &mut Vec<String>,
    ) -> Result<()> {
        if !self.stack.is_enabled() {
            return Ok(());
        }
        let message = escape(token.capture(0).trim());
        error!("{}: {}", source.name(), message);
        self.debug(token, source, content, fragments, &format!("error {message}"));
        Ok(())
    }

    fn do_warning(
        &mut self,
        token: &Token,
        source: &Source,
        content: &str,
        fragments: &mut Vec<String>,
    ) -> Result<()> {
        if !self.stack.is_enabled() {
            return Ok(());
        }
        let message = escape(token.capture(0).trim());
        warn!("{}: {}", source.name(), message);
        self.debug(token, source, content, fragments, &format!("warning {message}"));
        Ok(())
    }

    fn do_include(
        &mut self,
        token: &Token,
        source: &Source,
        content: &str,
        fragments: &mut Vec<String>,
    ) -> Result<()> {
        if !self.stack.is_enabled() {
            return Ok(());
        }
        let quoted = token.kind == TokenKind::QuotedInclude;
        let name = if quoted {
            token.capture(0).replace("\\\"", "\"")
        } else {
            token.capture(0).to_owned()
        };
        let inclusion = io::resolve(
            &name,
            quoted,
            source.base_dir(),
            self.overrides,
            self.directories,
        )?
        .ok_or_else(|| Error::from(ErrorKind::NotReadable(name.clone())))?;

        self.debug(token, source, content, fragments, &format!("include {}", inclusion.name()));
        self.execute(&inclusion, fragments)
    }

    fn do_ifdef(&mut self, token: &Token, negate: bool) -> Result<()> {
        if !self.stack.is_enabled() {
            self.stack.push(false);
            return Ok(());
        }
        let name = escape(token.capture(0)).trim().to_owned();
        let defined = self.registry.defined(&name);
        self.stack.push(defined != negate);
        Ok(())
    }

    fn do_endif(&mut self) -> Result<()> {
        self.stack
            .pop()
            .map_err(|_| malformed("#endif directive without #if"))?;
        Ok(())
    }

    fn do_if(&mut self, token: &Token) -> Result<()> {
        if !self.stack.is_enabled() {
            self.stack.push(false);
            return Ok(());
        }
        let state = self.eval(token)?;
        self.stack.push(state);
        Ok(())
    }

    fn do_elseif(&mut self, token: &Token) -> Result<()> {
        if self.stack.is_empty() {
            return Err(malformed("#elif directive without #if"));
        }
        if !self.stack.is_completed() && self.eval(token)? {
            self.stack
                .complete()
                .map_err(|_| malformed("#elif directive without #if"))?;
            return Ok(());
        }
        let completed = self.stack.is_completed();
        self.stack
            .update(false, completed)
            .map_err(|_| malformed("#elif directive without #if"))?;
        Ok(())
    }

    fn do_else(&mut self) -> Result<()> {
        let outcome = if self.stack.is_completed() {
            self.stack.update(false, true)
        } else {
            self.stack.inverse()
        };
        outcome.map_err(|_| malformed("#else directive without #if"))?;
        Ok(())
    }

    fn do_object_macro(&mut self, token: &Token) -> Result<()> {
        if !self.stack.is_enabled() {
            return Ok(());
        }
        let name = token.capture(0).trim().to_owned();
        let value = escape(token.capture(1).trim());
        // Eager definition-time expansion: the body is frozen against the
        // registry as it exists right now.
        let value = executor::replace(&value, Context::Expression, self.registry)?;
        self.registry.define(&name, Directive::object_like(&value));
        Ok(())
    }

    fn do_function_macro(&mut self, token: &Token) -> Result<()> {
        if !self.stack.is_enabled() {
            return Ok(());
        }
        let name = token.capture(0).trim().to_owned();
        let params: Vec<String> = token
            .capture(1)
            .split(',')
            .map(|p| p.trim().to_owned())
            .collect();
        let value = escape(token.capture(2).trim());
        let value = executor::replace(&value, Context::Expression, self.registry)?;
        self.registry
            .define(&name, Directive::function_like(params, &value));
        Ok(())
    }

    fn do_undef(&mut self, token: &Token) -> Result<()> {
        if !self.stack.is_enabled() {
            return Ok(());
        }
        let name = escape(token.capture(0));
        self.registry.undef(name.trim());
        Ok(())
    }

    fn do_render_code(&mut self, token: &Token, fragments: &mut Vec<String>) -> Result<()> {
        if !self.stack.is_enabled() {
            return Ok(());
        }
        let body = escape(&token.value);
        let rendered = executor::replace(&body, Context::Source, self.registry)?;
        fragments.push(rendered);
        Ok(())
    }

    fn eval(&mut self, token: &Token) -> Result<bool> {
        let body = escape(token.capture(0).trim());
        let processed = executor::replace(&body, Context::Expression, self.registry)?;
        Ok(expr::evaluate_condition(&processed)?)
    }

    fn debug(
        &self,
        token: &Token,
        source: &Source,
        content: &str,
        fragments: &mut Vec<String>,
        comment: &str,
    ) {
        if !self.options.keep_debug_comments {
            return;
        }
        let position = crate::error::Position::from_offset(content, token.offset);
        fragments.push(format!(
            "// {}:{}\n//   {comment}\n",
            source.name(),
            position.line
        ));
    }
}

/// A backslash-newline continuation joins physical lines; the backslash
/// itself is dropped.
fn escape(body: &str) -> String {
    body.replace("\\\n", "\n")
}

fn malformed(message: &str) -> Error {
    Error::from(ErrorKind::MalformedConditional(message.to_owned()))
}
