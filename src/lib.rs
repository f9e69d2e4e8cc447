use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;

use directives::{Directive, Registry};
use error::Result;
use evaluate::SourceExecutor;
use io::{Directories, Source, SourceOverrides};

pub mod directives;
pub mod error;
pub mod io;

pub mod environment;
pub mod executor;

mod evaluate;
mod expr;
mod lexer;
mod stack;

pub use environment::StandardEnvironment;

/// Behavior toggles for one `process()` call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Keep runs of blank lines instead of collapsing them to one.
    pub keep_extra_line_feeds: bool,
    /// Suppress the synthesized `#define` lines for the builtin names.
    pub skip_builtin_directives: bool,
    /// Interleave `//` comments tracing each handled directive.
    pub keep_debug_comments: bool,
}

/// Names re-emitted as `#define` lines in front of the output when they
/// ended up defined, so downstream binding loaders can read them back.
const BUILTIN_DIRECTIVES: [&str; 2] = ["FFI_SCOPE", "FFI_LIB"];

static EXTRA_LINE_FEEDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n{2,}").expect("valid line feed pattern"));

/// The collected result of one preprocessing run. Rendering to a string
/// applies the builtin-directive prefix and newline collapsing, subject to
/// the run's [`Options`].
#[derive(Debug)]
pub struct Output {
    fragments: Vec<String>,
    registry: Registry,
    options: Options,
}

impl Output {
    fn new(fragments: Vec<String>, registry: Registry, options: Options) -> Self {
        Self {
            fragments,
            registry,
            options,
        }
    }

    /// Macro definitions as they stood when the run finished.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    fn render(&self) -> String {
        let mut result = self.fragments.concat();

        if !self.options.skip_builtin_directives {
            for name in BUILTIN_DIRECTIVES {
                let Some(directive) = self.registry.find(name) else {
                    continue;
                };
                if let Ok(value) = directive.invoke(name, &[]) {
                    result = format!("#define {name} {value}\n{result}");
                }
            }
        }

        if !self.options.keep_extra_line_feeds {
            result = EXTRA_LINE_FEEDS.replace_all(&result, "\n").into_owned();
            result = result.trim_matches('\n').to_owned();
        }

        result
    }
}

impl std::fmt::Display for Output {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.render())
    }
}

/// The preprocessor instance: a base macro registry plus include lookup
/// tables. `process()` clones the tables per call so repeated runs against
/// the same instance never observe each other's definitions.
pub struct Preprocessor {
    registry: Registry,
    directories: Directories,
    overrides: SourceOverrides,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new()
    }
}

impl Preprocessor {
    pub fn new() -> Self {
        Self::with_environment(&StandardEnvironment::default())
    }

    pub fn with_environment(environment: &StandardEnvironment) -> Self {
        let mut registry = Registry::new();
        environment.apply_to(&mut registry);
        Self {
            registry,
            directories: Directories::default(),
            overrides: SourceOverrides::default(),
        }
    }

    /// Define an object-like macro in the base registry.
    pub fn define(&mut self, name: &str, value: &str) {
        self.registry.define(name, Directive::object_like(value));
    }

    /// Define any directive variant in the base registry.
    pub fn define_directive(&mut self, name: &str, directive: Directive) {
        self.registry.define(name, directive);
    }

    pub fn undef(&mut self, name: &str) -> bool {
        self.registry.undef(name)
    }

    /// Register an in-memory source that shadows same-named files.
    pub fn add_source(&mut self, name: &str, content: &str) {
        self.overrides.add(name, content);
    }

    pub fn remove_source(&mut self, name: &str) -> bool {
        self.overrides.remove(name)
    }

    /// Append a directory to the include search path.
    pub fn include(&mut self, directory: PathBuf) {
        self.directories.include(directory);
    }

    pub fn exclude(&mut self, directory: &Path) {
        self.directories.exclude(directory);
    }

    pub fn process(&self, source: &Source, options: Options) -> Result<Output> {
        let mut registry = self.registry.clone();
        let mut fragments = Vec::new();
        SourceExecutor::new(&mut registry, &self.directories, &self.overrides, &options)
            .execute(source, &mut fragments)?;
        Ok(Output::new(fragments, registry, options))
    }

    pub fn process_text(&self, name: &str, content: &str, options: Options) -> Result<Output> {
        self.process(&Source::from_text(name, content), options)
    }

    pub fn process_file(&self, path: &Path, options: Options) -> Result<Output> {
        self.process(&Source::from_file(path)?, options)
    }
}

/// `name[=value]`, as accepted by `-D`.
#[derive(Debug, Clone)]
pub struct ArgumentDefine {
    pub name: String,
    pub value: Option<String>,
}

fn parse_define(input: &str) -> std::result::Result<ArgumentDefine, String> {
    let (name, value) = match input.split_once('=') {
        Some((name, value)) => (name, Some(value.to_owned())),
        None => (input, None),
    };
    if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!("invalid macro name {name:?}"));
    }
    Ok(ArgumentDefine {
        name: name.to_owned(),
        value,
    })
}

#[derive(Debug, clap::Parser, Clone, Default)]
#[command(version, about)]
pub struct Args {
    /// `name[=val]`
    ///
    /// Define `name` to `val` or to an empty value if `=val` is omitted.
    #[arg(short = 'D', long, value_parser = parse_define)]
    pub define: Vec<ArgumentDefine>,
    /// Undefine `name`.
    #[arg(short = 'U', long)]
    pub undefine: Vec<String>,
    /// Append a directory to the include search path.
    #[arg(short = 'I', long = "include")]
    pub include: Vec<PathBuf>,
    /// Keep runs of blank lines instead of collapsing them.
    #[arg(long)]
    pub keep_extra_line_feeds: bool,
    /// Do not prefix the output with `#define` lines for builtin names.
    #[arg(long)]
    pub skip_builtin_directives: bool,
    /// Interleave `//` comments tracing each handled directive.
    #[arg(long)]
    pub keep_debug_comments: bool,
    /// Input files; read from stdin when empty.
    pub files: Vec<PathBuf>,
}

pub fn run<STDOUT: Write, STDERR: Write>(
    mut stdout: STDOUT,
    mut stderr: STDERR,
    args: Args,
) -> Result<()> {
    match run_impl(&mut stdout, args) {
        Ok(()) => Ok(()),
        Err(error) => {
            if let Err(write_error) = writeln!(stderr, "{error}") {
                return Err(write_error.into());
            }
            Err(error)
        }
    }
}

fn run_impl<STDOUT: Write>(stdout: &mut STDOUT, args: Args) -> Result<()> {
    let mut preprocessor = Preprocessor::new();
    for define in args.define {
        preprocessor.define(&define.name, define.value.as_deref().unwrap_or(""));
    }
    for name in args.undefine {
        preprocessor.undef(&name);
    }
    for directory in args.include {
        preprocessor.include(directory);
    }

    let options = Options {
        keep_extra_line_feeds: args.keep_extra_line_feeds,
        skip_builtin_directives: args.skip_builtin_directives,
        keep_debug_comments: args.keep_debug_comments,
    };

    if args.files.is_empty() {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        let output = preprocessor.process_text("stdin", &content, options)?;
        writeln!(stdout, "{output}")?;
    } else {
        for path in args.files {
            let output = preprocessor.process_file(&path, options)?;
            writeln!(stdout, "{output}")?;
        }
    }
    Ok(())
}
