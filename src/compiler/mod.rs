//! Compiler infrastructure for the template language.
//!
//! - Lexer: splits contents into delimiter-bounded regions
//! - Directive sub-compiler: registers parts, then resolves `show`, `parent`
//!   and conditionals
//! - Tag sub-compiler: evaluates tags and escapes sanitized output

mod directive;
mod error;
mod error_fmt;
pub mod expr;
pub mod lexer;
mod lines;
mod segment;
pub mod syntax;
mod tag;

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::escape::{Escaper, HtmlEscaper};
use crate::functions::FunctionRegistry;
use crate::template::Template;
use directive::DirectiveCompiler;
pub use error::{ErrorKind, ViewCompilerError};
use tag::TagCompiler;

/// Limits applied while compiling.
///
/// ```
/// use viewforge::CompilerConfig;
///
/// let config: CompilerConfig = serde_json::from_str(r#"{ "max_tag_depth": 8 }"#).unwrap();
/// assert_eq!(config.max_tag_depth, 8);
/// assert_eq!(config.max_directive_depth, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerConfig {
    /// How many times a tag value may itself be compiled for nested tags.
    pub max_tag_depth: usize,
    /// How deeply `show`, `parent` and `if` may nest.
    pub max_directive_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            max_tag_depth: 32,
            max_directive_depth: 32,
        }
    }
}

impl CompilerConfig {
    pub fn with_max_tag_depth(mut self, depth: usize) -> Self {
        self.max_tag_depth = depth;
        self
    }

    pub fn with_max_directive_depth(mut self, depth: usize) -> Self {
        self.max_directive_depth = depth;
        self
    }
}

/// Compiles templates into their final text.
///
/// The compiler owns the function registry and the escaping strategy. It holds
/// no per-template state, so one compiler can be shared to compile independent
/// templates.
#[derive(Clone)]
pub struct Compiler {
    functions: FunctionRegistry,
    escaper: Arc<dyn Escaper>,
    config: CompilerConfig,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    /// Creates a compiler with HTML escaping and default limits.
    pub fn new() -> Self {
        Self::with_config(CompilerConfig::default())
    }

    pub fn with_config(config: CompilerConfig) -> Self {
        Self {
            functions: FunctionRegistry::new(),
            escaper: Arc::new(HtmlEscaper),
            config,
        }
    }

    /// Registers a template function, replacing any earlier one of the same
    /// name. Registered functions take precedence over built-ins.
    pub fn register_function<F, R>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.functions.register(name, function);
    }

    pub fn functions(&self) -> &FunctionRegistry {
        &self.functions
    }

    /// Replaces the escaping strategy used for sanitized tags.
    pub fn set_escaper(&mut self, escaper: impl Escaper + 'static) {
        self.escaper = Arc::new(escaper);
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles `template`: directives first, then tags.
    ///
    /// Parts defined in the contents are registered on `template`. On failure
    /// no output is returned, and the error names the line of the template
    /// contents it comes from.
    pub fn compile(&self, template: &mut Template) -> Result<String, ViewCompilerError> {
        debug!(
            path = template.path(),
            bytes = template.contents().len(),
            "compiling template"
        );
        let contents = template.contents().to_string();
        let result = DirectiveCompiler::new(&self.functions, &self.config)
            .compile_mapped(template, &contents)
            .and_then(|(compiled, lines)| {
                TagCompiler::new(&self.functions, self.escaper.as_ref(), &self.config)
                    .with_line_map(&lines)
                    .compile(template, &compiled)
            });

        match &result {
            Ok(output) => debug!(path = template.path(), bytes = output.len(), "compiled template"),
            Err(err) => debug!(path = template.path(), error = %err, "template failed to compile"),
        }
        result
    }

    /// Runs only the tag sub-compiler over `contents`. Never mutates `template`.
    /// Error lines are lines of `contents`.
    pub fn compile_tags(
        &self,
        template: &Template,
        contents: &str,
    ) -> Result<String, ViewCompilerError> {
        TagCompiler::new(&self.functions, self.escaper.as_ref(), &self.config)
            .compile(template, contents)
    }

    /// Runs only the directive sub-compiler over `contents`, registering its
    /// parts on `template`.
    pub fn compile_directives(
        &self,
        template: &mut Template,
        contents: &str,
    ) -> Result<String, ViewCompilerError> {
        DirectiveCompiler::new(&self.functions, &self.config).compile(template, contents)
    }
}

impl fmt::Debug for Compiler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Compiler")
            .field("functions", &self.functions)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
