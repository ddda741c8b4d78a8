//! View template compiler.
//!
//! This crate compiles view templates made of verbatim text (often host code
//! that a script evaluator runs later) mixed with three kinds of
//! delimiter-bounded regions:
//!
//! - **Directives** (`<% ... %>`) - control instructions such as
//!   `part("name") ... endpart`, `show("name")` and `if(...) ... endif`.
//! - **Sanitized tags** (`{{ ... }}`) - expressions whose result is
//!   HTML-escaped before insertion.
//! - **Unsanitized tags** (`{{! ... !}}`) - expressions whose result is
//!   inserted verbatim.
//!
//! Every delimiter pair can be overridden per template.
//!
//! # Architecture
//!
//! Compilation runs in two stages over the template contents:
//!
//! 1. The directive sub-compiler registers every part (pass 1) and then
//!    resolves `show`, `parent` and conditional directives (pass 2).
//! 2. The tag sub-compiler evaluates each tag, recursively compiling tag
//!    values that contain further tags, and escapes sanitized output.
//!
//! # Example
//!
//! ```
//! use viewforge::{Compiler, Template};
//!
//! let mut compiler = Compiler::new();
//! compiler.register_function("shout", |args: &[serde_json::Value]| {
//!     format!("{}!", viewforge::functions::arg(args, 0).as_str().unwrap_or_default())
//! });
//!
//! let mut template = Template::with_contents("page.html", "<h1>{{ shout(title) }}</h1>");
//! template.set_tag("title", "Fish & Chips");
//!
//! assert_eq!(compiler.compile(&mut template).unwrap(), "<h1>Fish &amp; Chips!</h1>");
//! ```

pub mod compiler;
pub mod escape;
pub mod functions;
pub mod template;
pub mod value;

pub use compiler::{Compiler, CompilerConfig, ErrorKind, ViewCompilerError};
pub use escape::{Escaper, HtmlEscaper, RawEscaper};
pub use functions::{CallTarget, FunctionRegistry};
pub use template::{DelimiterConfig, DelimiterType, Delimiters, Template};
