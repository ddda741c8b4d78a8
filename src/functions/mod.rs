//! Template functions.
//!
//! A function call inside a tag, `name(arg, ...)`, is resolved in a fixed
//! order: the compiler's [`FunctionRegistry`] first, then the allow-list of
//! [`Builtin`] functions. A name found in neither is an error at compile time.

mod builtins;

use std::fmt;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

pub use builtins::{Builtin, FunctionError};

/// A registered template function.
///
/// Functions receive their already-evaluated positional arguments. Arity is
/// not checked: use [`arg`] to read an argument that may have been omitted.
pub type TemplateFunction = dyn Fn(&[Value]) -> Value + Send + Sync;

static NULL: Value = Value::Null;

/// Returns the argument at `index`, or `null` when it was not passed.
pub fn arg(args: &[Value], index: usize) -> &Value {
    args.get(index).unwrap_or(&NULL)
}

/// Name to function mapping consulted by the tag sub-compiler.
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: FxHashMap<String, Arc<TemplateFunction>>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under `name`, replacing any earlier registration.
    pub fn register<F, R>(&mut self, name: impl Into<String>, function: F)
    where
        F: Fn(&[Value]) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        let name = name.into();
        tracing::trace!(function = %name, "registering template function");
        self.functions
            .insert(name, Arc::new(move |args: &[Value]| function(args).into()));
    }

    pub fn get(&self, name: &str) -> Option<&TemplateFunction> {
        self.functions.get(name).map(Arc::as_ref)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Returns the registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

/// What a function name in a call expression refers to.
pub enum CallTarget<'a> {
    /// A function registered on the compiler.
    Registered(&'a TemplateFunction),
    /// A built-in function from the allow-list.
    Builtin(Builtin),
    /// Neither.
    Unresolved,
}

impl<'a> CallTarget<'a> {
    /// Resolves `name`, preferring registered functions over built-ins.
    pub fn resolve(name: &str, registry: &'a FunctionRegistry) -> Self {
        if let Some(function) = registry.get(name) {
            CallTarget::Registered(function)
        } else if let Some(builtin) = Builtin::from_name(name) {
            CallTarget::Builtin(builtin)
        } else {
            CallTarget::Unresolved
        }
    }
}

impl fmt::Debug for CallTarget<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registered(_) => f.write_str("Registered"),
            Self::Builtin(builtin) => f.debug_tuple("Builtin").field(builtin).finish(),
            Self::Unresolved => f.write_str("Unresolved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_register_and_call() {
        let mut registry = FunctionRegistry::new();
        registry.register("greet", |args: &[Value]| {
            format!("Hello, {}", arg(args, 0).as_str().unwrap_or("nobody"))
        });

        let greet = registry.get("greet").expect("registered");
        assert_eq!(greet(&[json!("Dave")]), json!("Hello, Dave"));
        assert_eq!(greet(&[]), json!("Hello, nobody"));
    }

    #[test]
    fn test_later_registration_overwrites() {
        let mut registry = FunctionRegistry::new();
        registry.register("foo", |_: &[Value]| "first");
        registry.register("foo", |_: &[Value]| "second");

        assert_eq!(registry.len(), 1);
        let foo = registry.get("foo").expect("registered");
        assert_eq!(foo(&[]), json!("second"));
    }

    #[test]
    fn test_missing_argument_reads_as_null() {
        assert_eq!(arg(&[json!(1)], 3), &Value::Null);
    }

    #[test]
    fn test_resolution_order() {
        let mut registry = FunctionRegistry::new();
        registry.register("upper", |_: &[Value]| "shadowed");

        assert!(matches!(
            CallTarget::resolve("upper", &registry),
            CallTarget::Registered(_)
        ));
        assert!(matches!(
            CallTarget::resolve("lower", &registry),
            CallTarget::Builtin(Builtin::Lower)
        ));
        assert!(matches!(
            CallTarget::resolve("nope", &registry),
            CallTarget::Unresolved
        ));
    }

    #[test]
    fn test_names_are_sorted() {
        let mut registry = FunctionRegistry::new();
        registry.register("b", |_: &[Value]| Value::Null);
        registry.register("a", |_: &[Value]| Value::Null);
        assert_eq!(registry.names(), vec!["a", "b"]);
        assert_eq!(format!("{registry:?}"), r#"FunctionRegistry { functions: ["a", "b"] }"#);
    }
}
