//! The template entity: raw contents plus the tag, variable and part maps a
//! compilation reads from.
//!
//! Lookups are read-through: a child template first checks its own maps and
//! then walks its parent chain. Setting a value on a child never touches the
//! parent, which is shared behind an [`Arc`] and therefore immutable.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::Value;

/// Default directive delimiters.
pub const DEFAULT_DIRECTIVE_DELIMITERS: (&str, &str) = ("<%", "%>");
/// Default sanitized tag delimiters.
pub const DEFAULT_SANITIZED_TAG_DELIMITERS: (&str, &str) = ("{{", "}}");
/// Default unsanitized tag delimiters.
pub const DEFAULT_UNSANITIZED_TAG_DELIMITERS: (&str, &str) = ("{{!", "!}}");

/// The kinds of delimiter-bounded regions a template can contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DelimiterType {
    /// Control instructions such as `part`, `show` and `if`.
    Directive,
    /// Tags whose result is escaped before insertion.
    SanitizedTag,
    /// Tags whose result is inserted verbatim.
    UnsanitizedTag,
}

impl DelimiterType {
    /// All delimiter types.
    pub const ALL: [DelimiterType; 3] = [
        DelimiterType::Directive,
        DelimiterType::SanitizedTag,
        DelimiterType::UnsanitizedTag,
    ];

    /// Returns the built-in delimiters for this type.
    pub fn default_delimiters(self) -> Delimiters {
        let (open, close) = match self {
            Self::Directive => DEFAULT_DIRECTIVE_DELIMITERS,
            Self::SanitizedTag => DEFAULT_SANITIZED_TAG_DELIMITERS,
            Self::UnsanitizedTag => DEFAULT_UNSANITIZED_TAG_DELIMITERS,
        };
        Delimiters::new(open, close)
    }
}

/// An open/close delimiter pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delimiters {
    pub open: String,
    pub close: String,
}

impl Delimiters {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }
}

/// The active delimiters of a template, one optional pair per type.
///
/// A type without delimiters is never recognized by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelimiterConfig {
    directive: Option<Delimiters>,
    sanitized_tag: Option<Delimiters>,
    unsanitized_tag: Option<Delimiters>,
}

impl Default for DelimiterConfig {
    fn default() -> Self {
        Self {
            directive: Some(DelimiterType::Directive.default_delimiters()),
            sanitized_tag: Some(DelimiterType::SanitizedTag.default_delimiters()),
            unsanitized_tag: Some(DelimiterType::UnsanitizedTag.default_delimiters()),
        }
    }
}

impl DelimiterConfig {
    /// Returns the delimiters for `kind`, or `None` when the type is unset.
    pub fn get(&self, kind: DelimiterType) -> Option<&Delimiters> {
        self.slot(kind).as_ref()
    }

    pub fn set(&mut self, kind: DelimiterType, delimiters: Delimiters) {
        *self.slot_mut(kind) = Some(delimiters);
    }

    pub fn clear(&mut self, kind: DelimiterType) {
        *self.slot_mut(kind) = None;
    }

    /// Iterates over the set delimiter types with their delimiters.
    pub fn iter(&self) -> impl Iterator<Item = (DelimiterType, &Delimiters)> {
        DelimiterType::ALL
            .into_iter()
            .filter_map(|kind| self.get(kind).map(|d| (kind, d)))
    }

    fn slot(&self, kind: DelimiterType) -> &Option<Delimiters> {
        match kind {
            DelimiterType::Directive => &self.directive,
            DelimiterType::SanitizedTag => &self.sanitized_tag,
            DelimiterType::UnsanitizedTag => &self.unsanitized_tag,
        }
    }

    fn slot_mut(&mut self, kind: DelimiterType) -> &mut Option<Delimiters> {
        match kind {
            DelimiterType::Directive => &mut self.directive,
            DelimiterType::SanitizedTag => &mut self.sanitized_tag,
            DelimiterType::UnsanitizedTag => &mut self.unsanitized_tag,
        }
    }
}

/// A view template.
///
/// Child templates are usually derived by cloning a template and assigning
/// the original as parent:
///
/// ```
/// use std::sync::Arc;
/// use viewforge::Template;
///
/// let mut parent = Template::new();
/// parent.set_tag("title", "Home");
///
/// let mut child = Template::new();
/// child.set_parent(Arc::new(parent));
/// assert_eq!(child.tag("title"), Some("Home"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Template {
    path: String,
    contents: String,
    tags: FxHashMap<String, String>,
    vars: FxHashMap<String, Value>,
    parts: FxHashMap<String, String>,
    delimiters: DelimiterConfig,
    parent: Option<Arc<Template>>,
}

impl Template {
    /// Creates an empty template with the default delimiters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a template from a source path and its contents.
    pub fn with_contents(path: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            contents: contents.into(),
            ..Self::default()
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn set_path(&mut self, path: impl Into<String>) {
        self.path = path.into();
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    pub fn set_contents(&mut self, contents: impl Into<String>) {
        self.contents = contents.into();
    }

    // =========================================================================
    // Tags
    // =========================================================================

    /// Looks up a tag locally, then through the parent chain.
    pub fn tag(&self, name: &str) -> Option<&str> {
        match self.tags.get(name) {
            Some(value) => Some(value.as_str()),
            None => self.parent.as_deref().and_then(|parent| parent.tag(name)),
        }
    }

    /// Returns every visible tag, with local values shadowing inherited ones.
    pub fn tags(&self) -> FxHashMap<String, String> {
        let mut tags = self
            .parent
            .as_deref()
            .map(Template::tags)
            .unwrap_or_default();
        tags.extend(self.tags.iter().map(|(k, v)| (k.clone(), v.clone())));
        tags
    }

    /// Returns only the tags set on this template.
    pub fn own_tags(&self) -> &FxHashMap<String, String> {
        &self.tags
    }

    pub fn set_tag(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.tags.insert(name.into(), value.into());
    }

    pub fn set_tags<I, K, V>(&mut self, tags: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in tags {
            self.set_tag(name, value);
        }
    }

    // =========================================================================
    // Variables
    // =========================================================================

    /// Looks up a variable locally, then through the parent chain.
    pub fn var(&self, name: &str) -> Option<&Value> {
        match self.vars.get(name) {
            Some(value) => Some(value),
            None => self.parent.as_deref().and_then(|parent| parent.var(name)),
        }
    }

    /// Returns every visible variable, with local values shadowing inherited ones.
    pub fn vars(&self) -> FxHashMap<String, Value> {
        let mut vars = self
            .parent
            .as_deref()
            .map(Template::vars)
            .unwrap_or_default();
        vars.extend(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())));
        vars
    }

    /// Returns only the variables set on this template.
    pub fn own_vars(&self) -> &FxHashMap<String, Value> {
        &self.vars
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn set_vars<I, K, V>(&mut self, vars: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        for (name, value) in vars {
            self.set_var(name, value);
        }
    }

    // =========================================================================
    // Parts
    // =========================================================================

    /// Looks up a part locally, then through the parent chain.
    pub fn part(&self, name: &str) -> Option<&str> {
        self.part_owner(name)
            .and_then(|owner| owner.parts.get(name))
            .map(String::as_str)
    }

    /// Returns the nearest template in the chain that defines `name` itself.
    pub fn part_owner(&self, name: &str) -> Option<&Template> {
        if self.parts.contains_key(name) {
            Some(self)
        } else {
            self.parent
                .as_deref()
                .and_then(|parent| parent.part_owner(name))
        }
    }

    /// Returns every visible part, with local bodies shadowing inherited ones.
    pub fn parts(&self) -> FxHashMap<String, String> {
        let mut parts = self
            .parent
            .as_deref()
            .map(Template::parts)
            .unwrap_or_default();
        parts.extend(self.parts.iter().map(|(k, v)| (k.clone(), v.clone())));
        parts
    }

    pub fn set_part(&mut self, name: impl Into<String>, body: impl Into<String>) {
        self.parts.insert(name.into(), body.into());
    }

    pub fn set_parts<I, K, V>(&mut self, parts: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, body) in parts {
            self.set_part(name, body);
        }
    }

    // =========================================================================
    // Delimiters
    // =========================================================================

    /// Returns the delimiters for `kind`, or `None` if the type was cleared.
    pub fn delimiters(&self, kind: DelimiterType) -> Option<&Delimiters> {
        self.delimiters.get(kind)
    }

    /// Overrides the delimiters for `kind`. Empty or identical open/close
    /// strings are not validated.
    pub fn set_delimiters(
        &mut self,
        kind: DelimiterType,
        open: impl Into<String>,
        close: impl Into<String>,
    ) {
        self.delimiters.set(kind, Delimiters::new(open, close));
    }

    /// Unsets the delimiters for `kind`, disabling that region type.
    pub fn clear_delimiters(&mut self, kind: DelimiterType) {
        self.delimiters.clear(kind);
    }

    pub fn delimiter_config(&self) -> &DelimiterConfig {
        &self.delimiters
    }

    // =========================================================================
    // Parent
    // =========================================================================

    pub fn parent(&self) -> Option<&Template> {
        self.parent.as_deref()
    }

    pub fn set_parent(&mut self, parent: Arc<Template>) {
        self.parent = Some(parent);
    }

    pub fn clear_parent(&mut self) -> Option<Arc<Template>> {
        self.parent.take()
    }
}
