//! Integration tests for the public compiler API.
//!
//! These exercise templates the way a host application uses them: a shared
//! layout, pages that inherit from it, registered helper functions and
//! verbatim host code that must survive compilation untouched.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use viewforge::functions::arg;
use viewforge::{Compiler, CompilerConfig, DelimiterType, ErrorKind, Template};

// =============================================================================
// Helpers
// =============================================================================

fn layout() -> Arc<Template> {
    let mut layout = Template::with_contents("layout.html", "");
    layout.set_parts([
        ("head", "<title>{{ title }}</title>"),
        ("nav", "<nav>{{! links !}}</nav>"),
    ]);
    layout.set_tags([("title", "Untitled"), ("links", "<a href=\"/\">Home</a>")]);
    layout.set_var("year", 2024);
    Arc::new(layout)
}

fn compiler() -> Compiler {
    let mut compiler = Compiler::new();
    compiler.register_function("url", |args: &[Value]| {
        format!("/{}", arg(args, 0).as_str().unwrap_or_default().trim_start_matches('/'))
    });
    compiler
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn renders_page_from_layout() {
    let mut page = Template::with_contents(
        "page.html",
        concat!(
            "<% show('head') %>\n",
            "<% show('nav') %>\n",
            "<% part('body') %><p>{{ intro }}</p><% endpart %>",
            "<main><% show('body') %></main>\n",
            "<footer>&copy; {{ $year }}</footer>",
        ),
    );
    page.set_parent(layout());
    page.set_tag("title", "Q&A");
    page.set_tag("intro", "Ask <anything>");

    assert_eq!(
        compiler().compile(&mut page).unwrap(),
        concat!(
            "<title>Q&amp;A</title>\n",
            "<nav><a href=\"/\">Home</a></nav>\n",
            "<main><p>Ask &lt;anything&gt;</p></main>\n",
            "<footer>&copy; 2024</footer>",
        )
    );
    assert_eq!(page.part("body"), Some("<p>{{ intro }}</p>"));
}

#[test]
fn host_code_passes_through() {
    let mut page = Template::with_contents(
        "list.php",
        "<?php foreach ({{! json($items) !}} as $item): ?><li><?php echo $item; ?></li><?php endforeach; ?>",
    );
    page.set_var("items", json!(["x", "y"]));

    assert_eq!(
        compiler().compile(&mut page).unwrap(),
        r#"<?php foreach (["x","y"] as $item): ?><li><?php echo $item; ?></li><?php endforeach; ?>"#
    );
}

#[test]
fn registered_helper_with_conditionals() {
    let mut page = Template::with_contents(
        "account.html",
        concat!(
            "<% if($user && $user.admin) %><a href=\"{{ url('admin') }}\">Admin</a>",
            "<% elseif($user) %>Hi, {{ capitalize($user.name) }}",
            "<% else %><a href=\"{{ url('/login') }}\">Log in</a><% endif %>",
        ),
    );
    let compiler = compiler();

    page.set_var("user", json!({ "name": "dave", "admin": true }));
    assert_eq!(compiler.compile(&mut page).unwrap(), "<a href=\"/admin\">Admin</a>");

    page.set_var("user", json!({ "name": "dave", "admin": false }));
    assert_eq!(compiler.compile(&mut page).unwrap(), "Hi, Dave");

    page.set_var("user", Value::Null);
    assert_eq!(compiler.compile(&mut page).unwrap(), "<a href=\"/login\">Log in</a>");
}

#[test]
fn custom_delimiters_for_every_kind() {
    let mut page = Template::with_contents(
        "page.tpl",
        "[% part('x') %]<<a>> ((a)) {{ a }}[% endpart %][% show('x') %]",
    );
    page.set_delimiters(DelimiterType::Directive, "[%", "%]");
    page.set_delimiters(DelimiterType::SanitizedTag, "<<", ">>");
    page.set_delimiters(DelimiterType::UnsanitizedTag, "((", "))");
    page.set_tag("a", "&");

    assert_eq!(Compiler::new().compile(&mut page).unwrap(), "&amp; & {{ a }}");
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn undefined_part_reports_line() {
    let mut page = Template::with_contents("page.html", "<p>\n<% show('sidebar') %>\n</p>");
    let err = Compiler::new().compile(&mut page).unwrap_err();

    assert_eq!(err.kind, ErrorKind::UndefinedPart);
    assert_eq!(err.line, Some(2));
    assert_eq!(err.to_string(), "undefined part on line 2: part `sidebar` is not defined");

    let report = err.report(page.contents(), page.path());
    assert!(report.contains("--> page.html:2:1"), "got:\n{report}");
    assert!(report.contains("2 | <% show('sidebar') %>"), "got:\n{report}");
}

#[test]
fn unknown_function_is_an_error() {
    let mut page = Template::with_contents("page.html", "{{ frobnicate('x') }}");
    let err = Compiler::new().compile(&mut page).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnresolvedExpression);
    assert!(err.help.is_some());
}

#[test]
fn unterminated_regions_are_lexical_errors() {
    for contents in ["{{ title", "<% if(true)", "{{! 'open }}"] {
        let mut page = Template::with_contents("page.html", contents);
        let err = Compiler::new().compile(&mut page).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Lexical, "contents: {contents}");
    }
}

#[test]
fn recursion_limits_come_from_config() {
    let config: CompilerConfig = serde_json::from_value(json!({ "max_tag_depth": 0 })).unwrap();
    let compiler = Compiler::with_config(config);

    let mut page = Template::with_contents("page.html", "{{! outer !}}");
    page.set_tags([("outer", "[{{ inner }}]"), ("inner", "x")]);

    let err = compiler.compile(&mut page).unwrap_err();
    assert_eq!(err.kind, ErrorKind::RecursionLimitExceeded);
    assert_eq!(Compiler::new().compile(&mut page).unwrap(), "[x]");
}
