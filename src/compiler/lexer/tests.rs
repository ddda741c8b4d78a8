use super::*;
use crate::template::Delimiters;

fn lex_with(input: &str, delimiters: &DelimiterConfig) -> Vec<(TokenKind, String)> {
    tokenize(input, delimiters)
        .expect("input should lex")
        .into_iter()
        .map(|t| (t.kind, t.value))
        .collect()
}

fn lex(input: &str) -> Vec<(TokenKind, String)> {
    lex_with(input, &DelimiterConfig::default())
}

fn kinds(input: &str) -> Vec<TokenKind> {
    lex(input).into_iter().map(|(kind, _)| kind).collect()
}

fn lex_err(input: &str) -> LexError {
    tokenize(input, &DelimiterConfig::default()).expect_err("input should fail to lex")
}

#[test]
fn test_plain_text_produces_no_tokens() {
    assert!(lex("function foo() { return 1; }").is_empty());
    assert!(lex("").is_empty());
}

#[test]
fn test_sanitized_tag() {
    assert_eq!(
        lex("a {{ title }} b"),
        vec![
            (TokenKind::SanitizedTagOpen, "{{".to_string()),
            (TokenKind::Expression, "title".to_string()),
            (TokenKind::SanitizedTagClose, "}}".to_string()),
        ]
    );
}

#[test]
fn test_unsanitized_tag_wins_over_sanitized_prefix() {
    assert_eq!(
        kinds("{{! body !}}"),
        vec![
            TokenKind::UnsanitizedTagOpen,
            TokenKind::Expression,
            TokenKind::UnsanitizedTagClose,
        ]
    );
}

#[test]
fn test_empty_tag_has_empty_expression() {
    assert_eq!(
        lex("{{}}"),
        vec![
            (TokenKind::SanitizedTagOpen, "{{".to_string()),
            (TokenKind::Expression, String::new()),
            (TokenKind::SanitizedTagClose, "}}".to_string()),
        ]
    );
}

#[test]
fn test_directive_splits_name_and_arguments() {
    assert_eq!(
        lex(r#"<% show("header") %>"#),
        vec![
            (TokenKind::DirectiveOpen, "<%".to_string()),
            (TokenKind::DirectiveName, "show".to_string()),
            (TokenKind::Expression, r#"("header")"#.to_string()),
            (TokenKind::DirectiveClose, "%>".to_string()),
        ]
    );
}

#[test]
fn test_directive_without_arguments() {
    assert_eq!(
        kinds("<% endpart %>"),
        vec![
            TokenKind::DirectiveOpen,
            TokenKind::DirectiveName,
            TokenKind::DirectiveClose,
        ]
    );
}

#[test]
fn test_directive_missing_name() {
    let err = lex_err(r#"<% ("header") %>"#);
    assert_eq!(err.kind, LexErrorKind::MissingDirectiveName);
}

#[test]
fn test_escaped_tag_open() {
    assert_eq!(
        lex(r"\{{ not a tag }}"),
        vec![(TokenKind::EscapedTagOpen, "{{".to_string())]
    );
    assert_eq!(
        lex(r"\{{! raw !}}"),
        vec![(TokenKind::EscapedTagOpen, "{{!".to_string())]
    );
}

#[test]
fn test_backslash_before_directive_is_not_an_escape() {
    assert_eq!(
        kinds(r"\<% endif %>"),
        vec![
            TokenKind::DirectiveOpen,
            TokenKind::DirectiveName,
            TokenKind::DirectiveClose,
        ]
    );
}

#[test]
fn test_close_delimiter_inside_string_is_ignored() {
    let tokens = lex(r#"{{ "}}" }}"#);
    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[1], (TokenKind::Expression, r#""}}""#.to_string()));
}

#[test]
fn test_escaped_quote_inside_string() {
    let tokens = lex(r#"{{ 'it\'s }}' }}"#);
    assert_eq!(tokens[1].1, r#"'it\'s }}'"#);
}

#[test]
fn test_unterminated_tag() {
    let err = lex_err("Hello {{ name");
    assert_eq!(err.kind, LexErrorKind::UnterminatedTag);
    assert_eq!(err.expected.as_deref(), Some("`}}`"));
}

#[test]
fn test_unterminated_directive() {
    let err = lex_err("<% if($x)\n\nbody");
    assert_eq!(err.kind, LexErrorKind::UnterminatedDirective);
    assert_eq!(err.opened_at, Some(1));
    assert_eq!(err.line, 3);
}

#[test]
fn test_unterminated_string() {
    let err = lex_err(r#"{{ "abc }}"#);
    assert_eq!(err.kind, LexErrorKind::UnterminatedString);
}

#[test]
fn test_lines_are_tracked() {
    let tokens = tokenize("one\ntwo {{ a }}\n\n{{ b\n}}", &DelimiterConfig::default()).unwrap();
    let lines: Vec<usize> = tokens.iter().map(|t| t.line).collect();
    assert_eq!(lines, vec![2, 2, 2, 4, 4, 5]);
}

#[test]
fn test_spans_cover_the_source() {
    let input = "x{{ a }}y";
    let tokens = tokenize(input, &DelimiterConfig::default()).unwrap();
    assert_eq!(&input[tokens[0].span.clone()], "{{");
    assert_eq!(&input[tokens[1].span.clone()], " a ");
    assert_eq!(&input[tokens[2].span.clone()], "}}");
}

#[test]
fn test_multiline_tag_body_is_trimmed() {
    let tokens = lex("{{\n  date(\n    \"Y\"\n  )\n}}");
    assert_eq!(tokens[1].1, "date(\n    \"Y\"\n  )");
}

#[test]
fn test_custom_delimiters() {
    let mut delimiters = DelimiterConfig::default();
    delimiters.set(DelimiterType::Directive, Delimiters::new("(*", "*)"));
    delimiters.set(DelimiterType::SanitizedTag, Delimiters::new("^^", "$$"));
    delimiters.set(DelimiterType::UnsanitizedTag, Delimiters::new("++", "--"));

    assert_eq!(
        lex_with(r#"(* show("a") *) ^^ b $$ ++ c -- {{ d }}"#, &delimiters)
            .into_iter()
            .map(|(kind, _)| kind)
            .collect::<Vec<_>>(),
        vec![
            TokenKind::DirectiveOpen,
            TokenKind::DirectiveName,
            TokenKind::Expression,
            TokenKind::DirectiveClose,
            TokenKind::SanitizedTagOpen,
            TokenKind::Expression,
            TokenKind::SanitizedTagClose,
            TokenKind::UnsanitizedTagOpen,
            TokenKind::Expression,
            TokenKind::UnsanitizedTagClose,
        ]
    );
}

#[test]
fn test_cleared_delimiters_are_not_recognized() {
    let mut delimiters = DelimiterConfig::default();
    delimiters.clear(DelimiterType::Directive);
    assert!(lex_with("<% show(\"x\") %>", &delimiters).is_empty());
}

#[test]
fn test_non_ascii_text_is_skipped() {
    assert_eq!(
        kinds("héllo wörld {{ ü }} ✓"),
        vec![
            TokenKind::SanitizedTagOpen,
            TokenKind::Expression,
            TokenKind::SanitizedTagClose,
        ]
    );
}
