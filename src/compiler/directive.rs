//! The directive sub-compiler.
//!
//! Directives are control instructions between directive delimiters:
//!
//! ```text
//! <% part("name") %> ... <% endpart %>   define a part
//! <% show("name") %>                     insert a part
//! <% parent %>                           inside a part: the parent template's part
//! <% if(cond) %> ... <% elseif(cond) %> ... <% else %> ... <% endif %>
//! ```
//!
//! Compilation is two-pass. Pass 1 registers every part definition in the
//! template, wherever it appears, so `show` may reference a part defined later
//! in the source. Pass 2 renders the remaining nodes. Tags and escaped tag
//! delimiters are copied verbatim for the tag sub-compiler.

use rustc_hash::FxHashMap;
use tracing::{trace, warn};

use super::CompilerConfig;
use super::error::{ErrorKind, ViewCompilerError};
use super::expr::{self, Evaluator, Expr};
use super::lexer::tokenize;
use super::lines::{LineMap, LineOrigin};
use super::segment::{Segment, build_segments};
use crate::functions::FunctionRegistry;
use crate::template::Template;
use crate::value::{is_truthy, render_value};

type Result<T> = std::result::Result<T, ViewCompilerError>;

/// A parsed directive-level node. Lines are 1-based within the parsed text.
#[derive(Debug)]
enum Node<'s> {
    /// Verbatim text, tags, and escaped tag delimiters.
    Text { text: &'s str, line: usize },
    Part {
        name: Expr,
        body: String,
        line: usize,
        /// Line on which the body starts.
        body_line: usize,
    },
    Show {
        name: Expr,
        line: usize,
    },
    Parent {
        line: usize,
    },
    If {
        branches: Vec<Branch<'s>>,
    },
}

#[derive(Debug)]
struct Branch<'s> {
    /// `None` for the `else` branch.
    condition: Option<Expr>,
    line: usize,
    children: Vec<Node<'s>>,
}

/// The block whose closing directives end the current node list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Block {
    Root,
    Part,
    If,
}

/// Directive that ended a node list.
#[derive(Debug)]
enum Terminator {
    EndPart,
    ElseIf { condition: Expr, line: usize },
    Else { line: usize },
    EndIf,
}

/// The part being rendered, for resolving `parent`.
#[derive(Clone, Copy)]
struct PartScope<'a> {
    name: &'a str,
    /// The template whose own part map supplied the body.
    owner: &'a Template,
}

/// What the text being rendered is, and where it came from.
#[derive(Clone, Copy)]
struct Frame<'a> {
    scope: Option<PartScope<'a>>,
    origin: LineOrigin,
    depth: usize,
}

/// Pass 2 state.
struct Output<'t> {
    template: &'t Template,
    /// Source line each part defined in the compiled contents starts on.
    part_lines: FxHashMap<String, usize>,
    text: String,
    lines: LineMap,
}

pub(crate) struct DirectiveCompiler<'c> {
    functions: &'c FunctionRegistry,
    config: &'c CompilerConfig,
}

impl<'c> DirectiveCompiler<'c> {
    pub fn new(functions: &'c FunctionRegistry, config: &'c CompilerConfig) -> Self {
        Self { functions, config }
    }

    /// Registers the parts defined in `contents` on `template` and renders
    /// every other directive.
    pub fn compile(&self, template: &mut Template, contents: &str) -> Result<String> {
        self.compile_mapped(template, contents).map(|(text, _)| text)
    }

    /// Like [`compile`](Self::compile), also returning where each piece of
    /// the output came from in `contents`.
    pub fn compile_mapped(
        &self,
        template: &mut Template,
        contents: &str,
    ) -> Result<(String, LineMap)> {
        let tokens = tokenize(contents, template.delimiter_config())?;
        if tokens.is_empty() {
            return Ok((contents.to_string(), LineMap::default()));
        }
        let segments = build_segments(contents, &tokens);
        let nodes = NodeParser::new(&segments, self.config.max_directive_depth).parse_root(false)?;

        let mut part_lines = FxHashMap::default();
        self.register_parts(template, &nodes, &mut part_lines)?;

        let mut out = Output {
            template: &*template,
            part_lines,
            text: String::with_capacity(contents.len()),
            lines: LineMap::default(),
        };
        let frame = Frame {
            scope: None,
            origin: LineOrigin::TOP,
            depth: 0,
        };
        self.render(&mut out, &nodes, frame)?;
        Ok((out.text, out.lines))
    }

    /// Pass 1. Later definitions of the same name replace earlier ones.
    fn register_parts(
        &self,
        template: &mut Template,
        nodes: &[Node<'_>],
        part_lines: &mut FxHashMap<String, usize>,
    ) -> Result<()> {
        for node in nodes {
            match node {
                Node::Part {
                    name,
                    body,
                    line,
                    body_line,
                } => {
                    let name = self.part_name(template, name, *line)?;
                    if part_lines.insert(name.clone(), *body_line).is_some() {
                        warn!(
                            part = %name,
                            line,
                            path = template.path(),
                            "part defined more than once; the last definition wins"
                        );
                    }
                    trace!(part = %name, line, "registered part");
                    template.set_part(name, body.as_str());
                }
                Node::If { branches } => {
                    for branch in branches {
                        self.register_parts(template, &branch.children, part_lines)?;
                    }
                }
                Node::Text { .. } | Node::Show { .. } | Node::Parent { .. } => {}
            }
        }
        Ok(())
    }

    /// Pass 2.
    fn render(&self, out: &mut Output<'_>, nodes: &[Node<'_>], frame: Frame<'_>) -> Result<()> {
        let template = out.template;
        for node in nodes {
            match node {
                Node::Text { text, line } => {
                    out.lines
                        .push(out.text.len(), frame.origin.map(*line), frame.origin.advances());
                    out.text.push_str(text);
                }
                Node::Part { .. } => {}
                Node::Show { name, line } => {
                    let line = frame.origin.map(*line);
                    let name = self.part_name(template, name, line)?;
                    let found = template
                        .part_owner(&name)
                        .and_then(|owner| owner.part(&name).map(|body| (owner, body)));
                    let Some((owner, body)) = found else {
                        return Err(ViewCompilerError::new(
                            ErrorKind::UndefinedPart,
                            format!("part `{name}` is not defined"),
                        )
                        .at_line(line)
                        .with_help(format!("define it with part(\"{name}\") ... endpart")));
                    };
                    trace!(part = %name, depth = frame.depth, "showing part");

                    // Only parts defined in the compiled contents have source lines
                    let origin = match out.part_lines.get(&name) {
                        Some(&first_line) if std::ptr::eq(owner, template) => {
                            LineOrigin::Source { first_line }
                        }
                        _ => LineOrigin::Fixed(line),
                    };
                    let frame = Frame {
                        scope: Some(PartScope { name: &name, owner }),
                        origin,
                        depth: frame.depth + 1,
                    };
                    self.render_body(out, body, frame, line)?;
                }
                Node::Parent { line } => {
                    let line = frame.origin.map(*line);
                    let Some(scope) = frame.scope else {
                        return Err(ViewCompilerError::new(
                            ErrorKind::UndefinedPart,
                            "`parent` used outside of a part",
                        )
                        .at_line(line));
                    };
                    let found = scope
                        .owner
                        .parent()
                        .and_then(|parent| parent.part_owner(scope.name))
                        .and_then(|owner| owner.part(scope.name).map(|body| (owner, body)));
                    let Some((owner, body)) = found else {
                        return Err(ViewCompilerError::new(
                            ErrorKind::UndefinedPart,
                            format!("no parent template defines part `{}`", scope.name),
                        )
                        .at_line(line));
                    };
                    trace!(part = scope.name, depth = frame.depth, "showing parent part");
                    let frame = Frame {
                        scope: Some(PartScope {
                            name: scope.name,
                            owner,
                        }),
                        origin: LineOrigin::Fixed(line),
                        depth: frame.depth + 1,
                    };
                    self.render_body(out, body, frame, line)?;
                }
                Node::If { branches } => {
                    let evaluator = Evaluator::new(template, self.functions);
                    for branch in branches {
                        let taken = match &branch.condition {
                            Some(condition) => is_truthy(&evaluator.evaluate(condition).map_err(
                                |err| ViewCompilerError::evaluation(err, frame.origin.map(branch.line)),
                            )?),
                            None => true,
                        };
                        if taken {
                            trace!(line = branch.line, "taking conditional branch");
                            self.render(out, &branch.children, frame)?;
                            break;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Compiles the body of a shown part in place. `line` is the source line
    /// of the directive that pulled it in.
    fn render_body(
        &self,
        out: &mut Output<'_>,
        body: &str,
        frame: Frame<'_>,
        line: usize,
    ) -> Result<()> {
        if frame.depth > self.config.max_directive_depth {
            let name = frame.scope.map_or("", |scope| scope.name);
            return Err(ViewCompilerError::new(
                ErrorKind::RecursionLimitExceeded,
                format!(
                    "part `{name}` nests more than {} levels deep",
                    self.config.max_directive_depth
                ),
            )
            .at_line(line)
            .with_help("check for a part that shows itself"));
        }

        let tokens = tokenize(body, out.template.delimiter_config())
            .map_err(|err| frame.origin.relocate(err.into()))?;
        let segments = build_segments(body, &tokens);
        let nodes = NodeParser::new(&segments, self.config.max_directive_depth)
            .parse_root(true)
            .map_err(|err| frame.origin.relocate(err))?;
        self.render(out, &nodes, frame)
    }

    fn part_name(&self, template: &Template, name: &Expr, line: usize) -> Result<String> {
        Evaluator::new(template, self.functions)
            .evaluate(name)
            .map(|value| render_value(&value))
            .map_err(|err| ViewCompilerError::evaluation(err, line))
    }
}

/// Builds the node tree from segments.
struct NodeParser<'a, 's> {
    segments: &'a [Segment<'s>],
    pos: usize,
    /// Line the next segment starts on.
    line: usize,
    max_depth: usize,
}

impl<'a, 's> NodeParser<'a, 's> {
    fn new(segments: &'a [Segment<'s>], max_depth: usize) -> Self {
        Self {
            segments,
            pos: 0,
            line: 1,
            max_depth,
        }
    }

    /// Parses every segment. `in_part` rejects part definitions.
    fn parse_root(mut self, in_part: bool) -> Result<Vec<Node<'s>>> {
        let (nodes, _) = self.parse_nodes(Block::Root, in_part, 0)?;
        Ok(nodes)
    }

    /// Parses nodes until a directive that closes `block`, or the end.
    fn parse_nodes(
        &mut self,
        block: Block,
        in_part: bool,
        depth: usize,
    ) -> Result<(Vec<Node<'s>>, Option<Terminator>)> {
        let mut nodes = Vec::new();

        while let Some(segment) = self.segments.get(self.pos) {
            self.pos += 1;
            let start_line = self.line;
            self.line += segment.raw().matches('\n').count();

            let Segment::Directive {
                name,
                expression,
                line,
                ..
            } = *segment
            else {
                nodes.push(Node::Text {
                    text: segment.raw(),
                    line: start_line,
                });
                continue;
            };

            match name {
                "part" => {
                    if in_part {
                        return Err(ViewCompilerError::new(
                            ErrorKind::UnbalancedDirective,
                            "part definitions cannot be nested",
                        )
                        .at_line(line)
                        .with_help("close the enclosing part with endpart first"));
                    }
                    let part_name = argument(name, expression, line)?;
                    let body_start = self.pos;
                    let body_line = self.line;
                    self.check_depth(depth + 1, line)?;
                    let (_, terminator) = self.parse_nodes(Block::Part, true, depth + 1)?;
                    if !matches!(terminator, Some(Terminator::EndPart)) {
                        return Err(unclosed("part", "endpart", line));
                    }
                    // Everything between the part directive and its endpart
                    let body = self.segments[body_start..self.pos - 1]
                        .iter()
                        .map(Segment::raw)
                        .collect();
                    nodes.push(Node::Part {
                        name: part_name,
                        body,
                        line,
                        body_line,
                    });
                }
                "show" => nodes.push(Node::Show {
                    name: argument(name, expression, line)?,
                    line,
                }),
                "parent" => {
                    if expression.is_some_and(|e| e != "()") {
                        return Err(ViewCompilerError::new(
                            ErrorKind::InvalidExpression,
                            "`parent` takes no arguments",
                        )
                        .at_line(line));
                    }
                    nodes.push(Node::Parent { line });
                }
                "if" => {
                    let condition = argument(name, expression, line)?;
                    nodes.push(self.parse_if(condition, line, in_part, depth + 1)?);
                }
                "endpart" if block == Block::Part => return Ok((nodes, Some(Terminator::EndPart))),
                "elseif" if block == Block::If => {
                    let condition = argument(name, expression, line)?;
                    return Ok((nodes, Some(Terminator::ElseIf { condition, line })));
                }
                "else" if block == Block::If => return Ok((nodes, Some(Terminator::Else { line }))),
                "endif" if block == Block::If => return Ok((nodes, Some(Terminator::EndIf))),
                "endpart" | "elseif" | "else" | "endif" => {
                    let opener = if name == "endpart" { "part" } else { "if" };
                    return Err(ViewCompilerError::new(
                        ErrorKind::UnbalancedDirective,
                        format!("`{name}` without a matching `{opener}`"),
                    )
                    .at_line(line));
                }
                _ => {
                    return Err(ViewCompilerError::new(
                        ErrorKind::UnknownDirective,
                        format!("unknown directive `{name}`"),
                    )
                    .at_line(line)
                    .with_help("known directives: part, endpart, show, parent, if, elseif, else, endif"));
                }
            }
        }

        Ok((nodes, None))
    }

    fn parse_if(&mut self, condition: Expr, line: usize, in_part: bool, depth: usize) -> Result<Node<'s>> {
        self.check_depth(depth, line)?;
        let mut branches = Vec::new();
        let mut condition = Some(condition);
        let mut branch_line = line;

        loop {
            let (children, terminator) = self.parse_nodes(Block::If, in_part, depth)?;
            let seen_else = condition.is_none();
            branches.push(Branch {
                condition: condition.take(),
                line: branch_line,
                children,
            });

            match terminator {
                Some(Terminator::EndIf) => return Ok(Node::If { branches }),
                Some(Terminator::ElseIf { line, .. } | Terminator::Else { line }) if seen_else => {
                    return Err(ViewCompilerError::new(
                        ErrorKind::UnbalancedDirective,
                        "`else` must be the last branch of an `if`",
                    )
                    .at_line(line));
                }
                Some(Terminator::ElseIf {
                    condition: next,
                    line,
                }) => {
                    condition = Some(next);
                    branch_line = line;
                }
                Some(Terminator::Else { line }) => branch_line = line,
                Some(Terminator::EndPart) | None => return Err(unclosed("if", "endif", line)),
            }
        }
    }

    fn check_depth(&self, depth: usize, line: usize) -> Result<()> {
        if depth > self.max_depth {
            return Err(ViewCompilerError::new(
                ErrorKind::RecursionLimitExceeded,
                format!("directives nest more than {} levels deep", self.max_depth),
            )
            .at_line(line));
        }
        Ok(())
    }
}

/// Parses the argument expression a directive requires.
fn argument(directive: &str, expression: Option<&str>, line: usize) -> Result<Expr> {
    let Some(body) = expression else {
        return Err(ViewCompilerError::new(
            ErrorKind::InvalidExpression,
            format!("`{directive}` requires an argument"),
        )
        .at_line(line));
    };
    expr::parse(body).map_err(|err| ViewCompilerError::invalid_expression(&err, body, line))
}

fn unclosed(opener: &str, closer: &str, line: usize) -> ViewCompilerError {
    ViewCompilerError::new(
        ErrorKind::UnbalancedDirective,
        format!("`{opener}` is never closed"),
    )
    .at_line(line)
    .with_help(format!("add `{closer}`"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use pretty_assertions::assert_eq;

    fn compile(template: &mut Template) -> Result<String> {
        let functions = FunctionRegistry::new();
        let config = CompilerConfig::default();
        let contents = template.contents().to_string();
        DirectiveCompiler::new(&functions, &config).compile(template, &contents)
    }

    fn compile_str(contents: &str) -> Result<String> {
        compile(&mut Template::with_contents("test", contents))
    }

    fn error_kind(contents: &str) -> ErrorKind {
        compile_str(contents).expect_err("compile should fail").kind
    }

    #[test]
    fn test_no_directives_is_identity() {
        let contents = "<?php foreach ($items as $item): ?>{{ $item }}<?php endforeach; ?>";
        assert_eq!(compile_str(contents).unwrap(), contents);
    }

    #[test]
    fn test_show_before_part_definition() {
        let mut template = Template::with_contents(
            "test",
            "<% show(\"header\") %>|<% part(\"header\") %>Hi<% endpart %>",
        );
        assert_eq!(compile(&mut template).unwrap(), "Hi|");
        assert_eq!(template.part("header"), Some("Hi"));
    }

    #[test]
    fn test_parts_are_removed_from_output() {
        assert_eq!(
            compile_str("a<% part(\"x\") %>\nbody\n<% endpart %>b").unwrap(),
            "ab"
        );
    }

    #[test]
    fn test_tags_are_copied_verbatim() {
        assert_eq!(
            compile_str("<% part('p') %>{{ title }} \\{{ x }}<% endpart %><% show('p') %>").unwrap(),
            "{{ title }} \\{{ x }}"
        );
    }

    #[test]
    fn test_duplicate_part_last_wins() {
        assert_eq!(
            compile_str("<% part('a') %>1<% endpart %><% part('a') %>2<% endpart %><% show('a') %>")
                .unwrap(),
            "2"
        );
    }

    #[test]
    fn test_part_inside_conditional_is_registered() {
        assert_eq!(
            compile_str("<% if(false) %><% part('a') %>x<% endpart %><% endif %><% show('a') %>")
                .unwrap(),
            "x"
        );
    }

    #[test]
    fn test_conditionals() {
        let mut template = Template::with_contents(
            "test",
            "<% if($n > 1) %>many<% elseif($n == 1) %>one<% else %>none<% endif %>",
        );
        template.set_var("n", 1);
        assert_eq!(compile(&mut template).unwrap(), "one");
        template.set_var("n", 0);
        assert_eq!(compile(&mut template).unwrap(), "none");
        template.set_var("n", 5);
        assert_eq!(compile(&mut template).unwrap(), "many");
    }

    #[test]
    fn test_nested_conditionals() {
        let mut template = Template::with_contents(
            "test",
            "<% if($a) %>A<% if($b) %>B<% endif %><% endif %>",
        );
        template.set_var("a", true);
        template.set_var("b", false);
        assert_eq!(compile(&mut template).unwrap(), "A");
    }

    #[test]
    fn test_show_inherits_parent_parts() {
        let mut parent = Template::new();
        parent.set_part("footer", "(c) 2024");
        let mut child = Template::with_contents("child", "<% show('footer') %>");
        child.set_parent(Arc::new(parent));
        assert_eq!(compile(&mut child).unwrap(), "(c) 2024");
    }

    #[test]
    fn test_parent_directive_renders_parent_part() {
        let mut parent = Template::new();
        parent.set_part("title", "Site");
        let mut child = Template::with_contents(
            "child",
            "<% part('title') %>Page - <% parent %><% endpart %><% show('title') %>",
        );
        child.set_parent(Arc::new(parent));
        assert_eq!(compile(&mut child).unwrap(), "Page - Site");
    }

    #[test]
    fn test_parent_outside_part() {
        assert_eq!(error_kind("<% parent %>"), ErrorKind::UndefinedPart);
    }

    #[test]
    fn test_undefined_part() {
        let err = compile_str("line\n<% show(\"missing\") %>").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedPart);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_unknown_directive() {
        assert_eq!(error_kind("<% foreach($x) %>"), ErrorKind::UnknownDirective);
    }

    #[test]
    fn test_unbalanced_directives() {
        assert_eq!(error_kind("<% endpart %>"), ErrorKind::UnbalancedDirective);
        assert_eq!(error_kind("<% endif %>"), ErrorKind::UnbalancedDirective);
        assert_eq!(error_kind("<% part('a') %>x"), ErrorKind::UnbalancedDirective);
        assert_eq!(error_kind("<% if(true) %>x"), ErrorKind::UnbalancedDirective);
        assert_eq!(
            error_kind("<% part('a') %><% part('b') %><% endpart %><% endpart %>"),
            ErrorKind::UnbalancedDirective
        );
        assert_eq!(
            error_kind("<% if(true) %><% else %><% else %><% endif %>"),
            ErrorKind::UnbalancedDirective
        );
        assert_eq!(
            error_kind("<% part('a') %><% if(true) %><% endpart %><% endif %>"),
            ErrorKind::UnbalancedDirective
        );
    }

    #[test]
    fn test_missing_argument() {
        assert_eq!(error_kind("<% show %>"), ErrorKind::InvalidExpression);
        assert_eq!(error_kind("<% show(\"a\" %>"), ErrorKind::InvalidExpression);
    }

    #[test]
    fn test_self_showing_part_hits_recursion_limit() {
        assert_eq!(
            error_kind("<% part('a') %><% show('a') %><% endpart %><% show('a') %>"),
            ErrorKind::RecursionLimitExceeded
        );
    }

    #[test]
    fn test_custom_directive_delimiters() {
        let mut template = Template::with_contents(
            "test",
            "(* part(\"x\") *)X(* endpart *)(* show(\"x\") *){{ foo }}",
        );
        template.set_delimiters(crate::template::DelimiterType::Directive, "(*", "*)");
        assert_eq!(compile(&mut template).unwrap(), "X{{ foo }}");
    }

    #[test]
    fn test_lexical_errors_propagate() {
        assert_eq!(error_kind("<% show('a'"), ErrorKind::Lexical);
    }

    #[test]
    fn test_errors_inside_parts_report_source_lines() {
        let err = compile_str(
            "<% part('a') %>\nA\n\n\n<% show('zzz') %>\n<% endpart %>\n<% show('a') %>",
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedPart);
        assert_eq!(err.line, Some(5));

        let err = compile_str("x\n<% part('a') %><% if($nope) %><% endif %><% endpart %>\n<% show('a') %>")
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnresolvedExpression);
        assert_eq!(err.line, Some(2));
    }

    #[test]
    fn test_errors_inside_inherited_parts_report_show_line() {
        let mut parent = Template::new();
        parent.set_part("nav", "a\n<% show('missing') %>");
        let mut child = Template::with_contents("child", "x\n\n<% show('nav') %>");
        child.set_parent(Arc::new(parent));

        let err = compile(&mut child).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedPart);
        assert_eq!(err.line, Some(3));
    }

    #[test]
    fn test_line_map_tracks_spliced_parts() {
        let functions = FunctionRegistry::new();
        let config = CompilerConfig::default();
        let contents = "<% part('a') %>\n{{ a }}\n<% endpart %>\nx\n<% show('a') %>";
        let mut template = Template::with_contents("test", contents);
        let (output, lines) = DirectiveCompiler::new(&functions, &config)
            .compile_mapped(&mut template, contents)
            .unwrap();

        assert_eq!(output, "\nx\n\n{{ a }}\n");
        assert_eq!(lines.line_at(&output, output.find('x').unwrap()), 4);
        assert_eq!(lines.line_at(&output, output.find("{{").unwrap()), 2);
    }
}
