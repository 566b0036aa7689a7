//! Java structural parser built on the tree-sitter grammar.
//!
//! Extracts a File → Class → Method → Line component tree. Identities are
//! stable and order-independent: nested classes carry their dotted ancestor
//! chain, overloaded methods carry a canonical parameter type list, and
//! anonymous class bodies get a synthetic `N$<k>` name numbered in source
//! order within their enclosing component.

use std::collections::HashSet;

use tree_sitter::{Node, Parser};

use crate::core::component::Component;
use crate::core::errors::{Error, Result};
use crate::core::types::{ComponentKind, Granularity};
use crate::parsing::SourceParser;

pub struct JavaParser {
    parser: Parser,
}

impl JavaParser {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        parser
            .set_language(&tree_sitter_java::LANGUAGE.into())
            .map_err(|e| Error::extraction(format!("failed to load Java grammar: {e}")))?;
        Ok(Self { parser })
    }
}

impl SourceParser for JavaParser {
    fn parse(&mut self, path: &str, source: &str, granularity: Granularity) -> Result<Component> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or_else(|| Error::parse(path, 0, 0, "parser produced no tree"))?;
        let root = tree.root_node();
        if root.has_error() {
            let (line, column) = error_position(root);
            return Err(Error::parse(path, line, column, "invalid Java source"));
        }
        let end_line = (root.end_position().row + 1).max(1);
        let mut file = Component::file(path, end_line);
        if granularity > Granularity::File {
            let walker = TreeWalker {
                source: source.as_bytes(),
                granularity,
            };
            let mut anon = 0usize;
            let mut lines = HashSet::new();
            walker.visit_children(root, &mut file, &mut anon, &mut lines);
        }
        Ok(file)
    }
}

/// Position of the first ERROR or MISSING node, 1-based line
fn error_position(node: Node) -> (usize, usize) {
    match find_error_node(node) {
        Some(err) => (err.start_position().row + 1, err.start_position().column),
        None => (0, 0),
    }
}

fn find_error_node(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    if !node.has_error() {
        return None;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        if let Some(found) = find_error_node(child) {
            return Some(found);
        }
    }
    Some(node)
}

fn is_class_declaration(kind: &str) -> bool {
    matches!(
        kind,
        "class_declaration"
            | "interface_declaration"
            | "enum_declaration"
            | "record_declaration"
            | "annotation_type_declaration"
    )
}

/// Nodes whose start line is tracked at Line granularity
fn is_line_bearing(kind: &str) -> bool {
    kind.ends_with("_statement")
        || matches!(
            kind,
            "field_declaration"
                | "local_variable_declaration"
                | "import_declaration"
                | "package_declaration"
        )
}

struct TreeWalker<'a> {
    source: &'a [u8],
    granularity: Granularity,
}

impl<'a> TreeWalker<'a> {
    fn visit_children(
        &self,
        node: Node,
        parent: &mut Component,
        anon: &mut usize,
        lines: &mut HashSet<usize>,
    ) {
        let mut cursor = node.walk();
        for child in node.named_children(&mut cursor) {
            self.visit(child, parent, anon, lines);
        }
    }

    fn visit(&self, node: Node, parent: &mut Component, anon: &mut usize, lines: &mut HashSet<usize>) {
        let kind = node.kind();
        if is_class_declaration(kind) {
            if self.granularity.includes(ComponentKind::Class) {
                if let Some(name) = self.field_text(node, "name") {
                    self.push_component(node, node, ComponentKind::Class, name, parent);
                    return;
                }
            }
        } else if kind == "method_declaration" || kind == "constructor_declaration" {
            if self.granularity.includes(ComponentKind::Method) {
                if let Some(signature) = self.method_signature(node) {
                    self.push_component(node, node, ComponentKind::Method, signature, parent);
                    return;
                }
            }
        } else if kind == "object_creation_expression" {
            if self.granularity.includes(ComponentKind::Class) {
                if let Some(body) = anonymous_body(node) {
                    *anon += 1;
                    let name = format!("N${anon}");
                    self.push_component(node, body, ComponentKind::Class, name, parent);
                    return;
                }
            }
        } else if is_line_bearing(kind) && self.granularity == Granularity::Line {
            self.push_line(parent, node.start_position().row + 1, lines);
        }
        self.visit_children(node, parent, anon, lines);
    }

    /// Create a class or method component spanning `node`, walk `scope` for
    /// its members, and attach it to `parent`
    fn push_component(
        &self,
        node: Node,
        scope: Node,
        kind: ComponentKind,
        name: String,
        parent: &mut Component,
    ) {
        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;
        let mut component =
            Component::child_of(&parent.identity, kind, name, start_line, end_line);
        let mut anon = 0usize;
        let mut lines = HashSet::new();
        if self.granularity == Granularity::Line {
            // Line where the class or method is declared
            self.push_line(&mut component, start_line, &mut lines);
        }
        self.visit_children(scope, &mut component, &mut anon, &mut lines);
        parent.children.push(component);
    }

    fn push_line(&self, parent: &mut Component, line: usize, lines: &mut HashSet<usize>) {
        if lines.insert(line) {
            parent.children.push(Component::child_of(
                &parent.identity,
                ComponentKind::Line,
                line.to_string(),
                line,
                line,
            ));
        }
    }

    /// Canonical method signature: name plus parameter type list, e.g.
    /// `login(String,String)`. Overloads are thereby distinct identities.
    fn method_signature(&self, node: Node) -> Option<String> {
        let name = self.field_text(node, "name")?;
        let mut types = Vec::new();
        if let Some(params) = node.child_by_field_name("parameters") {
            let mut cursor = params.walk();
            for param in params.named_children(&mut cursor) {
                match param.kind() {
                    "formal_parameter" => {
                        if let Some(ty) = param.child_by_field_name("type") {
                            types.push(self.type_text(ty));
                        }
                    }
                    "spread_parameter" => {
                        let mut inner = param.walk();
                        let ty = param
                            .named_children(&mut inner)
                            .find(|n| n.kind() != "modifiers" && n.kind() != "variable_declarator");
                        if let Some(ty) = ty {
                            types.push(format!("{}...", self.type_text(ty)));
                        }
                    }
                    _ => {}
                }
            }
        }
        Some(format!("{}({})", name, types.join(",")))
    }

    /// Source text of a type node with all whitespace stripped
    fn type_text(&self, node: Node) -> String {
        self.text(node).split_whitespace().collect()
    }

    fn text(&self, node: Node) -> String {
        node.utf8_text(self.source).unwrap_or("").to_string()
    }

    fn field_text(&self, node: Node, field: &str) -> Option<String> {
        node.child_by_field_name(field).map(|n| self.text(n))
    }
}

/// The class body of an anonymous class instantiation, if any
fn anonymous_body(node: Node) -> Option<Node> {
    let mut cursor = node.walk();
    let body = node
        .named_children(&mut cursor)
        .find(|n| n.kind() == "class_body");
    body
}
