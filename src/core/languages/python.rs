use tree_sitter::{Node, Parser, Tree};

use crate::core::entity::{Entity, EntityKind};
use crate::core::parser::SkipReason;

/// Statements whose blocks may hold top-level declarations (`if TYPE_CHECKING:` etc.)
const COMPOUND_STATEMENTS: &[&str] = &[
    "module",
    "block",
    "if_statement",
    "elif_clause",
    "else_clause",
    "try_statement",
    "except_clause",
    "except_group_clause",
    "finally_clause",
    "with_statement",
    "for_statement",
    "while_statement",
    "match_statement",
    "case_clause",
];

/// Python 2 statements the grammar still accepts but Python 3 rejects
const LEGACY_STATEMENTS: &[&str] = &["print_statement", "exec_statement"];

/// Python-specific parser using Tree-sitter
pub struct PythonParser {
    parser: Parser,
}

impl PythonParser {
    pub fn new() -> Result<Self, SkipReason> {
        let mut parser = Parser::new();
        let python_language = tree_sitter_python::language();
        parser
            .set_language(&python_language)
            .map_err(|e| SkipReason::Parser(format!("failed to set Python language: {}", e)))?;

        Ok(Self { parser })
    }

    /// Parse source text; any error or missing node, or a Python 2 only
    /// statement, rejects the whole file
    pub fn parse(&mut self, content: &str) -> Result<Tree, SkipReason> {
        let tree = self
            .parser
            .parse(content, None)
            .ok_or_else(|| SkipReason::Parser("parser returned no tree".to_string()))?;

        let root = tree.root_node();
        if root.has_error() {
            let line = first_error_line(root).unwrap_or(1);
            return Err(SkipReason::Syntax { line });
        }
        if let Some(line) = first_legacy_statement_line(root) {
            return Err(SkipReason::Syntax { line });
        }

        Ok(tree)
    }

    /// Collect module-level classes and functions
    pub fn extract_entities(&self, root: Node, source: &str, file: &str) -> Vec<Entity> {
        let mut entities = Vec::new();
        self.extract_python_items(root, source, file, &mut entities);
        entities
    }

    pub fn language_name(&self) -> &str {
        "python"
    }
}

impl PythonParser {
    /// Walk statement containers, stopping at declaration bodies
    fn extract_python_items(&self, node: Node, source: &str, file: &str, entities: &mut Vec<Entity>) {
        let mut cursor = node.walk();

        for child in node.named_children(&mut cursor) {
            match child.kind() {
                "class_definition" | "function_definition" => {
                    entities.extend(self.parse_definition(child, Vec::new(), source, file));
                }
                "decorated_definition" => {
                    let decorators = self.extract_decorators(child, source);
                    if let Some(definition) = child.child_by_field_name("definition") {
                        entities.extend(self.parse_definition(definition, decorators, source, file));
                    }
                }
                kind if COMPOUND_STATEMENTS.contains(&kind) => {
                    self.extract_python_items(child, source, file, entities);
                }
                _ => {}
            }
        }
    }

    fn parse_definition(
        &self,
        node: Node,
        decorators: Vec<String>,
        source: &str,
        file: &str,
    ) -> Option<Entity> {
        let name = self.node_text(node.child_by_field_name("name")?, source);

        let (kind, bases, method_count) = match node.kind() {
            "class_definition" => (
                EntityKind::Class,
                self.extract_bases(node, source),
                self.count_methods(node),
            ),
            _ => (EntityKind::Function, Vec::new(), 0),
        };

        Some(Entity {
            kind,
            name,
            line: node.start_position().row + 1,
            file: file.to_string(),
            bases,
            method_count,
            decorators,
            docstring: self.extract_docstring_from_body(node, source),
        })
    }

    /// Positional superclasses; keyword arguments like `metaclass=` are skipped
    fn extract_bases(&self, node: Node, source: &str) -> Vec<String> {
        let Some(superclasses) = node.child_by_field_name("superclasses") else {
            return Vec::new();
        };

        let mut cursor = superclasses.walk();
        superclasses
            .named_children(&mut cursor)
            .filter(|arg| !matches!(arg.kind(), "keyword_argument" | "comment"))
            .map(|arg| self.node_text(arg, source))
            .collect()
    }

    /// Function definitions directly in the class body, decorated or not
    fn count_methods(&self, node: Node) -> usize {
        let Some(body) = node.child_by_field_name("body") else {
            return 0;
        };

        let mut cursor = body.walk();
        body.named_children(&mut cursor)
            .filter(|child| match child.kind() {
                "function_definition" => true,
                "decorated_definition" => child
                    .child_by_field_name("definition")
                    .map_or(false, |d| d.kind() == "function_definition"),
                _ => false,
            })
            .count()
    }

    fn extract_decorators(&self, node: Node, source: &str) -> Vec<String> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .map(|decorator| {
                self.node_text(decorator, source)
                    .trim_start_matches('@')
                    .trim()
                    .to_string()
            })
            .collect()
    }

    /// Extract docstring from function/class body
    fn extract_docstring_from_body(&self, node: Node, source: &str) -> Option<String> {
        let body = node.child_by_field_name("body")?;
        let mut cursor = body.walk();
        let first = body
            .named_children(&mut cursor)
            .find(|child| child.kind() != "comment")?;

        // Only a bare string as the first statement counts
        if first.kind() != "expression_statement" || first.named_child_count() != 1 {
            return None;
        }
        let mut literal = first.named_child(0)?;
        while literal.kind() == "parenthesized_expression" && literal.named_child_count() == 1 {
            literal = literal.named_child(0)?;
        }
        let value = match literal.kind() {
            "string" => self.string_value(literal, source)?,
            "concatenated_string" => {
                let mut cursor = literal.walk();
                let parts = literal
                    .named_children(&mut cursor)
                    .filter(|part| part.kind() == "string")
                    .map(|part| self.string_value(part, source))
                    .collect::<Option<Vec<String>>>()?;
                parts.concat()
            }
            _ => return None,
        };

        let cleaned = clean_docstring(&value);
        if cleaned.is_empty() {
            None
        } else {
            Some(cleaned)
        }
    }

    /// Decoded value of a plain string literal. Byte strings and f-strings
    /// are not docstrings.
    fn string_value(&self, literal: Node, source: &str) -> Option<String> {
        let (prefix, body) = self.string_parts(literal, source);
        let prefix = prefix.to_ascii_lowercase();

        if prefix.contains('b') || prefix.contains('f') {
            return None;
        }
        if prefix.contains('r') {
            Some(body)
        } else {
            Some(decode_escapes(&body))
        }
    }

    /// Prefix letters and the raw text between the quotes of a string literal
    fn string_parts(&self, literal: Node, source: &str) -> (String, String) {
        let mut cursor = literal.walk();
        let children: Vec<Node> = literal.children(&mut cursor).collect();
        let start = children.iter().find(|c| c.kind() == "string_start");
        let end = children.iter().rev().find(|c| c.kind() == "string_end");

        match (start, end) {
            (Some(start), Some(end)) if start.end_byte() <= end.start_byte() => {
                let opener = &source[start.byte_range()];
                let prefix = opener.trim_end_matches(['"', '\'']).to_string();
                (prefix, source[start.end_byte()..end.start_byte()].to_string())
            }
            _ => {
                let raw = self.node_text(literal, source);
                let prefix: String = raw.chars().take_while(|c| c.is_ascii_alphabetic()).collect();
                let body = raw[prefix.len()..]
                    .trim_start_matches("\"\"\"")
                    .trim_end_matches("\"\"\"")
                    .trim_start_matches("'''")
                    .trim_end_matches("'''")
                    .trim_matches('"')
                    .trim_matches('\'')
                    .to_string();
                (prefix, body)
            }
        }
    }

    /// Extract text content of a node
    fn node_text(&self, node: Node, source: &str) -> String {
        source[node.byte_range()].to_string()
    }
}

/// Decode backslash escapes of a non-raw string literal. Unknown escapes
/// are kept verbatim.
fn decode_escapes(raw: &str) -> String {
    let mut decoded = String::with_capacity(raw.len());
    let mut chars = raw.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            decoded.push(c);
            continue;
        }
        let Some(escape) = chars.next() else {
            decoded.push('\\');
            break;
        };
        match escape {
            '\n' => {}
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
            }
            'n' => decoded.push('\n'),
            't' => decoded.push('\t'),
            'r' => decoded.push('\r'),
            'a' => decoded.push('\u{07}'),
            'b' => decoded.push('\u{08}'),
            'f' => decoded.push('\u{0c}'),
            'v' => decoded.push('\u{0b}'),
            '\\' | '\'' | '"' => decoded.push(escape),
            'x' | 'u' | 'U' => {
                let width = match escape {
                    'x' => 2,
                    'u' => 4,
                    _ => 8,
                };
                let digits: String = chars.clone().take(width).collect();
                let code = if digits.len() == width {
                    u32::from_str_radix(&digits, 16).ok().and_then(char::from_u32)
                } else {
                    None
                };
                match code {
                    Some(ch) => {
                        decoded.push(ch);
                        for _ in 0..width {
                            chars.next();
                        }
                    }
                    None => {
                        decoded.push('\\');
                        decoded.push(escape);
                    }
                }
            }
            other => {
                decoded.push('\\');
                decoded.push(other);
            }
        }
    }

    decoded
}

/// Strip surrounding blank lines and the common indentation of continuation lines
fn clean_docstring(raw: &str) -> String {
    let mut lines = raw.lines();
    let first = lines.next().unwrap_or("").trim().to_string();
    let rest: Vec<&str> = lines.collect();

    let indent = rest
        .iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned = vec![first];
    for line in rest {
        let dedented = match line.get(..indent) {
            Some(prefix) if prefix.trim().is_empty() => &line[indent..],
            _ => line.trim_start(),
        };
        cleaned.push(dedented.trim_end().to_string());
    }

    while cleaned.first().map_or(false, |l| l.is_empty()) {
        cleaned.remove(0);
    }
    while cleaned.last().map_or(false, |l| l.is_empty()) {
        cleaned.pop();
    }

    cleaned.join("\n")
}

/// 1-based line of the first error or missing node in pre-order
fn first_error_line(root: Node) -> Option<usize> {
    let mut pending = vec![root];

    while let Some(node) = pending.pop() {
        if node.is_error() || node.is_missing() {
            return Some(node.start_position().row + 1);
        }
        if node.has_error() {
            let mut cursor = node.walk();
            let children: Vec<Node> = node.children(&mut cursor).collect();
            pending.extend(children.into_iter().rev());
        }
    }

    None
}

/// 1-based line of the first `print`/`exec` statement in pre-order
fn first_legacy_statement_line(root: Node) -> Option<usize> {
    let mut pending = vec![root];

    while let Some(node) = pending.pop() {
        if LEGACY_STATEMENTS.contains(&node.kind()) {
            return Some(node.start_position().row + 1);
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();
        pending.extend(children.into_iter().rev());
    }

    None
}
