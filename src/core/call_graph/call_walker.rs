// src/core/call_graph/call_walker.rs - scope-tracking traversal of a Python tree
use tree_sitter::Node;

use super::{CallEdge, FileRelationships, ImportForm, ImportRecord, MODULE_SCOPE};

/// Node kinds the walker treats specially; everything else is only descended into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SyntaxKind {
    ClassDefinition,
    FunctionDefinition,
    DecoratedDefinition,
    Call,
    Import,
    ImportFrom,
    FutureImport,
    Other,
}

impl SyntaxKind {
    fn of(node: &Node<'_>) -> Self {
        match node.kind() {
            "class_definition" => SyntaxKind::ClassDefinition,
            // covers `async def` too
            "function_definition" => SyntaxKind::FunctionDefinition,
            "decorated_definition" => SyntaxKind::DecoratedDefinition,
            "call" => SyntaxKind::Call,
            "import_statement" => SyntaxKind::Import,
            "import_from_statement" => SyntaxKind::ImportFrom,
            "future_import_statement" => SyntaxKind::FutureImport,
            _ => SyntaxKind::Other,
        }
    }
}

/// Pending work for the iterative traversal. `Leave` closes the scope opened
/// by the declaration that scheduled it, after all of its children ran.
enum Step<'t> {
    Visit(Node<'t>),
    Leave,
}

/// Single-pass walker producing call edges and imports for one file.
///
/// Traversal is pre-order, left-to-right. Every scope push schedules exactly
/// one `Leave`, so the stack is back to empty once the walk completes.
pub struct CallWalker<'s> {
    file: &'s str,
    source: &'s str,
    scope: Vec<String>,
    output: FileRelationships,
}

impl<'s> CallWalker<'s> {
    pub fn new(file: &'s str, source: &'s str) -> Self {
        Self {
            file,
            source,
            scope: Vec::new(),
            output: FileRelationships::default(),
        }
    }

    /// Walk `root` and hand back everything recorded, in encounter order
    pub fn walk(mut self, root: Node<'_>) -> FileRelationships {
        self.visit_tree(root);
        self.output
    }

    fn visit_tree(&mut self, root: Node<'_>) {
        let mut pending = vec![Step::Visit(root)];

        while let Some(step) = pending.pop() {
            match step {
                Step::Visit(node) => self.visit(node, &mut pending),
                Step::Leave => {
                    self.scope.pop();
                }
            }
        }

        debug_assert!(self.scope.is_empty(), "unbalanced scope stack: {:?}", self.scope);
    }

    #[cfg(test)]
    fn scope_depth(&self) -> usize {
        self.scope.len()
    }

    /// Caller path for a call made right now
    fn current_scope(&self) -> String {
        if self.scope.is_empty() {
            MODULE_SCOPE.to_string()
        } else {
            self.scope.join(".")
        }
    }

    fn visit<'t>(&mut self, node: Node<'t>, pending: &mut Vec<Step<'t>>) {
        match SyntaxKind::of(&node) {
            SyntaxKind::ClassDefinition | SyntaxKind::FunctionDefinition => {
                if let Some(name) = self.declaration_name(node) {
                    self.enter(name, pending);
                }
                schedule(pending, declaration_children(node, Vec::new()));
            }
            SyntaxKind::DecoratedDefinition => {
                let definition = node.child_by_field_name("definition");
                match definition.and_then(|d| self.declaration_name(d).map(|name| (d, name))) {
                    Some((definition, name)) => {
                        // Decorators belong to the declaration they decorate
                        self.enter(name, pending);
                        let decorators: Vec<Node<'t>> = named_children(node)
                            .into_iter()
                            .filter(|child| child.id() != definition.id())
                            .collect();
                        schedule(pending, declaration_children(definition, decorators));
                    }
                    None => schedule(pending, named_children(node)),
                }
            }
            SyntaxKind::Call => {
                self.record_call(node);
                schedule(pending, named_children(node));
            }
            SyntaxKind::Import => self.record_import(node),
            SyntaxKind::ImportFrom => {
                let module = node
                    .child_by_field_name("module_name")
                    .map(|m| self.module_path(m))
                    .unwrap_or_default();
                self.record_from_import(node, module);
            }
            SyntaxKind::FutureImport => self.record_from_import(node, "__future__".to_string()),
            SyntaxKind::Other => schedule(pending, named_children(node)),
        }
    }

    fn enter<'t>(&mut self, name: String, pending: &mut Vec<Step<'t>>) {
        self.scope.push(name);
        pending.push(Step::Leave);
    }

    fn declaration_name(&self, node: Node<'_>) -> Option<String> {
        node.child_by_field_name("name")
            .map(|name| node_text(name, self.source).to_string())
    }

    fn record_call(&mut self, node: Node<'_>) {
        let Some(function) = node.child_by_field_name("function") else {
            return;
        };
        let Some(callee) = resolve_callee(function, self.source) else {
            return;
        };

        self.output.calls.push(CallEdge {
            caller: self.current_scope(),
            callee,
            file: self.file.to_string(),
            line: node.start_position().row + 1,
        });
    }

    /// `import a.b, c as d`
    fn record_import(&mut self, node: Node<'_>) {
        let line = node.start_position().row + 1;
        let mut cursor = node.walk();
        let names: Vec<Node<'_>> = node.children_by_field_name("name", &mut cursor).collect();

        for name in names {
            let (module, alias) = self.split_alias(name);
            self.output.imports.push(ImportRecord {
                form: ImportForm::Direct,
                module,
                imported_name: None,
                alias,
                line,
                file: self.file.to_string(),
            });
        }
    }

    /// `from m import a, b as c` and `from m import *`
    fn record_from_import(&mut self, node: Node<'_>, module: String) {
        let line = node.start_position().row + 1;
        let mut cursor = node.walk();
        let mut names: Vec<(String, Option<String>)> = node
            .children_by_field_name("name", &mut cursor)
            .map(|name| self.split_alias(name))
            .collect();

        let mut cursor = node.walk();
        if node
            .named_children(&mut cursor)
            .any(|child| child.kind() == "wildcard_import")
        {
            names.push(("*".to_string(), None));
        }

        for (imported, alias) in names {
            self.output.imports.push(ImportRecord {
                form: ImportForm::From,
                module: module.clone(),
                imported_name: Some(imported),
                alias,
                line,
                file: self.file.to_string(),
            });
        }
    }

    fn split_alias(&self, node: Node<'_>) -> (String, Option<String>) {
        if node.kind() == "aliased_import" {
            let name = node
                .child_by_field_name("name")
                .map(|n| self.module_path(n))
                .unwrap_or_default();
            let alias = node
                .child_by_field_name("alias")
                .map(|a| node_text(a, self.source).to_string());
            (name, alias)
        } else {
            (self.module_path(node), None)
        }
    }

    /// Dotted module path; relative-import dots are dropped (`from ..a import b` -> `a`)
    fn module_path(&self, node: Node<'_>) -> String {
        match node.kind() {
            "dotted_name" => {
                let mut cursor = node.walk();
                let parts: Vec<&str> = node
                    .named_children(&mut cursor)
                    .filter(|part| part.kind() == "identifier")
                    .map(|part| node_text(part, self.source))
                    .collect();
                parts.join(".")
            }
            "relative_import" => {
                let mut cursor = node.walk();
                let dotted = node
                    .named_children(&mut cursor)
                    .find(|child| child.kind() == "dotted_name");
                dotted.map(|d| self.module_path(d)).unwrap_or_default()
            }
            _ => node_text(node, self.source).to_string(),
        }
    }
}

/// Name of the invoked expression: `foo`, or an attribute chain rooted at an
/// identifier (`obj.bar.baz`). Subscripts, call results, literals and other
/// shapes yield `None`.
fn resolve_callee(node: Node<'_>, source: &str) -> Option<String> {
    let mut parts = Vec::new();
    let mut current = node;

    loop {
        match current.kind() {
            "identifier" => {
                parts.push(node_text(current, source));
                break;
            }
            "attribute" => {
                let attribute = current.child_by_field_name("attribute")?;
                parts.push(node_text(attribute, source));
                current = current.child_by_field_name("object")?;
            }
            "parenthesized_expression" if current.named_child_count() == 1 => {
                current = current.named_child(0)?;
            }
            _ => return None,
        }
    }

    parts.reverse();
    Some(parts.join("."))
}

fn node_text<'a>(node: Node<'_>, source: &'a str) -> &'a str {
    &source[node.byte_range()]
}

fn named_children<'t>(node: Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    node.named_children(&mut cursor).collect()
}

/// Children of a class or function in Python's own AST field order:
/// signature and body first, then decorators, then the return annotation.
fn declaration_children<'t>(definition: Node<'t>, decorators: Vec<Node<'t>>) -> Vec<Node<'t>> {
    let return_type = definition.child_by_field_name("return_type");
    let mut ordered: Vec<Node<'t>> = named_children(definition)
        .into_iter()
        .filter(|child| return_type.map_or(true, |annotation| annotation.id() != child.id()))
        .collect();
    ordered.extend(decorators);
    ordered.extend(return_type);
    ordered
}

/// Queue children so they pop in source order
fn schedule<'t>(pending: &mut Vec<Step<'t>>, children: Vec<Node<'t>>) {
    pending.extend(children.into_iter().rev().map(Step::Visit));
}
