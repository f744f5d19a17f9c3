/*
Copyright 2021 Google LLC

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

     https://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/

//! The AST provider: given a source file, hand back a rooted tree of typed
//! nodes with parent/child links and source locations. Nothing in
//! `indexer`, `finder`, `query` or `search` reaches past the `Node`/`Kind`
//! types defined here into tree-sitter directly.

use std::fmt;
use std::ops::Range;
use std::path::Path;

use crate::error::ScryError;

/// A tagged union in place of dynamic dispatch on a runtime class object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Function,
    Class,
    Call,
    AttributeAccess,
    Name,
    AssignTarget,
    Arguments,
    Other,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Kind::Function => "fn",
            Kind::Class => "cls",
            Kind::Call => "call",
            Kind::AttributeAccess => "attr",
            Kind::Name => "name",
            Kind::AssignTarget => "var",
            Kind::Arguments => "args",
            Kind::Other => "other",
        };
        f.write_str(s)
    }
}

/// One AST node, borrowed from a `ParsedSource`. Cheap to copy: it's two
/// pointers (a tree-sitter node handle and the source slice it was parsed
/// from).
#[derive(Clone, Copy)]
pub struct Node<'a> {
    inner: tree_sitter::Node<'a>,
    source: &'a str,
}

impl<'a> PartialEq for Node<'a> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id() == other.inner.id()
    }
}
impl<'a> Eq for Node<'a> {}

impl<'a> fmt::Debug for Node<'a> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("kind", &self.kind())
            .field("ts_kind", &self.inner.kind())
            .field("line", &self.line())
            .finish()
    }
}

/// Positional/vararg/kwarg breakdown of a function's parameter list.
/// `fn:argcount` counts `positional.len() + vararg.is_some() + kwarg.is_some()`.
#[derive(Debug, Clone, Default)]
pub struct Args<'a> {
    pub positional: Vec<&'a str>,
    pub vararg: Option<&'a str>,
    pub kwarg: Option<&'a str>,
}

impl<'a> Args<'a> {
    pub fn count(&self) -> i64 {
        (self.positional.len() + usize::from(self.vararg.is_some()) + usize::from(self.kwarg.is_some()))
            as i64
    }
}

impl<'a> Node<'a> {
    fn wrap(inner: tree_sitter::Node<'a>, source: &'a str) -> Node<'a> {
        Node { inner, source }
    }

    /// Stable for the lifetime of the tree. Used by the indexer's visited
    /// set and the search engine's match-set dedup.
    pub fn id(&self) -> usize {
        self.inner.id()
    }

    pub fn kind(&self) -> Kind {
        match self.inner.kind() {
            "function_definition" => Kind::Function,
            "class_definition" => Kind::Class,
            "call" => Kind::Call,
            "attribute" => Kind::AttributeAccess,
            "parameters" => Kind::Arguments,
            "identifier" => {
                if self.is_assign_target() {
                    Kind::AssignTarget
                } else {
                    Kind::Name
                }
            }
            _ => Kind::Other,
        }
    }

    pub fn line(&self) -> usize {
        self.inner.start_position().row + 1
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.inner.byte_range()
    }

    pub fn text(&self) -> &'a str {
        &self.source[self.inner.byte_range()]
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.inner.parent().map(|p| Node::wrap(p, self.source))
    }

    /// Named children in source order. Punctuation and keyword tokens are
    /// unnamed in tree-sitter-python and are skipped here, since the
    /// indexer only cares about typed AST constructs.
    pub fn children(&self) -> Vec<Node<'a>> {
        let mut cursor = self.inner.walk();
        self.inner
            .named_children(&mut cursor)
            .map(|c| Node::wrap(c, self.source))
            .collect()
    }

    // --- identifier classification -----------------------------------

    /// True for an `identifier` that is the left-hand side of an
    /// assignment, augmented assignment, or a `for` loop's target.
    /// Distinguishes the `AssignTarget` kind from a plain `Name` reference.
    fn is_assign_target(&self) -> bool {
        let Some(parent) = self.inner.parent() else {
            return false;
        };
        match parent.kind() {
            "assignment" | "augmented_assignment" => parent
                .child_by_field_name("left")
                .map(|l| l.id() == self.inner.id())
                .unwrap_or(false),
            "for_statement" => parent
                .child_by_field_name("left")
                .map(|l| l.id() == self.inner.id())
                .unwrap_or(false),
            _ => false,
        }
    }

    // --- Function attributes ------------------------------------------

    pub fn function_name(&self) -> Option<&'a str> {
        if self.kind() != Kind::Function {
            return None;
        }
        let name = self.inner.child_by_field_name("name")?;
        Some(&self.source[name.byte_range()])
    }

    pub fn function_args(&self) -> Option<Args<'a>> {
        if self.kind() != Kind::Function {
            return None;
        }
        let params = self.inner.child_by_field_name("parameters")?;
        let mut args = Args::default();
        let mut cursor = params.walk();
        for child in params.named_children(&mut cursor) {
            classify_param(child, self.source, &mut args);
        }
        Some(args)
    }

    /// The source text of the parameter list with its enclosing
    /// parentheses stripped, used for the grep-formatter's
    /// `def name(args)` rendering.
    pub fn function_params_text(&self) -> Option<&'a str> {
        if self.kind() != Kind::Function {
            return None;
        }
        let params = self.inner.child_by_field_name("parameters")?;
        let text = &self.source[params.byte_range()];
        Some(text.trim_start_matches('(').trim_end_matches(')'))
    }

    // --- Class attributes ----------------------------------------------

    pub fn class_name(&self) -> Option<&'a str> {
        if self.kind() != Kind::Class {
            return None;
        }
        let name = self.inner.child_by_field_name("name")?;
        Some(&self.source[name.byte_range()])
    }

    /// Base-class expression nodes, in source order. `keyword_argument`
    /// children (`metaclass=Foo`) are not bases and are excluded.
    pub fn class_bases(&self) -> Vec<Node<'a>> {
        if self.kind() != Kind::Class {
            return Vec::new();
        }
        let Some(superclasses) = self.inner.child_by_field_name("superclasses") else {
            return Vec::new();
        };
        let mut cursor = superclasses.walk();
        superclasses
            .named_children(&mut cursor)
            .filter(|c| c.kind() != "keyword_argument")
            .map(|c| Node::wrap(c, self.source))
            .collect()
    }

    pub fn class_basenames(&self) -> Vec<&'a str> {
        self.class_bases().iter().map(|b| b.leaf_name()).collect()
    }

    // --- Call / AttributeAccess ------------------------------------------

    pub fn call_callee(&self) -> Option<Node<'a>> {
        if self.kind() != Kind::Call {
            return None;
        }
        self.inner
            .child_by_field_name("function")
            .map(|f| Node::wrap(f, self.source))
    }

    pub fn attribute_name(&self) -> Option<&'a str> {
        if self.kind() != Kind::AttributeAccess {
            return None;
        }
        let attr = self.inner.child_by_field_name("attribute")?;
        Some(&self.source[attr.byte_range()])
    }

    pub fn name_text(&self) -> Option<&'a str> {
        match self.kind() {
            Kind::Name | Kind::AssignTarget => Some(self.text()),
            _ => None,
        }
    }

    /// The leaf identifier of an arbitrary expression node: an attribute's
    /// attribute name, or the node's own text for everything else. Used to
    /// render `cls:parent`'s base names and for the immediate-callee-name
    /// helper in `finder::callee_name`.
    pub fn leaf_name(&self) -> &'a str {
        match self.kind() {
            Kind::AttributeAccess => self.attribute_name().unwrap_or_else(|| self.text()),
            _ => self.text(),
        }
    }
}

fn classify_param<'a>(node: tree_sitter::Node<'a>, source: &'a str, args: &mut Args<'a>) {
    match node.kind() {
        "identifier" => args.positional.push(&source[node.byte_range()]),
        "default_parameter" | "typed_default_parameter" => {
            if let Some(name) = node.child_by_field_name("name") {
                classify_param(name, source, args);
            }
        }
        "typed_parameter" => {
            if let Some(inner) = node.named_child(0) {
                classify_param(inner, source, args);
            }
        }
        "list_splat_pattern" => {
            if let Some(inner) = node.named_child(0) {
                args.vararg = Some(&source[inner.byte_range()]);
            }
        }
        "dictionary_splat_pattern" => {
            if let Some(inner) = node.named_child(0) {
                args.kwarg = Some(&source[inner.byte_range()]);
            }
        }
        // `/` and `*` separators and anything else carry no name.
        _ => {}
    }
}

/// A parsed file: owns the source text and the tree-sitter tree it was
/// parsed into, so both can be released together when the caller drops it.
pub struct ParsedSource {
    source: String,
    tree: tree_sitter::Tree,
}

impl ParsedSource {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> Node<'_> {
        Node::wrap(self.tree.root_node(), &self.source)
    }
}

/// A single operation: `build(file_path) -> RootNode`, or fails with a
/// syntax error. The core (indexer/query/finder/search) only ever depends
/// on this trait, never on a concrete parser.
pub trait AstProvider {
    fn build(&self, path: &Path) -> Result<ParsedSource, ScryError>;
}

/// The one concrete `AstProvider` this crate ships: a tree-sitter-python
/// backend. Kept in its own small impl so a second backend (another
/// language, or a different parser) only has to satisfy the trait above.
pub struct PythonAstProvider;

impl AstProvider for PythonAstProvider {
    fn build(&self, path: &Path) -> Result<ParsedSource, ScryError> {
        let source = std::fs::read_to_string(path).map_err(|e| ScryError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut parser = tree_sitter::Parser::new();
        parser
            .set_language(tree_sitter_python::language())
            .expect("tree-sitter-python grammar is ABI-compatible with the tree-sitter crate");

        let tree = parser.parse(&source, None).ok_or_else(|| ScryError::Syntax {
            path: path.to_path_buf(),
            message: "parser produced no tree".to_string(),
        })?;

        if tree.root_node().has_error() {
            return Err(ScryError::Syntax {
                path: path.to_path_buf(),
                message: "source contains syntax errors".to_string(),
            });
        }

        Ok(ParsedSource { source, tree })
    }
}

/// Parses `source` directly, bypassing the filesystem. Shared by this
/// module's tests and by `indexer`/`finder`/`search`'s tests so none of
/// them need a real file on disk.
#[cfg(test)]
pub(crate) fn parse_str(source: &str) -> ParsedSource {
    let mut parser = tree_sitter::Parser::new();
    parser.set_language(tree_sitter_python::language()).unwrap();
    let tree = parser.parse(source, None).unwrap();
    ParsedSource {
        source: source.to_string(),
        tree,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> ParsedSource {
        parse_str(source)
    }

    #[test]
    fn classifies_function_and_class() {
        let p = parse("def f(a, b):\n    pass\n\nclass C(Base):\n    pass\n");
        let root = p.root();
        let kinds: Vec<Kind> = root.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec![Kind::Function, Kind::Class]);
    }

    #[test]
    fn argcount_counts_star_args() {
        let p = parse("def f(*a, **kw):\n    pass\n");
        let root = p.root();
        let f = &root.children()[0];
        let args = f.function_args().unwrap();
        assert_eq!(args.count(), 2);
        assert_eq!(args.vararg, Some("a"));
        assert_eq!(args.kwarg, Some("kw"));
    }

    #[test]
    fn default_parameter_counts_as_positional() {
        let p = parse("def f(a='hello'):\n    pass\n");
        let f_args = p.root().children()[0].function_args().unwrap();
        assert_eq!(f_args.positional, vec!["a"]);
        assert_eq!(f_args.count(), 1);
    }

    #[test]
    fn class_basenames_follow_attribute_leaf() {
        let p = parse("class C(pkg.Base):\n    pass\n");
        let cls = &p.root().children()[0];
        assert_eq!(cls.class_basenames(), vec!["Base"]);
    }

    #[test]
    fn assign_target_excludes_parameters() {
        let p = parse("def f(a):\n    a = 1\n    b = a\n");
        let f = &p.root().children()[0];
        let body = &f.children()[0];
        let assign_targets: Vec<_> = body
            .children()
            .iter()
            .flat_map(|stmt| stmt.children())
            .filter(|n| n.kind() == Kind::AssignTarget)
            .map(|n| n.text())
            .collect();
        assert_eq!(assign_targets, vec!["a", "b"]);
    }
}
