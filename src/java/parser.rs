#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]

use std::{collections::HashMap, fmt::Formatter};

use anyhow::{Context, Result, anyhow};
use tree_sitter::{Node, Query, QueryCursor, StreamingIterator, Tree};

use crate::constants::{ATOMIC_NODE_KINDS, COMMENT_NODE_KINDS};

/// Capture name -> captured text, for one query match
pub type Captures = HashMap<String, String>;

/// A byte range of source code that becomes one token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    /// first byte
    pub start:   usize,
    /// one past the last byte
    pub end:     usize,
    /// true for comments
    pub comment: bool,
}

#[derive(Clone)]
/// A struct that wraps a tree-sitter parser object and source code
pub struct Parser {
    /// the source code being parsed
    code: String,
    /// the parse tree
    tree: Tree,
    /// the tree-sitter java grammar language
    lang: tree_sitter::Language,
}

/// Returns the compiled tree-sitter Java language.
fn java_language() -> tree_sitter::Language {
    tree_sitter_java::LANGUAGE.into()
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("bytes", &self.code.len())
            .finish()
    }
}

impl Parser {
    /// Returns a new parser object
    ///
    /// * `source_code`: the source code to be parsed
    pub fn new(source_code: String) -> Result<Self> {
        let mut parser = tree_sitter::Parser::new();
        let language = java_language();

        parser
            .set_language(&language)
            .with_context(|| "Failed to load Java grammar")?;
        let tree = parser
            .parse(source_code.as_str(), None)
            .ok_or_else(|| anyhow!("Error parsing Java code"))?;

        Ok(Self {
            code: source_code,
            tree,
            lang: language,
        })
    }

    /// A getter for parser's source code
    pub fn code(&self) -> &str {
        self.code.as_str()
    }

    /// 1-based line and column of the first syntax error, if the code has any.
    pub fn first_error(&self) -> Option<(usize, usize)> {
        let root = self.tree.root_node();
        if !root.has_error() {
            return None;
        }
        find_error(root).map(|node| {
            let at = node.start_position();
            (at.row + 1, at.column + 1)
        })
    }

    /// Byte ranges of every token-sized node, in source order.
    ///
    /// Leaves of the syntax tree become spans, except that literals the
    /// grammar splits up (strings, characters, text blocks) are kept whole.
    /// Whatever lies between two spans is whitespace.
    pub fn spans(&self) -> Vec<Span> {
        let mut spans = Vec::new();
        collect_spans(self.tree.root_node(), &mut spans);
        spans
    }

    /// Applies a tree sitter query and returns the result as a collection of
    /// HashMaps
    ///
    /// * `q`: the tree-sitter query to be applied
    pub fn query(&self, q: &str) -> Result<Vec<Captures>> {
        let mut results = vec![];

        let query = Query::new(&self.lang, q)
            .with_context(|| format!("Failed to compile tree-sitter query: {q}"))?;
        let mut cursor = QueryCursor::new();
        let mut matches = cursor.matches(&query, self.tree.root_node(), self.code.as_bytes());
        let capture_names = query.capture_names();

        while let Some(m) = matches.next() {
            let mut result = Captures::new();

            for capture in m.captures {
                let name = capture_names
                    .get(capture.index as usize)
                    .ok_or_else(|| anyhow!("Capture index {} has no name.", capture.index))?;
                let value = capture
                    .node
                    .utf8_text(self.code.as_bytes())
                    .with_context(|| {
                        format!(
                            "Cannot match query result indices with source code for capture name: \
                             {name}."
                        )
                    })?;

                result
                    .entry(name.to_string())
                    .or_insert_with(|| value.to_string());
            }
            results.push(result);
        }

        Ok(results)
    }
}

/// Depth-first search for the first `ERROR` or missing node.
fn find_error(node: Node<'_>) -> Option<Node<'_>> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|child| child.has_error())
        .find_map(find_error)
}

/// Pushes the spans under `node` onto `spans`.
fn collect_spans(node: Node<'_>, spans: &mut Vec<Span>) {
    let kind = node.kind();
    let comment = COMMENT_NODE_KINDS.contains(&kind);
    if node.child_count() == 0 || comment || ATOMIC_NODE_KINDS.contains(&kind) {
        if node.end_byte() > node.start_byte() {
            spans.push(Span {
                start: node.start_byte(),
                end: node.end_byte(),
                comment,
            });
        }
        return;
    }

    let mut cursor = node.walk();
    let children: Vec<Node<'_>> = node.children(&mut cursor).collect();
    for child in children {
        collect_spans(child, spans);
    }
}
