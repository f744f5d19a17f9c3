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

//! Walks a parsed tree once and produces a *kind → ordered node list*
//! inventory, deduplicated by node identity. Bound to one file; built
//! lazily on first `find`, discarded with the `ParsedSource` it borrows
//! from.

use std::collections::{HashMap, HashSet};

use crate::ast::{Kind, Node};

pub struct Index<'a> {
    root: Node<'a>,
    by_kind: HashMap<Kind, Vec<Node<'a>>>,
    built: bool,
}

impl<'a> Index<'a> {
    pub fn new(root: Node<'a>) -> Self {
        Index { root, by_kind: HashMap::new(), built: false }
    }

    fn ensure_built(&mut self) {
        if self.built {
            return;
        }
        self.built = true;
        let mut visited = HashSet::new();
        let mut order: HashMap<Kind, Vec<Node<'a>>> = HashMap::new();
        walk(self.root, &mut visited, &mut order);
        self.by_kind = order;
    }

    /// All indexed nodes whose kind is in `kinds`, in insertion (tree
    /// discovery) order.
    pub fn find(&mut self, kinds: &[Kind]) -> Vec<Node<'a>> {
        self.ensure_built();
        kinds
            .iter()
            .flat_map(|k| self.by_kind.get(k).into_iter().flatten().copied())
            .collect()
    }

    pub fn find_one(&mut self, kind: Kind) -> Vec<Node<'a>> {
        self.find(&[kind])
    }
}

/// Depth-first, visits each node identity once. Recurses through `parent`
/// on first visit so that if the provider ever hands back a node whose
/// ancestor chain wasn't otherwise reachable via `children()`, the chain
/// still gets indexed (spec's "back-edge" concern — tree-sitter always
/// gives us a fully rooted tree so this is a defensive no-op in practice,
/// but keeps the walker correct for any future AstProvider).
fn walk<'a>(node: Node<'a>, visited: &mut HashSet<usize>, order: &mut HashMap<Kind, Vec<Node<'a>>>) {
    if !visited.insert(node.id()) {
        return;
    }
    if let Some(parent) = node.parent() {
        walk(parent, visited, order);
    }
    order.entry(node.kind()).or_default().push(node);
    for child in node.children() {
        walk(child, visited, order);
    }
}
