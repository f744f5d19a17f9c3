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

//! The Match Set: one matched AST node plus the file it came from. Kept
//! deliberately thin — a node identity, its source file, and its line —
//! because the DSL has no captures or cross-assertion variable binding to
//! carry along, unlike a structural-diff query result.

use std::path::{Path, PathBuf};

use crate::ast::Node;

#[derive(Debug, Clone, Copy)]
pub struct Match<'a> {
    pub node: Node<'a>,
    path: &'a Path,
}

impl<'a> Match<'a> {
    pub fn new(node: Node<'a>, path: &'a Path) -> Match<'a> {
        Match { node, path }
    }

    pub fn path(&self) -> &'a Path {
        self.path
    }

    pub fn line(&self) -> usize {
        self.node.line()
    }
}

/// Deduplicate by node identity and sort ascending by line, as spec's
/// Match Set invariants require for a single file's results. Stable sort
/// preserves discovery order among same-line matches.
pub fn finalize(mut matches: Vec<Match<'_>>) -> Vec<Match<'_>> {
    let mut seen = std::collections::HashSet::new();
    matches.retain(|m| seen.insert(m.node.id()));
    matches.sort_by_key(|m| m.line());
    matches
}

/// Used by the CLI to shorten absolute match paths for display.
pub fn relative_path(path: &Path, base: &Path) -> PathBuf {
    path.strip_prefix(base).map(Path::to_path_buf).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parse_str;

    #[test]
    fn finalize_dedups_and_sorts() {
        let parsed = parse_str("def b():\n    pass\ndef a():\n    pass\n");
        let root = parsed.root();
        let children = root.children();
        let path = Path::new("sample.py");
        let matches = vec![
            Match::new(children[1], path),
            Match::new(children[0], path),
            Match::new(children[0], path),
        ];
        let result = finalize(matches);
        assert_eq!(result.len(), 2);
        assert!(result[0].line() < result[1].line());
    }
}
