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

//! The search engine: drives evaluation of a parsed `QueryTree` across
//! files, one file at a time, applying the narrow-then-union semantics
//! from the assertion/expression/query hierarchy.
//!
//! Single-threaded and synchronous by design (a deliberate divergence
//! from this crate's ambient worker-pool habits elsewhere): `search`
//! returns a lazy iterator so a caller can stop consuming at any point
//! and halt further file I/O and parsing at the next yield boundary.
//! Each file's source and tree live only for the duration of
//! `search_file` and are dropped before the next file is touched.

use std::path::{Path, PathBuf};

use log::warn;

use crate::ast::AstProvider;
use crate::error::ScryError;
use crate::finder::{self, Selector};
use crate::indexer::Index;
use crate::query::QueryTree;
use crate::result::{finalize, Match};

/// Evaluate `query` against the single file at `path`, already parsed by
/// `provider`. All per-file intermediate state (source text, tree-sitter
/// tree, index) lives in locals here and is dropped on return; only the
/// owned `PathBuf`-rooted `Match`es created for *this* file escape.
///
/// A per-file `AstProvider::build` failure (`ScryError::Syntax`/`Io`) is
/// logged and treated as "this file contributed nothing", per spec's
/// "logged, file skipped, other files proceed". An unknown selector
/// (`ScryError::NoSemanticIndexer`) is a user error in the query itself,
/// not a per-file condition — it is propagated to the caller instead, so
/// the whole search aborts rather than silently skipping every file.
pub fn search_file<'q>(
    provider: &dyn AstProvider,
    path: &Path,
    query: &'q QueryTree,
    aggressive_search: bool,
) -> Result<Vec<OwnedMatch>, ScryError> {
    let parsed = match provider.build(path) {
        Ok(p) => p,
        Err(e) => {
            warn!("{e}, skipping");
            return Ok(Vec::new());
        }
    };

    let mut index = Index::new(parsed.root());
    let mut global: Vec<Match<'_>> = Vec::new();

    for expression in query {
        let mut current: Option<Vec<crate::ast::Node<'_>>> = None;
        let mut expression_failed = false;

        for assertion in expression {
            let selector = Selector::parse(&assertion.kind, &assertion.attr)?;
            match finder::evaluate(selector, assertion.op, assertion.value.as_ref(), current.take(), &mut index) {
                Ok(nodes) => current = Some(nodes),
                Err(ScryError::NoNode) => {
                    if !aggressive_search {
                        expression_failed = true;
                        break;
                    }
                    current = Some(Vec::new());
                }
                Err(e) => return Err(e),
            }
        }

        if expression_failed {
            continue;
        }
        if let Some(nodes) = current {
            global.extend(nodes.into_iter().map(|n| Match::new(n, path)));
        }
    }

    Ok(finalize(global).into_iter().map(|m| OwnedMatch::from_match(&m)).collect())
}

/// A `Match` detached from the `ParsedSource` it was found in, so it can
/// cross the `search_file` boundary. Carries only what an output
/// formatter needs: the rendered text, path, and line.
#[derive(Debug, Clone)]
pub struct OwnedMatch {
    pub path: PathBuf,
    pub line: usize,
    pub rendered: crate::format::Rendered,
}

impl OwnedMatch {
    fn from_match(m: &Match<'_>) -> OwnedMatch {
        OwnedMatch {
            path: m.path().to_path_buf(),
            line: m.line(),
            rendered: crate::format::render(m.node),
        }
    }
}

/// Search every file in `paths`, in order, yielding matches lazily.
/// Dropping the returned iterator early halts work at the next file
/// boundary — no background tasks or timers are involved. A
/// `ScryError::NoSemanticIndexer` from any file propagates as an `Err`
/// item; the caller is expected to stop consuming and surface it rather
/// than treat it like a per-file syntax error.
pub fn search<'q>(
    provider: &'q dyn AstProvider,
    paths: Vec<PathBuf>,
    query: &'q QueryTree,
    aggressive_search: bool,
) -> impl Iterator<Item = Result<OwnedMatch, ScryError>> + 'q {
    paths.into_iter().flat_map(move |path| {
        match search_file(provider, &path, query, aggressive_search) {
            Ok(matches) => matches.into_iter().map(Ok).collect::<Vec<_>>(),
            Err(e) => vec![Err(e)],
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::PythonAstProvider;
    use std::io::Write;

    const SAMPLE: &str = "def fn2(arg1, arg2):\n    def fn3(*myargs, **mykwargs):\n        pass\n\ndef fn1(a='hello'):\n    pass\n";

    fn write_sample() -> tempfile_free::TempPyFile {
        tempfile_free::TempPyFile::new(SAMPLE)
    }

    // A tiny self-contained temp-file helper so tests don't need an extra
    // dependency: writes to a fixed-name file under `std::env::temp_dir()`
    // scoped by the current thread and process id, removed on drop.
    mod tempfile_free {
        use std::path::{Path, PathBuf};

        pub struct TempPyFile {
            path: PathBuf,
        }

        impl TempPyFile {
            pub fn new(contents: &str) -> Self {
                let path = std::env::temp_dir().join(format!(
                    "scry-test-{}-{:?}.py",
                    std::process::id(),
                    std::thread::current().id()
                ));
                std::fs::write(&path, contents).unwrap();
                TempPyFile { path }
            }

            pub fn path(&self) -> &Path {
                &self.path
            }
        }

        impl Drop for TempPyFile {
            fn drop(&mut self) {
                let _ = std::fs::remove_file(&self.path);
            }
        }
    }

    fn names(matches: &[OwnedMatch]) -> Vec<String> {
        matches
            .iter()
            .filter_map(|m| match &m.rendered {
                crate::format::Rendered::Function { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn scenario_1_equality() {
        let f = write_sample();
        let q = crate::query::parse(r#"fn:name == "fn1""#).unwrap();
        let matches = search_file(&PythonAstProvider, f.path(), &q, false).unwrap();
        assert_eq!(names(&matches), vec!["fn1"]);
    }

    #[test]
    fn scenario_3_comma_narrows_to_empty() {
        let f = write_sample();
        let q = crate::query::parse(r#"fn:name == "fn1", fn:name == "fn2""#).unwrap();
        let matches = search_file(&PythonAstProvider, f.path(), &q, false).unwrap();
        assert!(matches.is_empty());
    }

    #[test]
    fn scenario_4_semicolon_unions() {
        let f = write_sample();
        let q = crate::query::parse(r#"fn:name == "fn1"; fn:name == "fn2""#).unwrap();
        let matches = search_file(&PythonAstProvider, f.path(), &q, false).unwrap();
        let mut got = names(&matches);
        got.sort_unstable();
        assert_eq!(got, vec!["fn1", "fn2"]);
    }

    #[test]
    fn scenario_6_argcount_counts_star_args() {
        let f = write_sample();
        let q = crate::query::parse("fn:argcount in {2}").unwrap();
        let matches = search_file(&PythonAstProvider, f.path(), &q, false).unwrap();
        let mut got = names(&matches);
        got.sort_unstable();
        assert_eq!(got, vec!["fn2", "fn3"]);
    }

    #[test]
    fn scenario_8_ordering_ascends_by_line() {
        let f = write_sample();
        let q = crate::query::parse("fn:name").unwrap();
        let matches = search_file(&PythonAstProvider, f.path(), &q, false).unwrap();
        let lines: Vec<usize> = matches.iter().map(|m| m.line).collect();
        let mut sorted = lines.clone();
        sorted.sort_unstable();
        assert_eq!(lines, sorted);
        assert_eq!(names(&matches), vec!["fn2", "fn3", "fn1"]);
    }

    #[test]
    fn syntax_error_in_one_file_is_skipped_not_fatal() {
        let path = std::env::temp_dir().join(format!("scry-test-badsyntax-{}.py", std::process::id()));
        std::fs::write(&path, "def (:\n").unwrap();
        let q = crate::query::parse("fn:name").unwrap();
        let matches = search_file(&PythonAstProvider, &path, &q, false).unwrap();
        assert!(matches.is_empty());
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn unknown_selector_is_surfaced_not_swallowed() {
        let f = write_sample();
        let q = crate::query::parse("weird:thing").unwrap();
        let err = search_file(&PythonAstProvider, f.path(), &q, false).unwrap_err();
        assert!(matches!(err, ScryError::NoSemanticIndexer { .. }));
    }

    #[test]
    fn unknown_selector_aborts_the_whole_search_not_just_one_file() {
        let f = write_sample();
        let q = crate::query::parse("weird:thing").unwrap();
        let results: Vec<_> = search(&PythonAstProvider, vec![f.path().to_path_buf()], &q, false).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(results[0], Err(ScryError::NoSemanticIndexer { .. })));
    }
}
