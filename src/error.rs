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

use std::path::PathBuf;

use colored::Colorize;
use thiserror::Error;

/// Every way `scry` can fail. `NoNode` is the one variant that never reaches
/// a caller outside this crate: the search engine catches it per-expression
/// (see `search::search_file`) and turns it into an empty result instead of
/// propagating it.
#[derive(Debug, Error)]
pub enum ScryError {
    #[error("{}", format_parse_error(.line, .column, .message, .input))]
    Parse {
        line: usize,
        column: usize,
        message: String,
        input: String,
    },

    #[error("no semantic indexer registered for selector '{kind}:{attr}'")]
    NoSemanticIndexer { kind: String, attr: String },

    #[error("assertion tuple had {len} elements, expected 2 or 4")]
    InvalidAssertion { len: usize },

    /// Caught internally by the evaluator. Never surfaced to users.
    #[error("finder produced zero matches")]
    NoNode,

    #[error("{path}: {message}")]
    Syntax { path: PathBuf, message: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_parse_error(line: &usize, column: &usize, message: &str, input: &str) -> String {
    let offending_line = input.lines().nth(line.saturating_sub(1)).unwrap_or("");
    let caret = " ".repeat(column.saturating_sub(1)) + "^";
    format!(
        "{} at line {}, column {}: {}\n{}\n{}",
        "query parse error".red().bold(),
        line,
        column,
        message,
        offending_line,
        caret.red()
    )
}
