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

//! Output formatting. `render` captures a match's node into an owned, kind-specific
//! description while its tree is still alive; `GrepFormatter` and
//! `JsonFormatter` turn a batch of those into the two concrete renderings
//! the CLI exposes.

use serde::Serialize;

use crate::ast::{Kind, Node};
use crate::search::OwnedMatch;

/// An owned, kind-specific rendering of one matched node, captured while
/// the node (and the source text it borrows from) is still alive. Not
/// itself serialized: the JSON formatter renders it down to the same
/// grep-style string the grep formatter prints, rather than exposing this
/// enum's shape as a structured JSON object.
#[derive(Debug, Clone)]
pub enum Rendered {
    Function { name: String, params: String },
    Class { name: String, bases: Vec<String> },
    Call { text: String },
    Other { kind: String, text: String },
}

impl Rendered {
    /// `def <name>(<args>)` / `class <name>(<base1>, <base2>, …)` /
    /// `call -> <source text>` for the grep-like rendering.
    pub fn grep_text(&self) -> String {
        match self {
            Rendered::Function { name, params } => format!("def {name}({params})"),
            Rendered::Class { name, bases } => format!("class {name}({})", bases.join(", ")),
            Rendered::Call { text } => format!("call -> {text}"),
            Rendered::Other { kind, text } => format!("{kind}: {text}"),
        }
    }
}

pub fn render(node: Node<'_>) -> Rendered {
    match node.kind() {
        Kind::Function => Rendered::Function {
            name: node.function_name().unwrap_or("").to_string(),
            params: node.function_params_text().unwrap_or("").to_string(),
        },
        Kind::Class => Rendered::Class {
            name: node.class_name().unwrap_or("").to_string(),
            bases: node.class_basenames().into_iter().map(str::to_string).collect(),
        },
        Kind::Call => Rendered::Call { text: node.text().to_string() },
        other => Rendered::Other { kind: other.to_string(), text: node.text().to_string() },
    }
}

pub trait OutputFormatter {
    /// Called once per match, in yield order.
    fn push(&mut self, m: &OwnedMatch, rel_path: &str);
    /// Called once after the last match; returns the text to print.
    fn finish(&mut self) -> String;
}

#[derive(Default)]
pub struct GrepFormatter {
    lines: Vec<String>,
}

impl OutputFormatter for GrepFormatter {
    fn push(&mut self, m: &OwnedMatch, rel_path: &str) {
        self.lines.push(format!("{}:{}:{}", rel_path, m.line, m.rendered.grep_text()));
    }

    fn finish(&mut self) -> String {
        self.lines.join("\n")
    }
}

/// `result` is the same formatted string the grep formatter prints (e.g.
/// `"def fn2(arg1, arg2)"`), not a structured rendering of the node —
/// matching how the original's JSON formatter resolves this.
#[derive(Serialize)]
struct JsonRecord {
    filename: String,
    lineno: usize,
    result: String,
}

#[derive(Default)]
pub struct JsonFormatter {
    records: Vec<JsonRecord>,
}

impl OutputFormatter for JsonFormatter {
    fn push(&mut self, m: &OwnedMatch, rel_path: &str) {
        self.records.push(JsonRecord {
            filename: rel_path.to_string(),
            lineno: m.line,
            result: m.rendered.grep_text(),
        });
    }

    fn finish(&mut self) -> String {
        serde_json::to_string_pretty(&self.records).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parse_str;

    #[test]
    fn function_renders_def_signature() {
        let parsed = parse_str("def f(a, b):\n    pass\n");
        let f = &parsed.root().children()[0];
        let r = render(*f);
        assert_eq!(r.grep_text(), "def f(a, b)");
    }

    #[test]
    fn class_renders_base_list() {
        let parsed = parse_str("class C(A, B):\n    pass\n");
        let c = &parsed.root().children()[0];
        let r = render(*c);
        assert_eq!(r.grep_text(), "class C(A, B)");
    }

    #[test]
    fn call_renders_source_text() {
        let parsed = parse_str("handle(a, b)\n");
        let call_stmt = &parsed.root().children()[0];
        let call = &call_stmt.children()[0];
        let r = render(*call);
        assert_eq!(r.grep_text(), "call -> handle(a, b)");
    }
}
