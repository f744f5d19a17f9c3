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

//! The finder registry. Redesigned per the runtime `(string, string) ->
//! callable` table into a closed `Selector` enum matched at evaluation
//! time — adding a selector means adding a variant and a match arm, never
//! a new code path in the evaluator.

use crate::ast::{Kind, Node};
use crate::error::ScryError;
use crate::query::{Op, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selector {
    FnName,
    FnArgcount,
    FnParent,
    FnCall,
    ClsName,
    ClsParent,
    ClsMethod,
    VarName,
}

impl Selector {
    pub fn parse(kind: &str, attr: &str) -> Result<Selector, ScryError> {
        match (kind, attr) {
            ("fn", "name") => Ok(Selector::FnName),
            ("fn", "argcount") => Ok(Selector::FnArgcount),
            ("fn", "parent") => Ok(Selector::FnParent),
            ("fn", "call") => Ok(Selector::FnCall),
            ("cls", "name") => Ok(Selector::ClsName),
            ("cls", "parent") => Ok(Selector::ClsParent),
            ("cls", "method") => Ok(Selector::ClsMethod),
            ("var", "name") => Ok(Selector::VarName),
            _ => Err(ScryError::NoSemanticIndexer { kind: kind.to_string(), attr: attr.to_string() }),
        }
    }

    /// The kind this selector scans when it is given no refinement input.
    pub fn target_kind(&self) -> Kind {
        match self {
            Selector::FnName | Selector::FnArgcount | Selector::FnParent | Selector::ClsMethod => {
                Kind::Function
            }
            Selector::FnCall => Kind::Call,
            Selector::ClsName | Selector::ClsParent => Kind::Class,
            Selector::VarName => Kind::AssignTarget,
        }
    }
}

/// Every strict ancestor of `node`, following `parent` until the root.
/// Matches spec's "swallows missing-attribute silently, short-circuits on
/// first ancestor without a name": here that's encoded by simply only
/// ever inspecting `Function`/`Class` ancestors for their name, and
/// letting non-scope-bearing ancestors (module, block) pass through
/// freely without halting the walk.
pub fn ancestors<'a>(node: Node<'a>) -> impl Iterator<Item = Node<'a>> {
    std::iter::successors(node.parent(), |n| n.parent())
}

/// Name of the nearest enclosing `Function` or `Class`, if any.
fn ancestor_scope_names<'a>(node: Node<'a>) -> Vec<&'a str> {
    ancestors(node)
        .filter_map(|a| match a.kind() {
            Kind::Function => a.function_name(),
            Kind::Class => a.class_name(),
            _ => None,
        })
        .collect()
}

/// Immediate-callee name for a `Call` node: `callee.attrname` if the
/// callee is an `AttributeAccess`, else `callee.name`. For any other node
/// kind: prefer `attrname` then `name`; absent both, the empty string
/// (which matches nothing under `==` and everything under `!=` against a
/// non-empty value — part of the observable contract, not a bug).
pub fn immediate_callee_name<'a>(node: Node<'a>) -> &'a str {
    if node.kind() == Kind::Call {
        if let Some(callee) = node.call_callee() {
            return immediate_callee_name(callee);
        }
        return "";
    }
    node.attribute_name().or_else(|| node.name_text()).unwrap_or("")
}

fn compare(op: Op, lhs: &Value, rhs: &Value) -> bool {
    match op {
        Op::Eq => lhs == rhs,
        Op::Ne => lhs != rhs,
        Op::In => rhs.contains(lhs),
        Op::NotIn => !rhs.contains(lhs),
    }
}

fn compare_str(op: Op, actual: &str, value: &Value) -> bool {
    compare(op, &Value::Str(actual.to_string()), value)
}

fn compare_int(op: Op, actual: i64, value: &Value) -> bool {
    compare(op, &Value::Int(actual), value)
}

/// Evaluate one assertion (already split into selector + op/value) against
/// `input`. `input` is the refinement list from the previous assertion in
/// the same expression, or `None` to mean "scan the whole index for this
/// selector's target kind". Returns `Err(ScryError::NoNode)` — caught by
/// the search engine, never surfaced to the user — when zero candidates
/// match.
pub fn evaluate<'a>(
    selector: Selector,
    op: Option<Op>,
    value: Option<&Value>,
    input: Option<Vec<Node<'a>>>,
    index: &mut crate::indexer::Index<'a>,
) -> Result<Vec<Node<'a>>, ScryError> {
    let candidates = input.unwrap_or_else(|| index.find_one(selector.target_kind()));

    let matches: Vec<Node<'a>> = candidates
        .into_iter()
        .filter(|node| matches_selector(selector, op, value, *node))
        .collect();

    if matches.is_empty() {
        return Err(ScryError::NoNode);
    }
    Ok(matches)
}

fn matches_selector(selector: Selector, op: Option<Op>, value: Option<&Value>, node: Node<'_>) -> bool {
    let Some(op) = op else {
        return true;
    };
    let Some(value) = value else {
        return true;
    };

    match selector {
        Selector::FnName => node.function_name().map(|n| compare_str(op, n, value)).unwrap_or(false),
        Selector::FnArgcount => node
            .function_args()
            .map(|a| compare_int(op, a.count(), value))
            .unwrap_or(false),
        Selector::FnParent => ancestor_scope_names(node).iter().any(|n| compare_str(op, n, value)),
        Selector::FnCall => compare_str(op, immediate_callee_name(node), value),
        Selector::ClsName => node.class_name().map(|n| compare_str(op, n, value)).unwrap_or(false),
        Selector::ClsParent => {
            let bases = node.class_basenames();
            !bases.is_empty() && bases.iter().all(|b| compare_str(op, b, value))
        }
        Selector::ClsMethod => ancestors(node)
            .find(|a| a.kind() == Kind::Class)
            .and_then(|c| c.class_name())
            .map(|n| compare_str(op, n, value))
            .unwrap_or(false),
        Selector::VarName => {
            let excluded = node.parent().map(|p| p.kind() == Kind::Arguments).unwrap_or(false);
            !excluded && node.name_text().map(|n| compare_str(op, n, value)).unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::parse_str;
    use crate::indexer::Index;

    const SAMPLE: &str = "def fn2(arg1, arg2):\n    def fn3(*myargs, **mykwargs):\n        pass\n\ndef fn1(a='hello'):\n    pass\n";

    fn fn_names<'a>(nodes: &[Node<'a>]) -> Vec<&'a str> {
        let mut names: Vec<&str> = nodes.iter().filter_map(|n| n.function_name()).collect();
        names.sort_unstable();
        names
    }

    #[test]
    fn shorthand_matches_every_node_of_the_kind() {
        let parsed = parse_str(SAMPLE);
        let mut idx = Index::new(parsed.root());
        let result = evaluate(Selector::FnName, None, None, None, &mut idx).unwrap();
        assert_eq!(fn_names(&result), vec!["fn1", "fn2", "fn3"]);
    }

    #[test]
    fn argcount_counts_star_and_kwargs() {
        let parsed = parse_str(SAMPLE);
        let mut idx = Index::new(parsed.root());
        let result = evaluate(
            Selector::FnArgcount,
            Some(Op::In),
            Some(&Value::Set(vec![Value::Int(2)])),
            None,
            &mut idx,
        )
        .unwrap();
        assert_eq!(fn_names(&result), vec!["fn2", "fn3"]);
    }

    #[test]
    fn fn_parent_shorthand_matches_every_function() {
        let parsed = parse_str(SAMPLE);
        let mut idx = Index::new(parsed.root());
        let result = evaluate(Selector::FnParent, None, None, None, &mut idx);
        let names = fn_names(&result.unwrap());
        assert_eq!(names, vec!["fn1", "fn2", "fn3"]);
    }

    #[test]
    fn cls_parent_requires_all_bases_to_match() {
        let parsed = parse_str("class C(X, Y):\n    pass\nclass D(X):\n    pass\n");
        let mut idx = Index::new(parsed.root());
        let result = evaluate(
            Selector::ClsParent,
            Some(Op::Eq),
            Some(&Value::Str("X".to_string())),
            None,
            &mut idx,
        )
        .unwrap();
        let names: Vec<_> = result.iter().filter_map(|n| n.class_name()).collect();
        assert_eq!(names, vec!["D"]);
    }

    #[test]
    fn no_matches_is_nonode() {
        let parsed = parse_str(SAMPLE);
        let mut idx = Index::new(parsed.root());
        let err = evaluate(
            Selector::FnName,
            Some(Op::Eq),
            Some(&Value::Str("nonexistent".to_string())),
            None,
            &mut idx,
        )
        .unwrap_err();
        assert!(matches!(err, ScryError::NoNode));
    }

    #[test]
    fn var_name_excludes_parameters() {
        let parsed = parse_str("def f(a):\n    a = 1\n    b = a\n");
        let mut idx = Index::new(parsed.root());
        let result = evaluate(Selector::VarName, None, None, None, &mut idx).unwrap();
        let mut names: Vec<_> = result.iter().filter_map(|n| n.name_text()).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn unknown_selector_is_no_semantic_indexer() {
        assert!(matches!(
            Selector::parse("weird", "thing"),
            Err(ScryError::NoSemanticIndexer { .. })
        ));
    }
}
