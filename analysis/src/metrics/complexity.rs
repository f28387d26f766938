//! Complexity traversal: one pass over a tree-sitter tree per file.
//!
//! Accumulates file-level cyclomatic and cognitive complexity together with
//! per-function and per-class sub-metrics. The walk uses a `TreeCursor`
//! instead of recursion so deeply nested sources cannot overflow the stack.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tree_sitter::{Node, Parser};

use super::language::{LanguageProfile, SourceLanguage};
use super::lines::count_lines;
use crate::plugin::PluginError;

/// Metrics for one function, method, arrow function or closure-like item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionMetrics {
    pub name: String,
    /// 1-based, inclusive
    pub start_line: usize,
    pub end_line: usize,
    pub cyclomatic_complexity: u32,
    pub cognitive_complexity: u32,
    pub parameter_count: usize,
    pub called_identifiers: BTreeSet<String>,
}

/// Metrics for a class-like item (class, struct, impl block, trait).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassMetrics {
    pub name: String,
    pub start_line: usize,
    pub end_line: usize,
    /// Base 1 plus every decision point inside the body
    pub complexity: u32,
    pub member_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetrics {
    pub path: PathBuf,
    pub language: SourceLanguage,
    pub lines_of_code: usize,
    pub comment_lines: usize,
    pub blank_lines: usize,
    pub cyclomatic_complexity: u32,
    pub cognitive_complexity: u32,
    pub maintainability_index: f64,
    pub functions: Vec<FunctionMetrics>,
    pub classes: Vec<ClassMetrics>,
}

/// Simplified maintainability index.
///
/// `171 − 5.2·ln(V) − 0.23·CC − 16.2·ln(LOC)` with `V = log2(LOC+1)·LOC`
/// standing in for Halstead volume, clamped to `[0, 100]`. Empty files score
/// 100; the result is never NaN or infinite.
pub fn maintainability_index(lines_of_code: usize, cyclomatic_complexity: u32) -> f64 {
    if lines_of_code == 0 {
        return 100.0;
    }
    let loc = lines_of_code as f64;
    let volume = (loc + 1.0).log2() * loc;
    let raw = 171.0 - 5.2 * volume.ln() - 0.23 * f64::from(cyclomatic_complexity) - 16.2 * loc.ln();
    if raw.is_finite() {
        raw.clamp(0.0, 100.0)
    } else {
        0.0
    }
}

/// Parse `source` and compute its metrics.
///
/// # Errors
///
/// Returns `PluginError::Execution` if the grammar cannot be loaded or the
/// parser gives up on the input.
pub fn analyze_source(
    path: &Path,
    source: &str,
    language: SourceLanguage,
) -> Result<FileMetrics, PluginError> {
    let mut parser = Parser::new();
    parser.set_language(&language.grammar()).map_err(|e| {
        PluginError::execution(format!("{} grammar unavailable: {e}", language.name()))
    })?;

    let tree = parser.parse(source, None).ok_or_else(|| {
        PluginError::execution(format!("failed to parse {}", path.display()))
    })?;

    let root = tree.root_node();
    if root.has_error() {
        tracing::debug!(file = %path.display(), "syntax errors in source; metrics are best-effort");
    }

    let mut walker = Walker::new(source.as_bytes(), language.profile());
    walker.walk(root);

    let lines = count_lines(source, language.comment_syntax());
    let cyclomatic = 1 + walker.decisions;

    Ok(FileMetrics {
        path: path.to_path_buf(),
        language,
        lines_of_code: lines.code,
        comment_lines: lines.comment,
        blank_lines: lines.blank,
        cyclomatic_complexity: cyclomatic,
        cognitive_complexity: walker.cognitive,
        maintainability_index: maintainability_index(lines.code, cyclomatic),
        functions: walker.functions,
        classes: walker.classes,
    })
}

// ── Traversal ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Scope {
    Function { node_id: usize, index: usize },
    Class { node_id: usize, index: usize },
}

impl Scope {
    fn node_id(self) -> usize {
        match self {
            Self::Function { node_id, .. } | Self::Class { node_id, .. } => node_id,
        }
    }
}

struct Walker<'a> {
    source: &'a [u8],
    profile: &'static LanguageProfile,
    /// Cyclomatic decision points (branches + cases) for the whole file
    decisions: u32,
    cognitive: u32,
    functions: Vec<FunctionMetrics>,
    classes: Vec<ClassMetrics>,
    scopes: Vec<Scope>,
}

impl<'a> Walker<'a> {
    fn new(source: &'a [u8], profile: &'static LanguageProfile) -> Self {
        Self {
            source,
            profile,
            decisions: 0,
            cognitive: 0,
            functions: Vec::new(),
            classes: Vec::new(),
            scopes: Vec::new(),
        }
    }

    fn walk(&mut self, root: Node) {
        let mut cursor = root.walk();
        loop {
            self.enter(cursor.node());
            if cursor.goto_first_child() {
                continue;
            }
            loop {
                self.exit(cursor.node());
                if cursor.goto_next_sibling() {
                    break;
                }
                if !cursor.goto_parent() {
                    return;
                }
            }
        }
    }

    fn enter(&mut self, node: Node) {
        // Keyword tokens share kinds like `function` and `class` with the
        // expression nodes they introduce.
        if !node.is_named() {
            return;
        }
        let kind = node.kind();
        let profile = self.profile;

        if profile.is_function(kind) {
            let index = self.functions.len();
            self.functions.push(self.function_header(node));
            self.scopes.push(Scope::Function {
                node_id: node.id(),
                index,
            });
        } else if profile.is_class(kind) {
            let index = self.classes.len();
            self.classes.push(self.class_header(node));
            self.scopes.push(Scope::Class {
                node_id: node.id(),
                index,
            });
        }

        if profile.is_branch(kind) {
            self.record_decision(true);
        } else if profile.is_case(kind) {
            self.record_decision(false);
        } else if profile.logical_kinds.contains(&kind) && self.is_logical(node) {
            self.cognitive += 1;
            if let Some(f) = self.current_function() {
                f.cognitive_complexity += 1;
            }
        } else if profile.is_call(kind) {
            if let Some(callee) = self.callee_name(node) {
                if let Some(f) = self.current_function() {
                    f.called_identifiers.insert(callee);
                }
            }
        }
    }

    fn exit(&mut self, node: Node) {
        if let Some(scope) = self.scopes.last() {
            if scope.node_id() == node.id() {
                self.scopes.pop();
            }
        }
    }

    /// `cognitive` is false for switch/match arms.
    fn record_decision(&mut self, cognitive: bool) {
        self.decisions += 1;
        if cognitive {
            self.cognitive += 1;
        }
        if let Some(f) = self.current_function() {
            f.cyclomatic_complexity += 1;
            if cognitive {
                f.cognitive_complexity += 1;
            }
        }
        if let Some(c) = self.current_class() {
            c.complexity += 1;
        }
    }

    fn current_function(&mut self) -> Option<&mut FunctionMetrics> {
        let index = self.scopes.iter().rev().find_map(|s| match s {
            Scope::Function { index, .. } => Some(*index),
            Scope::Class { .. } => None,
        })?;
        self.functions.get_mut(index)
    }

    fn current_class(&mut self) -> Option<&mut ClassMetrics> {
        let index = self.scopes.iter().rev().find_map(|s| match s {
            Scope::Class { index, .. } => Some(*index),
            Scope::Function { .. } => None,
        })?;
        self.classes.get_mut(index)
    }

    fn is_logical(&self, node: Node) -> bool {
        node.child_by_field_name("operator")
            .map(|op| self.profile.logical_operators.contains(&op.kind()))
            .unwrap_or(false)
    }

    fn text(&self, node: Node) -> Option<String> {
        node.utf8_text(self.source).ok().map(str::to_string)
    }

    fn function_header(&self, node: Node) -> FunctionMetrics {
        let parameter_count = node
            .child_by_field_name("parameters")
            .or_else(|| node.child_by_field_name("parameter"))
            .map(|params| {
                if params.named_child_count() == 0 && params.kind() == "identifier" {
                    // `x => x + 1`
                    1
                } else {
                    self.count_parameters(params)
                }
            })
            .unwrap_or(0);

        FunctionMetrics {
            name: self.function_name(node),
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            cyclomatic_complexity: 1,
            cognitive_complexity: 0,
            parameter_count,
            called_identifiers: BTreeSet::new(),
        }
    }

    fn function_name(&self, node: Node) -> String {
        if let Some(name) = node.child_by_field_name("name").and_then(|n| self.text(n)) {
            return name;
        }
        // Anonymous functions take the name they are bound to.
        if let Some(parent) = node.parent() {
            let binding = match parent.kind() {
                "variable_declarator" => parent.child_by_field_name("name"),
                "pair" => parent.child_by_field_name("key"),
                "assignment_expression" => parent.child_by_field_name("left"),
                "public_field_definition" => parent.child_by_field_name("name"),
                _ => None,
            };
            if let Some(name) = binding.and_then(|n| self.text(n)) {
                return name;
            }
        }
        "<anonymous>".to_string()
    }

    fn class_header(&self, node: Node) -> ClassMetrics {
        let name = node
            .child_by_field_name("name")
            .or_else(|| node.child_by_field_name("type"))
            .and_then(|n| self.text(n))
            .unwrap_or_else(|| "<anonymous>".to_string());
        let member_count = node
            .child_by_field_name("body")
            .map(|body| self.count_named_children(body))
            .unwrap_or(0);

        ClassMetrics {
            name,
            start_line: node.start_position().row + 1,
            end_line: node.end_position().row + 1,
            complexity: 1,
            member_count,
        }
    }

    fn count_named_children(&self, node: Node) -> usize {
        let mut cursor = node.walk();
        let count = node
            .named_children(&mut cursor)
            .filter(|child| !self.profile.is_comment(child.kind()))
            .count();
        count
    }

    /// Go declares `a, b int` as one node holding several `name` fields.
    fn count_parameters(&self, params: Node) -> usize {
        let mut cursor = params.walk();
        let count = params
            .named_children(&mut cursor)
            .filter(|child| !self.profile.is_comment(child.kind()))
            .map(|child| match child.kind() {
                "parameter_declaration" | "variadic_parameter_declaration" => {
                    let mut names = child.walk();
                    let named = child.children_by_field_name("name", &mut names).count();
                    named.max(1)
                }
                _ => 1,
            })
            .sum();
        count
    }

    fn callee_name(&self, call: Node) -> Option<String> {
        let callee = call.child_by_field_name("function")?;
        if callee.kind().ends_with("identifier") {
            return self.text(callee);
        }
        ["property", "field", "attribute", "name"]
            .iter()
            .find_map(|field| callee.child_by_field_name(field))
            .and_then(|n| self.text(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(source: &str) -> FileMetrics {
        analyze_source(Path::new("/src/sample.ts"), source, SourceLanguage::TypeScript).unwrap()
    }

    #[test]
    fn mi_degenerate_inputs_stay_in_range() {
        for loc in [0usize, 1, 2, 10, 1_000, 1_000_000] {
            for cc in [0u32, 1, 50, u32::MAX] {
                let mi = maintainability_index(loc, cc);
                assert!(mi.is_finite(), "loc={loc} cc={cc}");
                assert!((0.0..=100.0).contains(&mi), "loc={loc} cc={cc} mi={mi}");
            }
        }
        assert_eq!(maintainability_index(0, 1), 100.0);
    }

    #[test]
    fn mi_decreases_with_size() {
        assert!(maintainability_index(50, 5) > maintainability_index(500, 5));
        assert!(maintainability_index(5_000, 80) < 20.0);
    }

    #[test]
    fn cyclomatic_counts_branches_and_cases() {
        let m = ts(r#"
function route(x: number, y: boolean): string {
    if (x > 1) {
        return "a";
    }
    for (let i = 0; i < x; i++) {}
    while (y) { y = false; }
    switch (x) {
        case 1: return "one";
        case 2: return "two";
        default: return "other";
    }
}
const pick = (a: boolean) => a ? 1 : 2;
"#);
        // if + for + while + 2 cases + ternary
        assert_eq!(m.cyclomatic_complexity, 1 + 6);
        // cases add nothing to cognitive
        assert_eq!(m.cognitive_complexity, 4);
        assert_eq!(m.functions.len(), 2);

        let route = &m.functions[0];
        assert_eq!(route.name, "route");
        assert_eq!(route.cyclomatic_complexity, 1 + 5);
        assert_eq!(route.parameter_count, 2);

        let pick = &m.functions[1];
        assert_eq!(pick.name, "pick");
        assert_eq!(pick.cyclomatic_complexity, 2);
    }

    #[test]
    fn logical_operators_add_cognitive_only() {
        let m = ts("function f(a: boolean, b: boolean, c: boolean) { return a && b || c; }\n");
        assert_eq!(m.cyclomatic_complexity, 1);
        assert_eq!(m.cognitive_complexity, 2);
        assert_eq!(m.functions[0].cognitive_complexity, 2);
    }

    #[test]
    fn nested_function_keeps_its_own_complexity() {
        let m = ts(r#"
function outer() {
    if (a) {}
    function inner() {
        if (b) {}
        if (c) {}
    }
}
"#);
        let outer = m.functions.iter().find(|f| f.name == "outer").unwrap();
        let inner = m.functions.iter().find(|f| f.name == "inner").unwrap();
        assert_eq!(outer.cyclomatic_complexity, 2);
        assert_eq!(inner.cyclomatic_complexity, 3);
        assert_eq!(m.cyclomatic_complexity, 4);
    }

    #[test]
    fn class_metrics_and_called_identifiers() {
        let m = ts(r#"
class Service {
    private count = 0;
    run(input: string) {
        if (input) {
            this.log(input);
            helper(input);
        }
    }
    log(msg: string) {
        console.log(msg);
    }
}
"#);
        assert_eq!(m.classes.len(), 1);
        let class = &m.classes[0];
        assert_eq!(class.name, "Service");
        assert_eq!(class.member_count, 3);
        assert_eq!(class.complexity, 2);

        let run = m.functions.iter().find(|f| f.name == "run").unwrap();
        assert!(run.called_identifiers.contains("log"));
        assert!(run.called_identifiers.contains("helper"));
        assert_eq!(run.start_line, 4);
        assert_eq!(run.end_line, 9);
    }

    #[test]
    fn rust_match_arms_are_cases() {
        let m = analyze_source(
            Path::new("/src/lib.rs"),
            r#"
fn classify(n: i32) -> &'static str {
    match n {
        0 => "zero",
        1 => "one",
        _ => "many",
    }
}
"#,
            SourceLanguage::Rust,
        )
        .unwrap();
        assert_eq!(m.cyclomatic_complexity, 4);
        assert_eq!(m.cognitive_complexity, 0);
        assert_eq!(m.functions[0].name, "classify");
        assert_eq!(m.functions[0].parameter_count, 1);
    }

    #[test]
    fn keyword_tokens_are_not_functions_or_classes() {
        let m = ts("function a() {}\nclass B {}\n");
        let names: Vec<_> = m.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a"]);
        assert_eq!(m.classes.len(), 1);
        assert_eq!(m.classes[0].name, "B");
    }

    #[test]
    fn class_and_function_expressions_still_count() {
        let m = ts("const A = class { m() {} };\nconst f = function () {};\n");
        assert_eq!(m.classes.len(), 1);
        assert!(m.functions.iter().any(|f| f.name == "f"));
        assert!(m.functions.iter().any(|f| f.name == "m"));
        assert!(m.functions.iter().all(|f| f.name != "<anonymous>"));
    }

    #[test]
    fn go_grouped_parameters_count_each_name() {
        let m = analyze_source(
            Path::new("/src/main.go"),
            "package main\n\nfunc f(a, b int, c string) {}\n\nfunc g(int, string) {}\n\nfunc h(xs ...int) {}\n",
            SourceLanguage::Go,
        )
        .unwrap();
        let params: Vec<_> = m
            .functions
            .iter()
            .map(|f| (f.name.as_str(), f.parameter_count))
            .collect();
        assert_eq!(params, vec![("f", 3), ("g", 2), ("h", 1)]);
    }

    #[test]
    fn python_grammar_loads_and_counts() {
        let m = analyze_source(
            Path::new("/src/tool.py"),
            "class Tool:\n    def run(self, a, b):\n        if a and b:\n            return 1\n        return 2\n",
            SourceLanguage::Python,
        )
        .unwrap();
        assert_eq!(m.classes.len(), 1);
        assert_eq!(m.functions.len(), 1);
        let run = &m.functions[0];
        assert_eq!(run.name, "run");
        assert_eq!(run.parameter_count, 3);
        assert_eq!(run.cyclomatic_complexity, 2);
        assert_eq!(run.cognitive_complexity, 2);
    }

    #[test]
    fn line_counts_flow_into_metrics() {
        let m = ts("// header\n\nconst a = 1;\n/* note */\nconst b = 2;\n");
        assert_eq!(m.lines_of_code, 2);
        assert_eq!(m.comment_lines, 2);
        assert_eq!(m.blank_lines, 1);
        assert!((0.0..=100.0).contains(&m.maintainability_index));
    }

    #[test]
    fn empty_file_has_base_complexity() {
        let m = ts("");
        assert_eq!(m.cyclomatic_complexity, 1);
        assert_eq!(m.lines_of_code, 0);
        assert_eq!(m.maintainability_index, 100.0);
        assert!(m.functions.is_empty());
    }
}
