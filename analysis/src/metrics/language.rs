//! Language profiles: which tree-sitter node kinds count as what.
//!
//! The traversal in `complexity` is language-agnostic; everything
//! grammar-specific lives in the static tables below.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tree_sitter::Language;

/// Languages the metrics engine can parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLanguage {
    TypeScript,
    Tsx,
    JavaScript,
    Rust,
    Python,
    Go,
}

impl SourceLanguage {
    /// Detect the language from a file extension.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "ts" | "mts" | "cts" => Some(Self::TypeScript),
            "tsx" => Some(Self::Tsx),
            "js" | "jsx" | "mjs" | "cjs" => Some(Self::JavaScript),
            "rs" => Some(Self::Rust),
            "py" | "pyi" => Some(Self::Python),
            "go" => Some(Self::Go),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::TypeScript => "typescript",
            Self::Tsx => "tsx",
            Self::JavaScript => "javascript",
            Self::Rust => "rust",
            Self::Python => "python",
            Self::Go => "go",
        }
    }

    /// Tree-sitter grammar. JavaScript is parsed with the TSX grammar, which
    /// accepts plain JS and JSX.
    pub fn grammar(self) -> Language {
        match self {
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into(),
            Self::Tsx | Self::JavaScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            Self::Go => tree_sitter_go::LANGUAGE.into(),
        }
    }

    pub fn comment_syntax(self) -> CommentSyntax {
        match self {
            Self::Python => CommentSyntax {
                line: "#",
                block: None,
                quotes: &['"', '\''],
            },
            // Rust lifetimes make a bare `'` ambiguous.
            Self::Rust => CommentSyntax {
                line: "//",
                block: Some(("/*", "*/")),
                quotes: &['"'],
            },
            _ => CommentSyntax {
                line: "//",
                block: Some(("/*", "*/")),
                quotes: &['"', '\'', '`'],
            },
        }
    }

    pub fn profile(self) -> &'static LanguageProfile {
        match self {
            Self::TypeScript | Self::Tsx | Self::JavaScript => &ECMASCRIPT,
            Self::Rust => &RUST,
            Self::Python => &PYTHON,
            Self::Go => &GO,
        }
    }
}

impl std::fmt::Display for SourceLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Comment markers used by the line scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommentSyntax {
    pub line: &'static str,
    pub block: Option<(&'static str, &'static str)>,
    /// String delimiters; markers between a matching pair are not comments.
    /// Quoted spans end at the line break.
    pub quotes: &'static [char],
}

/// Node kinds driving the complexity traversal for one grammar family.
#[derive(Debug)]
pub struct LanguageProfile {
    /// if / while / for / ternary: +1 cyclomatic, +1 cognitive
    pub branch_kinds: &'static [&'static str],
    /// switch/match arms: +1 cyclomatic only
    pub case_kinds: &'static [&'static str],
    /// Nodes whose `operator` field may hold a logical operator
    pub logical_kinds: &'static [&'static str],
    pub logical_operators: &'static [&'static str],
    pub function_kinds: &'static [&'static str],
    pub class_kinds: &'static [&'static str],
    pub call_kinds: &'static [&'static str],
    pub comment_kinds: &'static [&'static str],
}

impl LanguageProfile {
    pub fn is_branch(&self, kind: &str) -> bool {
        self.branch_kinds.contains(&kind)
    }

    pub fn is_case(&self, kind: &str) -> bool {
        self.case_kinds.contains(&kind)
    }

    pub fn is_function(&self, kind: &str) -> bool {
        self.function_kinds.contains(&kind)
    }

    pub fn is_class(&self, kind: &str) -> bool {
        self.class_kinds.contains(&kind)
    }

    pub fn is_call(&self, kind: &str) -> bool {
        self.call_kinds.contains(&kind)
    }

    pub fn is_comment(&self, kind: &str) -> bool {
        self.comment_kinds.contains(&kind)
    }
}

static ECMASCRIPT: LanguageProfile = LanguageProfile {
    branch_kinds: &[
        "if_statement",
        "while_statement",
        "do_statement",
        "for_statement",
        "for_in_statement",
        "ternary_expression",
    ],
    case_kinds: &["switch_case"],
    logical_kinds: &["binary_expression"],
    logical_operators: &["&&", "||"],
    function_kinds: &[
        "function_declaration",
        "function_expression",
        "function",
        "generator_function_declaration",
        "generator_function",
        "arrow_function",
        "method_definition",
    ],
    class_kinds: &["class_declaration", "abstract_class_declaration", "class"],
    call_kinds: &["call_expression"],
    comment_kinds: &["comment"],
};

static RUST: LanguageProfile = LanguageProfile {
    branch_kinds: &[
        "if_expression",
        "while_expression",
        "loop_expression",
        "for_expression",
    ],
    case_kinds: &["match_arm"],
    logical_kinds: &["binary_expression"],
    logical_operators: &["&&", "||"],
    function_kinds: &["function_item"],
    class_kinds: &["struct_item", "impl_item", "trait_item"],
    call_kinds: &["call_expression"],
    comment_kinds: &["line_comment", "block_comment"],
};

static PYTHON: LanguageProfile = LanguageProfile {
    branch_kinds: &[
        "if_statement",
        "elif_clause",
        "while_statement",
        "for_statement",
        "conditional_expression",
    ],
    case_kinds: &["case_clause"],
    logical_kinds: &["boolean_operator"],
    logical_operators: &["and", "or"],
    function_kinds: &["function_definition"],
    class_kinds: &["class_definition"],
    call_kinds: &["call"],
    comment_kinds: &["comment"],
};

static GO: LanguageProfile = LanguageProfile {
    branch_kinds: &["if_statement", "for_statement"],
    case_kinds: &["expression_case", "type_case", "communication_case"],
    logical_kinds: &["binary_expression"],
    logical_operators: &["&&", "||"],
    function_kinds: &["function_declaration", "method_declaration", "func_literal"],
    class_kinds: &[],
    call_kinds: &["call_expression"],
    comment_kinds: &["comment"],
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn detects_languages_by_extension() {
        let cases = [
            ("/src/app.ts", Some(SourceLanguage::TypeScript)),
            ("/src/App.TSX", Some(SourceLanguage::Tsx)),
            ("/src/index.mjs", Some(SourceLanguage::JavaScript)),
            ("/src/lib.rs", Some(SourceLanguage::Rust)),
            ("/src/tool.py", Some(SourceLanguage::Python)),
            ("/src/main.go", Some(SourceLanguage::Go)),
            ("/README.md", None),
            ("/Makefile", None),
        ];
        for (path, expected) in cases {
            assert_eq!(SourceLanguage::from_path(&PathBuf::from(path)), expected, "{path}");
        }
    }

    #[test]
    fn switch_case_is_not_a_branch() {
        let profile = SourceLanguage::TypeScript.profile();
        assert!(profile.is_case("switch_case"));
        assert!(!profile.is_branch("switch_case"));
        assert!(profile.is_branch("ternary_expression"));
    }

    #[test]
    fn python_uses_hash_comments() {
        let syntax = SourceLanguage::Python.comment_syntax();
        assert_eq!(syntax.line, "#");
        assert!(syntax.block.is_none());
    }
}
