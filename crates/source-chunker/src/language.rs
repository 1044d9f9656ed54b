use std::path::Path;

use serde::{Deserialize, Serialize};

/// Programming language tag.
///
/// Only a subset of tags has a [`LanguageProfile`]; the rest take the
/// verbatim code-block fallback in the facade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    C,
    Java,
    Rust,
    Go,
    Cpp,
    CSharp,
    Ruby,
    Swift,
    Kotlin,
    Unknown,
}

impl Language {
    /// Detect language from file extension
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "py" | "pyw" => Language::Python,
            "ts" | "tsx" | "cts" | "mts" => Language::TypeScript,
            "js" | "jsx" | "mjs" | "cjs" => Language::JavaScript,
            "c" | "h" => Language::C,
            "java" => Language::Java,
            "rs" => Language::Rust,
            "go" => Language::Go,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    #[must_use]
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Parse a language name such as `"python"` or `"typescript"`
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        match tag.to_lowercase().as_str() {
            "python" | "py" => Language::Python,
            "typescript" | "ts" => Language::TypeScript,
            "javascript" | "js" => Language::JavaScript,
            "c" => Language::C,
            "java" => Language::Java,
            "rust" => Language::Rust,
            "go" => Language::Go,
            "cpp" | "c++" => Language::Cpp,
            "csharp" | "c#" => Language::CSharp,
            "ruby" => Language::Ruby,
            "swift" => Language::Swift,
            "kotlin" => Language::Kotlin,
            _ => Language::Unknown,
        }
    }

    /// Get language name as string
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::C => "c",
            Language::Java => "java",
            Language::Rust => "rust",
            Language::Go => "go",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Unknown => "unknown",
        }
    }

    /// Structural profile for this language, if chunking is supported
    #[must_use]
    pub fn profile(self) -> Option<&'static LanguageProfile> {
        match self {
            Language::Python => Some(&PYTHON),
            Language::TypeScript => Some(&TYPESCRIPT),
            Language::JavaScript => Some(&JAVASCRIPT),
            Language::C => Some(&C),
            Language::Java => Some(&JAVA),
            _ => None,
        }
    }

    /// Get the tree-sitter grammar for a profiled language
    #[must_use]
    pub fn grammar(self) -> Option<tree_sitter::Language> {
        match self {
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::C => Some(tree_sitter_c::LANGUAGE.into()),
            Language::Java => Some(tree_sitter_java::LANGUAGE.into()),
            _ => None,
        }
    }
}

/// How a unit's docstring is located in the tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocstringRule {
    /// First string expression statement inside the body block (Python)
    BodyString,
    /// Single comment node immediately preceding the unit
    PrecedingComment,
    /// Run of consecutive comment nodes immediately preceding the unit (C)
    PrecedingCommentRun,
}

/// Per-language table of structural node-type names and behavior hooks.
///
/// Profiles are immutable static data; they are safe to share across
/// concurrent chunking calls.
#[derive(Debug)]
pub struct LanguageProfile {
    pub language: Language,
    /// Node types that declare a function-like unit
    pub function_types: &'static [&'static str],
    /// Node types that declare a class-like unit
    pub class_types: &'static [&'static str],
    /// Node type of a function body block (fallback when the `body` field
    /// is absent from the grammar)
    pub function_body_type: &'static str,
    /// Constructor name token; `None` when the language has no constructor
    /// concept
    pub constructor_name: Option<&'static str>,
    /// Wrapper node type for decorators/annotations
    pub decorator_type: Option<&'static str>,
    /// Comment/doc node types
    pub docs_types: &'static [&'static str],
    /// Node types counted as class fields when rebuilding class context
    pub expression_types: &'static [&'static str],
    /// Identifier node types scanned by the usage resolver
    pub identifier_types: &'static [&'static str],
    /// Block-opening token appended to the repeated signature line when a
    /// function chunk is split
    pub split_prefix: &'static str,
    /// Block-closing token appended to each split piece
    pub split_suffix: &'static str,
    /// Tree-sitter query locating import statements, when the language
    /// supports query-based import extraction
    pub import_query: Option<&'static str>,
    /// Docstring extraction rule
    pub docstring_rule: DocstringRule,
    /// Whether module-level variables/macros are a meaningful concept
    pub has_module_variables: bool,
}

const PYTHON_IMPORT_QUERY: &str = r"
(import_statement) @import
(import_from_statement) @import
(future_import_statement) @import
";

const TS_IMPORT_QUERY: &str = r#"
(import_statement) @import

(lexical_declaration
  (variable_declarator
    name: (identifier)
    value: (call_expression
      function: (identifier) @require
      arguments: (arguments (string))))) @import

(lexical_declaration
  (variable_declarator
    name: (identifier)
    value: (await_expression
      (call_expression
        function: (import)
        arguments: (arguments (string)))))) @import
"#;

static PYTHON: LanguageProfile = LanguageProfile {
    language: Language::Python,
    function_types: &["function_definition"],
    class_types: &["class_definition"],
    function_body_type: "block",
    constructor_name: Some("__init__"),
    decorator_type: Some("decorated_definition"),
    docs_types: &["comment"],
    expression_types: &["expression_statement"],
    identifier_types: &["identifier"],
    split_prefix: "",
    split_suffix: "",
    import_query: Some(PYTHON_IMPORT_QUERY),
    docstring_rule: DocstringRule::BodyString,
    has_module_variables: true,
};

static TYPESCRIPT: LanguageProfile = LanguageProfile {
    language: Language::TypeScript,
    function_types: &[
        "function_declaration",
        "arrow_function",
        "method_definition",
        "function_expression",
        "generator_function",
        "generator_function_declaration",
        "export_statement",
    ],
    class_types: &["class_declaration"],
    function_body_type: "statement_block",
    constructor_name: Some("constructor"),
    decorator_type: Some("decorator"),
    docs_types: &["comment"],
    expression_types: &["expression_statement"],
    identifier_types: &["identifier", "type_identifier"],
    split_prefix: " {",
    split_suffix: "\n}",
    import_query: Some(TS_IMPORT_QUERY),
    docstring_rule: DocstringRule::PrecedingComment,
    has_module_variables: false,
};

static JAVASCRIPT: LanguageProfile = LanguageProfile {
    language: Language::JavaScript,
    function_types: &[
        "function_declaration",
        "arrow_function",
        "method_definition",
        "function_expression",
        "generator_function",
        "generator_function_declaration",
        "export_statement",
    ],
    class_types: &["class_declaration"],
    function_body_type: "statement_block",
    constructor_name: Some("constructor"),
    decorator_type: Some("decorator"),
    docs_types: &["comment"],
    expression_types: &["expression_statement"],
    identifier_types: &["identifier"],
    split_prefix: " {",
    split_suffix: "\n}",
    import_query: Some(TS_IMPORT_QUERY),
    docstring_rule: DocstringRule::PrecedingComment,
    has_module_variables: false,
};

static C: LanguageProfile = LanguageProfile {
    language: Language::C,
    function_types: &["function_definition"],
    class_types: &[],
    function_body_type: "compound_statement",
    constructor_name: None,
    decorator_type: None,
    docs_types: &["comment"],
    expression_types: &[],
    identifier_types: &["identifier"],
    split_prefix: " {",
    split_suffix: "\n}",
    import_query: None,
    docstring_rule: DocstringRule::PrecedingCommentRun,
    has_module_variables: true,
};

static JAVA: LanguageProfile = LanguageProfile {
    language: Language::Java,
    function_types: &[
        "method_declaration",
        "constructor_declaration",
        "static_initializer",
    ],
    class_types: &["class_declaration", "interface_declaration"],
    function_body_type: "block",
    // Never matches a real method name, so Java constructors are collected
    // as ordinary functions rather than folded into class context.
    constructor_name: Some("<init>"),
    decorator_type: Some("annotation"),
    docs_types: &["block_comment", "line_comment", "comment"],
    expression_types: &[],
    identifier_types: &["identifier", "type_identifier"],
    split_prefix: " {",
    split_suffix: "\n}",
    import_query: None,
    docstring_rule: DocstringRule::PrecedingComment,
    has_module_variables: false,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_extension_covers_profiled_languages() {
        assert_eq!(Language::from_extension("py"), Language::Python);
        assert_eq!(Language::from_extension("TS"), Language::TypeScript);
        assert_eq!(Language::from_extension("mjs"), Language::JavaScript);
        assert_eq!(Language::from_extension("c"), Language::C);
        assert_eq!(Language::from_extension("java"), Language::Java);
        assert_eq!(Language::from_extension("zig"), Language::Unknown);
    }

    #[test]
    fn from_path_uses_extension() {
        assert_eq!(Language::from_path("src/app.py"), Language::Python);
        assert_eq!(Language::from_path("no_extension"), Language::Unknown);
    }

    #[test]
    fn from_tag_round_trips_as_str() {
        for lang in [
            Language::Python,
            Language::TypeScript,
            Language::JavaScript,
            Language::C,
            Language::Java,
            Language::Rust,
        ] {
            assert_eq!(Language::from_tag(lang.as_str()), lang);
        }
    }

    #[test]
    fn profiles_exist_only_for_supported_languages() {
        assert!(Language::Python.profile().is_some());
        assert!(Language::TypeScript.profile().is_some());
        assert!(Language::JavaScript.profile().is_some());
        assert!(Language::C.profile().is_some());
        assert!(Language::Java.profile().is_some());
        assert!(Language::Rust.profile().is_none());
        assert!(Language::Go.profile().is_none());
        assert!(Language::Unknown.profile().is_none());
    }

    #[test]
    fn grammars_available_for_profiled_languages() {
        for lang in [
            Language::Python,
            Language::TypeScript,
            Language::JavaScript,
            Language::C,
            Language::Java,
        ] {
            assert!(lang.grammar().is_some(), "missing grammar for {lang:?}");
        }
        assert!(Language::Rust.grammar().is_none());
    }

    #[test]
    fn constructor_conventions() {
        assert_eq!(
            Language::Python.profile().unwrap().constructor_name,
            Some("__init__")
        );
        assert_eq!(Language::C.profile().unwrap().constructor_name, None);
    }
}
