//! Context reconstruction for extracted units.
//!
//! A function lifted out of its file loses the imports, module variables and
//! enclosing class declaration it depends on. The builders here put that
//! context back: resolving which imports a unit actually references,
//! rebuilding a compressed class wrapper (header, fields, constructor) for
//! methods, and locating docstrings so they can move into metadata.

use std::collections::{BTreeMap, BTreeSet};

use tree_sitter::{Node, Tree};

use crate::error::Result;
use crate::extract::{children, is_constructor, named_children, node_text, padded_text};
use crate::language::{DocstringRule, Language, LanguageProfile};
use crate::ranges::ByteRange;

const JAVA_OBJECT_TYPES: [&str; 4] = [
    "class_declaration",
    "record_declaration",
    "enum_declaration",
    "interface_declaration",
];

/// Extract the docstring of a function or class node, if any
pub fn docstring(code: &str, node: Node<'_>, profile: &LanguageProfile) -> Result<Option<String>> {
    match profile.docstring_rule {
        DocstringRule::BodyString => {
            let Some(body) = node.child_by_field_name("body") else {
                return Ok(None);
            };
            let Some(stmt) = named_children(body).find(|c| is_docstring_node(*c, profile)) else {
                return Ok(None);
            };
            match stmt.named_child(0) {
                Some(string_node) => Ok(Some(node_text(code, string_node)?.to_string())),
                None => Ok(None),
            }
        }
        DocstringRule::PrecedingComment => match node.prev_named_sibling() {
            Some(prev) if profile.docs_types.contains(&prev.kind()) => {
                Ok(Some(node_text(code, prev)?.to_string()))
            }
            _ => Ok(None),
        },
        DocstringRule::PrecedingCommentRun => {
            let mut parts = Vec::new();
            let mut current = node.prev_named_sibling();
            while let Some(prev) = current {
                if !profile.docs_types.contains(&prev.kind()) {
                    break;
                }
                parts.push(node_text(code, prev)?.to_string());
                current = prev.prev_named_sibling();
            }
            if parts.is_empty() {
                Ok(None)
            } else {
                parts.reverse();
                Ok(Some(parts.join("\n")))
            }
        }
    }
}

/// Whether a class-body child is the docstring statement
pub(crate) fn is_docstring_node(node: Node<'_>, profile: &LanguageProfile) -> bool {
    if profile.docstring_rule == DocstringRule::BodyString {
        return node.kind() == "expression_statement"
            && node
                .named_child(0)
                .is_some_and(|c| c.kind() == "string");
    }
    profile.docs_types.contains(&node.kind())
}

/// Node text with any immediately preceding comment lines prepended
pub fn node_with_comments(code: &str, node: Node<'_>, profile: &LanguageProfile) -> Result<String> {
    let mut comments = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(prev) = current {
        if !profile.docs_types.contains(&prev.kind()) {
            break;
        }
        comments.push(padded_text(code, prev)?);
        current = prev.prev_sibling();
    }

    let body = padded_text(code, node)?;
    if comments.is_empty() {
        return Ok(body);
    }
    comments.reverse();
    Ok(format!("{}\n{}", comments.join("\n"), body))
}

/// Byte ranges of a node plus its immediately preceding comments
pub fn ranges_with_comments(node: Node<'_>, profile: &LanguageProfile) -> Vec<ByteRange> {
    let mut ranges = Vec::new();
    let mut current = node.prev_sibling();
    while let Some(prev) = current {
        if !profile.docs_types.contains(&prev.kind()) {
            break;
        }
        ranges.push((prev.start_byte(), prev.end_byte()));
        current = prev.prev_sibling();
    }
    ranges.push((node.start_byte(), node.end_byte()));
    ranges
}

/// Function text, including the decorator wrapper when one is present
pub fn function_text(code: &str, node: Node<'_>, profile: &LanguageProfile) -> Result<String> {
    let node = match node.parent() {
        Some(parent) if Some(parent.kind()) == profile.decorator_type => parent,
        _ => node,
    };
    padded_text(code, node)
}

/// Resolve which import names a unit references.
///
/// Identifiers anywhere in the unit are matched against the import map; the
/// reconstructed class context is matched textually; module variables the
/// unit uses pull in the imports their definitions reference; wildcard
/// imports are always considered used.
pub fn used_import_names(
    code: &str,
    node: Node<'_>,
    profile: &LanguageProfile,
    imports: &BTreeMap<String, Node<'_>>,
    context: &str,
    module_variables: Option<&BTreeMap<String, Node<'_>>>,
) -> Result<BTreeSet<String>> {
    let mut used = BTreeSet::new();
    if imports.is_empty() {
        return Ok(used);
    }

    collect_matching_identifiers(code, node, profile, imports, &mut used)?;

    if !context.is_empty() {
        for name in imports.keys() {
            if context.contains(name.as_str()) {
                used.insert(name.clone());
            }
        }
    }

    if let Some(variables) = module_variables {
        for var_name in used_variable_names(code, node, profile)? {
            if let Some(var_node) = variables.get(&var_name) {
                collect_matching_identifiers(code, *var_node, profile, imports, &mut used)?;
            }
        }
    }

    for name in imports.keys() {
        if name.contains('*') {
            used.insert(name.clone());
        }
    }

    Ok(used)
}

fn collect_matching_identifiers(
    code: &str,
    node: Node<'_>,
    profile: &LanguageProfile,
    imports: &BTreeMap<String, Node<'_>>,
    used: &mut BTreeSet<String>,
) -> Result<()> {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        if profile.identifier_types.contains(&node.kind()) {
            let text = node_text(code, node)?;
            if imports.contains_key(text) {
                used.insert(text.to_string());
            }
        }
        for child in children(node) {
            stack.push(child);
        }
    }
    Ok(())
}

/// Render the used imports as a text block ready to prepend to a chunk
pub fn imports_text(
    code: &str,
    profile: &LanguageProfile,
    imports: &BTreeMap<String, Node<'_>>,
    used: &BTreeSet<String>,
) -> Result<String> {
    let mut statements = BTreeSet::new();
    for name in used {
        if let Some(node) = imports.get(name) {
            statements.insert(node_with_comments(code, *node, profile)?);
        }
    }

    if statements.is_empty() {
        return Ok(String::new());
    }
    let mut text = statements.into_iter().collect::<Vec<_>>().join("\n");
    text.push('\n');
    Ok(text)
}

/// Module variable names referenced inside a function body.
///
/// Python identifiers that are assignment targets inside the function are
/// locals shadowing the module variable and do not count as uses.
pub fn used_variable_names(
    code: &str,
    function_node: Node<'_>,
    profile: &LanguageProfile,
) -> Result<BTreeSet<String>> {
    let scan_root = function_node
        .child_by_field_name("body")
        .or_else(|| children(function_node).find(|c| c.kind() == profile.function_body_type))
        .unwrap_or(function_node);

    let mut used = BTreeSet::new();
    let mut stack = vec![scan_root];
    while let Some(node) = stack.pop() {
        if profile.identifier_types.contains(&node.kind()) {
            let shadowed = profile.language == Language::Python && is_assignment_target(node);
            if !shadowed {
                used.insert(node_text(code, node)?.to_string());
            }
        }
        for child in children(node) {
            stack.push(child);
        }
    }

    Ok(used)
}

fn is_assignment_target(identifier: Node<'_>) -> bool {
    let mut current = identifier.parent();
    while let Some(node) = current {
        if node.kind() == "assignment" {
            if let Some(left) = node.child_by_field_name("left") {
                if left.id() == identifier.id() {
                    return true;
                }
            }
        }
        current = node.parent();
    }
    false
}

/// Locate the constructor in a class body, looking through decorators
pub fn find_constructor<'t>(
    code: &str,
    body: Node<'t>,
    profile: &LanguageProfile,
) -> Result<Option<Node<'t>>> {
    for child in children(body) {
        if is_constructor(code, child, profile)? {
            return Ok(Some(child));
        }
        if Some(child.kind()) == profile.decorator_type {
            if let Some(def) = child.child_by_field_name("definition") {
                if is_constructor(code, def, profile)? {
                    return Ok(Some(child));
                }
            }
        }
    }
    Ok(None)
}

/// Reconstructed enclosing-class context for a method, innermost last.
///
/// Returns the context with and without docstrings; both end with a newline
/// when non-empty so they can be prepended to the method text directly.
pub fn additional_context(
    code: &str,
    function_node: Node<'_>,
    profile: &LanguageProfile,
) -> Result<(String, String)> {
    if profile.language == Language::Java {
        return java_additional_context(code, function_node, profile);
    }

    let mut with_doc = String::new();
    let mut without_doc = String::new();

    let mut node = function_node;
    while let Some(parent) = node.parent() {
        if profile.class_types.contains(&node.kind()) {
            let (with, without) = class_context(code, node, profile)?;
            with_doc = format!("{with}\n{with_doc}");
            without_doc = format!("{without}\n{without_doc}");
        }
        node = parent;
    }

    Ok((with_doc, without_doc))
}

/// Compressed class wrapper: header line, docstring, fields, constructor
fn class_context(
    code: &str,
    class_node: Node<'_>,
    profile: &LanguageProfile,
) -> Result<(String, String)> {
    let mut start_byte = class_node.start_byte();
    let mut indent = class_node.start_position().column;
    if let Some(parent) = class_node.parent() {
        if Some(parent.kind()) == profile.decorator_type {
            start_byte = parent.start_byte();
            indent = parent.start_position().column;
        }
    }

    let Some(body) = class_node.child_by_field_name("body") else {
        return Ok((String::new(), String::new()));
    };

    let header_text = code
        .get(start_byte..body.start_byte())
        .unwrap_or_default()
        .trim_end();
    let header = format!("{}{}\n", " ".repeat(indent), header_text);

    let doc = docstring(code, class_node, profile)?;
    let header_with_doc = match &doc {
        Some(doc) => format!("{}{}{}\n", header, " ".repeat(indent + 4), doc),
        None => header.clone(),
    };

    let fields = children(body)
        .filter(|c| profile.expression_types.contains(&c.kind()) && !is_docstring_node(*c, profile))
        .map(|c| padded_text(code, c))
        .collect::<Result<Vec<_>>>()?
        .join("\n");

    let (ctor_with, ctor_without) = match find_constructor(code, body, profile)? {
        Some(ctor) => {
            let inner = ctor.child_by_field_name("definition").unwrap_or(ctor);
            let text = function_text(code, inner, profile)?;
            let without = match docstring(code, inner, profile)? {
                Some(doc) => text.replace(&doc, ""),
                None => text.clone(),
            };
            (text, without)
        }
        None => (String::new(), String::new()),
    };

    let with_doc = format!("{header_with_doc}\n{fields}\n{ctor_with}")
        .trim()
        .to_string();
    let without_doc = format!("{header}\n{fields}\n{ctor_without}")
        .trim()
        .to_string();

    Ok((with_doc, without_doc))
}

fn java_additional_context(
    code: &str,
    function_node: Node<'_>,
    profile: &LanguageProfile,
) -> Result<(String, String)> {
    let mut with_parts = Vec::new();
    let mut without_parts = Vec::new();

    let mut node = function_node;
    while let Some(parent) = node.parent() {
        if JAVA_OBJECT_TYPES.contains(&node.kind()) {
            let (with, without) = java_object_context(code, node, profile)?;
            with_parts.insert(0, with);
            without_parts.insert(0, without);
        }
        node = parent;
    }

    let mut with_doc = with_parts.join("\n");
    let mut without_doc = without_parts.join("\n");
    if !with_doc.is_empty() {
        with_doc.push('\n');
    }
    if !without_doc.is_empty() {
        without_doc.push('\n');
    }

    Ok((with_doc, without_doc))
}

/// Context for one Java class, record, enum or interface declaration
fn java_object_context(
    code: &str,
    node: Node<'_>,
    profile: &LanguageProfile,
) -> Result<(String, String)> {
    let Some(body) = node.child_by_field_name("body") else {
        let text = padded_text(code, node)?;
        return Ok((text.clone(), text));
    };

    let indent = node.start_position().column;
    let signature = code
        .get(node.start_byte()..body.start_byte())
        .unwrap_or_default()
        .trim_end();
    let header = format!("{}{} {{", " ".repeat(indent), signature);

    let doc = docstring(code, node, profile)?;
    let header_with_doc = match &doc {
        Some(doc) => format!("{}\n{}{}", header, " ".repeat(indent + 4), doc),
        None => header.clone(),
    };

    let mut inner_parts: Vec<String> = Vec::new();
    match node.kind() {
        "enum_declaration" => {
            let constants = children(body)
                .filter(|c| c.kind() == "enum_constant")
                .map(|c| padded_text(code, c).map(|t| t.trim().to_string()))
                .collect::<Result<Vec<_>>>()?;
            if !constants.is_empty() {
                inner_parts.push(format!("{};", constants.join(",")));
            }
            if let Some(decl) = children(body).find(|c| c.kind() == "enum_body_declarations") {
                let members = children(decl)
                    .filter(|c| {
                        matches!(
                            c.kind(),
                            "field_declaration"
                                | "method_declaration"
                                | "block"
                                | "constructor_declaration"
                                | "compact_constructor_declaration"
                        )
                    })
                    .map(|c| padded_text(code, c))
                    .collect::<Result<Vec<_>>>()?;
                inner_parts.extend(members);
            }
        }
        "interface_declaration" => {
            for child in children(body) {
                if child.kind() == "constant_declaration"
                    || profile.function_types.contains(&child.kind())
                {
                    inner_parts.push(padded_text(code, child)?);
                }
            }
        }
        _ => {
            for child in children(body) {
                if matches!(child.kind(), "field_declaration" | "static_initializer" | "block") {
                    inner_parts.push(padded_text(code, child)?);
                }
            }
        }
    }

    if let Some(ctor) = find_constructor(code, body, profile)? {
        inner_parts.push(function_text(code, ctor, profile)?);
    }

    let inner = inner_parts
        .into_iter()
        .filter(|part| !part.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    let close = format!("{}}}", " ".repeat(indent));

    let join = |head: &str| -> String {
        let pieces: Vec<&str> = [head, inner.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        format!("{}\n{close}", pieces.join("\n\n").trim_end())
    };

    Ok((join(&header_with_doc), join(&header)))
}

/// File-level prefix repeated into every chunk: the Java package declaration
pub fn file_prefix(
    code: &str,
    tree: &Tree,
    profile: &LanguageProfile,
) -> Result<(String, Vec<ByteRange>)> {
    if profile.language != Language::Java {
        return Ok((String::new(), Vec::new()));
    }

    let mut prefix = String::new();
    let mut ranges = Vec::new();
    for child in children(tree.root_node()) {
        if child.kind() == "package_declaration" {
            prefix = format!("{}\n", padded_text(code, child)?.trim());
            ranges.push((child.start_byte(), child.end_byte()));
        }
    }
    Ok((prefix, ranges))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::{collect_functions, collect_imports, parse};
    use pretty_assertions::assert_eq;

    fn profile(lang: Language) -> &'static LanguageProfile {
        lang.profile().unwrap()
    }

    #[test]
    fn python_docstring_from_body() {
        let code = "def f():\n    \"\"\"Adds things.\"\"\"\n    return 1\n";
        let tree = parse(code, Language::Python).unwrap();
        let p = profile(Language::Python);
        let func = collect_functions(code, &tree, p).unwrap()[0];
        let doc = docstring(code, func, p).unwrap().unwrap();
        assert_eq!(doc, "\"\"\"Adds things.\"\"\"");
    }

    #[test]
    fn typescript_docstring_from_preceding_comment() {
        let code = "// greets the user\nfunction greet(name: string) {\n  return name;\n}\n";
        let tree = parse(code, Language::TypeScript).unwrap();
        let p = profile(Language::TypeScript);
        let func = collect_functions(code, &tree, p).unwrap()[0];
        let doc = docstring(code, func, p).unwrap().unwrap();
        assert_eq!(doc, "// greets the user");
    }

    #[test]
    fn c_docstring_joins_comment_run() {
        let code = "// adds two\n// numbers together\nint add(int a, int b) {\n  return a + b;\n}\n";
        let tree = parse(code, Language::C).unwrap();
        let p = profile(Language::C);
        let func = collect_functions(code, &tree, p).unwrap()[0];
        let doc = docstring(code, func, p).unwrap().unwrap();
        assert_eq!(doc, "// adds two\n// numbers together");
    }

    #[test]
    fn used_imports_match_identifiers_only() {
        let code = "import os\nimport sys\n\ndef f():\n    return os.getcwd()\n";
        let tree = parse(code, Language::Python).unwrap();
        let p = profile(Language::Python);
        let imports = collect_imports(code, &tree, p).unwrap();
        let func = collect_functions(code, &tree, p).unwrap()[0];

        let used = used_import_names(code, func, p, &imports, "", None).unwrap();
        assert!(used.contains("os"));
        assert!(!used.contains("sys"));

        let text = imports_text(code, p, &imports, &used).unwrap();
        assert_eq!(text, "import os\n");
    }

    #[test]
    fn wildcard_imports_always_used() {
        let code = "import java.io.*;\n\nclass A {\n    void run() {}\n}\n";
        let tree = parse(code, Language::Java).unwrap();
        let p = profile(Language::Java);
        let imports = collect_imports(code, &tree, p).unwrap();
        let func = collect_functions(code, &tree, p).unwrap()[0];
        let used = used_import_names(code, func, p, &imports, "", None).unwrap();
        assert_eq!(used.len(), 1);
    }

    #[test]
    fn assignment_targets_do_not_count_as_variable_uses() {
        let code = "LIMIT = 10\n\ndef f():\n    LIMIT = 5\n    return LIMIT\n";
        let tree = parse(code, Language::Python).unwrap();
        let p = profile(Language::Python);
        let func = collect_functions(code, &tree, p).unwrap()[0];
        let used = used_variable_names(code, func, p).unwrap();
        // the read on the return line still counts
        assert!(used.contains("LIMIT"));

        let write_only = "LIMIT = 10\n\ndef f():\n    LIMIT = 5\n";
        let tree = parse(write_only, Language::Python).unwrap();
        let func = collect_functions(write_only, &tree, p).unwrap()[0];
        let used = used_variable_names(write_only, func, p).unwrap();
        assert!(!used.contains("LIMIT"));
    }

    #[test]
    fn python_method_context_includes_header_fields_and_constructor() {
        let code = concat!(
            "class Point:\n",
            "    \"\"\"A 2D point.\"\"\"\n",
            "\n",
            "    def __init__(self, x, y):\n",
            "        self.x = x\n",
            "        self.y = y\n",
            "\n",
            "    def norm(self):\n",
            "        return (self.x ** 2 + self.y ** 2) ** 0.5\n",
        );
        let tree = parse(code, Language::Python).unwrap();
        let p = profile(Language::Python);
        let funcs = collect_functions(code, &tree, p).unwrap();
        assert_eq!(funcs.len(), 1, "only norm should be collected");

        let (with_doc, without_doc) = additional_context(code, funcs[0], p).unwrap();
        assert!(without_doc.contains("class Point:"));
        assert!(without_doc.contains("def __init__(self, x, y):"));
        assert!(!without_doc.contains("A 2D point"));
        assert!(with_doc.contains("A 2D point"));
        assert!(without_doc.ends_with('\n'));
    }

    #[test]
    fn top_level_function_has_no_context() {
        let code = "def f():\n    pass\n";
        let tree = parse(code, Language::Python).unwrap();
        let p = profile(Language::Python);
        let func = collect_functions(code, &tree, p).unwrap()[0];
        let (with_doc, without_doc) = additional_context(code, func, p).unwrap();
        assert!(with_doc.is_empty());
        assert!(without_doc.is_empty());
    }

    #[test]
    fn java_context_rebuilds_class_wrapper() {
        let code = concat!(
            "class Counter {\n",
            "    private int total;\n",
            "\n",
            "    int sum(int x) {\n",
            "        return total + x;\n",
            "    }\n",
            "}\n",
        );
        let tree = parse(code, Language::Java).unwrap();
        let p = profile(Language::Java);
        let func = collect_functions(code, &tree, p).unwrap()[0];
        let (_, without_doc) = additional_context(code, func, p).unwrap();
        assert!(without_doc.contains("class Counter {"));
        assert!(without_doc.contains("private int total;"));
        assert!(without_doc.trim_end().ends_with('}'));
    }

    #[test]
    fn java_file_prefix_is_package_declaration() {
        let code = "package com.example.app;\n\nclass A {\n    void run() {}\n}\n";
        let tree = parse(code, Language::Java).unwrap();
        let p = profile(Language::Java);
        let (prefix, ranges) = file_prefix(code, &tree, p).unwrap();
        assert_eq!(prefix, "package com.example.app;\n");
        assert_eq!(ranges.len(), 1);
    }

    #[test]
    fn node_with_comments_prepends_leading_comments() {
        let code = "# helper\nimport os\n\nx = os.getcwd()\n";
        let tree = parse(code, Language::Python).unwrap();
        let p = profile(Language::Python);
        let import_node = children(tree.root_node())
            .find(|c| c.kind() == "import_statement")
            .unwrap();
        let text = node_with_comments(code, import_node, p).unwrap();
        assert_eq!(text, "# helper\nimport os");
    }
}
