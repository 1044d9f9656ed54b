//! Parsing and symbol collection over tree-sitter syntax trees.
//!
//! Everything here is read-only over the parsed tree: collecting function and
//! class nodes, building the name -> definition maps used to inline imports
//! and module-level variables into chunks.

use std::collections::BTreeMap;

use tree_sitter::{Node, Parser, Query, QueryCursor, StreamingIterator, Tree};

use crate::error::{ChunkerError, Result};
use crate::language::{Language, LanguageProfile};

/// Parse source text with the grammar for `language`
pub fn parse(code: &str, language: Language) -> Result<Tree> {
    let grammar = language.grammar().ok_or_else(|| {
        ChunkerError::parse(format!("no grammar for language `{}`", language.as_str()))
    })?;

    let mut parser = Parser::new();
    parser
        .set_language(&grammar)
        .map_err(|err| ChunkerError::tree_sitter(err.to_string()))?;
    parser
        .parse(code, None)
        .ok_or_else(|| ChunkerError::parse("parser produced no tree"))
}

/// Slice the source text covered by a node
pub fn node_text<'a>(code: &'a str, node: Node<'_>) -> Result<&'a str> {
    code.get(node.start_byte()..node.end_byte())
        .ok_or(ChunkerError::Encoding {
            start: node.start_byte(),
            end: node.end_byte(),
        })
}

/// Node text re-padded to its source column, with trailing whitespace removed
pub fn padded_text(code: &str, node: Node<'_>) -> Result<String> {
    let indent = node.start_position().column;
    let text = node_text(code, node)?;
    Ok(format!("{}{}", " ".repeat(indent), text)
        .trim_end()
        .to_string())
}

pub(crate) fn children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.child_count()).filter_map(move |i| node.child(i))
}

pub(crate) fn named_children<'t>(node: Node<'t>) -> impl Iterator<Item = Node<'t>> {
    (0..node.named_child_count()).filter_map(move |i| node.named_child(i))
}

/// Name of a function-like node, when the grammar exposes one.
///
/// C function names hide behind the declarator rather than a `name` field.
pub fn function_name(code: &str, node: Node<'_>, profile: &LanguageProfile) -> Result<Option<String>> {
    if profile.language == Language::C {
        let inner = node
            .child_by_field_name("declarator")
            .and_then(|d| d.child_by_field_name("declarator"));
        return match inner {
            Some(n) => Ok(Some(node_text(code, n)?.to_string())),
            None => Ok(None),
        };
    }

    match node.child_by_field_name("name") {
        Some(n) => Ok(Some(node_text(code, n)?.to_string())),
        None => Ok(None),
    }
}

/// Whether a node is a constructor by the language's naming convention
pub(crate) fn is_constructor(code: &str, node: Node<'_>, profile: &LanguageProfile) -> Result<bool> {
    let Some(ctor) = profile.constructor_name else {
        return Ok(false);
    };
    if !profile.function_types.contains(&node.kind()) {
        return Ok(false);
    }
    Ok(function_name(code, node, profile)?.as_deref() == Some(ctor))
}

/// Whether a constructor has no sibling methods in its class body
pub(crate) fn is_only_function_in_class(node: Node<'_>, profile: &LanguageProfile) -> bool {
    let mut ancestor = node.parent();
    while let Some(n) = ancestor {
        if profile.class_types.contains(&n.kind()) {
            break;
        }
        ancestor = n.parent();
    }

    let Some(class_node) = ancestor else {
        return false;
    };
    let Some(body) = class_node.child_by_field_name("body") else {
        return false;
    };

    !children(body).any(|c| profile.function_types.contains(&c.kind()) && c.id() != node.id())
}

fn is_collectable_function(code: &str, node: Node<'_>, profile: &LanguageProfile) -> Result<bool> {
    if profile.language == Language::C {
        return Ok(true);
    }
    match function_name(code, node, profile)? {
        Some(name) => Ok(Some(name.as_str()) != profile.constructor_name),
        None => Ok(false),
    }
}

/// Collect extractable function nodes in document order.
///
/// Traversal never descends into a function node, so nested functions stay
/// inside their parent's chunk. Constructors are folded into class context
/// instead, except when the constructor is the only function in its class.
pub fn collect_functions<'t>(
    code: &str,
    tree: &'t Tree,
    profile: &LanguageProfile,
) -> Result<Vec<Node<'t>>> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root_node()];

    while let Some(node) = stack.pop() {
        if profile.function_types.contains(&node.kind()) {
            if is_collectable_function(code, node, profile)? {
                out.push(node);
            } else if is_constructor(code, node, profile)?
                && is_only_function_in_class(node, profile)
            {
                out.push(node);
            }
            continue;
        }

        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    Ok(out)
}

fn has_methods(class_node: Node<'_>, profile: &LanguageProfile) -> bool {
    children(class_node).any(|child| {
        profile.function_types.contains(&child.kind())
            || children(child).any(|grand| profile.function_types.contains(&grand.kind()))
    })
}

/// Collect class nodes with no methods at all (fields-only classes).
///
/// These get whole-class chunks; classes with methods are covered through
/// their methods' context instead.
pub fn collect_classes_without_methods<'t>(
    tree: &'t Tree,
    profile: &LanguageProfile,
) -> Vec<Node<'t>> {
    let mut out = Vec::new();
    let mut stack = vec![tree.root_node()];

    while let Some(node) = stack.pop() {
        if profile.class_types.contains(&node.kind()) {
            if !has_methods(node, profile) {
                out.push(node);
            }
            continue;
        }
        if profile.function_types.contains(&node.kind()) {
            continue;
        }

        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }

    out
}

/// Build the name -> import/definition map for a source file.
///
/// Keys are the identifiers a use site would reference; values are the
/// statement nodes whose text gets inlined into chunks that use them.
pub fn collect_imports<'t>(
    code: &str,
    tree: &'t Tree,
    profile: &LanguageProfile,
) -> Result<BTreeMap<String, Node<'t>>> {
    match profile.language {
        Language::Python => python_imports(code, tree, profile),
        Language::TypeScript | Language::JavaScript => ts_imports(code, tree, profile),
        Language::Java => java_imports(code, tree),
        Language::C => c_imports(code, tree),
        _ => Ok(BTreeMap::new()),
    }
}

/// Run the profile's import query and return captured statement nodes.
///
/// The tree-sitter binding does not evaluate `#eq?` predicates, so the
/// `@require` capture is checked by hand. A query that fails to compile is
/// logged and treated as "no imports".
fn query_import_nodes<'t>(code: &str, tree: &'t Tree, profile: &LanguageProfile) -> Vec<Node<'t>> {
    let Some(source) = profile.import_query else {
        return Vec::new();
    };
    let Some(grammar) = profile.language.grammar() else {
        return Vec::new();
    };

    let query = match Query::new(&grammar, source) {
        Ok(query) => query,
        Err(err) => {
            log::warn!(
                "import query failed to compile for {}: {err}",
                profile.language.as_str()
            );
            return Vec::new();
        }
    };
    let Some(import_idx) = query.capture_index_for_name("import") else {
        return Vec::new();
    };
    let require_idx = query.capture_index_for_name("require");

    let mut nodes = Vec::new();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(&query, tree.root_node(), code.as_bytes());
    while let Some(m) = matches.next() {
        let mut statement = None;
        let mut keep = true;
        for capture in m.captures {
            if capture.index == import_idx {
                statement = Some(capture.node);
            } else if Some(capture.index) == require_idx {
                keep = capture
                    .node
                    .utf8_text(code.as_bytes())
                    .map(|text| text == "require")
                    .unwrap_or(false);
            }
        }
        if keep {
            if let Some(node) = statement {
                nodes.push(node);
            }
        }
    }

    nodes.sort_by_key(Node::start_byte);
    nodes.dedup_by_key(|n| n.id());
    nodes
}

fn python_imports<'t>(
    code: &str,
    tree: &'t Tree,
    profile: &LanguageProfile,
) -> Result<BTreeMap<String, Node<'t>>> {
    let mut imports = BTreeMap::new();

    for node in query_import_nodes(code, tree, profile) {
        for child in named_children(node) {
            match child.kind() {
                "dotted_name" => {
                    imports.insert(node_text(code, child)?.to_string(), node);
                }
                "aliased_import" => {
                    // `import x as y`: both names resolve to the statement
                    if let Some(name) = child.child_by_field_name("name") {
                        imports.insert(node_text(code, name)?.to_string(), node);
                    }
                    if let Some(alias) = child.child_by_field_name("alias") {
                        imports.insert(node_text(code, alias)?.to_string(), node);
                    }
                }
                _ => {}
            }
        }
    }

    Ok(imports)
}

fn ts_imports<'t>(
    code: &str,
    tree: &'t Tree,
    profile: &LanguageProfile,
) -> Result<BTreeMap<String, Node<'t>>> {
    let mut imports = BTreeMap::new();

    for node in query_import_nodes(code, tree, profile) {
        let mut names: Vec<String> = Vec::new();

        for child in children(node) {
            match child.kind() {
                "import_clause" => {
                    for sub in children(child) {
                        match sub.kind() {
                            "identifier" => {
                                names.push(node_text(code, sub)?.to_string());
                            }
                            "named_imports" => {
                                for spec in children(sub) {
                                    if spec.kind() != "import_specifier" {
                                        continue;
                                    }
                                    let bound = spec
                                        .child_by_field_name("alias")
                                        .or_else(|| spec.child_by_field_name("name"));
                                    if let Some(name) = bound {
                                        names.push(node_text(code, name)?.to_string());
                                    }
                                }
                            }
                            "namespace_import" => {
                                for ns in children(sub) {
                                    if ns.kind() == "identifier" {
                                        names.push(node_text(code, ns)?.to_string());
                                    }
                                }
                            }
                            _ => {}
                        }
                    }
                }
                "variable_declarator" => {
                    // require() and dynamic-import bindings
                    if let Some(name) = child.child_by_field_name("name") {
                        names.push(node_text(code, name)?.to_string());
                    }
                }
                _ => {}
            }
        }

        for name in names {
            imports.insert(name, node);
        }
    }

    Ok(imports)
}

fn java_imports<'t>(code: &str, tree: &'t Tree) -> Result<BTreeMap<String, Node<'t>>> {
    let mut imports = BTreeMap::new();

    for child in children(tree.root_node()) {
        if child.kind() != "import_declaration" {
            continue;
        }

        let wildcard = children(child).any(|c| c.kind() == "asterisk");
        if wildcard {
            // keyed by full statement text; wildcard imports are always inlined
            imports.insert(node_text(code, child)?.to_string(), child);
            continue;
        }

        let target = children(child).find(|c| matches!(c.kind(), "scoped_identifier" | "identifier"));
        if let Some(target) = target {
            let last = target.child_by_field_name("name").unwrap_or(target);
            imports.insert(node_text(code, last)?.to_string(), child);
        }
    }

    Ok(imports)
}

fn clean_c_name(raw: &str) -> &str {
    let cut = raw.find(|c| c == '[' || c == '(').map_or(raw, |i| &raw[..i]);
    cut.trim()
}

/// Top-level C definitions that behave like imports: structs, macro
/// functions, typedefs and global declarations. Object-like `#define`s are
/// handled as module variables instead.
fn c_imports<'t>(code: &str, tree: &'t Tree) -> Result<BTreeMap<String, Node<'t>>> {
    let mut defs = BTreeMap::new();
    let mut stack: Vec<Node<'t>> = children(tree.root_node()).collect();

    while let Some(node) = stack.pop() {
        let name_node = match node.kind() {
            "struct_specifier" | "enum_specifier" | "preproc_function_def" => {
                node.child_by_field_name("name")
            }
            "declaration" => node.child_by_field_name("declarator").map(|d| {
                d.child_by_field_name("declarator").unwrap_or(d)
            }),
            "type_definition" => node.child_by_field_name("declarator"),
            _ => None,
        };

        if let Some(name_node) = name_node {
            let clean = clean_c_name(node_text(code, name_node)?).to_string();
            if !clean.is_empty() {
                defs.insert(clean, node);
            }
        }

        if node.kind() != "compound_statement" {
            for child in children(node) {
                stack.push(child);
            }
        }
    }

    Ok(defs)
}

/// Module-level variable definitions: Python assignments and C object
/// macros. Other languages have no equivalent concept.
pub fn collect_module_variables<'t>(
    code: &str,
    tree: &'t Tree,
    profile: &LanguageProfile,
) -> Result<BTreeMap<String, Node<'t>>> {
    if !profile.has_module_variables {
        return Ok(BTreeMap::new());
    }

    let mut variables = BTreeMap::new();

    for child in children(tree.root_node()) {
        match profile.language {
            Language::Python => {
                if !profile.expression_types.contains(&child.kind()) {
                    continue;
                }
                let Some(expr) = child.named_child(0) else {
                    continue;
                };
                if expr.kind() != "assignment" {
                    continue;
                }
                let Some(left) = expr.child_by_field_name("left") else {
                    continue;
                };
                if profile.identifier_types.contains(&left.kind()) {
                    variables.insert(node_text(code, left)?.to_string(), child);
                }
            }
            Language::C => {
                if child.kind() != "preproc_def" {
                    continue;
                }
                if let Some(name) = children(child).find(|c| c.kind() == "identifier") {
                    variables.insert(node_text(code, name)?.to_string(), child);
                }
            }
            _ => {}
        }
    }

    Ok(variables)
}
