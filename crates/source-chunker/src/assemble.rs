//! Assembly of extracted units into self-contained chunks.

use std::collections::BTreeMap;

use tree_sitter::{Node, Tree};

use crate::context::{
    additional_context, docstring, file_prefix, function_text, imports_text, node_with_comments,
    ranges_with_comments, used_import_names, used_variable_names,
};
use crate::error::Result;
use crate::extract::{children, function_name, padded_text};
use crate::language::LanguageProfile;
use crate::ranges::{ByteRange, RangeTracker};
use crate::types::{content_hash, ChunkKind, ChunkMeta, CodeChunk};

/// 1-indexed line numbers for a byte span of the source
pub(crate) fn line_numbers(code: &str, start_byte: usize, end_byte: usize) -> (usize, usize) {
    let start_line = code[..start_byte.min(code.len())].matches('\n').count() + 1;
    if end_byte == 0 || end_byte > code.len() {
        return (start_line, start_line);
    }

    // a span ending just past a newline does not reach the next line
    let mut end_line = code[..end_byte].matches('\n').count() + 1;
    if code.as_bytes()[end_byte - 1] == b'\n' {
        end_line -= 1;
    }
    (start_line, end_line)
}

/// Builds chunks for one source file.
///
/// Holds the resolved import and module-variable maps plus the file prefix so
/// each emitted chunk can be made self-contained.
pub struct ChunkAssembler<'a, 't> {
    code: &'a str,
    profile: &'static LanguageProfile,
    imports: &'a BTreeMap<String, Node<'t>>,
    module_variables: &'a BTreeMap<String, Node<'t>>,
    prefix: String,
    prefix_ranges: Vec<ByteRange>,
    origin: Option<String>,
}

impl<'a, 't> ChunkAssembler<'a, 't> {
    pub fn new(
        code: &'a str,
        tree: &Tree,
        profile: &'static LanguageProfile,
        imports: &'a BTreeMap<String, Node<'t>>,
        module_variables: &'a BTreeMap<String, Node<'t>>,
        origin: Option<String>,
    ) -> Result<Self> {
        let (prefix, prefix_ranges) = file_prefix(code, tree, profile)?;
        Ok(Self {
            code,
            profile,
            imports,
            module_variables,
            prefix,
            prefix_ranges,
            origin,
        })
    }

    fn meta(
        &self,
        kind: ChunkKind,
        part_name: Option<String>,
        doc: Option<String>,
        text: &str,
        start_line: usize,
        end_line: usize,
        end_line_signature: Option<usize>,
    ) -> ChunkMeta {
        ChunkMeta {
            kind,
            part_name,
            docstring: doc,
            content_hash: content_hash(text),
            start_line,
            end_line,
            end_line_signature,
            origin: self.origin.clone(),
        }
    }

    /// 1-indexed line on which a function's signature region ends
    fn signature_end_line(&self, node: Node<'t>) -> usize {
        let body = node
            .child_by_field_name("body")
            .or_else(|| children(node).find(|c| c.kind() == self.profile.function_body_type));

        match body {
            Some(body) => {
                let body_row = body.start_position().row;
                if body_row > node.start_position().row {
                    body_row
                } else {
                    body_row + 1
                }
            }
            None => node.end_position().row + 1,
        }
    }

    /// Assemble a function chunk plus the byte ranges it consumed
    pub fn function_chunk(&self, node: Node<'t>) -> Result<(CodeChunk, Vec<ByteRange>)> {
        let doc = docstring(self.code, node, self.profile)?;
        let (_, context) = additional_context(self.code, node, self.profile)?;

        let module_variables = (!self.module_variables.is_empty()).then_some(self.module_variables);
        let used = used_import_names(
            self.code,
            node,
            self.profile,
            self.imports,
            &context,
            module_variables,
        )?;
        let imports = imports_text(self.code, self.profile, self.imports, &used)?;

        let mut used_ranges = vec![(node.start_byte(), node.end_byte())];
        for name in &used {
            if let Some(import_node) = self.imports.get(name) {
                used_ranges.extend(ranges_with_comments(*import_node, self.profile));
            }
        }
        if !self.prefix.is_empty() {
            used_ranges.extend(self.prefix_ranges.iter().copied());
        }
        if !context.is_empty() {
            let mut current = node;
            while let Some(parent) = current.parent() {
                if self.profile.class_types.contains(&parent.kind()) {
                    used_ranges.push((parent.start_byte(), parent.end_byte()));
                    break;
                }
                current = parent;
            }
        }

        let mut variable_definitions = String::new();
        if !self.module_variables.is_empty() {
            for var_name in used_variable_names(self.code, node, self.profile)? {
                if let Some(var_node) = self.module_variables.get(&var_name) {
                    used_ranges.extend(ranges_with_comments(*var_node, self.profile));
                    variable_definitions.push_str(&padded_text(self.code, *var_node)?);
                    variable_definitions.push('\n');
                }
            }
        }

        let body = function_text(self.code, node, self.profile)?;
        let body = match &doc {
            Some(doc) => body.replace(doc, ""),
            None => body,
        };

        let text = format!(
            "{}{}{}{}{}",
            self.prefix, imports, variable_definitions, context, body
        );

        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;
        let signature_end = self.signature_end_line(node);
        let name = function_name(self.code, node, self.profile)?;

        let meta = self.meta(
            ChunkKind::Function,
            name,
            doc,
            &text,
            start_line,
            end_line,
            Some(signature_end),
        );
        Ok((CodeChunk::new(text, meta), used_ranges))
    }

    /// Assemble a whole-class chunk for a class without methods
    pub fn class_chunk(&self, node: Node<'t>) -> Result<(CodeChunk, Vec<ByteRange>)> {
        let doc = docstring(self.code, node, self.profile)?;
        let class_text = node_with_comments(self.code, node, self.profile)?;

        let used = used_import_names(
            self.code,
            node,
            self.profile,
            self.imports,
            &class_text,
            None,
        )?;
        let imports = imports_text(self.code, self.profile, self.imports, &used)?;

        let mut used_ranges = ranges_with_comments(node, self.profile);
        for name in &used {
            if let Some(import_node) = self.imports.get(name) {
                used_ranges.extend(ranges_with_comments(*import_node, self.profile));
            }
        }
        if !self.prefix.is_empty() {
            used_ranges.extend(self.prefix_ranges.iter().copied());
        }

        let class_text = match &doc {
            Some(doc) => class_text.replace(doc, ""),
            None => class_text,
        };
        let text = format!("{}{}{}", self.prefix, imports, class_text);

        let start_line = node.start_position().row + 1;
        let end_line = node.end_position().row + 1;
        let name = function_name(self.code, node, self.profile)?;

        let meta = self.meta(
            ChunkKind::Class,
            name,
            doc,
            &text,
            start_line,
            end_line,
            Some(end_line),
        );
        Ok((CodeChunk::new(text, meta), used_ranges))
    }

    /// Collect all bytes not consumed by any chunk into one preamble chunk.
    ///
    /// Gaps are trimmed and joined; an all-whitespace remainder produces no
    /// chunk at all.
    pub fn preamble_chunk(&self, tracker: &RangeTracker) -> Result<Option<CodeChunk>> {
        let mut pieces = Vec::new();
        for (start, end) in tracker.gaps(self.code.len()) {
            let text = self.code.get(start..end).unwrap_or_default().trim();
            if !text.is_empty() {
                pieces.push((text, start, end));
            }
        }

        let Some(&(_, first_start, _)) = pieces.first() else {
            return Ok(None);
        };
        let (_, _, last_end) = pieces[pieces.len() - 1];

        let text = pieces
            .iter()
            .map(|(text, _, _)| *text)
            .collect::<Vec<_>>()
            .join("\n\n");
        let (start_line, end_line) = line_numbers(self.code, first_start, last_end);

        let meta = self.meta(ChunkKind::Preamble, None, None, &text, start_line, end_line, None);
        Ok(Some(CodeChunk::new(text, meta)))
    }
}
