//! Chunking engine facade.

use std::collections::BTreeMap;

use tree_sitter::Node;

use crate::assemble::ChunkAssembler;
use crate::config::ChunkerConfig;
use crate::context::used_variable_names;
use crate::error::Result;
use crate::extract::{
    self, children, is_constructor, is_only_function_in_class, padded_text,
};
use crate::language::{Language, LanguageProfile};
use crate::ranges::RangeTracker;
use crate::split::SizeProcessor;
use crate::tokenizer::TokenCounter;
use crate::types::{content_hash, ChunkKind, ChunkMeta, CodeChunk};

const COPYRIGHT_WORDS: [&str; 4] = [
    "copyright",
    "license",
    "licensed under",
    "all rights reserved",
];

/// Partitions source files into structure-aware chunks.
///
/// The engine parses the file, lifts functions and methods into
/// self-contained chunks (inlined imports, module variables and a
/// reconstructed class wrapper), emits method-free classes whole, sweeps the
/// leftovers into a preamble chunk and finally enforces the token budget.
///
/// Languages without a grammar fall back to a single verbatim code-block
/// chunk.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkerConfig,
}

impl Chunker {
    /// Create a chunker, validating the configuration
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    #[must_use]
    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk source text in the given language
    pub fn chunk(
        &self,
        code: &str,
        language: Language,
        tokenizer: &dyn TokenCounter,
    ) -> Result<Vec<CodeChunk>> {
        self.chunk_with_origin(code, language, tokenizer, None)
    }

    /// Chunk source text, stamping every chunk with an origin reference
    pub fn chunk_with_origin(
        &self,
        code: &str,
        language: Language,
        tokenizer: &dyn TokenCounter,
        origin: Option<&str>,
    ) -> Result<Vec<CodeChunk>> {
        if code.trim().is_empty() {
            return Ok(Vec::new());
        }

        let Some(profile) = language.profile() else {
            log::debug!(
                "no grammar for {}, emitting verbatim code block",
                language.as_str()
            );
            // the fallback is exempt from size enforcement: one chunk,
            // verbatim, however large the input
            return Ok(vec![fallback_chunk(code, origin)]);
        };

        let tree = extract::parse(code, language)?;
        let imports = extract::collect_imports(code, &tree, profile)?;
        let module_variables = extract::collect_module_variables(code, &tree, profile)?;
        let assembler = ChunkAssembler::new(
            code,
            &tree,
            profile,
            &imports,
            &module_variables,
            origin.map(str::to_string),
        )?;

        let mut tracker = RangeTracker::new();
        mark_copyright_comments(code, tree.root_node(), profile, &mut tracker)?;

        // staged by source position so output follows document order
        let mut staged: Vec<(usize, CodeChunk)> = Vec::new();

        for node in extract::collect_functions(code, &tree, profile)? {
            let (chunk, used) = assembler.function_chunk(node)?;
            tracker.extend(used);
            staged.push((node.start_byte(), chunk));
        }

        if !module_variables.is_empty() {
            track_constructor_variables(
                code,
                tree.root_node(),
                profile,
                &module_variables,
                &mut tracker,
            )?;
        }

        for node in extract::collect_classes_without_methods(&tree, profile) {
            let (chunk, used) = assembler.class_chunk(node)?;
            tracker.extend(used);
            staged.push((node.start_byte(), chunk));
        }

        staged.sort_by_key(|(start, _)| *start);
        let mut chunks: Vec<CodeChunk> = staged.into_iter().map(|(_, chunk)| chunk).collect();

        if let Some(preamble) = assembler.preamble_chunk(&tracker)? {
            chunks.push(preamble);
        }

        SizeProcessor::new(&self.config, Some(profile)).process(chunks, tokenizer)
    }
}

/// Single verbatim chunk for languages without a grammar
fn fallback_chunk(code: &str, origin: Option<&str>) -> CodeChunk {
    let meta = ChunkMeta {
        kind: ChunkKind::CodeBlock,
        part_name: None,
        docstring: None,
        content_hash: content_hash(code),
        start_line: 1,
        end_line: code.lines().count().max(1),
        end_line_signature: None,
        origin: origin.map(str::to_string),
    };
    CodeChunk::new(code.to_string(), meta)
}

/// Top-level license headers never belong to any chunk
fn mark_copyright_comments(
    code: &str,
    root: Node<'_>,
    profile: &LanguageProfile,
    tracker: &mut RangeTracker,
) -> Result<()> {
    for child in children(root) {
        if !profile.docs_types.contains(&child.kind()) {
            continue;
        }
        let text = padded_text(code, child)?.to_lowercase();
        if COPYRIGHT_WORDS.iter().any(|word| text.contains(word)) {
            tracker.mark(child.start_byte(), child.end_byte());
        }
    }
    Ok(())
}

/// Constructors folded into class context still consume the module variables
/// they reference, keeping those definitions out of the preamble.
fn track_constructor_variables(
    code: &str,
    root: Node<'_>,
    profile: &LanguageProfile,
    module_variables: &BTreeMap<String, Node<'_>>,
    tracker: &mut RangeTracker,
) -> Result<()> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if profile.function_types.contains(&node.kind())
            && is_constructor(code, node, profile)?
            && !is_only_function_in_class(node, profile)
        {
            for var_name in used_variable_names(code, node, profile)? {
                if let Some(var_node) = module_variables.get(&var_name) {
                    tracker.mark(var_node.start_byte(), var_node.end_byte());
                }
            }
        }
        for child in children(node) {
            stack.push(child);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::HeuristicTokenizer;
    use pretty_assertions::assert_eq;

    fn chunker() -> Chunker {
        Chunker::new(ChunkerConfig::default()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = ChunkerConfig {
            max_tokens: 0,
            ..Default::default()
        };
        assert!(Chunker::new(config).is_err());
    }

    #[test]
    fn blank_input_yields_no_chunks() {
        let chunks = chunker()
            .chunk("", Language::Python, &HeuristicTokenizer)
            .unwrap();
        assert!(chunks.is_empty());

        let chunks = chunker()
            .chunk("   \n\n  ", Language::Python, &HeuristicTokenizer)
            .unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn unsupported_language_falls_back_to_code_block() {
        let code = "fn main() {\n    println!(\"hi\");\n}\n";
        let chunks = chunker()
            .chunk(code, Language::Rust, &HeuristicTokenizer)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].meta.kind, ChunkKind::CodeBlock);
        assert_eq!(chunks[0].text, code);
        assert_eq!(chunks[0].meta.start_line, 1);
        assert_eq!(chunks[0].meta.end_line, 3);
    }

    #[test]
    fn oversized_fallback_stays_a_single_verbatim_chunk() {
        let line = "let value = compute_everything(alpha, beta, gamma, delta);\n";
        let code = line.repeat(500);
        let config = ChunkerConfig {
            max_tokens: 100,
            min_chunk_size: 50,
            ..Default::default()
        };
        let chunks = Chunker::new(config)
            .unwrap()
            .chunk(&code, Language::Rust, &HeuristicTokenizer)
            .unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].meta.kind, ChunkKind::CodeBlock);
        assert_eq!(chunks[0].text, code);
        assert_eq!(chunks[0].meta.end_line, 500);
    }

    #[test]
    fn copyright_header_is_dropped_from_preamble() {
        let code = concat!(
            "# Copyright 2024 Example Corp\n",
            "# Licensed under the Apache License\n",
            "\n",
            "import os\n",
            "\n",
            "def f():\n",
            "    return os.sep\n",
        );
        let chunks = chunker()
            .chunk(code, Language::Python, &HeuristicTokenizer)
            .unwrap();
        assert!(chunks
            .iter()
            .all(|c| !c.text.to_lowercase().contains("copyright")));
    }

    #[test]
    fn origin_is_stamped_on_every_chunk() {
        let code = "def f():\n    return 1\n\nprint(f())\n";
        let chunks = chunker()
            .chunk_with_origin(code, Language::Python, &HeuristicTokenizer, Some("doc-7"))
            .unwrap();
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.meta.origin.as_deref() == Some("doc-7")));
    }

    #[test]
    fn output_is_deterministic() {
        let code = concat!(
            "import os\nimport sys\n\n",
            "def a():\n    return os.getcwd()\n\n",
            "def b():\n    return sys.argv\n\n",
            "print(a())\n",
        );
        let first = chunker()
            .chunk(code, Language::Python, &HeuristicTokenizer)
            .unwrap();
        let second = chunker()
            .chunk(code, Language::Python, &HeuristicTokenizer)
            .unwrap();
        assert_eq!(first, second);
    }
}
