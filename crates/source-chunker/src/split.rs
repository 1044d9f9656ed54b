//! Token-budget enforcement: splitting oversized chunks.
//!
//! Function chunks split with the signature line repeated at the top of each
//! piece so every piece stays attributable to its function. Everything else
//! splits on plain line boundaries.

use crate::config::ChunkerConfig;
use crate::error::Result;
use crate::language::LanguageProfile;
use crate::tokenizer::TokenCounter;
use crate::types::{content_hash, CodeChunk};

/// Splits chunks that exceed the configured token budget
pub struct SizeProcessor<'a> {
    config: &'a ChunkerConfig,
    split_prefix: &'static str,
    split_suffix: &'static str,
}

impl<'a> SizeProcessor<'a> {
    pub fn new(config: &'a ChunkerConfig, profile: Option<&'static LanguageProfile>) -> Self {
        let (split_prefix, split_suffix) = match profile {
            Some(p) => (p.split_prefix, p.split_suffix),
            None => ("", ""),
        };
        Self {
            config,
            split_prefix,
            split_suffix,
        }
    }

    /// Pass chunks through, splitting any whose token count exceeds the
    /// budget. Chunks within budget are emitted unchanged.
    pub fn process(
        &self,
        chunks: Vec<CodeChunk>,
        tokenizer: &dyn TokenCounter,
    ) -> Result<Vec<CodeChunk>> {
        let mut out = Vec::with_capacity(chunks.len());
        for chunk in chunks {
            if tokenizer.count_tokens(&chunk.text)? <= self.config.max_tokens {
                out.push(chunk);
            } else if chunk.meta.kind.splits_as_function() {
                out.extend(self.split_function(chunk, tokenizer)?);
            } else {
                out.extend(self.split_lines(chunk, tokenizer)?);
            }
        }
        Ok(out)
    }

    fn part(&self, original: &CodeChunk, text: String, number: usize, total: usize) -> CodeChunk {
        let mut meta = original.meta.clone();
        if total > 1 {
            meta.part_name = meta
                .part_name
                .as_ref()
                .map(|name| format!("{name}_part_{number}"));
        }
        meta.content_hash = content_hash(&text);
        CodeChunk::new(text, meta)
    }

    /// Split a function chunk, repeating the signature line per piece.
    ///
    /// The signature is the first non-blank line; a lone closing brace at the
    /// end is dropped since each piece re-closes itself with the suffix.
    /// An undersized final piece merges back into its predecessor.
    fn split_function(
        &self,
        chunk: CodeChunk,
        tokenizer: &dyn TokenCounter,
    ) -> Result<Vec<CodeChunk>> {
        let lines: Vec<&str> = chunk.text.split('\n').collect();

        let Some(signature_idx) = lines.iter().position(|line| !line.trim().is_empty()) else {
            return Ok(vec![chunk]);
        };
        let signature = lines[signature_idx];
        let header = format!("{signature}{}", self.split_prefix);

        let mut body: &[&str] = &lines[signature_idx + 1..];
        if body.last().is_some_and(|line| line.trim() == "}") {
            body = &body[..body.len() - 1];
        }
        if body.is_empty() {
            return Ok(vec![chunk]);
        }

        let mut pieces: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;

        for line in body {
            let line_tokens = tokenizer.count_tokens(line)?;
            if current_tokens + line_tokens > self.config.max_tokens && !current.is_empty() {
                pieces.push(self.join_piece(&header, &current));
                current.clear();
                current_tokens = 0;
            }
            current.push(line);
            current_tokens += line_tokens;
        }
        if !current.is_empty() {
            pieces.push(self.join_piece(&header, &current));
        }

        if pieces.len() > 1 {
            let last = pieces[pieces.len() - 1].clone();
            if tokenizer.count_tokens(&last)? < self.config.min_chunk_size {
                pieces.pop();
                let mut tail = last.as_str();
                tail = tail.strip_prefix(header.as_str()).unwrap_or(tail);
                tail = tail.strip_suffix(self.split_suffix).unwrap_or(tail);
                if let Some(prev) = pieces.last_mut() {
                    let kept = prev
                        .strip_suffix(self.split_suffix)
                        .unwrap_or(prev)
                        .to_string();
                    *prev = format!("{kept}{tail}{}", self.split_suffix);
                }
            }
        }

        let total = pieces.len();
        Ok(pieces
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .enumerate()
            .map(|(i, text)| self.part(&chunk, text, i + 1, total))
            .collect())
    }

    fn join_piece(&self, header: &str, lines: &[&str]) -> String {
        format!("{header}\n{}{}", lines.join("\n"), self.split_suffix)
    }

    /// Split a non-function chunk on line boundaries.
    ///
    /// Blocks below the minimum size are discarded unless the configuration
    /// keeps them.
    fn split_lines(
        &self,
        chunk: CodeChunk,
        tokenizer: &dyn TokenCounter,
    ) -> Result<Vec<CodeChunk>> {
        let mut blocks: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut current_tokens = 0;

        for line in chunk.text.split('\n') {
            let line_tokens = tokenizer.count_tokens(line)?;
            if current_tokens + line_tokens > self.config.max_tokens && !current.is_empty() {
                blocks.push(current.join("\n"));
                current.clear();
                current_tokens = 0;
            }
            current.push(line);
            current_tokens += line_tokens;
        }
        if !current.is_empty() {
            blocks.push(current.join("\n"));
        }

        let mut out = Vec::new();
        let mut number = 1;
        for block in blocks {
            let undersized = tokenizer.count_tokens(&block)? < self.config.min_chunk_size;
            if undersized && self.config.drop_undersized_blocks {
                continue;
            }

            let mut meta = chunk.meta.clone();
            meta.part_name = meta
                .part_name
                .as_ref()
                .map(|name| format!("{name}_part_{number}"));
            meta.content_hash = content_hash(&block);
            out.push(CodeChunk::new(block, meta));
            number += 1;
        }
        Ok(out)
    }
}
