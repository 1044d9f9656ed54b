//! # Source Chunker
//!
//! AST-aware partitioning of source files into self-contained chunks for
//! semantic search and AI context windows.
//!
//! ## Philosophy
//!
//! Cutting code on line counts destroys meaning. The chunker cuts on
//! syntactic boundaries instead, and makes every chunk stand on its own:
//! - Functions and methods become chunks, with the imports and module
//!   variables they reference inlined at the top
//! - Methods carry a reconstructed class wrapper (header, fields,
//!   constructor) so the receiver type is visible
//! - Classes without methods are emitted whole; leftover top-level code is
//!   swept into a single preamble chunk
//! - Every byte of the input is accounted for by the range tracker: consumed
//!   by a chunk, or swept into the preamble (docstrings move to metadata,
//!   and license headers are dropped on purpose)
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Tree-sitter Parsing → AST
//!     │
//!     ├──> Symbol Collection
//!     │    ├─> functions and methods
//!     │    ├─> method-free classes
//!     │    └─> import / module-variable maps
//!     │
//!     ├──> Chunk Assembly
//!     │    ├─> usage resolution (which imports, which variables)
//!     │    ├─> class context reconstruction
//!     │    └─> byte-range accounting → preamble from the gaps
//!     │
//!     └──> Size Enforcement
//!          ├─> signature-repeating function splits
//!          └─> line-wise splits for everything else
//! ```
//!
//! Python, TypeScript, JavaScript, Java and C are chunked structurally;
//! other languages fall back to a single verbatim code-block chunk.
//!
//! ## Example
//!
//! ```rust
//! use source_chunker::{Chunker, ChunkerConfig, HeuristicTokenizer, Language};
//!
//! let chunker = Chunker::new(ChunkerConfig::default())?;
//!
//! let code = r#"
//! import os
//!
//! def cwd():
//!     return os.getcwd()
//! "#;
//!
//! let chunks = chunker.chunk(code, Language::Python, &HeuristicTokenizer)?;
//! for chunk in &chunks {
//!     println!(
//!         "{} lines {}-{}",
//!         chunk.meta.kind.as_str(),
//!         chunk.meta.start_line,
//!         chunk.meta.end_line,
//!     );
//! }
//! # assert!(!chunks.is_empty());
//! # Ok::<(), source_chunker::ChunkerError>(())
//! ```

mod assemble;
mod chunker;
mod config;
mod context;
mod error;
mod extract;
mod language;
mod ranges;
mod split;
mod tokenizer;
mod types;

pub use chunker::Chunker;
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
pub use language::{DocstringRule, Language, LanguageProfile};
pub use ranges::{ByteRange, RangeTracker};
pub use tokenizer::{HeuristicTokenizer, TokenCounter};
pub use types::{content_hash, ChunkKind, ChunkMeta, CodeChunk};
