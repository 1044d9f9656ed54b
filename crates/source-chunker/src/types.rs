use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Semantic kind of an emitted chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChunkKind {
    /// Standalone or class-embedded function (with reconstructed context)
    Function,
    /// Method inside a class. The assembler currently emits [`Function`]
    /// for methods too; this variant is reserved for callers that tag
    /// their own chunks and splits identically to a function.
    ///
    /// [`Function`]: ChunkKind::Function
    Method,
    /// Whole class without extractable methods
    Class,
    /// Leftover top-level code not covered by any extraction
    Preamble,
    /// Verbatim fallback for languages without a profile
    CodeBlock,
}

impl ChunkKind {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Method => "method",
            Self::Class => "class",
            Self::Preamble => "preamble",
            Self::CodeBlock => "code_block",
        }
    }

    /// Whether the size processor uses the signature-repeating split strategy
    #[must_use]
    pub const fn splits_as_function(self) -> bool {
        matches!(self, Self::Function | Self::Method)
    }
}

/// Metadata attached to a [`CodeChunk`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMeta {
    /// Chunk kind
    pub kind: ChunkKind,

    /// Function or class name; suffixed `_part_{n}` when a chunk was split
    pub part_name: Option<String>,

    /// Docstring extracted from the unit, kept out of the chunk body
    pub docstring: Option<String>,

    /// Hash over the assembled chunk text
    pub content_hash: u64,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Line at which the declaration/signature region ends; set for
    /// function and method chunks
    pub end_line_signature: Option<usize>,

    /// Opaque back-reference to the source document, carried untouched
    pub origin: Option<String>,
}

/// One emitted unit of source text plus metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    /// Assembled chunk text
    pub text: String,

    /// Chunk metadata
    pub meta: ChunkMeta,
}

impl CodeChunk {
    /// Create a new chunk
    #[must_use]
    pub const fn new(text: String, meta: ChunkMeta) -> Self {
        Self { text, meta }
    }

    /// Number of lines spanned in the original source
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.meta.end_line.saturating_sub(self.meta.start_line) + 1
    }
}

/// Hash chunk text into a stable 64-bit identifier.
///
/// The value is the big-endian prefix of the SHA-256 digest; it identifies
/// chunk content for deduplication but is not meant for bit-for-bit
/// compatibility with any external system.
#[must_use]
pub fn content_hash(text: &str) -> u64 {
    let digest = Sha256::digest(text.as_bytes());
    let mut prefix = [0u8; 8];
    prefix.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(prefix)
}
