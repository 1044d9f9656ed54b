use serde::{Deserialize, Serialize};

use crate::error::{ChunkerError, Result};

/// Configuration for chunk sizing behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkerConfig {
    /// Maximum chunk size in tokens (hard limit before splitting)
    pub max_tokens: usize,

    /// Minimum chunk size in tokens (undersized pieces are merged or dropped)
    pub min_chunk_size: usize,

    /// When splitting non-function chunks line-wise, discard blocks whose
    /// token count falls below `min_chunk_size`. Set to `false` to keep
    /// every block.
    pub drop_undersized_blocks: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_tokens: 5000,
            min_chunk_size: 300,
            drop_undersized_blocks: true,
        }
    }
}

impl ChunkerConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_tokens == 0 {
            return Err(ChunkerError::invalid_config("max_tokens must be > 0"));
        }

        if self.min_chunk_size > self.max_tokens {
            return Err(ChunkerError::invalid_config(format!(
                "min_chunk_size ({}) cannot exceed max_tokens ({})",
                self.min_chunk_size, self.max_tokens
            )));
        }

        Ok(())
    }
}
