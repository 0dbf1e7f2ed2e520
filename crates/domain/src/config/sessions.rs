use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Sessions
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionsConfig {
    /// Maximum number of conversations kept in the process-local cache.
    /// The least recently used entry is evicted beyond this.
    #[serde(default = "d_1024")]
    pub cache_capacity: usize,
    /// Inline replacement for the built-in system instructions.
    #[serde(default)]
    pub system_prompt: Option<String>,
    /// File holding the system instructions. Ignored when `system_prompt` is set.
    #[serde(default)]
    pub system_prompt_path: Option<PathBuf>,
}

impl Default for SessionsConfig {
    fn default() -> Self {
        Self {
            cache_capacity: d_1024(),
            system_prompt: None,
            system_prompt_path: None,
        }
    }
}

fn d_1024() -> usize {
    1024
}
