use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tools
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// When false the model is offered no tools and every reply is final.
    #[serde(default = "d_true")]
    pub enabled: bool,
    /// TOML file replacing the built-in menu and house info.
    #[serde(default)]
    pub menu_path: Option<PathBuf>,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            menu_path: None,
        }
    }
}

fn d_true() -> bool {
    true
}
