//! UI context for detecting colored vs plain environments

use std::io::IsTerminal;

/// UI context that determines output styling
#[derive(Debug, Clone, Copy)]
pub struct UiContext {
    color: bool,
}

impl UiContext {
    /// Detect the current environment
    pub fn detect() -> Self {
        Self {
            color: std::io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    /// Plain output (for testing or captured logs)
    pub fn plain() -> Self {
        Self { color: false }
    }

    /// Whether headings are styled
    pub fn use_color(&self) -> bool {
        self.color
    }
}

impl Default for UiContext {
    fn default() -> Self {
        Self::detect()
    }
}
