//! Tool availability probe
//!
//! Checked before every external invocation so that a missing program turns
//! into a clear advisory instead of an opaque spawn failure.

use tracing::debug;

/// Answers whether an executable can be located
pub trait ToolProbe: Send + Sync {
    /// `true` if `tool` resolves to an executable; absence is never an error
    fn is_available(&self, tool: &str) -> bool;
}

/// Resolves tools through `PATH`, or directly when given a path
#[derive(Debug, Clone, Copy, Default)]
pub struct PathProbe;

impl ToolProbe for PathProbe {
    fn is_available(&self, tool: &str) -> bool {
        let found = which::which(tool);
        debug!(tool, found = ?found.as_ref().ok(), "probed tool");
        found.is_ok()
    }
}

impl<P: ToolProbe + ?Sized> ToolProbe for &P {
    fn is_available(&self, tool: &str) -> bool {
        (**self).is_available(tool)
    }
}

impl<P: ToolProbe + ?Sized> ToolProbe for std::sync::Arc<P> {
    fn is_available(&self, tool: &str) -> bool {
        (**self).is_available(tool)
    }
}
