//! Notice delivery through `tracing`.

use qkart_core::{Notice, NoticeSink, Severity};

/// Sink that logs each notice at a level matching its severity.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl NoticeSink for TracingSink {
    fn notify(&self, notice: Notice) {
        match notice.severity {
            Severity::Success => tracing::info!(severity = %notice.severity, "{}", notice.message),
            Severity::Warning => tracing::warn!(severity = %notice.severity, "{}", notice.message),
            Severity::Error => tracing::error!(severity = %notice.severity, "{}", notice.message),
        }
    }
}
