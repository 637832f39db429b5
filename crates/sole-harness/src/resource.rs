//! Harness payload

use serde::{Deserialize, Serialize};
use sole_cell::{ConstructionResult, Latency};

/// Expensive shared resource; holds only a label
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resource {
    label: String,
}

impl Resource {
    /// Create resource with label
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    /// Label given at construction
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Log the label from the calling thread
    pub fn announce(&self) {
        let thread = std::thread::current();
        tracing::info!(
            thread = thread.name().unwrap_or("unnamed"),
            label = %self.label,
            "using resource"
        );
    }
}

/// Factory that waits out `latency` before building a [`Resource`]
///
/// The delay is only paid by the constructing call.
pub fn resource_factory(
    label: impl Into<String>,
    latency: Latency,
) -> impl Fn() -> ConstructionResult<Resource> + Send + Sync + 'static {
    let label = label.into();
    move || {
        latency.wait()?;
        Ok(Resource::new(label.clone()))
    }
}
