#![forbid(unsafe_code)]

//! Construction-time node configuration.

/// Options applied when a node is created.
///
/// ```
/// use bindery_core::NodeOptions;
///
/// let opts = NodeOptions::new().label("volume").disabled(true);
/// assert_eq!(opts.label.as_deref(), Some("volume"));
/// assert!(opts.disabled);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NodeOptions {
    /// Human-readable name, shown in `Debug` output and log fields.
    pub label: Option<String>,
    /// Initial disabled flag.
    pub disabled: bool,
}

impl NodeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the label.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set the initial disabled flag.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}
