//! Product configuration trait for CLI binaries
//!
//! This trait defines the interface that a CLI binary implements to brand
//! the creation flow and to point it at its preset registry.

/// Configuration trait for CLI products built on presto-core
///
/// Each product defines:
/// - Product identity (name, display name)
/// - Where named presets are looked up
/// - Defaults shown in metadata prompts
pub trait ProductConfig: Clone + Send + Sync + 'static {
    /// Internal product name (used for CLI command, env vars)
    fn name(&self) -> &'static str;

    /// Human-readable display name
    fn display_name(&self) -> &'static str;

    /// CLI description shown in help text
    fn cli_description(&self) -> &'static str;

    /// Environment variable naming a YAML preset registry file
    fn preset_registry_env(&self) -> &'static str;

    /// Source used for the `default` preset when the registry has none.
    /// `None` falls back to the built-in preset.
    fn default_preset_source(&self) -> Option<&'static str> {
        None
    }

    /// Default project description offered in the metadata prompt
    fn default_description(&self) -> String {
        format!("project created by {}", self.name())
    }

    /// User agent string for HTTP requests
    fn user_agent(&self) -> &'static str {
        self.name()
    }
}
