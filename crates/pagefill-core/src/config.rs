//! Paging configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Options recognized by the pager.
///
/// Defaults match the numbers the engine was first tuned with: pages of
/// 30 items, an initial load of one page, prefetch one item from either
/// end, no placeholders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PagingConfig {
    /// Items per Append.
    pub page_size: usize,
    /// How close to the loaded edge an accessed position must be to trigger a load.
    pub prefetch_distance: usize,
    /// Items written by Refresh. Must be at least `page_size`.
    pub initial_load_size: usize,
    /// Pad snapshot windows with placeholder rows for unresolved slots.
    pub placeholders_enabled: bool,
}

impl Default for PagingConfig {
    fn default() -> Self {
        Self {
            page_size: 30,
            prefetch_distance: 1,
            initial_load_size: 30,
            placeholders_enabled: false,
        }
    }
}

impl PagingConfig {
    /// A config with the given page size and an initial load of one page.
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size,
            initial_load_size: page_size,
            ..Self::default()
        }
    }

    pub fn prefetch_distance(mut self, distance: usize) -> Self {
        self.prefetch_distance = distance;
        self
    }

    pub fn initial_load_size(mut self, size: usize) -> Self {
        self.initial_load_size = size;
        self
    }

    pub fn placeholders(mut self, enabled: bool) -> Self {
        self.placeholders_enabled = enabled;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.initial_load_size < self.page_size {
            return Err(ConfigError::InitialLoadTooSmall {
                initial_load_size: self.initial_load_size,
                page_size: self.page_size,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = PagingConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.page_size, 30);
        assert_eq!(config.initial_load_size, 30);
        assert_eq!(config.prefetch_distance, 1);
        assert!(!config.placeholders_enabled);
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = PagingConfig::with_page_size(0);
        assert_eq!(config.validate(), Err(ConfigError::ZeroPageSize));
    }

    #[test]
    fn test_initial_load_smaller_than_page_rejected() {
        let config = PagingConfig::with_page_size(20).initial_load_size(10);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InitialLoadTooSmall { .. })
        ));
    }

    #[test]
    fn test_deserialize_partial_json_uses_defaults() {
        let config: PagingConfig =
            serde_json::from_str(r#"{"page_size": 50, "initial_load_size": 150}"#).unwrap();
        assert_eq!(config.page_size, 50);
        assert_eq!(config.initial_load_size, 150);
        assert_eq!(config.prefetch_distance, 1);
        assert!(config.validate().is_ok());
    }
}
