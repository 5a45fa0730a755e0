//! Platform options.
//!
//! Options can be built in code or loaded from a TOML document:
//!
//! ```
//! use horizon_lattice_win32::PlatformOptions;
//!
//! let options = PlatformOptions::from_toml_str(
//!     r#"
//!     default_window_width = 320
//!     has_border_in_fullscreen = true
//!     "#,
//! )
//! .unwrap();
//! assert_eq!(options.default_window_width, 320);
//! assert_eq!(options.default_window_height, 160);
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PlatformError, PlatformResult};

/// Configuration shared by every window of a platform integration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformOptions {
    /// Width used when a window requests no usable size.
    pub default_window_width: i32,
    /// Height used when a window requests no usable size.
    pub default_window_height: i32,
    /// Keep a one pixel border on fullscreen windows by default.
    pub has_border_in_fullscreen: bool,
    /// Forcefully take the foreground when a window asks for activation.
    pub always_activate_window: bool,
    /// Native window class used for created windows.
    pub window_class_name: String,
    /// Title given to titled top-levels that have none.
    pub application_name: String,
}

impl Default for PlatformOptions {
    fn default() -> Self {
        Self {
            default_window_width: 160,
            default_window_height: 160,
            has_border_in_fullscreen: false,
            always_activate_window: false,
            window_class_name: "HorizonLatticeWindow".to_string(),
            application_name: String::new(),
        }
    }
}

impl PlatformOptions {
    /// Parses options from TOML. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> PlatformResult<Self> {
        let options: PlatformOptions = toml::from_str(source)?;
        options.validated()
    }

    /// Reads and parses a TOML options file.
    pub fn from_file(path: impl AsRef<Path>) -> PlatformResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| PlatformError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    fn validated(self) -> PlatformResult<Self> {
        if self.default_window_width <= 0 || self.default_window_height <= 0 {
            return Err(PlatformError::Config(format!(
                "default window size must be positive, got {}x{}",
                self.default_window_width, self.default_window_height
            )));
        }
        if self.window_class_name.is_empty() {
            return Err(PlatformError::Config("window class name is empty".into()));
        }
        Ok(self)
    }

    pub fn with_default_window_size(mut self, width: i32, height: i32) -> Self {
        self.default_window_width = width;
        self.default_window_height = height;
        self
    }

    pub fn with_border_in_fullscreen(mut self, enabled: bool) -> Self {
        self.has_border_in_fullscreen = enabled;
        self
    }

    pub fn with_always_activate_window(mut self, enabled: bool) -> Self {
        self.always_activate_window = enabled;
        self
    }

    pub fn with_window_class_name(mut self, name: impl Into<String>) -> Self {
        self.window_class_name = name.into();
        self
    }

    pub fn with_application_name(mut self, name: impl Into<String>) -> Self {
        self.application_name = name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_used_for_missing_keys() {
        let options = PlatformOptions::from_toml_str("always_activate_window = true").unwrap();
        assert!(options.always_activate_window);
        assert_eq!(options.default_window_width, 160);
        assert_eq!(options.window_class_name, "HorizonLatticeWindow");
    }

    #[test]
    fn rejects_non_positive_default_size() {
        let err = PlatformOptions::from_toml_str("default_window_height = 0").unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn rejects_malformed_toml() {
        let err = PlatformOptions::from_toml_str("default_window_width = \"wide\"").unwrap_err();
        assert!(matches!(err, PlatformError::Config(_)));
    }

    #[test]
    fn builder_methods_chain() {
        let options = PlatformOptions::default()
            .with_default_window_size(200, 100)
            .with_border_in_fullscreen(true)
            .with_application_name("demo");
        assert_eq!(options.default_window_width, 200);
        assert!(options.has_border_in_fullscreen);
        assert_eq!(options.application_name, "demo");
    }
}
