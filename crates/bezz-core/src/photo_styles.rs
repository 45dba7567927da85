use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::ConfigError;

const BUILTIN_STYLES: &str = include_str!("../../../config/photo_styles.yaml");

/// Sector-keyed photography style fragments used to steer image prompts
/// toward realistic commercial photography.
#[derive(Debug, Clone, Deserialize)]
pub struct PhotoStyles {
    pub default: String,
    #[serde(default)]
    pub sectors: HashMap<String, String>,
}

impl PhotoStyles {
    /// The style table compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the embedded YAML fails to parse or validate.
    pub fn builtin() -> Result<Self, ConfigError> {
        Self::parse(BUILTIN_STYLES)
    }

    /// Load and validate a style table from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::StylesFileIo {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Loads `path` when given, otherwise the builtin table.
    ///
    /// # Errors
    ///
    /// See [`PhotoStyles::load`] and [`PhotoStyles::builtin`].
    pub fn from_optional_path(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Self::builtin(),
        }
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        let styles: PhotoStyles = serde_yaml::from_str(content)?;
        styles.validate()?;
        Ok(styles)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.default.trim().is_empty() {
            return Err(ConfigError::Validation(
                "photo styles default must be non-empty".to_string(),
            ));
        }

        let mut seen = HashMap::new();
        for (sector, style) in &self.sectors {
            if style.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "photo style for sector '{sector}' must be non-empty"
                )));
            }
            if let Some(previous) = seen.insert(sector.to_lowercase(), sector) {
                return Err(ConfigError::Validation(format!(
                    "duplicate photo style sector: '{sector}' collides with '{previous}'"
                )));
            }
        }

        Ok(())
    }

    /// Style fragment for `sector`, falling back to the default.
    #[must_use]
    pub fn style_for(&self, sector: &str) -> &str {
        let wanted = sector.trim();
        self.sectors
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(wanted))
            .map_or(self.default.as_str(), |(_, style)| style.as_str())
    }
}
