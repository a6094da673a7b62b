//! Configuration error types, one variant per invalid-configuration kind.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid range for field '{field}': {value} not in {min}..={max}")]
    Range {
        field: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("missing 'version' field in configuration file. Add 'version: 1' to the top of your YAML file.")]
    MissingVersion,

    #[error("unsupported configuration version {found}; supported versions: 1")]
    UnsupportedVersion { found: u32 },

    #[error("unknown preset '{0}'. Valid presets: fast, balanced, thorough, custom")]
    UnknownPreset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_preset_message_lists_valid_presets() {
        let err = ConfigError::UnknownPreset("ultra_fast".to_string());
        let msg = err.to_string();
        assert!(msg.contains("ultra_fast"));
        assert!(msg.contains("fast, balanced, thorough"));
    }

    #[test]
    fn range_error_reports_field_and_bounds() {
        let err = ConfigError::Range {
            field: "max_iterations".to_string(),
            value: "0".to_string(),
            min: "1".to_string(),
            max: "10000".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("max_iterations"));
        assert!(msg.contains("1..=10000"));
    }
}
