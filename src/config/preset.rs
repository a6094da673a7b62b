//! Configuration presets (`fast`/`balanced`/`thorough`/`custom`).

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Insensitive pointer analysis, low iteration cap, no summary memoization.
    Fast,
    /// Flow-sensitive pointer analysis, moderate iteration cap.
    Balanced,
    /// Flow-sensitive-with-invalidation pointer analysis, high iteration cap,
    /// summary memoization enabled.
    Thorough,
    /// Minimal defaults; callers are expected to override via YAML.
    Custom,
}

impl Default for Preset {
    fn default() -> Self {
        Self::Balanced
    }
}

impl Preset {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.to_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "balanced" => Ok(Self::Balanced),
            "thorough" => Ok(Self::Thorough),
            "custom" => Ok(Self::Custom),
            _ => Err(format!(
                "unknown preset '{s}'. Valid presets: fast, balanced, thorough, custom"
            )),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_case_insensitively() {
        assert_eq!(Preset::from_str("FAST").unwrap(), Preset::Fast);
        assert_eq!(Preset::from_str("Thorough").unwrap(), Preset::Thorough);
        assert!(Preset::from_str("ultra").is_err());
    }

    #[test]
    fn default_is_balanced() {
        assert_eq!(Preset::default(), Preset::Balanced);
    }
}
