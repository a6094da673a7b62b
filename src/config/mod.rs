//! Analysis configuration.
//!
//! A 3-tier configuration system (preset -> overrides -> YAML), sized to
//! what this analysis actually has knobs for: which pointer-analysis
//! variant to run (spec §4.2), iteration/worklist caps, and whether
//! interprocedural summary edges are memoized (spec §4.6 step 7).

pub mod error;
pub mod preset;

pub use error::{ConfigError, ConfigResult};
pub use preset::Preset;

use serde::{Deserialize, Serialize};

/// Which pointer-analysis variant to run (spec §4.2's three variants).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PointerAnalysisKind {
    /// Flow-insensitive (Andersen-style inclusion-based) analysis.
    Insensitive,
    /// Flow-sensitive analysis with strong updates but no invalidation tracking.
    FlowSensitive,
    /// Flow-sensitive analysis that additionally tracks invalidated (freed)
    /// memory (spec §9: "free semantics on weak updates").
    FlowSensitiveInv,
}

/// Top-level analysis configuration. Constructed from a [`Preset`] and
/// optionally overridden field-by-field, or loaded wholesale from YAML via
/// [`AnalysisConfig::from_yaml_str`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalysisConfig {
    pub version: u32,
    pub pointer_analysis: PointerAnalysisKind,
    /// Upper bound on pointer-analysis worklist iterations before the
    /// solver gives up and widens remaining unresolved constraints to
    /// `UNKNOWN` (spec §7).
    pub max_iterations: u32,
    /// Whether interprocedural summary-edge reachability (spec §4.6 step 7)
    /// is memoized.
    pub memoize_summaries: bool,
    /// Capacity of the per-callee summary-edge LRU cache when
    /// `memoize_summaries` is set.
    pub summary_cache_capacity: usize,
}

impl AnalysisConfig {
    pub fn preset(preset: Preset) -> Self {
        let (pointer_analysis, max_iterations, memoize_summaries, summary_cache_capacity) =
            match preset {
                Preset::Fast => (PointerAnalysisKind::Insensitive, 50, false, 0),
                Preset::Balanced => (PointerAnalysisKind::FlowSensitive, 500, true, 256),
                Preset::Thorough => (PointerAnalysisKind::FlowSensitiveInv, 5_000, true, 4_096),
                Preset::Custom => (PointerAnalysisKind::FlowSensitive, 500, false, 0),
            };
        AnalysisConfig {
            version: 1,
            pointer_analysis,
            max_iterations,
            memoize_summaries,
            summary_cache_capacity,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.version != 1 {
            return Err(ConfigError::UnsupportedVersion { found: self.version });
        }
        if self.max_iterations == 0 {
            return Err(ConfigError::Range {
                field: "max_iterations".to_string(),
                value: "0".to_string(),
                min: "1".to_string(),
                max: u32::MAX.to_string(),
            });
        }
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let config: AnalysisConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_yaml_string(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::preset(Preset::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fast_preset_disables_summary_memoization() {
        let cfg = AnalysisConfig::preset(Preset::Fast);
        assert_eq!(cfg.pointer_analysis, PointerAnalysisKind::Insensitive);
        assert!(!cfg.memoize_summaries);
    }

    #[test]
    fn thorough_preset_uses_flow_sensitive_inv() {
        let cfg = AnalysisConfig::preset(Preset::Thorough);
        assert_eq!(cfg.pointer_analysis, PointerAnalysisKind::FlowSensitiveInv);
        assert!(cfg.memoize_summaries);
    }

    #[test]
    fn yaml_roundtrip_preserves_fields() {
        let cfg = AnalysisConfig::preset(Preset::Balanced);
        let yaml = cfg.to_yaml_string().unwrap();
        let parsed = AnalysisConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(cfg, parsed);
    }

    #[test]
    fn zero_max_iterations_is_rejected() {
        let mut cfg = AnalysisConfig::default();
        cfg.max_iterations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn unsupported_version_is_rejected() {
        let yaml = "version: 2\npointer_analysis: flow_sensitive\nmax_iterations: 10\nmemoize_summaries: false\nsummary_cache_capacity: 0\n";
        assert!(AnalysisConfig::from_yaml_str(yaml).is_err());
    }
}
