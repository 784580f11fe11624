//! Whole-analysis configuration
//!
//! Built from a preset, optionally overridden from YAML:
//!
//! ```yaml
//! preset: thorough
//! join: partial
//! action_cache_capacity: 500
//! ret:
//!   do_coerce_after_update: true
//! ```

use super::applier_policy::{ApplierPolicy, ApplierRole};
use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default bound of the action-instance cache
pub const MAX_ACTION_INSTANTIATIONS: usize = 500;

/// How an abstract state merges a new structure into its contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinMode {
    /// Keep one structure per isomorphism class
    Relational,
    /// Pointwise-join structures sharing the same canonical node names
    Partial,
}

impl Default for JoinMode {
    fn default() -> Self {
        JoinMode::Relational
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub preset: Preset,
    pub join: JoinMode,
    pub action_cache_capacity: usize,
    pub intra: ApplierPolicy,
    pub guard: ApplierPolicy,
    pub call: ApplierPolicy,
    pub ret: ApplierPolicy,
}

/// On-disk form: every field optional, missing ones come from the preset
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct AnalysisConfigFile {
    preset: Option<Preset>,
    join: Option<JoinMode>,
    action_cache_capacity: Option<usize>,
    intra: Option<ApplierPolicy>,
    guard: Option<ApplierPolicy>,
    call: Option<ApplierPolicy>,
    ret: Option<ApplierPolicy>,
}

impl AnalysisConfig {
    pub fn from_preset(preset: Preset) -> Self {
        Self {
            preset,
            join: JoinMode::default(),
            action_cache_capacity: MAX_ACTION_INSTANTIATIONS,
            intra: ApplierPolicy::from_preset(preset, ApplierRole::Intra),
            guard: ApplierPolicy::from_preset(preset, ApplierRole::Guard),
            call: ApplierPolicy::from_preset(preset, ApplierRole::Call),
            ret: ApplierPolicy::from_preset(preset, ApplierRole::Ret),
        }
    }

    pub fn policy(&self, role: ApplierRole) -> &ApplierPolicy {
        match role {
            ApplierRole::Intra => &self.intra,
            ApplierRole::Guard => &self.guard,
            ApplierRole::Call => &self.call,
            ApplierRole::Ret => &self.ret,
        }
    }

    pub fn policy_mut(&mut self, role: ApplierRole) -> &mut ApplierPolicy {
        match role {
            ApplierRole::Intra => &mut self.intra,
            ApplierRole::Guard => &mut self.guard,
            ApplierRole::Call => &mut self.call,
            ApplierRole::Ret => &mut self.ret,
        }
    }

    pub fn with_join(mut self, join: JoinMode) -> Self {
        self.join = join;
        self
    }

    /// Replace the policy of every role except the return role's
    /// coerce-after-focus flag, which stays off.
    pub fn with_all_policies(mut self, policy: ApplierPolicy) -> Self {
        for role in ApplierRole::ALL {
            let mut p = policy.clone();
            if role == ApplierRole::Ret {
                p.do_coerce_after_focus = false;
            }
            *self.policy_mut(role) = p;
        }
        self
    }

    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let file: AnalysisConfigFile = serde_yaml::from_str(yaml)?;
        let mut config = Self::from_preset(file.preset.unwrap_or_default());
        if let Some(join) = file.join {
            config.join = join;
        }
        if let Some(capacity) = file.action_cache_capacity {
            config.action_cache_capacity = capacity;
        }
        for (role, policy) in [
            (ApplierRole::Intra, file.intra),
            (ApplierRole::Guard, file.guard),
            (ApplierRole::Call, file.call),
            (ApplierRole::Ret, file.ret),
        ] {
            if let Some(policy) = policy {
                *config.policy_mut(role) = policy;
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self::from_preset(Preset::default())
    }
}

impl Validatable for AnalysisConfig {
    fn validate(&self) -> ConfigResult<()> {
        if self.action_cache_capacity == 0 || self.action_cache_capacity > 100_000 {
            return Err(ConfigError::range_with_hint(
                "action_cache_capacity",
                self.action_cache_capacity,
                1,
                100_000,
                "Use 500 for typical analyses",
            ));
        }
        for role in ApplierRole::ALL {
            self.policy(role).validate_for(role)?;
        }
        Ok(())
    }

    fn config_name(&self) -> &'static str {
        "AnalysisConfig"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_validate() {
        for preset in [
            Preset::Fast,
            Preset::Balanced,
            Preset::Thorough,
            Preset::Custom,
        ] {
            assert!(AnalysisConfig::from_preset(preset).validate().is_ok());
        }
    }

    #[test]
    fn test_yaml_overrides_preset() {
        let yaml = r#"
preset: thorough
join: partial
ret:
  do_coerce_after_update: false
"#;
        let config = AnalysisConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.preset, Preset::Thorough);
        assert_eq!(config.join, JoinMode::Partial);
        assert!(config.intra.break_if_coerce_after_update_failed);
        assert!(!config.ret.do_coerce_after_update);
        assert_eq!(config.action_cache_capacity, MAX_ACTION_INSTANTIATIONS);
    }

    #[test]
    fn test_yaml_rejects_invalid_capacity() {
        let err = AnalysisConfig::from_yaml_str("action_cache_capacity: 0").unwrap_err();
        assert!(matches!(err, ConfigError::Range { .. }));
    }

    #[test]
    fn test_yaml_rejects_unknown_field() {
        assert!(AnalysisConfig::from_yaml_str("widening: true").is_err());
    }

    #[test]
    fn test_yaml_roundtrip_preserves_policies() {
        let config = AnalysisConfig::from_preset(Preset::Fast).with_join(JoinMode::Partial);
        let yaml = config.to_yaml().unwrap();
        let back = AnalysisConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_with_all_policies_keeps_ret_constraint() {
        let config = AnalysisConfig::default()
            .with_all_policies(ApplierPolicy::default().with_coerce_after_focus(true));
        assert!(config.intra.do_coerce_after_focus);
        assert!(!config.ret.do_coerce_after_focus);
        assert!(config.validate().is_ok());
    }
}
