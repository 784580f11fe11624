//! Per-role applier policy
//!
//! Every applier instance (intra/guard/call/return) runs the same pipeline
//! with its own fixed set of flags.

use super::error::{ConfigError, ConfigResult};
use super::preset::Preset;
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Role an applier plays in the interprocedural layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplierRole {
    Intra,
    Guard,
    Call,
    Ret,
}

impl ApplierRole {
    pub const ALL: [ApplierRole; 4] = [
        ApplierRole::Intra,
        ApplierRole::Guard,
        ApplierRole::Call,
        ApplierRole::Ret,
    ];

    /// Marker used when reporting statistics and diagnostics
    pub fn marker(&self) -> &'static str {
        match self {
            ApplierRole::Intra => "intra",
            ApplierRole::Guard => "guard",
            ApplierRole::Call => "call",
            ApplierRole::Ret => "return",
        }
    }
}

impl fmt::Display for ApplierRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

/// Flags controlling the action-application pipeline
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplierPolicy {
    /// Split structures on the action's focus formulas
    pub do_focus: bool,

    /// Drop focused structures that violate integrity constraints
    pub do_coerce_after_focus: bool,

    /// Drop updated structures that violate integrity constraints
    pub do_coerce_after_update: bool,

    /// Bound the node count after update (must stay on)
    pub do_blur: bool,

    /// Drop branches on which a message formula fired
    pub freeze_structures_with_messages: bool,

    /// Abort the analysis when coerce after update fails
    pub break_if_coerce_after_update_failed: bool,

    /// Log the structure rejected by coerce after focus
    pub print_structure_if_coerce_after_focus_failed: bool,
}

impl Default for ApplierPolicy {
    fn default() -> Self {
        Self {
            do_focus: true,
            do_coerce_after_focus: false,
            do_coerce_after_update: true,
            do_blur: true,
            freeze_structures_with_messages: false,
            break_if_coerce_after_update_failed: false,
            print_structure_if_coerce_after_focus_failed: false,
        }
    }
}

impl ApplierPolicy {
    /// Policy for a role under a preset.
    ///
    /// The return applier never coerces after focus: the combined
    /// call/exit structure is infeasible until the update runs.
    pub fn from_preset(preset: Preset, role: ApplierRole) -> Self {
        let mut policy = Self {
            do_coerce_after_focus: preset.coerces_after_focus(),
            do_coerce_after_update: preset.coerces_after_update(),
            break_if_coerce_after_update_failed: preset.aborts_on_coerce_failure(),
            print_structure_if_coerce_after_focus_failed: preset.coerces_after_focus(),
            ..Self::default()
        };
        if role == ApplierRole::Ret {
            policy.do_coerce_after_focus = false;
        }
        policy
    }

    pub fn with_focus(mut self, on: bool) -> Self {
        self.do_focus = on;
        self
    }

    pub fn with_coerce_after_focus(mut self, on: bool) -> Self {
        self.do_coerce_after_focus = on;
        self
    }

    pub fn with_coerce_after_update(mut self, on: bool) -> Self {
        self.do_coerce_after_update = on;
        self
    }

    pub fn with_freeze_on_messages(mut self, on: bool) -> Self {
        self.freeze_structures_with_messages = on;
        self
    }

    pub fn with_break_on_coerce_failure(mut self, on: bool) -> Self {
        self.break_if_coerce_after_update_failed = on;
        self
    }

    /// Validate the policy for the role it will be used in
    pub fn validate_for(&self, role: ApplierRole) -> ConfigResult<()> {
        if !self.do_blur {
            return Err(ConfigError::policy(
                role.marker(),
                "blur cannot be disabled; it bounds the abstract domain",
            ));
        }
        if role == ApplierRole::Ret && self.do_coerce_after_focus {
            return Err(ConfigError::policy(
                role.marker(),
                "coerce after focus must be off for return actions",
            ));
        }
        if self.break_if_coerce_after_update_failed && !self.do_coerce_after_update {
            return Err(ConfigError::policy(
                role.marker(),
                "break_if_coerce_after_update_failed requires do_coerce_after_update",
            ));
        }
        Ok(())
    }
}

impl Validatable for ApplierPolicy {
    fn validate(&self) -> ConfigResult<()> {
        self.validate_for(ApplierRole::Intra)
    }

    fn config_name(&self) -> &'static str {
        "ApplierPolicy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = ApplierPolicy::default();
        assert!(policy.do_focus);
        assert!(!policy.do_coerce_after_focus);
        assert!(policy.do_coerce_after_update);
        assert!(policy.do_blur);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_ret_role_never_coerces_after_focus() {
        let policy = ApplierPolicy::from_preset(Preset::Thorough, ApplierRole::Ret);
        assert!(!policy.do_coerce_after_focus);
        assert!(policy.validate_for(ApplierRole::Ret).is_ok());

        let bad = policy.with_coerce_after_focus(true);
        assert!(bad.validate_for(ApplierRole::Ret).is_err());
        assert!(bad.validate_for(ApplierRole::Intra).is_ok());
    }

    #[test]
    fn test_blur_is_mandatory() {
        let policy = ApplierPolicy {
            do_blur: false,
            ..ApplierPolicy::default()
        };
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_break_requires_coerce_after_update() {
        let policy = ApplierPolicy::from_preset(Preset::Fast, ApplierRole::Intra)
            .with_break_on_coerce_failure(true);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_role_markers() {
        let markers: Vec<_> = ApplierRole::ALL.iter().map(|r| r.marker()).collect();
        assert_eq!(markers, vec!["intra", "guard", "call", "return"]);
    }
}
