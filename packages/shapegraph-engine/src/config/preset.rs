//! Applier presets
//!
//! A preset fixes how much constraint checking the pipeline does around
//! focus and update. Blur is never optional, so it is not part of a preset.
//!
//! | preset   | coerce after focus | coerce after update | abort on failure |
//! |----------|--------------------|---------------------|------------------|
//! | fast     | no                 | no                  | no               |
//! | balanced | no                 | yes                 | no               |
//! | thorough | yes                | yes                 | yes              |

use super::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// Skip coerce after update; infeasible branches survive until blur
    Fast,

    /// Coerce after update and drop branches that fail it
    #[default]
    Balanced,

    /// Also coerce focused structures, and abort on a failed coerce after
    /// update. Used while debugging action definitions.
    Thorough,

    /// Balanced flags, expected to be overridden per role from YAML
    Custom,
}

impl Preset {
    pub const ALL: [Preset; 4] = [Preset::Fast, Preset::Balanced, Preset::Thorough, Preset::Custom];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Balanced => "balanced",
            Self::Thorough => "thorough",
            Self::Custom => "custom",
        }
    }

    pub fn coerces_after_focus(&self) -> bool {
        matches!(self, Self::Thorough)
    }

    pub fn coerces_after_update(&self) -> bool {
        !matches!(self, Self::Fast)
    }

    /// A failed coerce after update aborts the run instead of dropping the
    /// branch
    pub fn aborts_on_coerce_failure(&self) -> bool {
        matches!(self, Self::Thorough)
    }
}

impl FromStr for Preset {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|preset| preset.as_str() == lowered)
            .ok_or_else(|| ConfigError::UnknownPreset(s.to_string()))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_parsing() {
        assert_eq!("fast".parse::<Preset>().unwrap(), Preset::Fast);
        assert_eq!(" THOROUGH ".parse::<Preset>().unwrap(), Preset::Thorough);
        let err = "exhaustive".parse::<Preset>().unwrap_err();
        assert!(matches!(err, ConfigError::UnknownPreset(ref name) if name == "exhaustive"));
        assert!(err.to_string().contains("thorough"));
    }

    #[test]
    fn test_flags_per_preset() {
        assert!(!Preset::Fast.coerces_after_update());
        assert!(Preset::Balanced.coerces_after_update());
        assert!(!Preset::Balanced.coerces_after_focus());
        assert!(Preset::Thorough.coerces_after_focus());
        assert!(Preset::Thorough.aborts_on_coerce_failure());
        // aborting needs a coerce to fail in the first place
        for preset in Preset::ALL {
            assert!(!preset.aborts_on_coerce_failure() || preset.coerces_after_update());
        }
        assert_eq!(Preset::default().to_string(), "balanced");
    }
}
