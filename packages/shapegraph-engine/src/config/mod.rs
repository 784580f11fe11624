//! Analysis configuration
//!
//! - `preset`: complete default policies (fast/balanced/thorough/custom)
//! - `applier_policy`: per-role pipeline flags
//! - `analysis_config`: whole-analysis settings with YAML overrides

pub mod analysis_config;
pub mod applier_policy;
pub mod error;
pub mod preset;
pub mod validation;

pub use analysis_config::{AnalysisConfig, JoinMode, MAX_ACTION_INSTANTIATIONS};
pub use applier_policy::{ApplierPolicy, ApplierRole};
pub use error::{ConfigError, ConfigResult};
pub use preset::Preset;
pub use validation::Validatable;
