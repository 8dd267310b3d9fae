pub mod clones;

pub use clones::{ CloneConfig, ConfigError, LoyaltyCore, OrchestratorConfig };
