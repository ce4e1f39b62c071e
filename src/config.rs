/*!
Run configuration, loaded from an optional TOML file and overridable from
the command line (see `main.rs`).
*/

use serde::{Deserialize, Serialize};

use crate::ppu::Mirroring;

/// Host-level knobs that sit outside anything the cartridge header encodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunConfig {
    /// Force a mirroring mode instead of trusting the iNES header bit.
    #[serde(default)]
    pub mirroring_override: Option<Mirroring>,

    /// Enable `tracing` output at startup.
    #[serde(default)]
    pub trace: bool,

    /// Stop `run_until_frame` early after this many CPU cycles even if no
    /// frame has completed, to bound runaway or stalled programs. `None`
    /// means no limit.
    #[serde(default)]
    pub cycle_budget: Option<u64>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            mirroring_override: None,
            trace: false,
            cycle_budget: None,
        }
    }
}

impl RunConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn from_toml_file(path: &std::path::Path) -> std::io::Result<Self> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_empty() {
        let cfg = RunConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, RunConfig::default());
    }

    #[test]
    fn parses_mirroring_override_and_cycle_budget() {
        let cfg = RunConfig::from_toml_str(
            r#"
            mirroring_override = "Vertical"
            trace = true
            cycle_budget = 200000
            "#,
        )
        .unwrap();
        assert_eq!(cfg.mirroring_override, Some(Mirroring::Vertical));
        assert!(cfg.trace);
        assert_eq!(cfg.cycle_budget, Some(200_000));
    }
}
