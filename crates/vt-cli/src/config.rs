//! Configuration loading and management.

use std::path::{Path, PathBuf};

use chrono::FixedOffset;
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};
use vt_core::AnalysisConfig;

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// The report provider's fixed UTC offset, e.g. `+03:00`.
    pub provider_utc_offset: String,

    /// Reconstruction and attachment settings.
    #[serde(default)]
    pub analysis: AnalysisConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            provider_utc_offset: "+00:00".to_string(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from default locations.
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load() -> Result<Self, figment::Error> {
        Self::load_from(None)
    }

    /// Loads configuration, optionally from a specific file.
    ///
    /// Later sources win: defaults, the user config file, `config_path`, then
    /// `VT_*` variables (`VT_ANALYSIS__CALC_IDLE=false` sets a nested key).
    #[expect(
        clippy::result_large_err,
        reason = "figment::Error is large but only returned at startup"
    )]
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, figment::Error> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(config_dir) = dirs_config_path() {
            figment = figment.merge(Toml::file(config_dir.join("config.toml")));
        }

        if let Some(path) = config_path {
            figment = figment.merge(Toml::file(path));
        }

        figment = figment.merge(Env::prefixed("VT_").split("__"));

        figment.extract()
    }

    /// The provider offset, parsed.
    pub fn offset(&self) -> anyhow::Result<FixedOffset> {
        parse_utc_offset(&self.provider_utc_offset)
    }
}

/// Parses `+HH:MM`, `-HH:MM`, `+HHMM` or `+HH`; `Z` means UTC.
pub fn parse_utc_offset(raw: &str) -> anyhow::Result<FixedOffset> {
    let raw = match raw.trim() {
        z if z.eq_ignore_ascii_case("z") || z.eq_ignore_ascii_case("utc") => "+00:00",
        other => other,
    };

    let (sign, rest) = match raw.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => anyhow::bail!("invalid UTC offset {raw:?}: expected a sign, e.g. +03:00"),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        anyhow::bail!("invalid UTC offset {raw:?}");
    }
    let (hours, minutes) = match digits.len() {
        2 => (digits.as_str(), "0"),
        4 => digits.split_at(2),
        _ => anyhow::bail!("invalid UTC offset {raw:?}"),
    };

    let hours: i32 = hours.parse().map_err(|_| anyhow::anyhow!("invalid UTC offset {raw:?}"))?;
    let minutes: i32 = minutes.parse().map_err(|_| anyhow::anyhow!("invalid UTC offset {raw:?}"))?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
        .ok_or_else(|| anyhow::anyhow!("UTC offset out of range: {raw:?}"))
}

/// Returns the platform-specific config directory for vt.
///
/// On Linux: `~/.config/vt`
fn dirs_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("vt"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_dirs_config_path_ends_with_vt() {
        let path = dirs_config_path().unwrap();
        assert_eq!(path.file_name().unwrap(), "vt");
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.offset().unwrap().local_minus_utc(), 0);
        assert_eq!(config.analysis.merge_gap_secs, 60);
        assert!(config.analysis.calc_idle);
    }

    #[test]
    fn test_load_from_file_overrides_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
provider_utc_offset = "+03:00"

[analysis]
start_allowance_secs = 300
calc_odometer = false
datasets = ["trips", "моточасы"]
"#
        )
        .unwrap();

        let config = Config::load_from(Some(file.path())).unwrap();
        assert_eq!(config.offset().unwrap().local_minus_utc(), 3 * 3600);
        assert_eq!(config.analysis.start_allowance_secs, 300);
        assert_eq!(config.analysis.end_allowance_secs, 180);
        assert!(!config.analysis.calc_odometer);
        assert_eq!(
            config.analysis.datasets,
            Some(vec![
                vt_core::DatasetKind::Trips,
                vt_core::DatasetKind::Motohours
            ])
        );
    }

    #[test]
    fn test_parse_utc_offset_forms() {
        assert_eq!(parse_utc_offset("+03:00").unwrap().local_minus_utc(), 10_800);
        assert_eq!(parse_utc_offset("+0530").unwrap().local_minus_utc(), 19_800);
        assert_eq!(parse_utc_offset("-05").unwrap().local_minus_utc(), -18_000);
        assert_eq!(parse_utc_offset("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_utc_offset("03:00").is_err());
        assert!(parse_utc_offset("+3:0").is_err());
        assert!(parse_utc_offset("+99:00").is_err());
        assert!(parse_utc_offset("+1é2").is_err());
        assert!(parse_utc_offset("+ab:cd").is_err());
    }
}
