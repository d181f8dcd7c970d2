use clap::Parser;
use std::path::PathBuf;

use crate::error::{LedgerError, Result};

/// Default upload ceiling: 10 MiB.
pub const DEFAULT_MAX_BYTES: u64 = 10 * 1024 * 1024;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Summarise a marketplace settlement export by SKU and by month
#[derive(Parser, Debug, Clone)]
#[command(
    name = "settlement-report",
    about = "Summarise a marketplace settlement export by SKU and by month",
    version
)]
pub struct Settings {
    /// Settlement export (CSV) to analyse
    pub ledger: PathBuf,

    /// Output format
    #[arg(long, default_value = "json", value_parser = ["json", "table"])]
    pub format: String,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Write the report to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Reject ledgers larger than this many bytes
    #[arg(long, env = "SETTLEMENT_MAX_BYTES", default_value_t = DEFAULT_MAX_BYTES)]
    pub max_bytes: u64,

    /// Logging level
    #[arg(
        long,
        env = "SETTLEMENT_LOG_LEVEL",
        default_value = "WARNING",
        value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"]
    )]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse the process arguments and apply derived overrides.
    pub fn load() -> Result<Self> {
        Self::resolve(Settings::parse())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list so
    /// tests do not need to spawn a subprocess.
    pub fn load_from<I, T>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let settings = Settings::try_parse_from(args)
            .map_err(|e| LedgerError::Config(e.to_string()))?;
        Self::resolve(settings)
    }

    /// Apply the `--debug` flag and validate value ranges.
    fn resolve(mut settings: Settings) -> Result<Self> {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_bytes == 0 {
            return Err(LedgerError::Config(
                "max-bytes must be greater than zero".to_string(),
            ));
        }
        if self.pretty && self.format != "json" {
            return Err(LedgerError::Config(
                "--pretty only applies to json output".to_string(),
            ));
        }
        Ok(())
    }

    pub fn is_table(&self) -> bool {
        self.format == "table"
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["settlement-report", "ledger.csv"]);

        assert_eq!(settings.ledger, PathBuf::from("ledger.csv"));
        assert_eq!(settings.format, "json");
        assert!(!settings.pretty);
        assert!(settings.output.is_none());
        assert_eq!(settings.max_bytes, DEFAULT_MAX_BYTES);
        assert_eq!(settings.log_level, "WARNING");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
    }

    #[test]
    fn test_settings_cli_table_format() {
        let settings =
            Settings::parse_from(["settlement-report", "ledger.csv", "--format", "table"]);
        assert!(settings.is_table());
    }

    #[test]
    fn test_settings_cli_rejects_unknown_format() {
        let result = Settings::try_parse_from(["settlement-report", "x.csv", "--format", "xml"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_cli_output_short_flag() {
        let settings = Settings::parse_from(["settlement-report", "x.csv", "-o", "out.json"]);
        assert_eq!(settings.output, Some(PathBuf::from("out.json")));
    }

    #[test]
    fn test_settings_cli_max_bytes() {
        let settings =
            Settings::parse_from(["settlement-report", "x.csv", "--max-bytes", "2048"]);
        assert_eq!(settings.max_bytes, 2048);
    }

    #[test]
    fn test_load_from_debug_overrides_log_level() {
        let settings = Settings::load_from(["settlement-report", "x.csv", "--debug"]).unwrap();
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_from_rejects_zero_max_bytes() {
        let err = Settings::load_from(["settlement-report", "x.csv", "--max-bytes", "0"])
            .unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_load_from_rejects_pretty_table() {
        let err = Settings::load_from([
            "settlement-report",
            "x.csv",
            "--format",
            "table",
            "--pretty",
        ])
        .unwrap_err();
        assert!(err.to_string().contains("--pretty"));
    }

    #[test]
    fn test_load_from_missing_ledger_is_config_error() {
        let err = Settings::load_from(["settlement-report"]).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }

    #[test]
    fn test_settings_cli_rejects_filter_directive_as_log_level() {
        let result = Settings::try_parse_from([
            "settlement-report",
            "x.csv",
            "--log-level",
            "settlement_data=debug",
        ]);
        assert!(result.is_err());
    }
}
