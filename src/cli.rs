//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.
//!
//! With no selection the available states are listed; adding `--state` lists
//! its municipalities; adding `--municipality` (or `--code`) loads and
//! summarizes that dataset; `--home` queries the transparency API instead.

use clap::Parser;
use std::path::PathBuf;

/// beneficios - browse PBF/BPC disbursements by state and municipality
///
/// Examples:
///   beneficios
///   beneficios --state BA
///   beneficios --state BA --municipality Fátima
///   beneficios --home
///   beneficios --home --code 2927408
///   beneficios --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Two-letter state code (UF) to browse
    #[arg(short, long, value_name = "UF")]
    pub state: Option<String>,

    /// Municipality name within the chosen state
    ///
    /// Matched case-insensitively against the catalog.
    #[arg(short, long, value_name = "NAME")]
    pub municipality: Option<String>,

    /// IBGE municipality code
    ///
    /// With --home, selects the municipality to query; otherwise addresses
    /// the dataset file directly, bypassing name resolution.
    #[arg(long, value_name = "CODE")]
    pub code: Option<String>,

    /// Show the home summary from the transparency API (PBF and BPC)
    #[arg(long)]
    pub home: bool,

    /// Root directory of the per-municipality dataset files
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// JSON municipality index (switches to the JSON catalog variant)
    #[arg(long, value_name = "FILE")]
    pub municipalities_file: Option<PathBuf>,

    /// Transparency API key
    ///
    /// Without a key the home summary is unavailable; everything else works.
    #[arg(long, env = "API_KEY", hide_env_values = true, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Request timeout in seconds for external API calls
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Output format (text, json)
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Path to configuration file
    ///
    /// If not specified, looks for .beneficios.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .beneficios.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Plain text (default)
    #[default]
    Text,
    /// JSON
    Json,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.municipality.is_some() && self.state.is_none() {
            return Err("--municipality requires --state".to_string());
        }

        if let Some(ref state) = self.state {
            if state.len() != 2 {
                return Err(format!("State code must be two letters, got '{}'", state));
            }
        }

        if let Some(ref code) = self.code {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(format!("IBGE code must be numeric, got '{}'", code));
            }
        }

        if let Some(timeout) = self.timeout {
            if timeout == 0 {
                return Err("Timeout must be at least 1 second".to_string());
            }
        }

        // Check for conflicting options
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            state: None,
            municipality: None,
            code: None,
            home: false,
            data_dir: None,
            municipalities_file: None,
            api_key: None,
            timeout: None,
            format: OutputFormat::Text,
            config: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_municipality_requires_state() {
        let mut args = make_args();
        args.municipality = Some("Fátima".to_string());
        assert!(args.validate().is_err());

        args.state = Some("BA".to_string());
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_state_code_length() {
        let mut args = make_args();
        args.state = Some("Bahia".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_code_must_be_numeric() {
        let mut args = make_args();
        args.code = Some("2910750".to_string());
        assert!(args.validate().is_ok());

        args.code = Some("29x0750".to_string());
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }
}
