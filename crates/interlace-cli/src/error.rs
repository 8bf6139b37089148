use std::path::PathBuf;

use interlace_net::NetError;
use interlace_rt::{RuntimeError, StopReason};
use miette::{Diagnostic, NamedSource, SourceSpan};
use thiserror::Error;

/// CLI-specific error type that provides rich diagnostics
#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    #[error("Failed to read file {path}")]
    #[diagnostic(code(interlace::cli::io_error))]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid configuration file: {message}")]
    #[diagnostic(code(interlace::cli::config_error))]
    ConfigError {
        #[source_code]
        src: NamedSource<String>,
        #[label("{message}")]
        span: Option<SourceSpan>,
        message: String,
        #[source]
        source: toml::de::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(interlace::cli::runtime_error))]
    RuntimeError(#[from] RuntimeError),

    #[error(transparent)]
    #[diagnostic(code(interlace::cli::net_error))]
    NetError(#[from] NetError),

    #[error("Reduction stopped early: {reason}")]
    #[diagnostic(
        code(interlace::cli::incomplete),
        help("raise --max-steps or --timeout, or pass a config file with a larger budget")
    )]
    Incomplete { reason: StopReason },

    #[error("Malformed result net: {0}")]
    #[diagnostic(code(interlace::cli::read_back))]
    ReadBack(String),
}

/// Convert IO errors with context
pub fn convert_io_error(error: std::io::Error, path: PathBuf) -> CliError {
    CliError::IoError { path, source: error }
}

/// Convert TOML errors, pointing the diagnostic at the offending span
pub fn convert_toml_error(error: toml::de::Error, path: PathBuf, contents: String) -> CliError {
    CliError::ConfigError {
        src: NamedSource::new(path.display().to_string(), contents),
        span: error.span().map(SourceSpan::from),
        message: error.message().to_string(),
        source: error,
    }
}
