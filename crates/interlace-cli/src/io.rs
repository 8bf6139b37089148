use std::path::{Path, PathBuf};

use interlace_rt::RunConfig;
use serde::Deserialize;

use crate::error::{convert_io_error, convert_toml_error, CliError};

/// Layout of a config file. Only the `[run]` table is read.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigFile {
    run: RunConfig,
}

pub fn read_file(path: PathBuf) -> Result<String, CliError> {
    let contents = std::fs::read_to_string(&path).map_err(|e| convert_io_error(e, path))?;
    Ok(contents)
}

/// Loads the run configuration from `path`, or the defaults if no file is given.
pub fn load_config(path: Option<&Path>) -> Result<RunConfig, CliError> {
    let Some(path) = path else {
        return Ok(RunConfig::default());
    };
    let contents = read_file(path.to_path_buf())?;
    let file: ConfigFile = toml::from_str(&contents)
        .map_err(|e| convert_toml_error(e, path.to_path_buf(), contents.clone()))?;
    log::debug!("Loaded run config from {}: {:?}", path.display(), file.run);
    Ok(file.run)
}
