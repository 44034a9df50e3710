pub mod defs;

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::cli::Arguments;
use crate::config::defs::{ReplayError, RunConfig, CACHE_FILE_NAME};

/// Values that may be supplied through `--config-file`.
/// Every field is optional; anything given on the command line wins.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub src_dir: Option<String>,
    pub dest_dir: Option<String>,
    pub seed: Option<u64>,
    pub rescan: Option<bool>,
    pub checkpoint: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = fs::read_to_string(path).map_err(|e| ReplayError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| {
            ReplayError::InvalidConfig(format!("Cannot parse config file {}: {}", path.display(), e))
        })
    }
}

/// Merges the command line with the optional config file and validates the directories.
///
/// # Arguments
///
/// * `args` - Parsed command-line arguments.
///
/// # Returns
/// RunConfig with absolute, existing source and destination directories.
pub fn build_run_config(args: Arguments) -> Result<RunConfig, ReplayError> {
    let file_config = match &args.config_file {
        Some(path) => {
            debug!("Reading config file {}", path);
            ConfigFile::load(Path::new(path))?
        }
        None => ConfigFile::default(),
    };

    let src_dir = args
        .src_dir
        .clone()
        .or(file_config.src_dir)
        .ok_or_else(|| ReplayError::InvalidConfig("A source directory (-s/--src_dir) is required".to_string()))?;
    let dest_dir = args
        .dest_dir
        .clone()
        .or(file_config.dest_dir)
        .ok_or_else(|| ReplayError::InvalidConfig("A destination directory (-d/--dest_dir) is required".to_string()))?;

    let dest_dir = validate_dir(&dest_dir, "destination")?;
    let src_dir = validate_dir(&src_dir, "source")?;
    let cache_path = src_dir.join(CACHE_FILE_NAME);

    Ok(RunConfig {
        src_dir,
        dest_dir,
        cache_path,
        seed: args.seed.or(file_config.seed),
        rescan: args.rescan || file_config.rescan.unwrap_or(false),
        checkpoint: args.checkpoint || file_config.checkpoint.unwrap_or(false),
        args,
    })
}

fn validate_dir(raw: &str, role: &'static str) -> Result<PathBuf, ReplayError> {
    let path = PathBuf::from(raw);
    if !path.is_dir() {
        return Err(ReplayError::MissingDirectory { role, path });
    }
    path.canonicalize().map_err(|e| ReplayError::io(&path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{tempdir, NamedTempFile};

    fn args_for(src: &Path, dest: &Path) -> Arguments {
        Arguments {
            src_dir: Some(src.to_string_lossy().into_owned()),
            dest_dir: Some(dest.to_string_lossy().into_owned()),
            ..Default::default()
        }
    }

    #[test]
    fn test_build_run_config_valid_dirs() -> anyhow::Result<()> {
        let src = tempdir()?;
        let dest = tempdir()?;
        let config = build_run_config(args_for(src.path(), dest.path()))?;
        assert_eq!(config.src_dir, src.path().canonicalize()?);
        assert_eq!(config.dest_dir, dest.path().canonicalize()?);
        assert_eq!(config.cache_path, config.src_dir.join(CACHE_FILE_NAME));
        assert!(!config.rescan);
        assert!(!config.checkpoint);
        Ok(())
    }

    #[test]
    fn test_missing_source_dir_is_rejected() -> anyhow::Result<()> {
        let dest = tempdir()?;
        let missing = dest.path().join("does_not_exist");
        let err = build_run_config(args_for(&missing, dest.path())).unwrap_err();
        match err {
            ReplayError::MissingDirectory { role, .. } => assert_eq!(role, "source"),
            other => panic!("Unexpected error: {}", other),
        }
        Ok(())
    }

    #[test]
    fn test_missing_destination_dir_is_rejected() -> anyhow::Result<()> {
        let src = tempdir()?;
        let missing = src.path().join("nope");
        let err = build_run_config(args_for(src.path(), &missing)).unwrap_err();
        assert!(matches!(err, ReplayError::MissingDirectory { role: "destination", .. }));
        Ok(())
    }

    #[test]
    fn test_config_file_fills_gaps_and_cli_wins() -> anyhow::Result<()> {
        let src = tempdir()?;
        let dest = tempdir()?;
        let other_dest = tempdir()?;
        let mut cfg = NamedTempFile::new()?;
        write!(
            cfg,
            r#"{{"src_dir": "{}", "dest_dir": "{}", "seed": 7, "checkpoint": true}}"#,
            src.path().display(),
            other_dest.path().display()
        )?;
        cfg.flush()?;

        let args = Arguments {
            dest_dir: Some(dest.path().to_string_lossy().into_owned()),
            config_file: Some(cfg.path().to_string_lossy().into_owned()),
            ..Default::default()
        };
        let config = build_run_config(args)?;
        assert_eq!(config.src_dir, src.path().canonicalize()?);
        assert_eq!(config.dest_dir, dest.path().canonicalize()?);
        assert_eq!(config.seed, Some(7));
        assert!(config.checkpoint);
        Ok(())
    }

    #[test]
    fn test_invalid_config_file() -> anyhow::Result<()> {
        let mut cfg = NamedTempFile::new()?;
        write!(cfg, "{{\"unknown_key\": 1}}")?;
        cfg.flush()?;
        let err = ConfigFile::load(cfg.path()).unwrap_err();
        assert!(matches!(err, ReplayError::InvalidConfig(_)));
        Ok(())
    }
}
