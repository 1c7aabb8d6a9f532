use crate::wrapper::env_file::EnvFile;
use crate::wrapper::function_path;
use crate::wrapper::result_error::error::Error;
use crate::wrapper::result_error::result::Result;
use crate::wrapper::result_error::{AddFunctionName, AddMsg};
use crate::wrapper::validate::{validate_backup_name, validate_dir_or_absent, validate_non_empty_path};
use bon::Builder;
use function_name::named;
use getset::Getters;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use validator::Validate;

/// The four positional inputs of one scheduled invocation.
#[derive(Clone, Debug, Validate, Builder, Getters)]
#[getset(get = "pub")]
pub struct JobArgs {
    #[validate(custom(function = validate_backup_name))]
    #[builder(into)]
    backup_name: String,
    #[builder(into)]
    config_dir: PathBuf,
    #[validate(custom(function = validate_dir_or_absent))]
    #[builder(into)]
    cache_dir: PathBuf,
    #[validate(custom(function = validate_non_empty_path))]
    #[builder(into)]
    restic_binary: PathBuf,
}

/// A fully resolved backup job. Built once per invocation and never changed.
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct BackupJob {
    name: String,
    config_dir: PathBuf,
    cache_dir: PathBuf,
    restic_binary: PathBuf,
    env: EnvFile,
    files_path: PathBuf,
    /// `None` when `<name>.excludes` does not exist
    excludes_path: Option<PathBuf>,
    include_paths: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl BackupJob {
    /// Validates the arguments and reads the job's files from the config
    /// directory. Nothing is spawned or written.
    #[named]
    pub fn load(args: JobArgs) -> Result<Self> {
        args.validate()
            .map_err(Error::from)
            .add_msg("Invalid job arguments")?;

        let JobArgs {
            backup_name,
            config_dir,
            cache_dir,
            restic_binary,
        } = args;

        let env = EnvFile::load(config_dir.join(format!("{backup_name}.env")))
            .add_fn_name(function_path!())?;

        let files_path = config_dir.join(format!("{backup_name}.files"));
        let include_paths = read_path_list(&files_path)
            .add_fn_name(function_path!())?
            .ok_or_else(|| Error::config_not_found(&files_path))?;
        if include_paths.is_empty() {
            return Err(Error::config_parse(&files_path, "no paths to back up"));
        }

        let excludes_path = config_dir.join(format!("{backup_name}.excludes"));
        let (excludes_path, exclude_patterns) = match read_path_list(&excludes_path)
            .add_fn_name(function_path!())?
        {
            Some(patterns) => (Some(excludes_path), patterns),
            None => {
                tracing::debug!("No exclude file at {:?}", excludes_path);
                (None, vec![])
            }
        };

        tracing::info!(
            "Loaded backup job {:?}: {} include paths, {} exclude patterns, {} env variables",
            backup_name,
            include_paths.len(),
            exclude_patterns.len(),
            env.len()
        );

        Ok(BackupJob {
            name: backup_name,
            config_dir,
            cache_dir,
            restic_binary,
            env,
            files_path,
            excludes_path,
            include_paths,
            exclude_patterns,
        })
    }
}

/// Reads a newline-delimited list, dropping blank lines and `#` comments.
/// Returns `None` when the file does not exist.
fn read_path_list(path: &Path) -> Result<Option<Vec<String>>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            return Err(Error::config_parse(path, "file is not valid UTF-8"));
        }
        Err(e) => {
            return Err(Error::from(e)).add_msg(format!("Reading path list {:?} failed", path));
        }
    };

    Ok(Some(
        content
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(str::to_string)
            .collect(),
    ))
}
