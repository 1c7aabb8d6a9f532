use crate::wrapper::function_path;
use crate::wrapper::result_error::error::Error;
use crate::wrapper::result_error::result::{convert_error_vec, Result};
use crate::wrapper::result_error::{AddFunctionName, AddMsg};
use crate::wrapper::validate::is_valid_env_key;
use derive_more::{Deref, From};
use function_name::named;
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter};
use std::io::ErrorKind;
use std::path::Path;

/// Variables read from a `<name>.env` file.
///
/// One `KEY=value` per line. Blank lines and `#` comments are skipped, key and
/// value are trimmed, and the value is taken literally without quote removal
/// or expansion. A repeated key keeps its last value.
///
/// `Debug` prints the keys only since values carry repository passwords and
/// cloud credentials.
#[derive(Clone, Default, PartialEq, Eq, Deref, From)]
pub struct EnvFile {
    vars: BTreeMap<String, String>,
}

impl EnvFile {
    #[named]
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(Error::config_not_found(path));
            }
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                return Err(Error::config_parse(path, "file is not valid UTF-8"));
            }
            Err(e) => {
                return Err(Error::from(e))
                    .add_msg(format!("Reading env file {:?} failed", path))
                    .add_fn_name(function_path!());
            }
        };

        Self::parse(path, &content)
    }

    /// Parses env file content. Every malformed line is reported, not only the
    /// first one.
    pub fn parse<P: AsRef<Path>>(path: P, content: &str) -> Result<Self> {
        let path = path.as_ref();
        let mut vars = BTreeMap::new();
        let mut errors = vec![];

        for (idx, raw_line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(Error::config_parse(
                    path,
                    format!("line {line_no}: expected KEY=value"),
                ));
                continue;
            };

            let key = key.trim();
            if !is_valid_env_key(key) {
                errors.push(Error::config_parse(
                    path,
                    format!("line {line_no}: invalid variable name {key:?}"),
                ));
                continue;
            }

            if vars
                .insert(key.to_string(), value.trim().to_string())
                .is_some()
            {
                tracing::warn!("{:?} line {}: {} set again, last value wins", path, line_no, key);
            }
        }

        convert_error_vec(errors)?;
        tracing::debug!("Loaded {} variables from {:?}", vars.len(), path);
        Ok(vars.into())
    }

    /// Returns the value for `key` unless it is missing or blank.
    pub fn non_empty(&self, key: &str) -> Option<&str> {
        self.vars
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

impl Debug for EnvFile {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.vars.keys()).finish()
    }
}
