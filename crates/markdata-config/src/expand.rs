//! `${VAR}` and `${VAR:-default}` expansion in configuration strings.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// `${VAR}` must be set; `${VAR:-default}` falls back to `default`. Bare
/// `$VAR` is left alone so shell snippets in command arguments pass through.
/// `field` names the setting in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var)
            .map(Some)
            .map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand every element of a list setting in place.
///
/// Elements are reported as `field[index]`.
pub(crate) fn expand_env_list(values: &mut [String], field: &str) -> Result<(), ConfigError> {
    for (index, value) in values.iter_mut().enumerate() {
        *value = expand_env(value, &format!("{field}[{index}]"))?;
    }
    Ok(())
}

struct UnsetVar(String);
