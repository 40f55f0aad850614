//! Configuration management for markdata.
//!
//! Parses `markdata.toml` files with serde and provides auto-discovery of
//! config files in parent directories.
//!
//! ```toml
//! [front_matter]
//! format = "yaml"
//! strip = false
//!
//! [paths]
//! root = "data"
//! directives = "directives"
//!
//! [discovery]
//! patterns = ["**/*.md", "**/*.txt"]
//!
//! [[command]]
//! name = "plot"
//! program = "python3"
//! args = ["tools/plot.py"]
//!
//! [[command]]
//! name = "render"
//! program = "./tools/render.sh"
//! ```
//!
//! Command programs containing a path separator, and arguments naming a file
//! that exists next to the config, are resolved against the config directory.
//! Commands run in the resolution base of each document, so relative paths
//! in them would otherwise depend on where the document lives.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `paths.root`
//! - `paths.directives`
//! - `command.program`
//! - `command.args`

mod expand;

use std::path::{Path, PathBuf};

use markdata_core::SessionConfig;
use markdata_core::front_matter::FrontMatterFormat;
use serde::Deserialize;

/// Configuration filename to search for.
pub const CONFIG_FILENAME: &str = "markdata.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override front matter format.
    pub front_matter: Option<FrontMatterFormat>,
    /// Override front matter stripping.
    pub strip_front_matter: Option<bool>,
    /// Override the resolution root.
    pub root: Option<PathBuf>,
    /// Override the command directives directory.
    pub directives: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Front matter handling.
    pub front_matter: FrontMatterConfig,
    /// Paths as written in TOML, relative to the config file.
    paths: PathsConfigRaw,
    /// Directory mode document discovery.
    pub discovery: DiscoveryConfig,
    /// Command-backed directives.
    #[serde(rename = "command")]
    pub commands: Vec<CommandConfig>,

    /// Resolved paths (set after loading).
    #[serde(skip)]
    pub paths_resolved: PathsConfig,
    /// Path to the config file (set after loading).
    #[serde(skip)]
    pub config_path: Option<PathBuf>,
}

/// Front matter configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontMatterConfig {
    /// Format of the leading metadata block; unset disables front matter.
    pub format: Option<FrontMatterFormat>,
    /// Drop the metadata block from the output.
    pub strip: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PathsConfigRaw {
    root: Option<String>,
    directives: Option<String>,
}

/// Resolved paths.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PathsConfig {
    /// Directory directive paths resolve against instead of each document's
    /// own directory.
    pub root: Option<PathBuf>,
    /// Directory of executables registered as command directives.
    pub directives: Option<PathBuf>,
}

/// Document discovery configuration.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiscoveryConfig {
    /// Glob patterns, relative to the source directory, selecting the files
    /// to resolve. Other files are copied unchanged when mirroring.
    pub patterns: Vec<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            patterns: vec!["**/*.md".to_owned()],
        }
    }
}

/// A `[[command]]` entry.
#[derive(Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CommandConfig {
    /// Directive name.
    pub name: String,
    /// Program to run. Looked up on `PATH` unless it contains a separator,
    /// in which case it is relative to the config file.
    pub program: String,
    /// Arguments passed before the payload is written to stdin. Arguments
    /// naming an existing file relative to the config file are made absolute.
    #[serde(default)]
    pub args: Vec<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`paths.root`").
        field: String,
        /// Error message (e.g., "${`DATA_DIR`} not set").
        message: String,
    },
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file.
    /// Otherwise, searches for `markdata.toml` in the current directory and
    /// its parents, falling back to defaults.
    ///
    /// CLI settings are applied after loading and path resolution, so CLI
    /// arguments take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist or parsing fails.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = std::env::current_dir()
            .ok()
            .and_then(|cwd| Self::discover_config(&cwd))
        {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        Ok(config)
    }

    /// Search for a config file in `start` and its parents.
    #[must_use]
    pub fn discover_config(start: &Path) -> Option<PathBuf> {
        start
            .ancestors()
            .map(|dir| dir.join(CONFIG_FILENAME))
            .find(|candidate| candidate.is_file())
    }

    /// Session options derived from this configuration.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            front_matter: self.front_matter.format,
            strip_front_matter: self.front_matter.strip,
            root: self.paths_resolved.root.clone(),
        }
    }

    /// Validate configuration values.
    ///
    /// Called automatically after loading from file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_discovery()?;
        self.validate_commands()?;
        Ok(())
    }

    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        if let Some(format) = settings.front_matter {
            self.front_matter.format = Some(format);
        }
        if let Some(strip) = settings.strip_front_matter {
            self.front_matter.strip = strip;
        }
        if let Some(root) = &settings.root {
            self.paths_resolved.root = Some(root.clone());
        }
        if let Some(directives) = &settings.directives {
            self.paths_resolved.directives = Some(directives.clone());
        }
    }

    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let mut config: Self = toml::from_str(&content)?;

        // Expand environment variables before path resolution
        config.expand_env_vars()?;

        let config_dir = path.parent().unwrap_or(Path::new("."));
        config.resolve_paths(config_dir);
        config.config_path = Some(path.to_path_buf());

        config.validate()?;

        Ok(config)
    }

    fn validate_discovery(&self) -> Result<(), ConfigError> {
        if self.discovery.patterns.is_empty() {
            return Err(ConfigError::Validation(
                "discovery.patterns cannot be empty".to_owned(),
            ));
        }
        for pattern in &self.discovery.patterns {
            glob::Pattern::new(pattern).map_err(|e| {
                ConfigError::Validation(format!(
                    "discovery.patterns: invalid pattern {pattern:?}: {e}"
                ))
            })?;
        }
        Ok(())
    }

    fn validate_commands(&self) -> Result<(), ConfigError> {
        for (index, command) in self.commands.iter().enumerate() {
            let name = &command.name;
            if name.is_empty() || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
                return Err(ConfigError::Validation(format!(
                    "command[{index}].name must be a non-empty word, got {name:?}"
                )));
            }
            if command.program.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "command[{index}].program cannot be empty"
                )));
            }
            if self.commands[..index].iter().any(|c| c.name == *name) {
                return Err(ConfigError::Validation(format!(
                    "command `{name}` is declared more than once"
                )));
            }
        }
        Ok(())
    }

    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        if let Some(root) = &self.paths.root {
            self.paths.root = Some(expand::expand_env(root, "paths.root")?);
        }
        if let Some(directives) = &self.paths.directives {
            self.paths.directives = Some(expand::expand_env(directives, "paths.directives")?);
        }
        for command in &mut self.commands {
            command.program = expand::expand_env(&command.program, "command.program")?;
            expand::expand_env_list(&mut command.args, "command.args")?;
        }
        Ok(())
    }

    /// Resolve relative paths against the config directory.
    fn resolve_paths(&mut self, config_dir: &Path) {
        let resolve = |path: Option<&str>| path.map(|p| config_dir.join(p));
        self.paths_resolved = PathsConfig {
            root: resolve(self.paths.root.as_deref()),
            directives: resolve(self.paths.directives.as_deref()),
        };

        for command in &mut self.commands {
            if has_separator(&command.program) {
                command.program = join_lossy(config_dir, &command.program);
            }
            for arg in &mut command.args {
                if !arg.starts_with('-') && config_dir.join(&*arg).is_file() {
                    *arg = join_lossy(config_dir, arg);
                }
            }
        }
    }
}

fn has_separator(program: &str) -> bool {
    program.contains('/') || program.contains(std::path::MAIN_SEPARATOR)
}

/// `dir.join(path)` as a string. Absolute `path` is kept as is.
fn join_lossy(dir: &Path, path: &str) -> String {
    dir.join(path).to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.front_matter.format, None);
        assert!(!config.front_matter.strip);
        assert_eq!(config.discovery.patterns, vec!["**/*.md"]);
        assert!(config.commands.is_empty());
        assert_eq!(config.paths_resolved, PathsConfig::default());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_minimal_config() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.discovery.patterns, vec!["**/*.md"]);
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
[front_matter]
format = "toml"
strip = true

[paths]
root = "data"
directives = "bin/directives"

[discovery]
patterns = ["**/*.md", "notes/*.txt"]

[[command]]
name = "plot"
program = "python3"
args = ["tools/plot.py", "--svg"]

[[command]]
name = "today"
program = "date"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));
        config.validate().unwrap();

        assert_eq!(config.front_matter.format, Some(FrontMatterFormat::Toml));
        assert!(config.front_matter.strip);
        assert_eq!(config.discovery.patterns, vec!["**/*.md", "notes/*.txt"]);
        assert_eq!(
            config.paths_resolved,
            PathsConfig {
                root: Some(PathBuf::from("/project/data")),
                directives: Some(PathBuf::from("/project/bin/directives")),
            }
        );
        assert_eq!(
            config.commands,
            vec![
                CommandConfig {
                    name: "plot".to_owned(),
                    program: "python3".to_owned(),
                    args: vec!["tools/plot.py".to_owned(), "--svg".to_owned()],
                },
                CommandConfig {
                    name: "today".to_owned(),
                    program: "date".to_owned(),
                    args: Vec::new(),
                },
            ]
        );
    }

    #[test]
    fn test_command_paths_resolve_against_config_dir() {
        let toml = r#"
[[command]]
name = "render"
program = "tools/render.sh"
args = ["--fast"]

[[command]]
name = "shout"
program = "/usr/local/bin/shout"

[[command]]
name = "plot"
program = "python3"
"#;
        let mut config: Config = toml::from_str(toml).unwrap();
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.commands[0].program, "/project/tools/render.sh");
        assert_eq!(config.commands[0].args, vec!["--fast"]);
        assert_eq!(config.commands[1].program, "/usr/local/bin/shout");
        assert_eq!(config.commands[2].program, "python3");
    }

    #[test]
    fn test_existing_script_args_resolve_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("tools")).unwrap();
        std::fs::write(dir.path().join("tools/plot.py"), "").unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(
            &path,
            "[[command]]\nname = \"plot\"\nprogram = \"python3\"\nargs = [\"tools/plot.py\", \"svg\"]\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.commands[0].program, "python3");
        assert_eq!(
            config.commands[0].args,
            vec![
                dir.path().join("tools/plot.py").to_string_lossy().into_owned(),
                "svg".to_owned(),
            ]
        );
    }

    #[test]
    fn test_unknown_format_rejected() {
        let result: Result<Config, _> = toml::from_str("[front_matter]\nformat = \"ini\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<Config, _> = toml::from_str("[paths]\nsource = \"docs\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_pattern() {
        let config: Config = toml::from_str("[discovery]\npatterns = [\"[md\"]\n").unwrap();
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::Validation(_)),
            "Expected ConfigError::Validation, got {err:?}"
        );
        assert!(err.to_string().contains("[md"));
    }

    #[test]
    fn test_empty_patterns() {
        let config: Config = toml::from_str("[discovery]\npatterns = []\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_command_name() {
        let toml = r#"
[[command]]
name = "my-plot"
program = "plot"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("command[0].name"));
    }

    #[test]
    fn test_duplicate_command() {
        let toml = r#"
[[command]]
name = "plot"
program = "a"

[[command]]
name = "plot"
program = "b"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_apply_cli_settings() {
        let mut config: Config =
            toml::from_str("[front_matter]\nformat = \"yaml\"\n[paths]\nroot = \"data\"\n")
                .unwrap();
        config.resolve_paths(Path::new("/project"));

        config.apply_cli_settings(&CliSettings {
            strip_front_matter: Some(true),
            directives: Some(PathBuf::from("/opt/directives")),
            ..Default::default()
        });

        assert_eq!(config.front_matter.format, Some(FrontMatterFormat::Yaml)); // Unchanged
        assert!(config.front_matter.strip);
        assert_eq!(
            config.paths_resolved.root,
            Some(PathBuf::from("/project/data"))
        ); // Unchanged
        assert_eq!(
            config.paths_resolved.directives,
            Some(PathBuf::from("/opt/directives"))
        );
    }

    #[test]
    fn test_apply_cli_settings_overrides_root() {
        let mut config = Config::default();
        config.apply_cli_settings(&CliSettings {
            front_matter: Some(FrontMatterFormat::Json),
            root: Some(PathBuf::from("shared")),
            ..Default::default()
        });

        assert_eq!(
            config.session_config(),
            SessionConfig {
                front_matter: Some(FrontMatterFormat::Json),
                strip_front_matter: false,
                root: Some(PathBuf::from("shared")),
            }
        );
    }

    #[test]
    fn test_load_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(&path, "[paths]\nroot = \"tables\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.config_path, Some(path));
        assert_eq!(config.paths_resolved.root, Some(dir.path().join("tables")));
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Some(Path::new("/nonexistent/markdata.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_load_expands_env() {
        // SAFETY: the variable name is unique to this test
        unsafe {
            std::env::set_var("MARKDATA_TEST_LOAD_ROOT", "fixtures");
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[paths]\nroot = \"${MARKDATA_TEST_LOAD_ROOT}/csv\"\n").unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(
            config.paths_resolved.root,
            Some(dir.path().join("fixtures/csv"))
        );
        unsafe {
            std::env::remove_var("MARKDATA_TEST_LOAD_ROOT");
        }
    }

    #[test]
    fn test_load_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        std::fs::write(&path, "[[command]]\nname = \"x\"\nprogram = \"\"\n").unwrap();

        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_discover_config_in_parent() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("docs/guide");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_config(&nested),
            Some(dir.path().join(CONFIG_FILENAME))
        );
    }

    #[test]
    fn test_discover_config_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("sub");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILENAME), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILENAME), "").unwrap();

        assert_eq!(
            Config::discover_config(&nested),
            Some(nested.join(CONFIG_FILENAME))
        );
    }
}
