//! Configuration resolution and path discovery.
//!
//! Resolution order: CLI arguments → environment variables → XDG paths → defaults.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where a configuration file was found.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConfigSource {
    /// Explicitly provided via CLI argument.
    CliArgument,

    /// Set via environment variable.
    Environment,

    /// Found in XDG config directory.
    XdgConfig,

    /// Found in /etc/alphaplan/.
    SystemConfig,

    /// Using built-in defaults.
    #[default]
    BuiltinDefault,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::CliArgument => write!(f, "CLI argument"),
            ConfigSource::Environment => write!(f, "environment variable"),
            ConfigSource::XdgConfig => write!(f, "XDG config"),
            ConfigSource::SystemConfig => write!(f, "system config"),
            ConfigSource::BuiltinDefault => write!(f, "builtin default"),
        }
    }
}

/// Outcome of config file discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Path to alphaplan.json (or None if not found).
    pub path: Option<PathBuf>,

    /// Where it came from (for diagnostics).
    pub source: ConfigSource,
}

/// Environment variable names.
pub const ENV_CONFIG_PATH: &str = "ALPHAPLAN_CONFIG";
pub const ENV_CONFIG_DIR: &str = "ALPHAPLAN_CONFIG_DIR";

/// Standard config file name.
pub const CONFIG_FILENAME: &str = "alphaplan.json";

/// Application name for XDG directories.
const APP_NAME: &str = "alphaplan";

/// Resolve the configuration file path using the standard resolution order.
///
/// 1. Explicit CLI path (used even if missing, so the loader can report it)
/// 2. `ALPHAPLAN_CONFIG`
/// 3. `ALPHAPLAN_CONFIG_DIR` + filename
/// 4. XDG config directory (~/.config/alphaplan/)
/// 5. System config (/etc/alphaplan/)
/// 6. Built-in defaults (None)
pub fn resolve_config(cli_path: Option<&Path>) -> ResolvedPath {
    resolve_with(
        cli_path,
        |key| std::env::var_os(key),
        dirs::config_dir(),
        Some(PathBuf::from("/etc")),
    )
}

/// Resolution with injectable environment and base directories.
pub fn resolve_with<F>(
    cli_path: Option<&Path>,
    env: F,
    xdg_config: Option<PathBuf>,
    system_root: Option<PathBuf>,
) -> ResolvedPath
where
    F: Fn(&str) -> Option<OsString>,
{
    if let Some(path) = cli_path {
        return ResolvedPath {
            path: Some(path.to_path_buf()),
            source: ConfigSource::CliArgument,
        };
    }

    let env_nonempty = |key: &str| env(key).filter(|v| !v.is_empty()).map(PathBuf::from);

    if let Some(path) = env_nonempty(ENV_CONFIG_PATH) {
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(dir) = env_nonempty(ENV_CONFIG_DIR) {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::Environment);
        }
    }

    if let Some(xdg) = xdg_config {
        let path = xdg.join(APP_NAME).join(CONFIG_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::XdgConfig);
        }
    }

    if let Some(root) = system_root {
        let path = root.join(APP_NAME).join(CONFIG_FILENAME);
        if path.exists() {
            return found(path, ConfigSource::SystemConfig);
        }
    }

    ResolvedPath::default()
}

fn found(path: PathBuf, source: ConfigSource) -> ResolvedPath {
    ResolvedPath {
        path: Some(path),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn write_config(dir: &Path) -> PathBuf {
        std::fs::create_dir_all(dir).unwrap();
        let path = dir.join(CONFIG_FILENAME);
        std::fs::write(&path, "{}").unwrap();
        path
    }

    fn no_env(_: &str) -> Option<OsString> {
        None
    }

    #[test]
    fn cli_path_wins_even_if_missing() {
        let resolved = resolve_with(Some(Path::new("/nonexistent/a.json")), no_env, None, None);
        assert_eq!(resolved.source, ConfigSource::CliArgument);
        assert_eq!(resolved.path, Some(PathBuf::from("/nonexistent/a.json")));
    }

    #[test]
    fn env_path_beats_xdg() {
        let tmp = TempDir::new().unwrap();
        let env_file = write_config(&tmp.path().join("env"));
        let xdg = tmp.path().join("xdg");
        write_config(&xdg.join(APP_NAME));

        let env: HashMap<&str, OsString> =
            [(ENV_CONFIG_PATH, env_file.clone().into_os_string())].into_iter().collect();
        let resolved = resolve_with(None, |k| env.get(k).cloned(), Some(xdg), None);
        assert_eq!(resolved.source, ConfigSource::Environment);
        assert_eq!(resolved.path, Some(env_file));
    }

    #[test]
    fn config_dir_env_used() {
        let tmp = TempDir::new().unwrap();
        let expected = write_config(tmp.path());
        let env: HashMap<&str, OsString> =
            [(ENV_CONFIG_DIR, tmp.path().as_os_str().to_owned())].into_iter().collect();
        let resolved = resolve_with(None, |k| env.get(k).cloned(), None, None);
        assert_eq!(resolved.path, Some(expected));
        assert_eq!(resolved.source, ConfigSource::Environment);
    }

    #[test]
    fn missing_env_target_falls_through_to_xdg() {
        let tmp = TempDir::new().unwrap();
        let xdg = tmp.path().join("xdg");
        let expected = write_config(&xdg.join(APP_NAME));
        let env: HashMap<&str, OsString> =
            [(ENV_CONFIG_PATH, OsString::from("/nonexistent/alphaplan.json"))]
                .into_iter()
                .collect();
        let resolved = resolve_with(None, |k| env.get(k).cloned(), Some(xdg), None);
        assert_eq!(resolved.source, ConfigSource::XdgConfig);
        assert_eq!(resolved.path, Some(expected));
    }

    #[test]
    fn system_config_found() {
        let tmp = TempDir::new().unwrap();
        let expected = write_config(&tmp.path().join(APP_NAME));
        let resolved = resolve_with(None, no_env, None, Some(tmp.path().to_path_buf()));
        assert_eq!(resolved.source, ConfigSource::SystemConfig);
        assert_eq!(resolved.path, Some(expected));
    }

    #[test]
    fn nothing_found_is_builtin_default() {
        let tmp = TempDir::new().unwrap();
        let resolved = resolve_with(
            None,
            no_env,
            Some(tmp.path().join("xdg")),
            Some(tmp.path().join("etc")),
        );
        assert_eq!(resolved, ResolvedPath::default());
        assert_eq!(resolved.source.to_string(), "builtin default");
    }
}
