/// Platform-specific location of the release-digest config file
///
/// Follows the XDG Base Directory specification on Unix-like systems.
use std::path::PathBuf;

/// Directory name used under the platform config directory
pub const APP_DIR_NAME: &str = "release-digest";

/// Platform-agnostic path utilities
pub struct PlatformPaths;

impl PlatformPaths {
    /// Get the appropriate config directory for the current platform
    ///
    /// - Windows: %APPDATA%
    /// - macOS: ~/Library/Application Support
    /// - Linux/Unix: $XDG_CONFIG_HOME or ~/.config
    pub fn config_dir() -> PathBuf {
        Self::config_dir_from(|name| std::env::var(name).ok())
    }

    /// Resolve the config directory with an arbitrary variable lookup
    pub fn config_dir_from<F>(lookup: F) -> PathBuf
    where
        F: Fn(&str) -> Option<String>,
    {
        let home = || lookup("HOME").map(PathBuf::from);

        let dir = if cfg!(target_os = "windows") {
            lookup("APPDATA").map(PathBuf::from)
        } else if cfg!(target_os = "macos") {
            home().map(|h| h.join("Library/Application Support"))
        } else {
            lookup("XDG_CONFIG_HOME")
                .filter(|v| !v.is_empty())
                .map(PathBuf::from)
                .or_else(|| home().map(|h| h.join(".config")))
        };

        dir.unwrap_or_else(|| PathBuf::from("."))
    }

    /// Get the default config file path
    ///
    /// Returns: {config_dir}/release-digest/config.toml
    pub fn default_config_path() -> PathBuf {
        Self::config_dir().join(APP_DIR_NAME).join("config.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_path() {
        let path = PlatformPaths::default_config_path();
        assert!(path.to_string_lossy().contains(APP_DIR_NAME));
        assert!(path.ends_with("config.toml"));
    }

    #[test]
    fn test_config_dir_without_any_variables() {
        let dir = PlatformPaths::config_dir_from(|_| None);
        assert_eq!(dir, PathBuf::from("."));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_config_dir_prefers_xdg() {
        let dir = PlatformPaths::config_dir_from(|name| match name {
            "XDG_CONFIG_HOME" => Some("/tmp/xdg".to_string()),
            "HOME" => Some("/home/user".to_string()),
            _ => None,
        });
        assert_eq!(dir, PathBuf::from("/tmp/xdg"));
    }

    #[cfg(all(unix, not(target_os = "macos")))]
    #[test]
    fn test_config_dir_falls_back_to_home() {
        let dir = PlatformPaths::config_dir_from(|name| match name {
            "XDG_CONFIG_HOME" => Some(String::new()),
            "HOME" => Some("/home/user".to_string()),
            _ => None,
        });
        assert_eq!(dir, PathBuf::from("/home/user/.config"));
    }
}
