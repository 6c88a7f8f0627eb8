use std::env;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use serde::Serialize;

pub const DEFAULT_API_URL: &str = "http://localhost:8080";
pub const DEFAULT_TIMEOUT: u64 = 10;

pub const ENV_API_URL: &str = "CAMPUSDIR_API_URL";
pub const ENV_SLUG: &str = "CAMPUSDIR_SLUG";
pub const ENV_HOME: &str = "CAMPUSDIR_HOME";

#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    #[serde(alias = "base_url")]
    pub api_url: Option<String>,
    #[serde(alias = "tenant")]
    pub slug: Option<String>,
    pub timeout: Option<u64>,
    pub output_format: Option<String>,
    pub no_color: Option<bool>,
    pub user_id: Option<i64>,
    pub cookie: Option<String>,
}

impl ConfigFile {
    /// Environment values win over the file; empty variables are ignored.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        if let Some(url) = read(ENV_API_URL) {
            self.api_url = Some(url);
        }
        if let Some(slug) = read(ENV_SLUG) {
            self.slug = Some(slug);
        }
        self
    }
}

/// The first non-empty of `CAMPUSDIR_HOME`, `HOME` and `USERPROFILE`.
fn home_from<F>(lookup: F) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    [ENV_HOME, "HOME", "USERPROFILE"]
        .into_iter()
        .filter_map(|key| lookup(key))
        .find(|v| !v.trim().is_empty())
        .map(PathBuf::from)
}

fn home_dir() -> Option<PathBuf> {
    home_from(|key| env::var(key).ok())
}

pub fn default_config_path() -> Option<PathBuf> {
    Some(home_dir()?.join(".campusdir").join("config.yml"))
}

fn expand_tilde_with(path: &str, home: Option<PathBuf>) -> PathBuf {
    let rest = match path.strip_prefix('~') {
        Some("") => "",
        Some(rest) if rest.starts_with(['/', '\\']) => &rest[1..],
        _ => return PathBuf::from(path),
    };
    match home {
        Some(home) if rest.is_empty() => home,
        Some(home) => home.join(rest),
        None => PathBuf::from(path),
    }
}

/// Resolves a leading `~` against the home directory. `~user` is left alone.
pub fn expand_tilde(path: &str) -> PathBuf {
    expand_tilde_with(path, home_dir())
}

/// Reads the YAML file at `path`. A blank file is an empty config; a missing
/// one is too when `allow_missing` is set.
pub fn load_config(path: &Path, allow_missing: bool) -> Result<ConfigFile, String> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            if allow_missing {
                return Ok(ConfigFile::default());
            }
            return Err(format!("config file not found '{}'", path.display()));
        }
        Err(e) => return Err(format!("failed to read config '{}': {e}", path.display())),
    };
    if contents.trim().is_empty() {
        return Ok(ConfigFile::default());
    }
    serde_yaml::from_str(&contents)
        .map_err(|e| format!("failed to parse config '{}': {e}", path.display()))
}

fn default_config_yaml() -> String {
    format!(
        r#"# campusdir config
#
# Location (default):
#   ~/.campusdir/config.yml
#
# Environment overrides: {ENV_API_URL}, {ENV_SLUG}
# {ENV_HOME} moves the default location off $HOME

# Connection
api_url: {DEFAULT_API_URL}
# slug: acme
timeout: {DEFAULT_TIMEOUT}

# Session cookie sent with every request (optional)
# cookie: "session=..."

# Act as this user when no session is available (optional)
# user_id: 12

# Output
output_format: text
no_color: false
"#
    )
}

/// Writes the default file unless one exists. Returns whether it wrote.
pub fn ensure_default_config_file(path: &Path) -> Result<bool, String> {
    if path.exists() {
        return Ok(false);
    }
    let parent = path
        .parent()
        .ok_or_else(|| format!("invalid config path '{}'", path.display()))?;
    std::fs::create_dir_all(parent).map_err(|e| {
        format!(
            "failed to create config directory '{}': {e}",
            parent.display()
        )
    })?;
    std::fs::write(path, default_config_yaml())
        .map_err(|e| format!("failed to write config file '{}': {e}", path.display()))?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup<'a>(vars: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |key| {
            vars.iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn home_prefers_the_override_and_skips_blank_values() {
        let vars = [(ENV_HOME, "/srv/cd"), ("HOME", "/home/ann")];
        assert_eq!(home_from(lookup(&vars)), Some(PathBuf::from("/srv/cd")));
        let vars = [(ENV_HOME, " "), ("HOME", ""), ("USERPROFILE", "C:\\Users\\ann")];
        assert_eq!(
            home_from(lookup(&vars)),
            Some(PathBuf::from("C:\\Users\\ann"))
        );
        assert_eq!(home_from(lookup(&[])), None);
    }

    #[test]
    fn tilde_expands_only_as_a_home_prefix() {
        let home = || Some(PathBuf::from("/home/ann"));
        assert_eq!(expand_tilde_with("~", home()), PathBuf::from("/home/ann"));
        assert_eq!(
            expand_tilde_with("~/cd/config.yml", home()),
            PathBuf::from("/home/ann/cd/config.yml")
        );
        assert_eq!(expand_tilde_with("~bo/x.yml", home()), PathBuf::from("~bo/x.yml"));
        assert_eq!(expand_tilde_with("plain/path", home()), PathBuf::from("plain/path"));
        assert_eq!(expand_tilde_with("~/x.yml", None), PathBuf::from("~/x.yml"));
    }

    #[test]
    fn missing_file_is_allowed_only_when_asked() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nope.yml");
        assert_eq!(load_config(&path, true).unwrap(), ConfigFile::default());
        assert!(load_config(&path, false).unwrap_err().contains("not found"));
    }

    #[test]
    fn parses_keys_and_aliases() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(
            &path,
            "base_url: http://school.test\ntenant: acme\ntimeout: 3\nuser_id: 7\n",
        )
        .unwrap();
        let cfg = load_config(&path, false).unwrap();
        assert_eq!(cfg.api_url.as_deref(), Some("http://school.test"));
        assert_eq!(cfg.slug.as_deref(), Some("acme"));
        assert_eq!(cfg.timeout, Some(3));
        assert_eq!(cfg.user_id, Some(7));
    }

    #[test]
    fn reports_parse_errors_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yml");
        std::fs::write(&path, "timeout: [not, a, number]\n").unwrap();
        let err = load_config(&path, false).unwrap_err();
        assert!(err.contains("failed to parse config"));
    }

    #[test]
    fn default_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yml");
        assert!(ensure_default_config_file(&path).unwrap());
        assert!(!ensure_default_config_file(&path).unwrap());
        let cfg = load_config(&path, false).unwrap();
        assert_eq!(cfg.api_url.as_deref(), Some(DEFAULT_API_URL));
        assert_eq!(cfg.timeout, Some(DEFAULT_TIMEOUT));
        assert_eq!(cfg.slug, None);
    }

    #[test]
    fn env_overrides_file_values() {
        let cfg = ConfigFile {
            api_url: Some("http://file".to_string()),
            slug: Some("file-slug".to_string()),
            ..ConfigFile::default()
        };
        let cfg = cfg.with_env(|key| match key {
            ENV_SLUG => Some("env-slug".to_string()),
            ENV_API_URL => Some("  ".to_string()),
            _ => None,
        });
        assert_eq!(cfg.slug.as_deref(), Some("env-slug"));
        assert_eq!(cfg.api_url.as_deref(), Some("http://file"));
    }
}
