use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable overriding the catalog location.
pub const FOODS_ENV: &str = "NUTRITER_FOODS";

pub struct Config {
    pub db_path: PathBuf,
    pub foods_path: PathBuf,
}

impl Config {
    pub fn load(foods_override: Option<PathBuf>) -> Result<Self> {
        let proj_dirs =
            ProjectDirs::from("", "", "nutriter").context("Could not determine home directory")?;

        let data_dir = proj_dirs.data_dir().to_path_buf();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let db_path = data_dir.join("nutriter.db");
        let foods_path =
            resolve_foods_path(&data_dir, foods_override, std::env::var_os(FOODS_ENV));

        Ok(Config {
            db_path,
            foods_path,
        })
    }
}

/// `--foods` wins over `NUTRITER_FOODS`, which wins over `foods.json` in the
/// data directory.
fn resolve_foods_path(
    data_dir: &Path,
    flag: Option<PathBuf>,
    env: Option<OsString>,
) -> PathBuf {
    flag.or_else(|| env.filter(|v| !v.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| data_dir.join("foods.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foods_path_defaults_to_data_dir() {
        let path = resolve_foods_path(Path::new("/data"), None, None);
        assert_eq!(path, PathBuf::from("/data/foods.json"));
    }

    #[test]
    fn test_foods_path_env_override() {
        let path = resolve_foods_path(
            Path::new("/data"),
            None,
            Some(OsString::from("/etc/foods.json")),
        );
        assert_eq!(path, PathBuf::from("/etc/foods.json"));

        let path = resolve_foods_path(Path::new("/data"), None, Some(OsString::new()));
        assert_eq!(path, PathBuf::from("/data/foods.json"));
    }

    #[test]
    fn test_foods_path_flag_wins() {
        let path = resolve_foods_path(
            Path::new("/data"),
            Some(PathBuf::from("mine.json")),
            Some(OsString::from("/etc/foods.json")),
        );
        assert_eq!(path, PathBuf::from("mine.json"));
    }
}
