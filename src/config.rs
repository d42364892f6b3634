use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LineageConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    pub cache_ttl_secs: Option<u64>,
    pub cache_capacity: Option<usize>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("lineagedb.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".lineagedb").join("lineage.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<LineageConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: LineageConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &LineageConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineagedb.toml");

        let config = LineageConfig {
            database: Some("lineage.db".into()),
            port: Some(3900),
            cache_ttl_secs: Some(120),
            cache_capacity: None,
        };
        write_config(&path, &config, false).unwrap();

        let loaded = load_config(Some(&path)).unwrap().unwrap();
        assert_eq!(loaded.database.as_deref(), Some("lineage.db"));
        assert_eq!(loaded.port, Some(3900));
        assert_eq!(loaded.cache_ttl_secs, Some(120));
        assert_eq!(loaded.cache_capacity, None);
    }

    #[test]
    fn test_write_refuses_overwrite_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lineagedb.toml");

        write_config(&path, &LineageConfig::default(), false).unwrap();
        assert!(write_config(&path, &LineageConfig::default(), false).is_err());
        assert!(write_config(&path, &LineageConfig::default(), true).is_ok());
    }

    #[test]
    fn test_load_missing_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        assert!(load_config(Some(&path)).unwrap().is_none());
    }
}
