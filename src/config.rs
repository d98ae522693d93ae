use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::models::TableRef;
use crate::query::{SpatialPredicateBuilder, DEFAULT_RADIUS_METERS};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Table holding the searched entities
    pub target: TableRef,
    /// Table holding the searching entities, for id-scoped queries
    #[serde(default)]
    pub source: Option<TableRef>,
    #[serde(default)]
    pub search: SearchConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    /// Radius in meters when a request does not give one
    pub default_radius_m: f64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_radius_m: DEFAULT_RADIUS_METERS,
        }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;
        if config.target.table.is_empty() {
            anyhow::bail!("[target] table must be set");
        }
        Ok(config)
    }

    /// Predicate builder for the configured target table
    pub fn builder(&self) -> SpatialPredicateBuilder {
        SpatialPredicateBuilder::new(self.target.clone())
            .with_default_radius(self.search.default_radius_m)
    }

    /// Source table, falling back to the target table
    pub fn source_table(&self) -> &TableRef {
        self.source.as_ref().unwrap_or(&self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config() {
        let config = Config::from_toml("[target]\ntable = \"places\"\n").unwrap();
        assert_eq!(config.target, TableRef::new("places"));
        assert_eq!(config.search.default_radius_m, 10_000.0);
        assert_eq!(config.source_table().table, "places");
        assert_eq!(config.builder().default_radius(), 10_000.0);
    }

    #[test]
    fn test_full_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("geoscope.toml");
        fs::write(
            &path,
            r#"
[target]
table = "pois"
id_column = "poi_id"
point_column = "location"

[source]
table = "regions"
shape_column = "boundary"

[search]
default_radius_m = 2500.0
"#,
        )
        .unwrap();

        let config = Config::load_from_file(&path).unwrap();
        assert_eq!(config.target.id_column, "poi_id");
        assert_eq!(config.target.point_column, "location");
        assert_eq!(config.target.shape_column, "geog_shape");
        assert_eq!(config.source_table().shape_column, "boundary");
        assert_eq!(config.builder().target().table, "pois");
        assert_eq!(config.builder().default_radius(), 2500.0);
    }

    #[test]
    fn test_missing_target_table_rejected() {
        assert!(Config::from_toml("[target]\nid_column = \"id\"\n").is_err());
        assert!(Config::from_toml("[search]\ndefault_radius_m = 1.0\n").is_err());
    }
}
