use crate::assets::DirectoryAssets;
use crate::bake::artifacts::ArtifactStore;
use crate::bake::Baker;
use crate::container::ContainerSchema;
use crate::error::BakeError;
use crate::source::JsonDirSource;
pub use config::ConfigError;
use config::{Config, Environment, File, Map};
use serde::Deserialize;
use sheetbake_schema::NamingStrategy;
use std::path::PathBuf;
use std::sync::OnceLock;
use tracing::{debug, info};

/// `SHEETBAKE__BAKE__NAMING=snake_case` overrides `bake.naming`.
pub const ENV_PREFIX: &str = "SHEETBAKE";
const ENV_SEPARATOR: &str = "__";

static DOTENV: OnceLock<Option<PathBuf>> = OnceLock::new();

/// The `.env` file picked up by the first load, if any.
pub fn dotenv_path() -> Option<&'static PathBuf> {
    DOTENV.get_or_init(|| dotenv::dotenv().ok()).as_ref()
}

#[derive(Debug, Clone, Deserialize)]
pub struct BakeConfig {
    pub bake: BakeSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BakeSettings {
    /// redb file holding the baked artifacts.
    pub output_path: PathBuf,
    /// Directory of `<sheet>.json` row files.
    pub source_dir: PathBuf,
    pub asset_root: Option<PathBuf>,
    pub naming: NamingStrategy,
    pub allow_pseudo_sheets: bool,
}

impl BakeConfig {
    /// Reads `path` (any format `config` knows, extension optional) under the `SHEETBAKE__*` environment.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        match dotenv_path() {
            Some(env_file) => debug!(env_file = %env_file.display(), "bake config with .env"),
            None => debug!("bake config without .env"),
        }
        Self::load_with_env(path, None)
    }

    /// Like [`BakeConfig::load`] with `env` standing in for the process environment.
    pub fn load_with_env(path: &str, env: Option<Map<String, String>>) -> Result<Self, ConfigError> {
        let config: BakeConfig = Config::builder()
            .set_default("bake.naming", NamingStrategy::default().to_string())?
            .set_default("bake.allow_pseudo_sheets", false)?
            .add_source(File::with_name(path).required(true))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR).try_parsing(true).source(env))
            .build()?
            .try_deserialize()?;
        let bake = &config.bake;
        info!(
            source_dir = %bake.source_dir.display(),
            output_path = %bake.output_path.display(),
            naming = %bake.naming,
            allow_pseudo_sheets = bake.allow_pseudo_sheets,
            "bake config loaded"
        );
        Ok(config)
    }

    /// A baker over the configured directories. Settings override the schema's naming and pseudo sheet policy.
    pub fn baker(&self, schema: ContainerSchema) -> Result<Baker, BakeError> {
        let settings = &self.bake;
        let schema = schema.naming(settings.naming).allow_pseudo(settings.allow_pseudo_sheets);
        let store = ArtifactStore::open(&settings.output_path)?;
        let baker = Baker::new(schema, JsonDirSource::new(&settings.source_dir), store);
        Ok(match &settings.asset_root {
            Some(root) => baker.with_assets(DirectoryAssets::new(root)),
            None => baker,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(body: &str) -> (PathBuf, String) {
        let dir = std::env::temp_dir().join("sheetbake").join(format!("config_{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("bake.toml");
        std::fs::write(&path, body).unwrap();
        let path = path.to_str().unwrap().to_string();
        (dir, path)
    }

    #[test]
    fn reads_file_and_defaults() {
        let (dir, path) = write_config("[bake]\noutput_path = \"out/data.redb\"\nsource_dir = \"sheets\"\n");

        let config = BakeConfig::load_with_env(&path, Some(Map::new())).unwrap();
        assert_eq!(config.bake.output_path, PathBuf::from("out/data.redb"));
        assert_eq!(config.bake.naming, NamingStrategy::PascalCase);
        assert!(!config.bake.allow_pseudo_sheets);
        assert_eq!(config.bake.asset_root, None);
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn environment_overrides_the_file() {
        let (dir, path) = write_config("[bake]\noutput_path = \"out/data.redb\"\nsource_dir = \"sheets\"\nnaming = \"camelCase\"\n");
        let env = Map::from([
            ("SHEETBAKE__BAKE__NAMING".to_string(), "snake_case".to_string()),
            ("SHEETBAKE__BAKE__ALLOW_PSEUDO_SHEETS".to_string(), "true".to_string()),
            ("SHEETBAKE__BAKE__ASSET_ROOT".to_string(), "assets".to_string()),
            ("OTHER__BAKE__NAMING".to_string(), "kebab-case".to_string()),
        ]);

        let config = BakeConfig::load_with_env(&path, Some(env)).unwrap();
        assert_eq!(config.bake.naming, NamingStrategy::SnakeCase);
        assert!(config.bake.allow_pseudo_sheets);
        assert_eq!(config.bake.asset_root, Some(PathBuf::from("assets")));
        assert_eq!(config.bake.source_dir, PathBuf::from("sheets"));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(BakeConfig::load("/nonexistent/sheetbake/bake").is_err());
    }
}
