use heroes_demo::{heroes_schema, Hero, Item};
use sheetbake::{BakeConfig, BakeError, DataStore, RuntimeError};
use thiserror::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Error, Debug)]
enum DemoError {
    #[error("config error: {0}")]
    Config(#[from] sheetbake::config::ConfigError),
    #[error(transparent)]
    Bake(#[from] BakeError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

#[tokio::main]
async fn main() -> Result<(), DemoError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "demos/heroes/config/heroes".to_string());
    let config = BakeConfig::load(&path)?;
    let baker = config.baker(heroes_schema())?;

    let output = baker.bake_async().await?;
    let report = &output.report;
    info!(
        sheets = report.sheets.len(),
        skipped = report.skipped.len(),
        rows = report.rows(),
        unresolved = report.reference_errors().count(),
        elapsed = ?report.elapsed(),
        "bake finished"
    );

    let mut store = DataStore::new();
    store.initialize(baker.load()?)?;
    let heroes = store.table::<Hero>("Heroes")?;
    for hero in heroes.rows() {
        let weapon = store.resolve(&hero.weapon);
        match weapon.into_option() {
            Some(item) => info!(hero = %hero.name, weapon = %item.name, rarity = ?item.rarity, multipliers = hero.multipliers.len(), "hero"),
            None => warn!(hero = %hero.name, weapon = hero.weapon.key(), "hero without weapon"),
        }
    }

    let arthas = heroes.get_by_id_ref(&1).value_ref()?;
    let portrait = arthas.portrait.handle().map(|h| h.location.as_str()).unwrap_or("<missing>");
    info!(hero = %arthas.name, portrait, "first hero");
    if let Some(items) = store.try_get_table::<Item>() {
        info!(items = items.len(), "items loaded");
    }
    Ok(())
}
