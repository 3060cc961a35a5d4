use cached::proc_macro::cached;
use config::{Config, File, FileFormat};
use futures_locks::RwLock;
use once_cell::sync::Lazy;
use serde::Deserialize;

static CONFIG_BUILDER: Lazy<RwLock<Config>> = Lazy::new(|| {
    RwLock::new({
        let mut builder = Config::builder().add_source(File::from_str(
            include_str!("../Evently.toml"),
            FileFormat::Toml,
        ));

        if std::path::Path::new("Evently.toml").exists() {
            builder = builder.add_source(File::new("Evently.toml", FileFormat::Toml));
        }

        builder
            .build()
            .expect("Configuration sources should be valid TOML")
    })
});

#[derive(Deserialize, Debug, Clone)]
pub struct Database {
    pub mongodb: String,
    pub name: String,
}

#[derive(Deserialize, Debug, Clone)]
pub struct Settings {
    pub database: Database,
}

/// Configure logging and common Rust variables
pub fn setup_logging() {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }

    pretty_env_logger::try_init().ok();
}

pub async fn init() {
    log::info!(":: Evently Configuration ::\n{:?}", config().await);
}

pub async fn read() -> Config {
    CONFIG_BUILDER.read().await.clone()
}

#[cached(time = 30)]
pub async fn config() -> Settings {
    read()
        .await
        .try_deserialize::<Settings>()
        .expect("Configuration should match the settings schema")
}
