//! Configuration for Products API

use core_config::{app_info, env_or_default, server::ServerConfig, AppInfo, FromEnv};
use database::mongodb::MongoConfig;
use std::path::PathBuf;

pub use core_config::Environment;

/// Default directory for uploaded images, relative to the working directory
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub mongodb: MongoConfig,
    pub server: ServerConfig,
    pub environment: Environment,
    /// Where accepted images are written and served from
    pub upload_dir: PathBuf,
    /// Origin used in the link descriptors returned to clients
    pub public_base_url: String,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let mongodb = MongoConfig::from_env()?;
        let server = ServerConfig::from_env()?;

        let upload_dir = PathBuf::from(env_or_default("UPLOAD_DIR", DEFAULT_UPLOAD_DIR));
        let public_base_url = env_or_default("PUBLIC_BASE_URL", &server.local_url())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            app: app_info!(),
            mongodb,
            server,
            environment,
            upload_dir,
            public_base_url,
        })
    }

    /// Base URL of the products collection, e.g. `http://localhost:8080/api/products`
    pub fn products_url(&self) -> String {
        format!("{}/api/products", self.public_base_url)
    }
}
