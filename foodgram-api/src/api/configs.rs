use rocket::{
    figment::Figment,
    serde::{Deserialize, Serialize},
};

use crate::shopping::RenderOptions;
use crate::validation::Limits;

#[derive(Debug, Deserialize, Serialize)]
#[serde(crate = "rocket::serde", default)]
pub struct Config {
    pub ui_path: Option<String>,
    pub log_dir: Option<String>,
    /// Default page size of paginated listings
    pub page_size: i64,
    pub validation: Limits,
    pub shopping_list: RenderOptions,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ui_path: None,
            log_dir: None,
            page_size: 6,
            validation: Limits::default(),
            shopping_list: RenderOptions::default(),
        }
    }
}

pub fn config_provider() -> Figment {
    use rocket::figment::providers::{Env, Serialized};

    rocket::figment::Figment::from(rocket::Config::default())
        .merge(Serialized::defaults(Config::default()))
        .merge(("databases.main", rocket_db_pools::Config::default()))
        .merge(Env::prefixed("FG_").global())
}

pub fn get_database_url() -> anyhow::Result<String> {
    config_provider()
        .extract_inner("databases.main.url")
        .map_err(|e| anyhow::anyhow!("databases.main.url must be set: {}", e))
}
