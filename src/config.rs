use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialDatabaseConfig {
    url: Option<String>,
    max_connections: Option<u32>,
}

fn default_max_connections() -> u32 {
    10
}

impl DatabaseConfig {
    /// Loads the database configuration, layering an optional TOML file under
    /// environment variables (`DATABASE_URL`, `DB_MAX_CONNECTIONS`).
    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialDatabaseConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialDatabaseConfig::default()
            }
        } else {
            PartialDatabaseConfig::default()
        };

        // 2. Environment overrides file
        let env_url = env::var("DATABASE_URL").ok();
        let env_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .map(|v| {
                v.parse::<u32>()
                    .map_err(|e| format!("DB_MAX_CONNECTIONS is not a number: {e}"))
            })
            .transpose()?;

        let final_config = DatabaseConfig {
            url: env_url
                .or(file_config.url)
                .ok_or("DATABASE_URL is required")?,
            max_connections: env_max_connections
                .or(file_config.max_connections)
                .unwrap_or_else(default_max_connections),
        };

        Ok(final_config)
    }
}
