use std::path::PathBuf;
use std::sync::Arc;

use crate::db::SqliteStore;
use crate::error::ConfigError;
use crate::postgrest::PostgrestStore;
use crate::store::SmoothieStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Backend {
    Sqlite { path: String, seed: Option<PathBuf> },
    Remote { url: String, key: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub backend: Backend,
    pub table: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());

        let table = get("SMOOTHIE_TABLE").unwrap_or_else(|| "smoothies".to_string());
        let backend = match get("SMOOTHIE_BACKEND").as_deref() {
            None | Some("sqlite") => Backend::Sqlite {
                path: get("SMOOTHIE_DB").unwrap_or_else(|| ":memory:".to_string()),
                seed: get("SMOOTHIE_SEED").map(PathBuf::from),
            },
            Some("remote") => Backend::Remote {
                url: get("SUPABASE_URL").ok_or(ConfigError::Missing("SUPABASE_URL"))?,
                key: get("SUPABASE_KEY").ok_or(ConfigError::Missing("SUPABASE_KEY"))?,
            },
            Some(other) => {
                return Err(ConfigError::Invalid {
                    var: "SMOOTHIE_BACKEND",
                    value: other.to_string(),
                })
            }
        };
        Ok(Config { backend, table })
    }

    /// Builds the data-service client handed to every handler.
    pub fn open_store(
        &self,
    ) -> Result<Arc<dyn SmoothieStore>, Box<dyn std::error::Error + Send + Sync>> {
        match &self.backend {
            Backend::Sqlite { path, seed } => {
                log::info!("Opening SQLite store at {}", path);
                let store = SqliteStore::open(path, &self.table)?;
                if let Some(seed) = seed {
                    store.seed_from_file(seed)?;
                }
                Ok(Arc::new(store))
            }
            Backend::Remote { url, .. } if !url.starts_with("http") => Err(Box::new(
                ConfigError::Invalid {
                    var: "SUPABASE_URL",
                    value: url.clone(),
                },
            )),
            Backend::Remote { url, key } => {
                log::info!("Using remote data service at {}", url);
                Ok(Arc::new(PostgrestStore::new(url, key, &self.table)?))
            }
        }
    }
}
