use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use crate::plan::SupplementPlan;
use crate::storage::{FileKvStore, InMemoryKvStore, KvStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    File(PathBuf),
}

impl StoreBackend {
    fn from_env(raw: &str, path: PathBuf) -> Result<Self> {
        match raw.to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Self::Memory),
            "file" | "json" => Ok(Self::File(path)),
            _ => Err(anyhow::anyhow!("STORE_BACKEND must be one of: memory, file")),
        }
    }

    pub fn open(&self) -> Result<Arc<dyn KvStore>> {
        Ok(match self {
            Self::Memory => Arc::new(InMemoryKvStore::new()),
            Self::File(path) => Arc::new(
                FileKvStore::open(path)
                    .with_context(|| format!("failed to open store at {}", path.display()))?,
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub plan: SupplementPlan,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .context("APP_PORT must be a valid u16")?;

        let store_path = PathBuf::from(
            env::var("STORE_PATH").unwrap_or_else(|_| "data/store.json".to_string()),
        );
        let store_backend = StoreBackend::from_env(
            &env::var("STORE_BACKEND").unwrap_or_else(|_| "memory".to_string()),
            store_path,
        )?;

        let plan = match env::var("SUPPLEMENT_PLAN_PATH") {
            Ok(path) => SupplementPlan::load(&path)
                .with_context(|| format!("failed to load supplement plan from {path}"))?,
            Err(_) => SupplementPlan::builtin(),
        };

        Ok(Self {
            host,
            port,
            store_backend,
            plan,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_names_are_case_insensitive() {
        let path = PathBuf::from("x.json");
        assert_eq!(
            StoreBackend::from_env("MEMORY", path.clone()).unwrap(),
            StoreBackend::Memory
        );
        assert_eq!(
            StoreBackend::from_env("File", path.clone()).unwrap(),
            StoreBackend::File(path.clone())
        );
        assert!(StoreBackend::from_env("redis", path).is_err());
    }
}
