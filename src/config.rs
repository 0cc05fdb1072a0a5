use anyhow::{anyhow, Context};

/// Process configuration, read once at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub frontend_url: Option<String>,
    pub db: DbConfig,
}

#[derive(Clone, Debug)]
pub struct DbConfig {
    pub url: Option<String>,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn require_url(&self) -> anyhow::Result<&str> {
        self.url
            .as_deref()
            .ok_or_else(|| anyhow!("DATABASE_URL must be set for postgres-store"))
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let port = match get("PORT") {
            Some(v) => v.parse().with_context(|| format!("PORT is not a valid port: {v}"))?,
            None => 3000,
        };
        // one connection is the single shared session; raising it is an explicit opt-in
        let max_connections = match get("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse()
                .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {v}"))?,
            None => 1,
        };
        if max_connections == 0 {
            return Err(anyhow!("DB_MAX_CONNECTIONS must be at least 1"));
        }
        Ok(Self {
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            frontend_url: get("FRONTEND_URL").filter(|v| !v.is_empty()),
            db: DbConfig { url: get("DATABASE_URL"), max_connections },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.db.max_connections, 1);
        assert!(cfg.db.require_url().is_err());
        assert!(cfg.frontend_url.is_none());
    }

    #[test]
    fn values_are_read_and_validated() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("PORT", "8081"),
            ("DATABASE_URL", "postgres://localhost:5432/phenomena-dev"),
            ("FRONTEND_URL", "http://localhost:5173"),
        ]))
        .unwrap();
        assert_eq!(cfg.port, 8081);
        assert_eq!(cfg.db.require_url().unwrap(), "postgres://localhost:5432/phenomena-dev");
        assert_eq!(cfg.frontend_url.as_deref(), Some("http://localhost:5173"));

        assert!(AppConfig::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(AppConfig::from_lookup(lookup(&[("DB_MAX_CONNECTIONS", "0")])).is_err());
    }
}
