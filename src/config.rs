use anyhow::Context;

const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_LOG_FILE_PATH: &str = "logs/leadership_pulse.log";

/// Process settings read from the environment (after `.env` is loaded).
#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub log_file_path: String,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let max_connections = match lookup("DATABASE_MAX_CONNECTIONS") {
            Some(value) => value
                .parse()
                .with_context(|| format!("DATABASE_MAX_CONNECTIONS must be a number, got `{value}`"))?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            database_url: lookup("DATABASE_URL").filter(|url| !url.trim().is_empty()),
            max_connections,
            log_file_path: lookup("LOG_FILE_PATH")
                .unwrap_or_else(|| DEFAULT_LOG_FILE_PATH.to_string()),
        })
    }

    pub fn require_database_url(&self) -> anyhow::Result<&str> {
        self.database_url
            .as_deref()
            .context("DATABASE_URL must be set to a Postgres instance (or pass --csv)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let settings = settings(&[]).unwrap();
        assert!(settings.database_url.is_none());
        assert_eq!(settings.max_connections, 5);
        assert_eq!(settings.log_file_path, "logs/leadership_pulse.log");
        assert!(settings.require_database_url().is_err());
    }

    #[test]
    fn values_are_read_from_environment() {
        let settings = settings(&[
            ("DATABASE_URL", "postgres://pulse@localhost/pulse"),
            ("DATABASE_MAX_CONNECTIONS", "12"),
            ("LOG_FILE_PATH", "/var/log/pulse.log"),
        ])
        .unwrap();
        assert_eq!(
            settings.require_database_url().unwrap(),
            "postgres://pulse@localhost/pulse"
        );
        assert_eq!(settings.max_connections, 12);
        assert_eq!(settings.log_file_path, "/var/log/pulse.log");
    }

    #[test]
    fn bad_connection_count_is_rejected() {
        assert!(settings(&[("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
    }
}
