use serde::Deserialize;

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Directory holding `ratings.dat`, `movies.dat` and `users.dat`
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory the CSV snapshots are written to
    #[serde(default = "default_export_dir")]
    pub export_dir: String,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Collaborative weight used by the hybrid blend when a request omits it
    #[serde(default = "default_alpha")]
    pub default_alpha: f64,

    /// Neighbor count for collaborative filtering
    #[serde(default = "default_neighbors")]
    pub default_neighbors: usize,

    /// Result count for recommendations and similar-movie lookups
    #[serde(default = "default_results")]
    pub default_results: usize,

    /// Write the CSV snapshots once the first model is built
    #[serde(default)]
    pub export_on_load: bool,

    /// Build the model at startup rather than on the first request
    #[serde(default = "default_preload")]
    pub preload: bool,
}

fn default_data_dir() -> String {
    "data".to_string()
}

fn default_export_dir() -> String {
    "export".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_alpha() -> f64 {
    0.6
}

fn default_neighbors() -> usize {
    5
}

fn default_results() -> usize {
    15
}

fn default_preload() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            export_dir: default_export_dir(),
            host: default_host(),
            port: default_port(),
            default_alpha: default_alpha(),
            default_neighbors: default_neighbors(),
            default_results: default_results(),
            export_on_load: false,
            preload: default_preload(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let config = envy::from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

        if !(0.0..=1.0).contains(&config.default_alpha) {
            anyhow::bail!(
                "DEFAULT_ALPHA must be within [0, 1], got {}",
                config.default_alpha
            );
        }

        Ok(config)
    }

    /// Address the server binds to
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_env() {
        let config: Config = envy::from_iter(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(config.data_dir, "data");
        assert_eq!(config.export_dir, "export");
        assert_eq!(config.port, 3000);
        assert_eq!(config.default_alpha, 0.6);
        assert_eq!(config.default_neighbors, 5);
        assert_eq!(config.default_results, 15);
        assert!(!config.export_on_load);
        assert!(config.preload);
    }

    #[test]
    fn test_overrides_from_env() {
        let vars = vec![
            ("DATA_DIR".to_string(), "/srv/movielens".to_string()),
            ("DEFAULT_ALPHA".to_string(), "0.25".to_string()),
            ("EXPORT_ON_LOAD".to_string(), "true".to_string()),
            ("PORT".to_string(), "8080".to_string()),
        ];
        let config: Config = envy::from_iter(vars).unwrap();
        assert_eq!(config.data_dir, "/srv/movielens");
        assert_eq!(config.default_alpha, 0.25);
        assert!(config.export_on_load);
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }
}
