use std::env;

use crate::error::ConfigError;

pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;

/// Service settings, read from `TRIPSPLIT_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    /// Allowed browser origin. Any origin is accepted when unset.
    pub cors_origin: Option<String>,
    /// Start with the demo trip loaded.
    pub seed_sample_data: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            port: DEFAULT_PORT,
            cors_origin: None,
            seed_sample_data: true,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from an arbitrary variable source. Blank values count
    /// as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Config::default();

        if let Some(bind) = get("TRIPSPLIT_BIND") {
            config.bind = bind;
        }
        if let Some(port) = get("TRIPSPLIT_PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidEnv {
                name: "TRIPSPLIT_PORT",
                value: port.clone(),
                expected: "a port number between 0 and 65535",
            })?;
        }
        config.cors_origin = get("TRIPSPLIT_CORS_ORIGIN");
        if let Some(seed) = get("TRIPSPLIT_SEED") {
            config.seed_sample_data = match seed.as_str() {
                "1" | "true" => true,
                "0" | "false" => false,
                _ => {
                    return Err(ConfigError::InvalidEnv {
                        name: "TRIPSPLIT_SEED",
                        value: seed,
                        expected: "1 or 0",
                    })
                }
            };
        }
        Ok(config)
    }
}
