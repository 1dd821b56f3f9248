use crate::{env_or_default, ConfigError, FromEnv};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Origins allowed to call the API from a browser.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_origins: origins.into_iter().map(Into::into).collect(),
        }
    }

    fn parse(raw: &str) -> Result<Self, ConfigError> {
        let config = Self::new(
            raw.split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty()),
        );

        if config.allowed_origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "at least one origin is required".to_string(),
            });
        }

        Ok(config)
    }
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self::new([DEFAULT_ALLOWED_ORIGIN])
    }
}

impl FromEnv for CorsConfig {
    /// `CORS_ALLOWED_ORIGIN` is a comma-separated list, e.g.
    /// `http://localhost:3000,https://app.example.com`.
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&env_or_default("CORS_ALLOWED_ORIGIN", DEFAULT_ALLOWED_ORIGIN))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_default_origin() {
        temp_env::with_var_unset("CORS_ALLOWED_ORIGIN", || {
            let config = CorsConfig::from_env().unwrap();
            assert_eq!(config.allowed_origins, vec!["http://localhost:3000"]);
        });
    }

    #[test]
    fn test_cors_comma_separated_origins_are_trimmed() {
        temp_env::with_var(
            "CORS_ALLOWED_ORIGIN",
            Some(" http://localhost:3000 , https://app.example.com,"),
            || {
                let config = CorsConfig::from_env().unwrap();
                assert_eq!(
                    config.allowed_origins,
                    vec!["http://localhost:3000", "https://app.example.com"]
                );
            },
        );
    }

    #[test]
    fn test_cors_blank_value_is_rejected() {
        temp_env::with_var("CORS_ALLOWED_ORIGIN", Some(" , "), || {
            let err = CorsConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("CORS_ALLOWED_ORIGIN"));
        });
    }
}
