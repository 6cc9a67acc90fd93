use crate::{env_required, ConfigError, FromEnv};

/// Browser origins allowed to call the API.
///
/// Loaded from `CORS_ALLOWED_ORIGIN`, a comma-separated list. The variable is
/// required so a deployment never silently falls back to "allow everything".
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

    /// Parse a comma-separated origin list, dropping blanks and trailing slashes.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let allowed_origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim().trim_end_matches('/'))
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if allowed_origins.is_empty() {
            return Err(ConfigError::ParseError {
                key: "CORS_ALLOWED_ORIGIN".to_string(),
                details: "at least one origin is required".to_string(),
            });
        }

        Ok(Self { allowed_origins })
    }
}

impl FromEnv for CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Self::parse(&env_required("CORS_ALLOWED_ORIGIN")?)
    }
}
