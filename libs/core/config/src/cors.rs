use crate::{env_optional, ConfigError, Environment, FromEnv};

/// Allowed browser origins for cross-origin requests.
///
/// An empty list means "allow any origin", which is only accepted outside
/// production.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

impl CorsConfig {
    pub fn permissive() -> Self {
        Self::default()
    }

    pub fn is_permissive(&self) -> bool {
        self.allowed_origins.is_empty()
    }
}

impl FromEnv for CorsConfig {
    /// Reads the comma-separated `CORS_ALLOWED_ORIGIN` list.
    ///
    /// Required when `APP_ENV=production`.
    fn from_env() -> Result<Self, ConfigError> {
        let allowed_origins: Vec<String> = env_optional("CORS_ALLOWED_ORIGIN")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if allowed_origins.is_empty() && Environment::from_env().is_production() {
            return Err(ConfigError::MissingEnvVar("CORS_ALLOWED_ORIGIN".to_string()));
        }

        Ok(Self { allowed_origins })
    }
}
