//! Application configuration loaded from environment variables.
//!
//! Cloud Run injects secrets (Resend, Firebase web API key) as environment
//! variables through secret bindings, so everything is read once at startup.

use std::env;

/// Deployment environment. Gates email dry-run and the dev sign-in path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Test,
    Production,
}

impl AppEnv {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Ok(AppEnv::Development),
            "test" => Ok(AppEnv::Test),
            "production" | "prod" => Ok(AppEnv::Production),
            _ => Err(ConfigError::Invalid("APP_ENV", raw.to_string())),
        }
    }

    pub fn is_production(self) -> bool {
        self == AppEnv::Production
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// GCP project ID (also the Firebase project the ID tokens are issued for)
    pub gcp_project_id: String,
    /// Public site base URL, used for invitation links and CORS
    pub site_url: String,
    /// Public URL of this API (OIDC audience for scheduler calls)
    pub api_url: String,
    /// Server port
    pub port: u16,
    pub app_env: AppEnv,

    /// Resend API key; invitations cannot be sent without it
    pub resend_api_key: Option<String>,
    /// Sender address for transactional email
    pub email_from: String,

    /// Firebase web API key, only needed for the development sign-in
    pub firebase_api_key: Option<String>,
    pub seed_user_email: String,
    pub seed_user_password: String,

    /// Service account Cloud Scheduler uses to call `/functions/*`
    pub scheduler_service_account: String,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            gcp_project_id: "test-project".to_string(),
            site_url: "http://localhost:3000".to_string(),
            api_url: "http://localhost:8080".to_string(),
            port: 8080,
            app_env: AppEnv::Test,
            resend_api_key: Some("re_test_key".to_string()),
            email_from: "Studio <invites@studio.dev>".to_string(),
            firebase_api_key: None,
            seed_user_email: "seed@studio.dev".to_string(),
            seed_user_password: "password".to_string(),
            scheduler_service_account: "studio-scheduler@test-project.iam.gserviceaccount.com"
                .to_string(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let gcp_project_id =
            env::var("GCP_PROJECT_ID").map_err(|_| ConfigError::Missing("GCP_PROJECT_ID"))?;

        let app_env = match env::var("APP_ENV") {
            Ok(raw) => AppEnv::parse(&raw)?,
            Err(_) => AppEnv::Development,
        };

        let scheduler_service_account = env::var("SCHEDULER_SERVICE_ACCOUNT").unwrap_or_else(|_| {
            format!("studio-scheduler@{}.iam.gserviceaccount.com", gcp_project_id)
        });

        Ok(Self {
            site_url: env::var("SITE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            api_url: env::var("API_URL").unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            app_env,
            resend_api_key: optional_secret("RESEND_API_KEY"),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Studio <invites@studio.dev>".to_string()),
            firebase_api_key: optional_secret("FIREBASE_API_KEY"),
            seed_user_email: env::var("SEED_USER_EMAIL")
                .unwrap_or_else(|_| "seed@studio.dev".to_string()),
            seed_user_password: env::var("SEED_USER_PASSWORD")
                .unwrap_or_else(|_| "password".to_string()),
            scheduler_service_account,
            gcp_project_id,
        })
    }
}

/// Read a secret, treating blank values as unset.
fn optional_secret(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("GCP_PROJECT_ID", "studio-dev");
        env::set_var("APP_ENV", "production");
        env::set_var("SITE_URL", "https://studio.example.com/");
        env::set_var("RESEND_API_KEY", "  ");

        let config = Config::from_env().expect("Config should load");

        assert_eq!(config.gcp_project_id, "studio-dev");
        assert_eq!(config.app_env, AppEnv::Production);
        assert_eq!(config.site_url, "https://studio.example.com");
        assert_eq!(config.resend_api_key, None);
        assert_eq!(
            config.scheduler_service_account,
            "studio-scheduler@studio-dev.iam.gserviceaccount.com"
        );
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_app_env_rejects_unknown() {
        assert!(matches!(
            AppEnv::parse("staging"),
            Err(ConfigError::Invalid("APP_ENV", _))
        ));
        assert_eq!(AppEnv::parse("Dev").unwrap(), AppEnv::Development);
    }
}
