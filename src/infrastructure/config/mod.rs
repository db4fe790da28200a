use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::domain::analysis::AnalysisSettings;
use crate::domain::chart::ChartConfig;
use crate::domain::error::{AppError, Result};
use crate::domain::geo::MapConfig;
use crate::domain::llm_config::LLMConfig;
use crate::domain::upload::ParseConfig;
use crate::infrastructure::security::keyring::KeyringManager;

const KEYRING_SERVICE: &str = "portscope";
const ENV_PREFIX: &str = "PORTSCOPE_";
const CONFIG_PATH_VAR: &str = "PORTSCOPE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "portscope.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Largest accepted upload body
    pub max_upload_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LLMConfig,
    pub analysis: AnalysisSettings,
    pub parse: ParseConfig,
    pub chart: ChartConfig,
    pub map: MapConfig,
    pub preview: PreviewConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Rows shown in dataset previews
    pub rows: usize,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self { rows: 5 }
    }
}

impl AppConfig {
    /// Defaults, then `portscope.toml` (or `$PORTSCOPE_CONFIG`), then `PORTSCOPE_*` env vars
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());

        let figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(&path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config = Self::from_figment(figment)?;
        info!(
            config_path = %path,
            provider = ?config.llm.provider,
            model = %config.llm.model,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: AppConfig = figment
            .extract()
            .map_err(|e| AppError::ConfigError(format!("Failed to load configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let checks = [
            self.llm.validate(),
            self.analysis.validate(),
            self.parse.validate(),
            self.chart.validate(),
        ];

        for check in checks {
            check.map_err(AppError::ConfigError)?;
        }

        if self.server.max_upload_bytes == 0 {
            return Err(AppError::ConfigError(
                "server.max_upload_bytes must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

pub struct ConfigService {
    keyring: KeyringManager,
}

impl ConfigService {
    pub fn new() -> Self {
        Self {
            keyring: KeyringManager::new(KEYRING_SERVICE),
        }
    }

    /// Fill `config.api_key` from the provider's env var, then the OS keyring,
    /// when the configuration does not carry one.
    pub fn resolve_api_key(&self, config: &mut LLMConfig) {
        if config.api_key.as_deref().is_some_and(|k| !k.trim().is_empty()) {
            return;
        }

        let env_var = config.api_key_env_var();
        if let Ok(key) = std::env::var(env_var) {
            if !key.trim().is_empty() {
                info!(source = env_var, "Using API key from environment");
                config.api_key = Some(key);
                return;
            }
        }

        let account = format!("{:?}", config.provider);
        match self.keyring.get_secret(&account) {
            Ok(Some(key)) => {
                info!(source = "keyring", account = %account, "Using API key from keyring");
                config.api_key = Some(key);
            }
            Ok(None) => {
                if config.requires_api_key() {
                    warn!(
                        env_var,
                        "No API key configured; analysis requests will fail with an authentication error"
                    );
                }
            }
            Err(e) => warn!(error = %e, "Keyring lookup failed"),
        }
    }
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}
