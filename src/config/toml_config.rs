use crate::config::{
    API_KEY_ENV, DEFAULT_BASE_URL, DEFAULT_DATABASE_PATH, DEFAULT_FALLBACK_MODELS,
    DEFAULT_MODEL_FAMILY, DEFAULT_REPORT_HEADER, DEFAULT_TIMEOUT_SECONDS,
};
use crate::domain::model::{Category, PersistencePolicy, PromptTemplates, PRODUCT_PLACEHOLDER};
use crate::domain::ports::ConfigProvider;
use crate::utils::error::{DeskError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeskConfig {
    pub provider: ProviderConfig,
    pub storage: StorageConfig,
    pub history: HistoryConfig,
    pub report: ReportConfig,
    pub prompts: PromptTemplates,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_family: String,
    pub fallback_models: Vec<String>,
    pub timeout_seconds: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model_family: DEFAULT_MODEL_FAMILY.to_string(),
            fallback_models: DEFAULT_FALLBACK_MODELS
                .iter()
                .map(|m| m.to_string())
                .collect(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub database_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Categories written to history after a successful interaction.
    pub persist: Vec<Category>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            persist: vec![Category::Calculation, Category::ViabilityAnalysis],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub header: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            header: DEFAULT_REPORT_HEADER.to_string(),
        }
    }
}

impl DeskConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DeskError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DeskError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Loads the given file, or `customs-desk.toml` from the working
    /// directory when present, or defaults. The API key then falls back to
    /// the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                tracing::info!("📁 Loading configuration from: {}", path.display());
                Self::from_file(path)?
            }
            None if Path::new(super::DEFAULT_CONFIG_FILE).exists() => {
                tracing::info!(
                    "📁 Loading configuration from: {}",
                    super::DEFAULT_CONFIG_FILE
                );
                Self::from_file(super::DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_env_fallback();
        Ok(config)
    }

    pub fn apply_env_fallback(&mut self) {
        let missing = self
            .provider
            .api_key
            .as_deref()
            .map(|k| k.trim().is_empty())
            .unwrap_or(true);

        if missing {
            if let Ok(key) = std::env::var(API_KEY_ENV) {
                tracing::debug!("Using API key from {}", API_KEY_ENV);
                self.provider.api_key = Some(key);
            }
        }
    }

    /// 替換環境變數 (例如 ${GOOGLE_API_KEY})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| DeskError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        let api_key = validation::validate_required_field("provider.api_key", &self.provider.api_key)?;
        validation::validate_secret("provider.api_key", api_key)?;

        validation::validate_base_url("provider.base_url", &self.provider.base_url)?;
        validation::validate_model_name("provider.model_family", &self.provider.model_family)?;
        validation::validate_positive_number(
            "provider.timeout_seconds",
            self.provider.timeout_seconds,
            1,
        )?;

        if self.provider.fallback_models.is_empty() {
            return Err(DeskError::InvalidConfigValueError {
                field: "provider.fallback_models".to_string(),
                value: "[]".to_string(),
                reason: "At least one fallback model is required".to_string(),
            });
        }
        for model in &self.provider.fallback_models {
            validation::validate_model_name("provider.fallback_models", model)?;
        }

        validation::validate_database_path("storage.database_path", &self.storage.database_path)?;

        if !self.prompts.viability.contains(PRODUCT_PLACEHOLDER) {
            return Err(DeskError::InvalidConfigValueError {
                field: "prompts.viability".to_string(),
                value: self.prompts.viability.clone(),
                reason: format!("Template must contain {}", PRODUCT_PLACEHOLDER),
            });
        }

        Ok(())
    }
}

impl ConfigProvider for DeskConfig {
    fn api_key(&self) -> &str {
        self.provider.api_key.as_deref().unwrap_or("")
    }

    fn base_url(&self) -> &str {
        &self.provider.base_url
    }

    fn model_family(&self) -> &str {
        &self.provider.model_family
    }

    fn fallback_models(&self) -> &[String] {
        &self.provider.fallback_models
    }

    fn timeout_seconds(&self) -> u64 {
        self.provider.timeout_seconds
    }

    fn database_path(&self) -> &str {
        &self.storage.database_path
    }

    fn report_header(&self) -> &str {
        &self.report.header
    }

    fn persistence_policy(&self) -> PersistencePolicy {
        PersistencePolicy::new(self.history.persist.iter().copied())
    }

    fn prompts(&self) -> &PromptTemplates {
        &self.prompts
    }
}

impl Validate for DeskConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
