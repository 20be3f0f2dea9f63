use crate::domain::model::{
    Category, HistoryRecord, ImageAttachment, PersistencePolicy, PromptTemplates,
};
use crate::utils::error::{AdvisoryError, Result};
use async_trait::async_trait;

/// Append-only log of computations and advisory results.
pub trait HistoryStore: Send + Sync {
    /// Creates the backing table if needed. Never removes records.
    fn initialize(&self) -> Result<()>;
    fn append(&self, category: Category, payload: &str) -> Result<HistoryRecord>;
    /// Newest first.
    fn list_all(&self) -> Result<Vec<HistoryRecord>>;
}

#[async_trait]
pub trait AdvisoryGateway: Send + Sync {
    /// Model identifiers the provider offers, discovered once per gateway.
    async fn available_models(&self) -> Vec<String>;

    /// One attempt, no retry.
    async fn invoke(
        &self,
        prompt: &str,
        model: &str,
        image: Option<&ImageAttachment>,
    ) -> std::result::Result<String, AdvisoryError>;
}

pub trait ReportRenderer: Send + Sync {
    fn render(&self, title: &str, body: &str) -> Vec<u8>;
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> &str;
    fn base_url(&self) -> &str;
    fn model_family(&self) -> &str;
    fn fallback_models(&self) -> &[String];
    fn timeout_seconds(&self) -> u64;
    fn database_path(&self) -> &str;
    fn report_header(&self) -> &str;
    fn persistence_policy(&self) -> PersistencePolicy;
    fn prompts(&self) -> &PromptTemplates;
}
