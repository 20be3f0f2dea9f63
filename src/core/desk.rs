use crate::core::tariff;
use crate::domain::model::{
    Category, HistoryRecord, ImageAttachment, PersistencePolicy, PromptTemplates, TariffBreakdown,
    TariffInput,
};
use crate::domain::ports::{AdvisoryGateway, HistoryStore, ReportRenderer};
use crate::utils::error::{DeskError, Result};

/// What happened to a result after it was produced.
#[derive(Debug)]
pub enum PersistOutcome {
    Saved(HistoryRecord),
    /// Not requested, or the category is not persisted.
    Skipped,
    /// The result is still valid; only the history write failed.
    Failed(DeskError),
}

impl PersistOutcome {
    pub fn record(&self) -> Option<&HistoryRecord> {
        match self {
            PersistOutcome::Saved(record) => Some(record),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub struct CalculationOutcome {
    pub breakdown: TariffBreakdown,
    pub summary: String,
    pub history: PersistOutcome,
}

#[derive(Debug)]
pub struct AdvisoryOutcome {
    pub category: Category,
    pub model: String,
    pub text: String,
    /// PDF bytes, ready to be written wherever the user asked.
    pub report: Vec<u8>,
    pub history: PersistOutcome,
}

/// One method per user interaction. Each runs to completion before
/// returning; nothing is queued or retried.
pub struct CustomsDesk<G: AdvisoryGateway, H: HistoryStore, R: ReportRenderer> {
    gateway: G,
    store: H,
    renderer: R,
    policy: PersistencePolicy,
    prompts: PromptTemplates,
}

impl<G: AdvisoryGateway, H: HistoryStore, R: ReportRenderer> CustomsDesk<G, H, R> {
    pub fn new(gateway: G, store: H, renderer: R) -> Self {
        Self {
            gateway,
            store,
            renderer,
            policy: PersistencePolicy::default(),
            prompts: PromptTemplates::default(),
        }
    }

    pub fn with_policy(mut self, policy: PersistencePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_prompts(mut self, prompts: PromptTemplates) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn store(&self) -> &H {
        &self.store
    }

    fn persist(&self, category: Category, payload: &str) -> PersistOutcome {
        if !self.policy.persists(category) {
            tracing::debug!("{} results are not persisted", category);
            return PersistOutcome::Skipped;
        }

        match self.store.append(category, payload) {
            Ok(record) => {
                tracing::info!("💾 Saved {} as history record #{}", category, record.id);
                PersistOutcome::Saved(record)
            }
            Err(e) => {
                tracing::error!("❌ Failed to save {} result: {}", category, e);
                PersistOutcome::Failed(e)
            }
        }
    }

    pub fn calculate(&self, input: TariffInput, save: bool) -> CalculationOutcome {
        let breakdown = tariff::calculate(input);
        let summary = tariff::summary_payload(&breakdown);
        tracing::debug!(
            "CIF {} -> total {} in local currency",
            breakdown.cif,
            breakdown.total_local
        );

        let history = if save {
            self.persist(Category::Calculation, &summary)
        } else {
            PersistOutcome::Skipped
        };

        CalculationOutcome {
            breakdown,
            summary,
            history,
        }
    }

    pub async fn available_models(&self) -> Vec<String> {
        self.gateway.available_models().await
    }

    /// Uses the requested model when given, otherwise the first discovered one.
    pub async fn resolve_model(&self, requested: Option<&str>) -> Result<String> {
        let models = self.gateway.available_models().await;

        match requested {
            Some(model) => {
                if !models.iter().any(|m| m == model) {
                    tracing::warn!("Model {} was not in the discovered list", model);
                }
                Ok(model.to_string())
            }
            None => models
                .into_iter()
                .next()
                .ok_or_else(|| DeskError::ConfigError {
                    message: "No models available".to_string(),
                }),
        }
    }

    async fn advise(
        &self,
        category: Category,
        title: &str,
        prompt: &str,
        model: &str,
        image: Option<&ImageAttachment>,
    ) -> Result<AdvisoryOutcome> {
        tracing::info!("🧠 Analyzing with {}...", model);
        let text = self.gateway.invoke(prompt, model, image).await?;

        let report = self.renderer.render(title, &text);
        let history = self.persist(category, &text);

        Ok(AdvisoryOutcome {
            category,
            model: model.to_string(),
            text,
            report,
            history,
        })
    }

    pub async fn analyze_viability(&self, product: &str, model: &str) -> Result<AdvisoryOutcome> {
        if product.trim().is_empty() {
            return Err(DeskError::ValidationError {
                message: "Product description cannot be empty".to_string(),
            });
        }

        let prompt = self.prompts.viability_prompt(product);
        self.advise(Category::ViabilityAnalysis, "VIABILITY", &prompt, model, None)
            .await
    }

    pub async fn audit_customs_document(
        &self,
        image: &ImageAttachment,
        model: &str,
    ) -> Result<AdvisoryOutcome> {
        let prompt = self.prompts.customs_audit.clone();
        self.advise(
            Category::CustomsAudit,
            "CUSTOMS AUDIT",
            &prompt,
            model,
            Some(image),
        )
        .await
    }

    pub async fn audit_environmental_document(
        &self,
        image: &ImageAttachment,
        model: &str,
    ) -> Result<AdvisoryOutcome> {
        let prompt = self.prompts.environmental_audit.clone();
        self.advise(
            Category::EnvironmentalAudit,
            "ENVIRONMENTAL AUDIT",
            &prompt,
            model,
            Some(image),
        )
        .await
    }

    pub fn history(&self) -> Result<Vec<HistoryRecord>> {
        self.store.list_all()
    }
}
