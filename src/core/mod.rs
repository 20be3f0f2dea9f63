pub mod desk;
pub mod tariff;

pub use crate::domain::model::{
    Category, HistoryRecord, ImageAttachment, PersistencePolicy, PromptTemplates,
    TariffBreakdown, TariffInput,
};
pub use crate::domain::ports::{AdvisoryGateway, ConfigProvider, HistoryStore, ReportRenderer};
pub use crate::utils::error::Result;
