use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct EssayAnalysisRow {
    pub id: Uuid,
    pub filename: String,
    pub essay_type: String,
    pub essay_score: String,
    pub original_text: String,
    pub corrected_essay: String,
    pub suggestions: Value,
    pub created_at: DateTime<Utc>,
}
