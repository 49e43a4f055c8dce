use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::essay::classifier::EssayType;
use crate::models::essay::EssayAnalysisRow;

/// Parameters for persisting a completed analysis.
pub struct NewAnalysis<'a> {
    pub filename: &'a str,
    pub essay_type: EssayType,
    pub essay_score: &'a str,
    pub original_text: &'a str,
    pub corrected_essay: &'a str,
    pub suggestions: &'a [String],
}

pub async fn insert_analysis(pool: &PgPool, analysis: NewAnalysis<'_>) -> Result<Uuid, sqlx::Error> {
    let id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO essay_analyses
            (id, filename, essay_type, essay_score, original_text, corrected_essay, suggestions)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        "#,
    )
    .bind(id)
    .bind(analysis.filename)
    .bind(analysis.essay_type.display_name())
    .bind(analysis.essay_score)
    .bind(analysis.original_text)
    .bind(analysis.corrected_essay)
    .bind(serde_json::json!(analysis.suggestions))
    .execute(pool)
    .await?;

    info!("Stored analysis {id} for '{}'", analysis.filename);
    Ok(id)
}

pub async fn get_analysis(pool: &PgPool, id: Uuid) -> Result<Option<EssayAnalysisRow>, sqlx::Error> {
    sqlx::query_as::<_, EssayAnalysisRow>("SELECT * FROM essay_analyses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}
