use sqlx::Row;

use vendaflow_core::domain::analysis::{AnalysisId, AnalysisKind, AnalysisRecord};
use vendaflow_core::domain::lead::LeadId;

use super::{decode_err, parse_timestamp, AnalysisRepository, RepositoryError};
use crate::DbPool;

pub struct SqlAnalysisRepository {
    pool: DbPool,
}

impl SqlAnalysisRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<AnalysisRecord, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let lead_id: String = row.try_get("lead_id").map_err(decode_err)?;
    let kind: String = row.try_get("kind").map_err(decode_err)?;
    let metadata_json: String = row.try_get("metadata_json").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;

    let kind = AnalysisKind::parse(&kind)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown analysis kind `{kind}`")))?;
    let metadata = serde_json::from_str(&metadata_json).map_err(decode_err)?;

    Ok(AnalysisRecord {
        id: AnalysisId(id),
        lead_id: LeadId(lead_id),
        kind,
        input: row.try_get("input").map_err(decode_err)?,
        output: row.try_get("output").map_err(decode_err)?,
        converted: row.try_get("converted").map_err(decode_err)?,
        metadata,
        created_at: parse_timestamp(&created_at)?,
    })
}

#[async_trait::async_trait]
impl AnalysisRepository for SqlAnalysisRepository {
    async fn record(&self, record: AnalysisRecord) -> Result<(), RepositoryError> {
        let metadata_json = serde_json::to_string(&record.metadata).map_err(decode_err)?;

        sqlx::query(
            "INSERT INTO analysis (id, lead_id, kind, input, output, converted, metadata_json,
                                   created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&record.id.0)
        .bind(&record.lead_id.0)
        .bind(record.kind.as_str())
        .bind(&record.input)
        .bind(&record.output)
        .bind(record.converted)
        .bind(metadata_json)
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn list_for_lead(
        &self,
        lead_id: &LeadId,
    ) -> Result<Vec<AnalysisRecord>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT id, lead_id, kind, input, output, converted, metadata_json, created_at
             FROM analysis WHERE lead_id = ? ORDER BY created_at ASC",
        )
        .bind(&lead_id.0)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_record).collect()
    }
}
