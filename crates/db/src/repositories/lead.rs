use sqlx::Row;

use vendaflow_core::domain::lead::{Author, HistoryEntry, Lead, LeadId};
use vendaflow_core::flows::LeadStage;

use super::{decode_err, parse_timestamp, LeadRepository, RepositoryError};
use crate::DbPool;

const LEAD_COLUMNS: &str = "id, phone_number, name, email, status, stage, bot_paused,
                            last_interaction, created_at, updated_at";

pub struct SqlLeadRepository {
    pool: DbPool,
}

impl SqlLeadRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_history(&self, lead_id: &str) -> Result<Vec<HistoryEntry>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT author, text, timestamp FROM lead_message WHERE lead_id = ? ORDER BY seq ASC",
        )
        .bind(lead_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(row_to_history_entry).collect()
    }

    async fn hydrate(
        &self,
        row: Option<sqlx::sqlite::SqliteRow>,
    ) -> Result<Option<Lead>, RepositoryError> {
        let Some(row) = row else {
            return Ok(None);
        };
        let mut lead = row_to_lead(&row)?;
        lead.history = self.load_history(&lead.id.0).await?;
        Ok(Some(lead))
    }
}

fn row_to_lead(row: &sqlx::sqlite::SqliteRow) -> Result<Lead, RepositoryError> {
    let id: String = row.try_get("id").map_err(decode_err)?;
    let phone_number: String = row.try_get("phone_number").map_err(decode_err)?;
    let name: Option<String> = row.try_get("name").map_err(decode_err)?;
    let email: Option<String> = row.try_get("email").map_err(decode_err)?;
    let status: String = row.try_get("status").map_err(decode_err)?;
    let stage: String = row.try_get("stage").map_err(decode_err)?;
    let bot_paused: bool = row.try_get("bot_paused").map_err(decode_err)?;
    let last_interaction: String = row.try_get("last_interaction").map_err(decode_err)?;
    let created_at: String = row.try_get("created_at").map_err(decode_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(decode_err)?;

    Ok(Lead {
        id: LeadId(id),
        phone_number,
        name,
        email,
        status,
        stage: LeadStage::from_stored(&stage),
        history: Vec::new(),
        bot_paused,
        last_interaction: parse_timestamp(&last_interaction)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

fn row_to_history_entry(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry, RepositoryError> {
    let author: String = row.try_get("author").map_err(decode_err)?;
    let text: String = row.try_get("text").map_err(decode_err)?;
    let timestamp: String = row.try_get("timestamp").map_err(decode_err)?;

    let author = Author::parse(&author)
        .ok_or_else(|| RepositoryError::Decode(format!("unknown message author `{author}`")))?;

    Ok(HistoryEntry { author, text, timestamp: parse_timestamp(&timestamp)? })
}

#[async_trait::async_trait]
impl LeadRepository for SqlLeadRepository {
    async fn find_by_phone(&self, phone_number: &str) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead WHERE phone_number = ?"))
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await?;
        self.hydrate(row).await
    }

    async fn find_by_id(&self, id: &LeadId) -> Result<Option<Lead>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {LEAD_COLUMNS} FROM lead WHERE id = ?"))
            .bind(&id.0)
            .fetch_optional(&self.pool)
            .await?;
        self.hydrate(row).await
    }

    /// Upserts the lead row and appends history entries not yet stored.
    /// Stored entries are never rewritten.
    async fn save(&self, lead: Lead) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO lead (id, phone_number, name, email, status, stage, bot_paused,
                               last_interaction, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 name = excluded.name,
                 email = excluded.email,
                 status = excluded.status,
                 stage = excluded.stage,
                 bot_paused = excluded.bot_paused,
                 last_interaction = excluded.last_interaction,
                 updated_at = excluded.updated_at",
        )
        .bind(&lead.id.0)
        .bind(&lead.phone_number)
        .bind(&lead.name)
        .bind(&lead.email)
        .bind(&lead.status)
        .bind(lead.stage.as_str())
        .bind(lead.bot_paused)
        .bind(lead.last_interaction.to_rfc3339())
        .bind(lead.created_at.to_rfc3339())
        .bind(lead.updated_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let stored: i64 =
            sqlx::query("SELECT COUNT(*) AS count FROM lead_message WHERE lead_id = ?")
                .bind(&lead.id.0)
                .fetch_one(&mut *tx)
                .await?
                .try_get("count")
                .map_err(decode_err)?;
        let stored = usize::try_from(stored).map_err(decode_err)?;

        for (seq, entry) in lead.history.iter().enumerate().skip(stored) {
            let seq = i64::try_from(seq).map_err(decode_err)?;
            sqlx::query(
                "INSERT OR IGNORE INTO lead_message (lead_id, seq, author, text, timestamp)
                 VALUES (?, ?, ?, ?, ?)",
            )
            .bind(&lead.id.0)
            .bind(seq)
            .bind(entry.author.as_str())
            .bind(&entry.text)
            .bind(entry.timestamp.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_recent(&self, limit: u32) -> Result<Vec<Lead>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {LEAD_COLUMNS} FROM lead ORDER BY last_interaction DESC LIMIT ?"
        ))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut leads = Vec::with_capacity(rows.len());
        for row in rows {
            if let Some(lead) = self.hydrate(Some(row)).await? {
                leads.push(lead);
            }
        }
        Ok(leads)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use vendaflow_core::domain::lead::{Author, Lead};
    use vendaflow_core::flows::LeadStage;

    use super::SqlLeadRepository;
    use crate::repositories::LeadRepository;
    use crate::{connect_with_settings, migrations};

    async fn setup() -> sqlx::SqlitePool {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        migrations::run_pending(&pool).await.expect("migrations");
        pool
    }

    #[tokio::test]
    async fn save_and_find_by_phone_round_trips_history() {
        let repo = SqlLeadRepository::new(setup().await);
        let now = Utc::now();

        let mut lead = Lead::new("5511999999999", now);
        lead.record_inbound("oi", now);
        lead.record(Author::Bot, "Olá!", now + Duration::seconds(1));
        lead.stage = LeadStage::WaitingName;
        repo.save(lead.clone()).await.expect("save");

        let found = repo.find_by_phone("5511999999999").await.expect("find").expect("exists");
        assert_eq!(found.id, lead.id);
        assert_eq!(found.stage, LeadStage::WaitingName);
        assert_eq!(found.history.len(), 2);
        assert_eq!(found.history[0].author, Author::Customer);
        assert_eq!(found.history[1].text, "Olá!");
        assert!(!found.bot_paused);
    }

    #[tokio::test]
    async fn save_appends_only_new_entries() {
        let repo = SqlLeadRepository::new(setup().await);
        let now = Utc::now();

        let mut lead = Lead::new("5511888888888", now);
        lead.record_inbound("oi", now);
        repo.save(lead.clone()).await.expect("first save");

        lead.record(Author::Bot, "Olá!", now);
        lead.record_agent_reply("Aqui é a Ana", now);
        lead.name = Some("Maria".to_string());
        repo.save(lead.clone()).await.expect("second save");

        let found = repo.find_by_id(&lead.id).await.expect("find").expect("exists");
        assert_eq!(found.history.len(), 3);
        assert_eq!(found.history[2].author, Author::Agent);
        assert_eq!(found.name.as_deref(), Some("Maria"));
        assert!(found.bot_paused);
    }

    #[tokio::test]
    async fn unknown_stage_values_survive_a_round_trip() {
        let pool = setup().await;
        let repo = SqlLeadRepository::new(pool);
        let mut lead = Lead::new("5511777777777", Utc::now());
        lead.stage = LeadStage::from_stored("LEGACY_STAGE");
        repo.save(lead.clone()).await.expect("save");

        let found = repo.find_by_id(&lead.id).await.expect("find").expect("exists");
        assert_eq!(found.stage.as_str(), "LEGACY_STAGE");
    }

    #[tokio::test]
    async fn missing_lead_returns_none() {
        let repo = SqlLeadRepository::new(setup().await);
        assert!(repo.find_by_phone("000").await.expect("query").is_none());
    }

    #[tokio::test]
    async fn list_recent_orders_by_last_interaction() {
        let repo = SqlLeadRepository::new(setup().await);
        let now = Utc::now();
        let older = Lead::new("551100000001", now - Duration::minutes(5));
        let newer = Lead::new("551100000002", now);
        repo.save(older).await.expect("save older");
        repo.save(newer).await.expect("save newer");

        let leads = repo.list_recent(10).await.expect("list");
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].phone_number, "551100000002");
    }
}
