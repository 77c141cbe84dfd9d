//! Contact Message Repository

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use super::corrupt;
use crate::domain::aggregates::{ContactMessage, MessageStatus};
use crate::{Result, StoreError};

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    subject: String,
    message: String,
    status: String,
    admin_reply: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for ContactMessage {
    type Error = StoreError;
    fn try_from(r: ContactRow) -> Result<Self> {
        Ok(ContactMessage {
            id: r.id,
            name: r.name,
            email: r.email,
            subject: r.subject,
            message: r.message,
            status: r.status.parse().map_err(|e: String| corrupt("status", e))?,
            admin_reply: r.admin_reply,
            created_at: r.created_at,
        })
    }
}

fn collect(rows: Vec<ContactRow>) -> Result<Vec<ContactMessage>> {
    rows.into_iter().map(ContactMessage::try_from).collect()
}

#[derive(Debug, Clone)]
pub struct ContactRepository {
    pool: SqlitePool,
}

impl ContactRepository {
    pub fn new(pool: SqlitePool) -> Self { Self { pool } }

    pub async fn insert(&self, m: &ContactMessage) -> Result<()> {
        sqlx::query(
            "INSERT INTO contact_messages (id, name, email, subject, message, status, admin_reply, created_at) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(m.id)
        .bind(&m.name)
        .bind(&m.email)
        .bind(&m.subject)
        .bind(&m.message)
        .bind(m.status.as_str())
        .bind(&m.admin_reply)
        .bind(m.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<Option<ContactMessage>> {
        sqlx::query_as::<_, ContactRow>("SELECT * FROM contact_messages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ContactMessage::try_from)
            .transpose()
    }

    pub async fn list_all(&self) -> Result<Vec<ContactMessage>> {
        let rows = sqlx::query_as::<_, ContactRow>("SELECT * FROM contact_messages ORDER BY created_at DESC, rowid DESC")
            .fetch_all(&self.pool)
            .await?;
        collect(rows)
    }

    pub async fn list_by_email(&self, email: &str) -> Result<Vec<ContactMessage>> {
        let rows = sqlx::query_as::<_, ContactRow>(
            "SELECT * FROM contact_messages WHERE email = ? ORDER BY created_at DESC, rowid DESC",
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await?;
        collect(rows)
    }

    pub async fn unread_count(&self) -> Result<u64> {
        let n: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_messages WHERE status = 'unread'")
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }

    /// Writes status and reply back. `false` when the message no longer exists.
    pub async fn save(&self, m: &ContactMessage) -> Result<bool> {
        let res = sqlx::query("UPDATE contact_messages SET status = ?, admin_reply = ? WHERE id = ?")
            .bind(m.status.as_str())
            .bind(&m.admin_reply)
            .bind(m.id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    pub async fn set_status(&self, id: Uuid, status: MessageStatus) -> Result<Option<ContactMessage>> {
        sqlx::query_as::<_, ContactRow>("UPDATE contact_messages SET status = ? WHERE id = ? RETURNING *")
            .bind(status.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(ContactMessage::try_from)
            .transpose()
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let res = sqlx::query("DELETE FROM contact_messages WHERE id = ?").bind(id).execute(&self.pool).await?;
        Ok(res.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{Database, DbConfig};

    fn message(email: &str) -> ContactMessage {
        ContactMessage::new("Ravi".into(), email.into(), "Refund".into(), "Please refund order".into())
    }

    #[tokio::test]
    async fn test_contact_lifecycle() {
        let db = Database::connect(DbConfig::in_memory()).await.unwrap();
        let contacts = db.contacts();
        let mut first = message("ravi@example.com");
        contacts.insert(&first).await.unwrap();
        contacts.insert(&message("ravi@example.com")).await.unwrap();
        contacts.insert(&message("mira@example.com")).await.unwrap();
        assert_eq!(contacts.unread_count().await.unwrap(), 3);
        assert_eq!(contacts.list_by_email("ravi@example.com").await.unwrap().len(), 2);

        first.reply("Refund issued");
        assert!(contacts.save(&first).await.unwrap());
        let stored = contacts.get(first.id).await.unwrap().unwrap();
        assert_eq!(stored.status, MessageStatus::Replied);
        assert_eq!(stored.admin_reply.as_deref(), Some("Refund issued"));
        assert_eq!(contacts.unread_count().await.unwrap(), 2);

        let read = contacts.list_all().await.unwrap().remove(0);
        assert_eq!(contacts.set_status(read.id, MessageStatus::Read).await.unwrap().unwrap().status, MessageStatus::Read);

        assert!(contacts.delete(first.id).await.unwrap());
        assert!(!contacts.delete(first.id).await.unwrap());
        assert!(contacts.set_status(first.id, MessageStatus::Read).await.unwrap().is_none());
    }
}
