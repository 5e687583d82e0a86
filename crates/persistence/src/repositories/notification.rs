//! In-app notification repository.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::NotificationEntity;
use crate::metrics::QueryTimer;

/// Input data for inserting an in-app notification.
#[derive(Debug, Clone)]
pub struct NotificationInput {
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub link: Option<String>,
    pub metadata: serde_json::Value,
}

/// Repository for in-app notifications.
#[derive(Clone)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Stores a notification for the user's inbox.
    pub async fn create(&self, input: NotificationInput) -> Result<NotificationEntity, sqlx::Error> {
        let timer = QueryTimer::new("create_notification");
        let result = sqlx::query_as::<_, NotificationEntity>(
            r#"
            INSERT INTO notifications (user_id, kind, title, message, link, metadata)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, user_id, kind, title, message, link, metadata, is_read, created_at
            "#,
        )
        .bind(input.user_id)
        .bind(&input.kind)
        .bind(&input.title)
        .bind(&input.message)
        .bind(&input.link)
        .bind(&input.metadata)
        .fetch_one(&self.pool)
        .await;
        timer.record();
        result
    }
}
