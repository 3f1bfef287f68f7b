use serde_json::Value;
use uuid::Uuid;

use crate::{db::DbPool, error::AppResult};

// Audit action names, one per accepted booking write.
pub const APPOINTMENT_CREATED: &str = "appointment_created";
pub const APPOINTMENT_UPDATED: &str = "appointment_updated";
pub const APPOINTMENT_CANCELLED: &str = "appointment_cancelled";
pub const APPOINTMENT_COMPLETED: &str = "appointment_completed";
pub const WALK_IN_CREATED: &str = "walk_in_created";
pub const EMERGENCY_CANCEL: &str = "emergency_cancel";

/// Append one audit row. Best-effort: callers log and swallow the error.
pub async fn log_audit(
    pool: &DbPool,
    user_id: Option<Uuid>,
    action: &str,
    resource: Option<&str>,
    metadata: Option<Value>,
) -> AppResult<()> {
    let id = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO audit_logs (id, user_id, action, resource, metadata)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(action)
    .bind(resource)
    .bind(metadata)
    .execute(pool)
    .await?;

    Ok(())
}
