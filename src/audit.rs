use actix_web::HttpRequest;
use anyhow::Result;
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::warn;

/// One audit row per mutating operation.
pub struct AuditEntry {
    pub action: &'static str,
    pub performed_by: u64,
    pub entity_type: &'static str,
    pub entity_id: Option<u64>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEntry {
    pub fn new(action: &'static str, performed_by: u64, entity_type: &'static str) -> Self {
        Self {
            action,
            performed_by,
            entity_type,
            entity_id: None,
            old_values: None,
            new_values: None,
            ip_address: None,
            user_agent: None,
        }
    }

    pub fn entity(mut self, id: u64) -> Self {
        self.entity_id = Some(id);
        self
    }

    pub fn old(mut self, values: Value) -> Self {
        self.old_values = Some(values);
        self
    }

    pub fn new_values(mut self, values: Value) -> Self {
        self.new_values = Some(values);
        self
    }

    pub fn from_request(mut self, req: &HttpRequest) -> Self {
        self.ip_address = req
            .connection_info()
            .realip_remote_addr()
            .map(|s| s.to_string());
        self.user_agent = req
            .headers()
            .get("User-Agent")
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());
        self
    }
}

/// Best-effort sink: a failed audit insert is logged, never surfaced
/// to the caller.
pub async fn record(pool: &MySqlPool, entry: AuditEntry) {
    if let Err(e) = try_record(pool, &entry).await {
        warn!(error = %e, action = entry.action, "failed to write audit log");
    }
}

async fn try_record(pool: &MySqlPool, entry: &AuditEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO audit_logs
            (action, performed_by, entity_type, entity_id, old_values, new_values, ip_address, user_agent)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.action)
    .bind(entry.performed_by)
    .bind(entry.entity_type)
    .bind(entry.entity_id)
    .bind(entry.old_values.as_ref().map(|v| v.to_string()))
    .bind(entry.new_values.as_ref().map(|v| v.to_string()))
    .bind(entry.ip_address.as_deref())
    .bind(entry.user_agent.as_deref())
    .execute(pool)
    .await?;

    Ok(())
}
