use serde::Serialize;
use uuid::Uuid;

use crate::database::models::NewAuditLog;
use crate::database::Store;

/// Builder for one audit-log row
#[derive(Debug, Clone)]
pub struct AuditEntry {
    inner: NewAuditLog,
}

impl AuditEntry {
    pub fn new(user_id: Uuid, action: &str, table_name: &str, record_id: impl ToString) -> Self {
        Self {
            inner: NewAuditLog {
                user_id: Some(user_id),
                action: action.to_string(),
                table_name: table_name.to_string(),
                record_id: Some(record_id.to_string()),
                old_values: None,
                new_values: None,
                ip_address: None,
            },
        }
    }

    pub fn old_values<T: Serialize>(mut self, values: &T) -> Self {
        self.inner.old_values = serde_json::to_value(values).ok();
        self
    }

    pub fn new_values<T: Serialize>(mut self, values: &T) -> Self {
        self.inner.new_values = serde_json::to_value(values).ok();
        self
    }

    pub fn ip(mut self, ip_address: Option<String>) -> Self {
        self.inner.ip_address = ip_address;
        self
    }

    pub fn into_row(self) -> NewAuditLog {
        self.inner
    }

    pub fn action(&self) -> &str {
        &self.inner.action
    }
}

/// Write an audit row. A failed write is logged and never fails the caller.
pub async fn record(store: &dyn Store, entry: AuditEntry) {
    let action = entry.action().to_string();
    if let Err(e) = store.insert_audit_log(entry.into_row()).await {
        tracing::warn!("Failed to write audit log for '{}': {}", action, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_snapshots_values() {
        let user = Uuid::new_v4();
        let entry = AuditEntry::new(user, "partner_verification", "partner_profiles", "p-1")
            .old_values(&json!({"verification_status": "pending"}))
            .new_values(&json!({"verification_status": "verified"}))
            .ip(Some("10.0.0.1".to_string()));

        let row = entry.into_row();
        assert_eq!(row.user_id, Some(user));
        assert_eq!(row.record_id.as_deref(), Some("p-1"));
        assert_eq!(row.old_values.unwrap()["verification_status"], "pending");
        assert_eq!(row.new_values.unwrap()["verification_status"], "verified");
        assert_eq!(row.ip_address.as_deref(), Some("10.0.0.1"));
    }
}
