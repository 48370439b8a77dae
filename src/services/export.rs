use serde_json::Value;

use crate::database::models::AuditLog;

pub const AUDIT_CSV_HEADERS: [&str; 9] = [
    "id",
    "created_at",
    "user_id",
    "action",
    "table_name",
    "record_id",
    "old_values",
    "new_values",
    "ip_address",
];

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Render a header row followed by data rows. Every field is quoted.
pub fn to_csv<S: AsRef<str>>(headers: &[&str], rows: &[Vec<S>]) -> String {
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(headers.iter().map(|h| quote(h)).collect::<Vec<_>>().join(","));
    for row in rows {
        lines.push(row.iter().map(|f| quote(f.as_ref())).collect::<Vec<_>>().join(","));
    }
    lines.join("\n")
}

fn json_field(value: &Option<Value>) -> String {
    match value {
        Some(Value::Null) | None => String::new(),
        Some(v) => v.to_string(),
    }
}

pub fn audit_log_row(log: &AuditLog) -> Vec<String> {
    vec![
        log.id.to_string(),
        log.created_at.to_rfc3339(),
        log.user_id.map(|u| u.to_string()).unwrap_or_default(),
        log.action.clone(),
        log.table_name.clone(),
        log.record_id.clone().unwrap_or_default(),
        json_field(&log.old_values),
        json_field(&log.new_values),
        log.ip_address.clone().unwrap_or_default(),
    ]
}
