// Audit logging for user, folder and link mutations
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum AuditAction {
    UserCreated,
    UserUpdated,
    UserDeleted,
    UserLoggedIn,
    FolderCreated,
    FolderUpdated,
    FolderDeleted,
    LinkCreated,
}

impl AuditAction {
    pub fn resource_type(&self) -> &'static str {
        match self {
            AuditAction::UserCreated
            | AuditAction::UserUpdated
            | AuditAction::UserDeleted
            | AuditAction::UserLoggedIn => "user",
            AuditAction::FolderCreated
            | AuditAction::FolderUpdated
            | AuditAction::FolderDeleted => "folder",
            AuditAction::LinkCreated => "link",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLog {
    pub id: Uuid,
    pub action: AuditAction,
    pub user_id: i32,
    pub resource_id: Option<String>,
    pub resource_type: String,
    pub details: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl AuditLog {
    pub fn new(
        action: AuditAction,
        user_id: i32,
        resource_id: Option<i32>,
        details: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            action,
            user_id,
            resource_id: resource_id.map(|id| id.to_string()),
            resource_type: action.resource_type().to_string(),
            details,
            timestamp: Utc::now(),
        }
    }
}

pub struct AuditLogger;

impl AuditLogger {
    /// Emit an audit event as one JSON line on the `audit` target
    pub fn log(
        action: AuditAction,
        user_id: i32,
        resource_id: Option<i32>,
        details: Option<String>,
    ) {
        let audit_log = AuditLog::new(action, user_id, resource_id, details);

        let json_log = serde_json::to_string(&audit_log).unwrap_or_else(|e| {
            warn!("Failed to serialize audit log: {}", e);
            format!("{:?}", audit_log)
        });

        info!(target: "audit", "{}", json_log);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_audit_log_fields() {
        let log = AuditLog::new(AuditAction::FolderDeleted, 7, Some(42), None);
        assert_eq!(log.resource_type, "folder");
        assert_eq!(log.resource_id.as_deref(), Some("42"));

        let json = serde_json::to_value(&log).unwrap();
        assert_eq!(json["action"], "FolderDeleted");
        assert_eq!(json["user_id"], 7);
    }

    #[test]
    fn test_resource_types() {
        assert_eq!(AuditAction::UserLoggedIn.resource_type(), "user");
        assert_eq!(AuditAction::LinkCreated.resource_type(), "link");
    }
}
