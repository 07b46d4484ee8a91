use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Active,
    Resolved,
}

impl TicketStatus {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "active" => Some(TicketStatus::Active),
            "resolved" => Some(TicketStatus::Resolved),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Ticket {
    pub id: u64,
    pub title: String,
    pub description: String,
    pub username: String,
    pub status: TicketStatus,
    pub resolution: Option<String>,
    pub resolved_by: Option<String>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Ticket ID {0} not found")]
    NotFound(u64),
    #[error("Ticket {0} status not active")]
    NotActive(u64),
}

/// In-memory ticket table. Persistence is out of scope; the store exists so
/// the access checks around it have something real to guard.
pub struct TicketStore {
    tickets: DashMap<u64, Ticket>,
    next_id: AtomicU64,
}

impl TicketStore {
    pub fn new() -> Self {
        Self {
            tickets: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn create(&self, title: &str, description: &str, username: &str) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.tickets.insert(
            id,
            Ticket {
                id,
                title: title.to_string(),
                description: description.to_string(),
                username: username.to_string(),
                status: TicketStatus::Active,
                resolution: None,
                resolved_by: None,
            },
        );
        id
    }

    /// Mark an active ticket resolved, recording who resolved it.
    pub fn resolve(
        &self,
        id: u64,
        resolution: &str,
        resolved_by: &str,
    ) -> Result<(), ResolveError> {
        let mut ticket = self.tickets.get_mut(&id).ok_or(ResolveError::NotFound(id))?;
        if ticket.status != TicketStatus::Active {
            return Err(ResolveError::NotActive(id));
        }
        ticket.status = TicketStatus::Resolved;
        ticket.resolution = Some(resolution.to_string());
        ticket.resolved_by = Some(resolved_by.to_string());
        Ok(())
    }

    pub fn by_user(&self, username: &str) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|entry| entry.username == username)
            .map(|entry| entry.clone())
            .collect();
        tickets.sort_by_key(|t| t.id);
        tickets
    }

    pub fn by_status(&self, status: Option<TicketStatus>) -> Vec<Ticket> {
        let mut tickets: Vec<Ticket> = self
            .tickets
            .iter()
            .filter(|entry| status.map_or(true, |s| entry.status == s))
            .map(|entry| entry.clone())
            .collect();
        tickets.sort_by_key(|t| t.id);
        tickets
    }
}

impl Default for TicketStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = TicketStore::new();
        let a = store.create("t1", "d1", "linda_baker");
        let b = store.create("t2", "d2", "linda_baker");
        assert!(b > a);
    }

    #[test]
    fn test_resolve_active_ticket() {
        let store = TicketStore::new();
        let id = store.create("printer down", "3rd floor", "james_smith");

        store.resolve(id, "rebooted", "admin").unwrap();

        let tickets = store.by_user("james_smith");
        assert_eq!(tickets[0].status, TicketStatus::Resolved);
        assert_eq!(tickets[0].resolved_by.as_deref(), Some("admin"));
    }

    #[test]
    fn test_resolve_missing_and_already_resolved() {
        let store = TicketStore::new();
        assert_eq!(store.resolve(99, "r", "admin"), Err(ResolveError::NotFound(99)));

        let id = store.create("t", "d", "u");
        store.resolve(id, "r", "admin").unwrap();
        assert_eq!(
            store.resolve(id, "again", "admin"),
            Err(ResolveError::NotActive(id))
        );
    }

    #[test]
    fn test_by_status_filters() {
        let store = TicketStore::new();
        let a = store.create("t1", "d", "u");
        store.create("t2", "d", "u");
        store.resolve(a, "r", "admin").unwrap();

        assert_eq!(store.by_status(Some(TicketStatus::Active)).len(), 1);
        assert_eq!(store.by_status(Some(TicketStatus::Resolved)).len(), 1);
        assert_eq!(store.by_status(None).len(), 2);
    }
}
