use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use service_core::error::AppError;
use uuid::Uuid;

/// An outstanding authorization code waiting to be exchanged.
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
}

/// In-memory table of outstanding authorization codes.
///
/// Codes are uuid v4 (OS randomness, unguessable within the validity window),
/// live for a bounded time and are consumed on first successful redemption.
/// Entries do not survive a restart; an unexchanged code is inert garbage
/// until it expires.
pub struct CodeBroker {
    codes: DashMap<String, IssuedCode>,
    ttl: Duration,
}

impl CodeBroker {
    pub fn new(ttl_seconds: i64) -> Self {
        Self {
            codes: DashMap::new(),
            ttl: Duration::seconds(ttl_seconds),
        }
    }

    /// Mint a fresh code for an authenticated user.
    pub fn issue(&self, user_id: &str) -> String {
        self.sweep_expired();

        let code = Uuid::new_v4().to_string();
        self.codes.insert(
            code.clone(),
            IssuedCode {
                user_id: user_id.to_string(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        code
    }

    /// Redeem a code, consuming it. A second redemption of the same code
    /// fails with `InvalidCode`.
    pub fn redeem(&self, code: &str) -> Result<IssuedCode, AppError> {
        let (_, issued) = self.codes.remove(code).ok_or(AppError::InvalidCode)?;

        if Utc::now() >= issued.expires_at {
            return Err(AppError::ExpiredCode);
        }

        Ok(issued)
    }

    /// Drop expired entries. Correctness does not depend on this; it only
    /// bounds table growth from abandoned logins.
    fn sweep_expired(&self) {
        let now = Utc::now();
        self.codes.retain(|_, issued| now < issued.expires_at);
    }

    #[cfg(test)]
    pub fn outstanding(&self) -> usize {
        self.codes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_redeem() {
        let broker = CodeBroker::new(600);
        let code = broker.issue("linda_baker");

        let issued = broker.redeem(&code).unwrap();
        assert_eq!(issued.user_id, "linda_baker");
    }

    #[test]
    fn test_codes_are_unique() {
        let broker = CodeBroker::new(600);
        assert_ne!(broker.issue("a"), broker.issue("a"));
    }

    #[test]
    fn test_second_redemption_fails() {
        let broker = CodeBroker::new(600);
        let code = broker.issue("linda_baker");

        broker.redeem(&code).unwrap();
        assert!(matches!(broker.redeem(&code), Err(AppError::InvalidCode)));
    }

    #[test]
    fn test_unknown_code_fails() {
        let broker = CodeBroker::new(600);
        assert!(matches!(
            broker.redeem("no-such-code"),
            Err(AppError::InvalidCode)
        ));
    }

    #[test]
    fn test_expired_code_fails() {
        let broker = CodeBroker::new(0);
        let code = broker.issue("linda_baker");

        assert!(matches!(broker.redeem(&code), Err(AppError::ExpiredCode)));
    }

    #[test]
    fn test_expired_entries_are_swept() {
        let broker = CodeBroker::new(0);
        broker.issue("a");
        broker.issue("b");
        // Issuing again sweeps the expired entries before inserting.
        broker.issue("c");
        assert_eq!(broker.outstanding(), 1);
    }
}
