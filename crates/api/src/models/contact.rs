//! Contact-form message model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use cedarmarket_core::{ContactId, ContactStatus, Email, UserId};

/// A message submitted through the public contact form.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    pub email: Email,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub message: String,
    pub status: ContactStatus,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_by: Option<UserId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub responded_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Contact {
    /// Record an admin response, moving the message to `responded`.
    pub fn record_response(&mut self, response: String, admin: UserId) {
        self.response = response;
        self.status = ContactStatus::Responded;
        self.responded_by = Some(admin);
        self.responded_at = Some(Utc::now());
        self.updated_at = Utc::now();
    }

    /// Reading a fresh message advances it from `new` to `read`.
    ///
    /// Returns `true` if the status changed.
    pub fn mark_read(&mut self) -> bool {
        if self.status == ContactStatus::New {
            self.status = ContactStatus::Read;
            self.updated_at = Utc::now();
            return true;
        }
        false
    }
}

/// One page of contact messages.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPage {
    pub contacts: Vec<Contact>,
    pub total_pages: i64,
    pub current_page: u32,
    pub total: i64,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn contact(status: ContactStatus) -> Contact {
        Contact {
            id: ContactId::mint(),
            name: "Rami".to_owned(),
            email: Email::parse("rami@example.com").unwrap(),
            phone_number: None,
            message: "Where is my order?".to_owned(),
            status,
            response: String::new(),
            responded_by: None,
            responded_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_mark_read_advances_only_new() {
        let mut fresh = contact(ContactStatus::New);
        assert!(fresh.mark_read());
        assert_eq!(fresh.status, ContactStatus::Read);

        let mut read = contact(ContactStatus::Read);
        assert!(!read.mark_read());

        let mut responded = contact(ContactStatus::Responded);
        assert!(!responded.mark_read());
        assert_eq!(responded.status, ContactStatus::Responded);
    }

    #[test]
    fn test_record_response_stamps_responder() {
        let admin = UserId::mint();
        let mut message = contact(ContactStatus::Read);

        message.record_response("On its way.".to_owned(), admin);

        assert_eq!(message.status, ContactStatus::Responded);
        assert_eq!(message.response, "On its way.");
        assert_eq!(message.responded_by, Some(admin));
        assert!(message.responded_at.is_some());
    }
}
