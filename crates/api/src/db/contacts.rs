//! Contact message repository.

use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use cedarmarket_core::{ContactId, ContactStatus, Email, UserId};

use super::RepositoryError;
use crate::models::{Contact, ContactPage};

const CONTACT_COLUMNS: &str = "id, name, email, phone_number, message, status, response, \
     responded_by, responded_at, created_at, updated_at";

/// Internal row type for contact queries.
#[derive(Debug, sqlx::FromRow)]
struct ContactRow {
    id: Uuid,
    name: String,
    email: String,
    phone_number: Option<String>,
    message: String,
    status: String,
    response: String,
    responded_by: Option<Uuid>,
    responded_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<ContactRow> for Contact {
    type Error = RepositoryError;

    fn try_from(row: ContactRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let status: ContactStatus = row
            .status
            .parse()
            .map_err(|e| RepositoryError::DataCorruption(format!("contact {}: {e}", row.id)))?;

        Ok(Self {
            id: ContactId::new(row.id),
            name: row.name,
            email,
            phone_number: row.phone_number,
            message: row.message,
            status,
            response: row.response,
            responded_by: row.responded_by.map(UserId::new),
            responded_at: row.responded_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Fields for a new contact submission.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: Email,
    pub phone_number: Option<String>,
    pub message: String,
}

/// Repository for contact message database operations.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new contact message with status `new`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert(&self, new: NewContact) -> Result<Contact, RepositoryError> {
        let row: ContactRow = sqlx::query_as(&format!(
            "INSERT INTO contacts (id, name, email, phone_number, message)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {CONTACT_COLUMNS}"
        ))
        .bind(ContactId::mint())
        .bind(new.name)
        .bind(new.email)
        .bind(new.phone_number)
        .bind(new.message)
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// List one page of contact messages, newest first, optionally filtered
    /// by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        page: u32,
        limit: u32,
        status: Option<ContactStatus>,
    ) -> Result<ContactPage, RepositoryError> {
        let limit = i64::from(limit.max(1));
        let offset = (i64::from(page.max(1)) - 1) * limit;

        let mut count_builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM contacts");
        if let Some(status) = status {
            count_builder
                .push(" WHERE status = ")
                .push_bind(status.as_str());
        }
        let total: i64 = count_builder
            .build_query_scalar()
            .fetch_one(self.pool)
            .await?;

        let mut builder =
            QueryBuilder::<Postgres>::new(format!("SELECT {CONTACT_COLUMNS} FROM contacts"));
        if let Some(status) = status {
            builder.push(" WHERE status = ").push_bind(status.as_str());
        }
        builder.push(" ORDER BY created_at DESC");
        builder.push(" LIMIT ").push_bind(limit);
        builder.push(" OFFSET ").push_bind(offset);

        let rows: Vec<ContactRow> = builder.build_query_as().fetch_all(self.pool).await?;
        let contacts: Vec<Contact> = rows
            .into_iter()
            .map(TryInto::try_into)
            .collect::<Result<_, _>>()?;

        Ok(ContactPage {
            contacts,
            total_pages: (total + limit - 1) / limit,
            current_page: page.max(1),
            total,
        })
    }

    /// Get a contact message by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ContactId) -> Result<Option<Contact>, RepositoryError> {
        let row: Option<ContactRow> =
            sqlx::query_as(&format!("SELECT {CONTACT_COLUMNS} FROM contacts WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// Persist a contact message's mutable fields.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the update fails.
    pub async fn update(&self, contact: &Contact) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE contacts
             SET status = $2, response = $3, responded_by = $4, responded_at = $5,
                 updated_at = NOW()
             WHERE id = $1",
        )
        .bind(contact.id)
        .bind(contact.status.as_str())
        .bind(&contact.response)
        .bind(contact.responded_by)
        .bind(contact.responded_at)
        .execute(self.pool)
        .await?;

        Ok(())
    }

    /// Delete a contact message.
    ///
    /// Returns `false` if no such message exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the delete fails.
    pub async fn delete(&self, id: ContactId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM contacts WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
