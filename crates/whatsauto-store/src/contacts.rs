//! Storage mapping for [`Contact`] records and the status update helper.

use chrono::Utc;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

use whatsauto_shared::types::{ContactId, ContactStatus};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Contact;
use crate::record::{
    conversion_failure, decode_tag, decode_timestamp, encode_timestamp, get_one_in,
    optional_text, put_in, Collection, Record,
};

impl Record for Contact {
    type Key = ContactId;

    const COLLECTION: Collection = Collection::Contacts;

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "phone",
        "display_phone",
        "origin",
        "status",
        "last_sent_at",
        "last_error",
        "raw_phone",
    ];

    fn key(&self) -> &ContactId {
        &self.id
    }

    fn encode_key(key: &ContactId) -> String {
        key.to_string()
    }

    fn to_values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            Value::Text(self.id.to_string()),
            Value::Text(self.name.clone()),
            Value::Text(self.phone.clone()),
            Value::Text(self.display_phone.clone()),
            Value::Text(self.origin.as_str().to_string()),
            Value::Text(self.status.as_str().to_string()),
            self.last_sent_at
                .as_ref()
                .map_or(Value::Null, encode_timestamp),
            optional_text(self.last_error.as_deref()),
            Value::Text(self.raw_phone.clone()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id_str: String = row.get(0)?;
        let name: String = row.get(1)?;
        let phone: String = row.get(2)?;
        let display_phone: String = row.get(3)?;
        let origin_str: String = row.get(4)?;
        let status_str: String = row.get(5)?;
        let last_sent_str: Option<String> = row.get(6)?;
        let last_error: Option<String> = row.get(7)?;
        let raw_phone: String = row.get(8)?;

        let id = Uuid::parse_str(&id_str).map_err(|e| conversion_failure(0, e))?;
        let last_sent_at = last_sent_str
            .map(|s| decode_timestamp(6, &s))
            .transpose()?;

        Ok(Contact {
            id: ContactId(id),
            name,
            raw_phone,
            phone,
            display_phone,
            origin: decode_tag(4, &origin_str)?,
            status: decode_tag(5, &status_str)?,
            last_sent_at,
            last_error,
        })
    }
}

impl Database {
    /// Read-modify-write of a contact's status in one transaction.
    ///
    /// Fails with [`StoreError::NotFound`] when the contact does not exist
    /// and with [`StoreError::InvalidTransition`] when the move is not
    /// forward; in both cases nothing is written. `last_sent_at` is stamped
    /// only when moving to `sent`; `last_error` is replaced only when a
    /// message is given.
    pub fn update_status(
        &self,
        id: ContactId,
        status: ContactStatus,
        error_message: Option<&str>,
    ) -> Result<Contact> {
        let tx = self.conn().unchecked_transaction()?;

        let mut contact = get_one_in::<Contact>(&tx, &id)?
            .ok_or_else(|| StoreError::not_found(Collection::Contacts, id))?;

        if !contact.status.can_advance_to(status) {
            return Err(StoreError::InvalidTransition {
                contact: id,
                from: contact.status,
                to: status,
            });
        }

        contact.status = status;
        if status == ContactStatus::Sent {
            contact.last_sent_at = Some(Utc::now());
        }
        if let Some(message) = error_message {
            contact.last_error = Some(message.to_string());
        }

        put_in(&tx, &contact)?;
        tx.commit()?;

        tracing::debug!(contact = %id.short(), %status, "contact status updated");
        Ok(contact)
    }

    /// Put a contact back to `pending` so it can be queued again.
    ///
    /// Manual requeue, outside the send flow. A full-record put, since
    /// [`Database::update_status`] never moves a contact backwards. The last
    /// error is cleared; the last send time is kept as history.
    pub fn reset_contact(&self, id: ContactId) -> Result<Contact> {
        let mut contact = self
            .get_one::<Contact>(&id)?
            .ok_or_else(|| StoreError::not_found(Collection::Contacts, id))?;

        contact.status = ContactStatus::Pending;
        contact.last_error = None;
        self.put(&contact)?;

        tracing::info!(contact = %id.short(), "contact reset to pending");
        Ok(contact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatsauto_shared::types::ContactOrigin;

    fn open() -> (tempfile::TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("contacts.db")).unwrap();
        (dir, db)
    }

    fn contact(name: &str, phone: &str, status: ContactStatus) -> Contact {
        let mut c = Contact::new(name, phone, ContactOrigin::File, "1").unwrap();
        c.status = status;
        c
    }

    #[test]
    fn raw_input_survives_storage() {
        let (_dir, db) = open();
        let c = contact("Alice", " (555) 000-0001 ", ContactStatus::Pending);
        db.put(&c).unwrap();

        let stored: Contact = db.get_one(&c.id).unwrap().unwrap();
        assert_eq!(stored.raw_phone, "(555) 000-0001");
        assert_eq!(stored.phone, "+15550000001");
    }

    #[test]
    fn assigned_to_sent_stamps_last_sent() {
        let (_dir, db) = open();
        let c = contact("Alice", "555-000-0001", ContactStatus::Assigned);
        db.put(&c).unwrap();

        let before = Utc::now();
        db.update_status(c.id, ContactStatus::Sent, None).unwrap();

        let stored: Contact = db.get_one(&c.id).unwrap().unwrap();
        assert_eq!(stored.status, ContactStatus::Sent);
        assert!(stored.last_sent_at.unwrap() >= before);
        assert_eq!(stored.last_error, None);
    }

    #[test]
    fn failure_records_message_without_send_time() {
        let (_dir, db) = open();
        let c = contact("Bob", "555-000-0002", ContactStatus::Assigned);
        db.put(&c).unwrap();

        let updated = db
            .update_status(c.id, ContactStatus::Failed, Some("launcher missing"))
            .unwrap();

        assert_eq!(updated.status, ContactStatus::Failed);
        assert_eq!(updated.last_error.as_deref(), Some("launcher missing"));
        assert!(updated.last_sent_at.is_none());
    }

    #[test]
    fn missing_contact_is_not_found_and_nothing_changes() {
        let (_dir, db) = open();
        let c = contact("Carol", "555-000-0003", ContactStatus::Pending);
        db.put(&c).unwrap();

        let err = db
            .update_status(ContactId::new(), ContactStatus::Sent, None)
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(db.get_all::<Contact>().unwrap(), vec![c]);
    }

    #[test]
    fn terminal_status_is_not_left() {
        let (_dir, db) = open();
        let c = contact("Dan", "555-000-0004", ContactStatus::Sent);
        db.put(&c).unwrap();

        let err = db
            .update_status(c.id, ContactStatus::Assigned, None)
            .unwrap_err();
        assert!(matches!(err, StoreError::InvalidTransition { .. }));

        let stored: Contact = db.get_one(&c.id).unwrap().unwrap();
        assert_eq!(stored.status, ContactStatus::Sent);
    }

    #[test]
    fn batch_put_is_all_or_nothing() {
        let (_dir, db) = open();
        let good = contact("Eve", "555-000-0005", ContactStatus::Pending);
        let dup = contact("Eve 2", "555-000-0006", ContactStatus::Pending);
        db.put_many(&[good.clone(), dup.clone()]).unwrap();
        assert_eq!(db.count::<Contact>().unwrap(), 2);

        // A row rejected halfway through rolls the whole batch back.
        db.conn()
            .execute_batch(
                "CREATE TRIGGER reject_mallory BEFORE INSERT ON contacts
                 WHEN NEW.name = 'Mallory'
                 BEGIN SELECT RAISE(ABORT, 'rejected'); END;",
            )
            .unwrap();
        let batch = vec![
            contact("Frank", "555-000-0007", ContactStatus::Pending),
            contact("Mallory", "555-000-0008", ContactStatus::Pending),
        ];
        assert!(db.put_many(&batch).is_err());
        assert_eq!(db.count::<Contact>().unwrap(), 2);
    }

    #[test]
    fn reset_moves_failed_back_to_pending() {
        let (_dir, db) = open();
        let c = contact("Gina", "555-000-0009", ContactStatus::Assigned);
        db.put(&c).unwrap();
        db.update_status(c.id, ContactStatus::Failed, Some("boom"))
            .unwrap();

        let reset = db.reset_contact(c.id).unwrap();
        assert_eq!(reset.status, ContactStatus::Pending);
        assert_eq!(reset.last_error, None);
    }
}
