//! Storage mapping for [`Assignment`] records.
//!
//! Assignments are keyed by contact id, so saving a second assignment for
//! the same contact overwrites the first while keeping its queue position.

use rusqlite::types::Value;
use rusqlite::{params, Row};
use uuid::Uuid;

use whatsauto_shared::types::{ContactId, ContactStatus, DocumentId};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::{Assignment, Contact, Document};
use crate::record::{
    conversion_failure, decode_tag, decode_timestamp, encode_timestamp, exists_in, get_one_in,
    put_in, query_in, Collection, Record,
};

impl Record for Assignment {
    type Key = ContactId;

    const COLLECTION: Collection = Collection::Assignments;

    const COLUMNS: &'static [&'static str] =
        &["contact_id", "document_id", "variant", "assigned_at"];

    fn key(&self) -> &ContactId {
        &self.contact_id
    }

    fn encode_key(key: &ContactId) -> String {
        key.to_string()
    }

    fn to_values(&self) -> Result<Vec<Value>> {
        Ok(vec![
            Value::Text(self.contact_id.to_string()),
            Value::Text(self.document_id.to_string()),
            Value::Text(self.variant.as_str().to_string()),
            encode_timestamp(&self.assigned_at),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let contact_str: String = row.get(0)?;
        let document_str: String = row.get(1)?;
        let variant_str: String = row.get(2)?;
        let assigned_str: String = row.get(3)?;

        let contact_id = Uuid::parse_str(&contact_str).map_err(|e| conversion_failure(0, e))?;
        let document_id = Uuid::parse_str(&document_str).map_err(|e| conversion_failure(1, e))?;

        Ok(Assignment {
            contact_id: ContactId(contact_id),
            document_id: DocumentId(document_id),
            variant: decode_tag(2, &variant_str)?,
            assigned_at: decode_timestamp(3, &assigned_str)?,
        })
    }
}

impl Database {
    /// Save one assignment. See [`Database::save_assignments`].
    pub fn save_assignment(&self, assignment: &Assignment) -> Result<()> {
        self.save_assignments(std::slice::from_ref(assignment))
            .map(|_| ())
    }

    /// Save a batch of assignments in one transaction.
    ///
    /// Each assignment must reference an existing contact and document,
    /// otherwise the batch fails with [`StoreError::NotFound`] and nothing is
    /// written. Contacts still `pending` move to `assigned`. Returns how many
    /// contacts changed status.
    pub fn save_assignments(&self, assignments: &[Assignment]) -> Result<usize> {
        let tx = self.conn().unchecked_transaction()?;
        let mut promoted = 0;

        for assignment in assignments {
            let mut contact = get_one_in::<Contact>(&tx, &assignment.contact_id)?
                .ok_or_else(|| StoreError::not_found(Collection::Contacts, assignment.contact_id))?;

            if !exists_in::<Document>(&tx, &assignment.document_id)? {
                return Err(StoreError::not_found(
                    Collection::Documents,
                    assignment.document_id,
                ));
            }

            put_in(&tx, assignment)?;

            if contact.status == ContactStatus::Pending {
                contact.status = ContactStatus::Assigned;
                put_in(&tx, &contact)?;
                promoted += 1;
            }
        }

        tx.commit()?;

        tracing::info!(
            count = assignments.len(),
            promoted,
            "assignments saved"
        );
        Ok(promoted)
    }

    /// Assignments pointing at a document, in stored order.
    pub fn assignments_for_document(&self, document_id: DocumentId) -> Result<Vec<Assignment>> {
        query_in(
            self.conn(),
            "WHERE document_id = ?1",
            params![document_id.to_string()],
        )
    }
}
