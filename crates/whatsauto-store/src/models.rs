//! Domain model structs persisted in the local database.
//!
//! Every struct derives `Serialize` and `Deserialize` so it can be printed
//! as JSON by the command line front end.

use std::path::Path;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use whatsauto_shared::constants::PDF_MIME_TYPE;
use whatsauto_shared::phone;
use whatsauto_shared::types::{
    ContactId, ContactOrigin, ContactStatus, DocumentId, Variant, VariantFlags,
};
use whatsauto_shared::PhoneError;

use crate::error::{Result, StoreError};

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// An uploaded invitation PDF.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Document {
    pub id: DocumentId,
    /// Display name, normally the uploaded file name.
    pub name: String,
    /// File contents. Stored as a BLOB; cloning the handle does not copy.
    #[serde(skip)]
    pub payload: Bytes,
    pub uploaded_at: DateTime<Utc>,
    /// Recipient classes this document is approved for.
    pub variants: VariantFlags,
    /// Payload length in bytes.
    pub size: u64,
    pub mime_type: String,
    /// Hex BLAKE3 digest of the payload, computed at upload.
    pub content_hash: String,
}

impl Document {
    /// Build a new PDF document from in-memory bytes. Both variant flags
    /// start out false.
    pub fn new(name: impl Into<String>, payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        Self {
            id: DocumentId::new(),
            name: name.into(),
            size: payload.len() as u64,
            content_hash: hash_payload(&payload),
            payload,
            uploaded_at: Utc::now(),
            variants: VariantFlags::default(),
            mime_type: PDF_MIME_TYPE.to_string(),
        }
    }

    /// Read a document from disk, named after the file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let payload = std::fs::read(path).map_err(|source| StoreError::PayloadUnreadable {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown.pdf")
            .to_string();
        Ok(Self::new(name, payload))
    }

    /// Whether the payload still matches the digest taken at upload.
    pub fn verify_payload(&self) -> bool {
        self.payload.len() as u64 == self.size && hash_payload(&self.payload) == self.content_hash
    }

    pub fn is_approved_for(&self, variant: Variant) -> bool {
        self.variants.get(variant)
    }
}

pub fn hash_payload(payload: &[u8]) -> String {
    hex::encode(blake3::hash(payload).as_bytes())
}

// ---------------------------------------------------------------------------
// Contact
// ---------------------------------------------------------------------------

/// A recipient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    /// The number as entered or imported.
    pub raw_phone: String,
    /// Canonical `+<digits>` number.
    pub phone: String,
    /// Grouped for reading only; never used to identify the contact.
    pub display_phone: String,
    pub origin: ContactOrigin,
    pub status: ContactStatus,
    /// Set only when the contact moves to `sent`.
    pub last_sent_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

impl Contact {
    /// Build a `pending` contact from a raw, user-entered number.
    pub fn new(
        name: impl Into<String>,
        raw_phone: &str,
        origin: ContactOrigin,
        country_code: &str,
    ) -> std::result::Result<Self, PhoneError> {
        let phone = phone::normalize(raw_phone, country_code)?;
        Ok(Self {
            id: ContactId::new(),
            name: name.into(),
            raw_phone: raw_phone.trim().to_string(),
            display_phone: phone::display(&phone),
            phone,
            origin,
            status: ContactStatus::Pending,
            last_sent_at: None,
            last_error: None,
        })
    }

    /// How the recipient is addressed when opening the conversation: by name
    /// for address-book contacts, by number otherwise.
    pub fn label(&self) -> &str {
        if self.origin.is_trusted() {
            &self.name
        } else {
            &self.display_phone
        }
    }

    /// Case-insensitive match against name, canonical number and display number.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&query.to_lowercase())
            || self.phone.contains(query)
            || self.display_phone.contains(query)
    }
}

// ---------------------------------------------------------------------------
// Assignment
// ---------------------------------------------------------------------------

/// The document and variant chosen for one contact. Keyed by contact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Assignment {
    pub contact_id: ContactId,
    pub document_id: DocumentId,
    pub variant: Variant,
    pub assigned_at: DateTime<Utc>,
}

impl Assignment {
    pub fn new(contact_id: ContactId, document_id: DocumentId, variant: Variant) -> Self {
        Self {
            contact_id,
            document_id,
            variant,
            assigned_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_is_unflagged_pdf() {
        let doc = Document::new("invite.pdf", b"%PDF-1.4 body".to_vec());

        assert_eq!(doc.size, 13);
        assert_eq!(doc.mime_type, "application/pdf");
        assert_eq!(doc.variants, VariantFlags::default());
        assert!(doc.verify_payload());
    }

    #[test]
    fn tampered_payload_fails_verification() {
        let mut doc = Document::new("invite.pdf", b"%PDF-1.4 body".to_vec());
        doc.payload = Bytes::from_static(b"%PDF-1.4 BODY");
        assert!(!doc.verify_payload());
    }

    #[test]
    fn missing_file_is_unreadable_payload() {
        let err = Document::from_path(Path::new("/definitely/not/here.pdf")).unwrap_err();
        assert!(matches!(err, StoreError::PayloadUnreadable { .. }));
    }

    #[test]
    fn contact_label_depends_on_origin() {
        let device = Contact::new("Asha", "+91 98765 43210", ContactOrigin::Device, "1").unwrap();
        let file = Contact::new("Asha", "+91 98765 43210", ContactOrigin::File, "1").unwrap();

        assert_eq!(device.phone, "+919876543210");
        assert_eq!(device.label(), "Asha");
        assert_eq!(file.label(), "+91 98765 43210");
        assert_eq!(file.status, ContactStatus::Pending);
    }

    #[test]
    fn contact_search_matches_name_and_number() {
        let c = Contact::new("Bob Marley", "555-123-4567", ContactOrigin::File, "1").unwrap();

        assert!(c.matches("marley"));
        assert!(c.matches("5551234"));
        assert!(c.matches("555 123"));
        assert!(!c.matches("alice"));
    }
}
