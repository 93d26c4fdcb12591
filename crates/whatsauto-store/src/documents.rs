//! Storage mapping and helpers for [`Document`] records.

use bytes::Bytes;
use rusqlite::types::Value;
use rusqlite::Row;
use uuid::Uuid;

use whatsauto_shared::types::{DocumentId, Variant, VariantFlags};

use crate::database::Database;
use crate::error::{Result, StoreError};
use crate::models::Document;
use crate::record::{
    conversion_failure, decode_timestamp, encode_timestamp, get_one_in, put_in, Collection,
    Record,
};

impl Record for Document {
    type Key = DocumentId;

    const COLLECTION: Collection = Collection::Documents;

    const COLUMNS: &'static [&'static str] = &[
        "id",
        "name",
        "payload",
        "uploaded_at",
        "variants",
        "size",
        "mime_type",
        "content_hash",
    ];

    fn key(&self) -> &DocumentId {
        &self.id
    }

    fn encode_key(key: &DocumentId) -> String {
        key.to_string()
    }

    fn to_values(&self) -> Result<Vec<Value>> {
        let size = i64::try_from(self.size)
            .map_err(|_| StoreError::Serialization(format!("document size {} overflows", self.size)))?;

        Ok(vec![
            Value::Text(self.id.to_string()),
            Value::Text(self.name.clone()),
            Value::Blob(self.payload.to_vec()),
            encode_timestamp(&self.uploaded_at),
            Value::Text(serde_json::to_string(&self.variants)?),
            Value::Integer(size),
            Value::Text(self.mime_type.clone()),
            Value::Text(self.content_hash.clone()),
        ])
    }

    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let id_str: String = row.get(0)?;
        let name: String = row.get(1)?;
        let payload: Vec<u8> = row.get(2)?;
        let uploaded_str: String = row.get(3)?;
        let variants_json: String = row.get(4)?;
        let size: i64 = row.get(5)?;
        let mime_type: String = row.get(6)?;
        let content_hash: String = row.get(7)?;

        let id = Uuid::parse_str(&id_str).map_err(|e| conversion_failure(0, e))?;
        let uploaded_at = decode_timestamp(3, &uploaded_str)?;
        let variants: VariantFlags =
            serde_json::from_str(&variants_json).map_err(|e| conversion_failure(4, e))?;
        let size = u64::try_from(size).map_err(|e| conversion_failure(5, e))?;

        Ok(Document {
            id: DocumentId(id),
            name,
            payload: Bytes::from(payload),
            uploaded_at,
            variants,
            size,
            mime_type,
            content_hash,
        })
    }
}

impl Database {
    /// Turn one variant approval flag on or off.
    pub fn set_variant_flag(
        &self,
        id: DocumentId,
        variant: Variant,
        enabled: bool,
    ) -> Result<Document> {
        let tx = self.conn().unchecked_transaction()?;

        let mut document = get_one_in::<Document>(&tx, &id)?
            .ok_or_else(|| StoreError::not_found(Collection::Documents, id))?;
        document.variants.set(variant, enabled);
        put_in(&tx, &document)?;

        tx.commit()?;

        tracing::info!(document = %id, %variant, enabled, "variant flag updated");
        Ok(document)
    }

    /// Find an already stored document with the same content.
    pub fn find_document_by_hash(&self, content_hash: &str) -> Result<Option<DocumentId>> {
        let mut stmt = self
            .conn()
            .prepare("SELECT id FROM documents WHERE content_hash = ?1 ORDER BY rowid LIMIT 1")?;
        let mut rows = stmt.query([content_hash])?;

        match rows.next()? {
            Some(row) => {
                let id_str: String = row.get(0)?;
                let id = Uuid::parse_str(&id_str)
                    .map_err(|e| StoreError::Serialization(e.to_string()))?;
                Ok(Some(DocumentId(id)))
            }
            None => Ok(None),
        }
    }
}
