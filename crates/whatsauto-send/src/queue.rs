//! The send queue: contacts that still need their invitation, in the order
//! their assignments were saved.

use std::collections::HashMap;

use serde::Serialize;

use whatsauto_shared::types::{ContactId, ContactStatus, DocumentId};
use whatsauto_store::{Assignment, Contact, Database, Document};

/// One contact waiting for a send.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    pub contact: Contact,
    pub assignment: Assignment,
    /// `None` when the assigned document was deleted after assignment.
    pub document: Option<Document>,
}

/// Project the stored collections into the send queue.
///
/// Assignment order is queue order. Contacts already `sent` or `failed`
/// drop out, as do assignments whose contact no longer exists.
pub fn build_queue(
    contacts: &[Contact],
    assignments: &[Assignment],
    documents: &[Document],
) -> Vec<QueueEntry> {
    let contacts: HashMap<ContactId, &Contact> = contacts.iter().map(|c| (c.id, c)).collect();
    let documents: HashMap<DocumentId, &Document> = documents.iter().map(|d| (d.id, d)).collect();

    assignments
        .iter()
        .filter_map(|assignment| {
            let contact = contacts.get(&assignment.contact_id)?;
            if !contact.status.is_queueable() {
                return None;
            }
            Some(QueueEntry {
                contact: (*contact).clone(),
                assignment: assignment.clone(),
                document: documents.get(&assignment.document_id).map(|d| (*d).clone()),
            })
        })
        .collect()
}

/// Load all three collections and build the queue.
pub fn load_queue(db: &Database) -> whatsauto_store::Result<Vec<QueueEntry>> {
    let contacts: Vec<Contact> = db.get_all()?;
    let assignments: Vec<Assignment> = db.get_all()?;
    let documents: Vec<Document> = db.get_all()?;

    let queue = build_queue(&contacts, &assignments, &documents);
    tracing::debug!(
        assignments = assignments.len(),
        queued = queue.len(),
        "queue rebuilt"
    );
    Ok(queue)
}

/// Progress counters over contacts that have an assignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub total: usize,
    pub sent: usize,
    /// `pending` and `assigned` together.
    pub pending: usize,
    pub failed: usize,
}

impl QueueStats {
    pub fn compute(contacts: &[Contact], assignments: &[Assignment]) -> Self {
        let statuses: HashMap<ContactId, ContactStatus> =
            contacts.iter().map(|c| (c.id, c.status)).collect();

        let mut stats = QueueStats::default();
        for status in assignments
            .iter()
            .filter_map(|a| statuses.get(&a.contact_id))
        {
            stats.total += 1;
            match status {
                ContactStatus::Sent => stats.sent += 1,
                ContactStatus::Failed => stats.failed += 1,
                ContactStatus::Pending | ContactStatus::Assigned => stats.pending += 1,
            }
        }
        stats
    }

    pub fn load(db: &Database) -> whatsauto_store::Result<Self> {
        let contacts: Vec<Contact> = db.get_all()?;
        let assignments: Vec<Assignment> = db.get_all()?;
        Ok(Self::compute(&contacts, &assignments))
    }

    /// Share of sent contacts, 0 to 100. An empty queue reports 0.
    pub fn progress_percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.sent as f64 * 100.0 / self.total as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use whatsauto_shared::types::{ContactOrigin, Variant};

    fn contact(name: &str, phone: &str, status: ContactStatus) -> Contact {
        let mut c = Contact::new(name, phone, ContactOrigin::File, "1").unwrap();
        c.status = status;
        c
    }

    #[test]
    fn keeps_only_queueable_contacts_in_assignment_order() {
        let doc = Document::new("invite.pdf", b"%PDF-x".to_vec());
        let a = contact("A", "555-000-0001", ContactStatus::Pending);
        let b = contact("B", "555-000-0002", ContactStatus::Sent);
        let c = contact("C", "555-000-0003", ContactStatus::Assigned);
        let assignments = vec![
            Assignment::new(a.id, doc.id, Variant::TwoMember),
            Assignment::new(b.id, doc.id, Variant::TwoMember),
            Assignment::new(c.id, doc.id, Variant::AllMember),
        ];

        // Contact order differs from assignment order on purpose.
        let contacts = vec![c.clone(), b, a.clone()];
        let queue = build_queue(&contacts, &assignments, &[doc.clone()]);

        let names: Vec<&str> = queue.iter().map(|e| e.contact.name.as_str()).collect();
        assert_eq!(names, vec!["A", "C"]);
        assert_eq!(queue[1].assignment.variant, Variant::AllMember);
        assert_eq!(queue[0].document.as_ref().map(|d| d.id), Some(doc.id));
    }

    #[test]
    fn missing_document_keeps_entry_without_attachment() {
        let (doc, gone) = (
            Document::new("kept.pdf", b"%PDF-k".to_vec()),
            DocumentId::new(),
        );
        let a = contact("A", "555-000-0001", ContactStatus::Assigned);
        let assignments = vec![Assignment::new(a.id, gone, Variant::TwoMember)];

        let queue = build_queue(&[a], &assignments, &[doc]);

        assert_eq!(queue.len(), 1);
        assert!(queue[0].document.is_none());
    }

    #[test]
    fn assignment_without_contact_is_skipped() {
        let doc = Document::new("invite.pdf", b"%PDF-x".to_vec());
        let assignments = vec![Assignment::new(ContactId::new(), doc.id, Variant::TwoMember)];

        assert!(build_queue(&[], &assignments, &[doc]).is_empty());
    }

    #[test]
    fn stats_count_assigned_contacts_only() {
        let doc = Document::new("invite.pdf", b"%PDF-x".to_vec());
        let sent = contact("S", "555-000-0001", ContactStatus::Sent);
        let failed = contact("F", "555-000-0002", ContactStatus::Failed);
        let waiting = contact("W", "555-000-0003", ContactStatus::Assigned);
        let pending = contact("P", "555-000-0004", ContactStatus::Pending);
        let unassigned = contact("U", "555-000-0005", ContactStatus::Pending);
        let assignments: Vec<Assignment> = [&sent, &failed, &waiting, &pending]
            .iter()
            .map(|c| Assignment::new(c.id, doc.id, Variant::TwoMember))
            .collect();

        let stats = QueueStats::compute(&[sent, failed, waiting, pending, unassigned], &assignments);

        assert_eq!(
            stats,
            QueueStats {
                total: 4,
                sent: 1,
                pending: 2,
                failed: 1,
            }
        );
        assert_eq!(stats.progress_percent(), 25.0);
        assert_eq!(QueueStats::default().progress_percent(), 0.0);
    }

    #[test]
    fn deleted_document_survives_a_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open_at(&dir.path().join("queue.db")).unwrap();
        let doc = Document::new("invite.pdf", b"%PDF-x".to_vec());
        let a = contact("A", "555-000-0001", ContactStatus::Pending);
        db.put(&doc).unwrap();
        db.put(&a).unwrap();
        db.save_assignment(&Assignment::new(a.id, doc.id, Variant::TwoMember))
            .unwrap();

        db.delete::<Document>(&doc.id).unwrap();
        let queue = load_queue(&db).unwrap();

        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].contact.id, a.id);
        assert_eq!(queue[0].contact.status, ContactStatus::Assigned);
        assert!(queue[0].document.is_none());
    }
}
