use std::collections::HashMap;

use anyhow::{bail, Context as _};
use clap::Subcommand;

use whatsauto_shared::types::{ContactId, ContactStatus, DocumentId, Variant};
use whatsauto_store::{Assignment, Contact, Document};

use super::{format_time, Context};
use crate::output;

#[derive(Subcommand)]
pub enum AssignAction {
    /// Assign a document to contacts. Re-assigning replaces the previous
    /// choice and keeps the contact's place in the queue.
    Set {
        document: DocumentId,
        contacts: Vec<ContactId>,
        #[arg(long, default_value_t = Variant::TwoMember)]
        variant: Variant,
        /// Assign every pending contact that has no assignment yet.
        #[arg(long, conflicts_with = "contacts")]
        all_unassigned: bool,
    },
    /// List assignments in send order.
    List,
}

pub fn run(action: AssignAction, ctx: &Context<'_>) -> anyhow::Result<()> {
    match action {
        AssignAction::Set {
            document,
            contacts,
            variant,
            all_unassigned,
        } => set(ctx, document, contacts, variant, all_unassigned),
        AssignAction::List => list(ctx),
    }
}

fn set(
    ctx: &Context<'_>,
    document_id: DocumentId,
    mut contact_ids: Vec<ContactId>,
    variant: Variant,
    all_unassigned: bool,
) -> anyhow::Result<()> {
    let document = ctx
        .db
        .get_one::<Document>(&document_id)?
        .with_context(|| format!("Document {document_id} not found"))?;
    if !document.is_approved_for(variant) {
        output::print_warning(
            &format!("{} is not approved for {variant}", document.name),
            ctx.json,
        );
    }

    if all_unassigned {
        let assigned: Vec<Assignment> = ctx.db.get_all()?;
        let contacts: Vec<Contact> = ctx.db.get_all()?;
        contact_ids = contacts
            .iter()
            .filter(|c| c.status == ContactStatus::Pending)
            .filter(|c| !assigned.iter().any(|a| a.contact_id == c.id))
            .map(|c| c.id)
            .collect();
    }
    if contact_ids.is_empty() {
        bail!("No contacts to assign");
    }

    let batch: Vec<Assignment> = contact_ids
        .iter()
        .map(|id| Assignment::new(*id, document_id, variant))
        .collect();
    let promoted = ctx.db.save_assignments(&batch)?;

    output::print_success(
        &format!(
            "{} assigned to {} contact(s) as {variant} ({promoted} newly queued)",
            document.name,
            batch.len()
        ),
        ctx.json,
    );
    Ok(())
}

fn list(ctx: &Context<'_>) -> anyhow::Result<()> {
    let assignments: Vec<Assignment> = ctx.db.get_all()?;
    let contacts: HashMap<ContactId, Contact> = ctx
        .db
        .get_all::<Contact>()?
        .into_iter()
        .map(|c| (c.id, c))
        .collect();
    let documents: HashMap<DocumentId, String> = ctx
        .db
        .get_all::<Document>()?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();

    let rows: Vec<Vec<String>> = assignments
        .iter()
        .map(|a| {
            let contact = contacts.get(&a.contact_id);
            vec![
                contact.map_or_else(|| format!("(deleted {})", a.contact_id.short()), |c| c.name.clone()),
                contact.map(|c| c.display_phone.clone()).unwrap_or_default(),
                documents
                    .get(&a.document_id)
                    .cloned()
                    .unwrap_or_else(|| "(deleted)".to_string()),
                a.variant.to_string(),
                contact.map(|c| c.status.to_string()).unwrap_or_default(),
                format_time(&a.assigned_at),
            ]
        })
        .collect();

    output::print_table(
        &["contact", "phone", "document", "variant", "status", "assigned"],
        &rows,
        ctx.json,
    );
    Ok(())
}
