//! Contact commands: import, add, list, search, delete, reset.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use clap::Subcommand;
use tracing::{info, warn};

use whatsauto_shared::import::{parse_contact_csv, parse_vcard, ParsedImport};
use whatsauto_shared::types::{ContactId, ContactOrigin, ContactStatus};
use whatsauto_store::{Assignment, Contact};

use super::Context;
use crate::output;

#[derive(Subcommand)]
pub enum ContactsAction {
    /// Import a `name,phone` file. The first row is a header.
    Import { file: PathBuf },
    /// Import a vCard export of the device address book.
    ImportVcf { file: PathBuf },
    /// Add one contact.
    Add {
        name: String,
        phone: String,
        /// The contact is saved in the device address book.
        #[arg(long)]
        device: bool,
    },
    /// List contacts.
    List {
        /// Only contacts with this status.
        #[arg(long)]
        status: Option<ContactStatus>,
    },
    /// Find contacts by name or number.
    Search { query: String },
    /// Delete a contact.
    Delete { id: ContactId },
    /// Manual requeue (extension): put a sent or failed contact back to
    /// pending.
    ///
    /// Outside the normal send flow, which never moves a contact backwards.
    /// Use it to retry a failed send.
    Reset { id: ContactId },
}

pub fn run(action: ContactsAction, ctx: &Context<'_>) -> anyhow::Result<()> {
    match action {
        ContactsAction::Import { file } => {
            let text = read_text(&file)?;
            import(ctx, parse_contact_csv(&text), ContactOrigin::File)
        }
        ContactsAction::ImportVcf { file } => {
            let text = read_text(&file)?;
            import(ctx, parse_vcard(&text), ContactOrigin::Device)
        }
        ContactsAction::Add {
            name,
            phone,
            device,
        } => add(ctx, &name, &phone, device),
        ContactsAction::List { status } => list(ctx, |c| status.map_or(true, |s| c.status == s)),
        ContactsAction::Search { query } => list(ctx, |c| c.matches(&query)),
        ContactsAction::Delete { id } => delete(ctx, id),
        ContactsAction::Reset { id } => {
            let contact = ctx.db.reset_contact(id)?;
            output::print_success(&format!("{} is pending again", contact.label()), ctx.json);
            Ok(())
        }
    }
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))
}

/// Build contacts from parsed rows. Rows whose number has no digits are
/// counted with the parser's skips.
fn build_contacts(
    parsed: ParsedImport,
    origin: ContactOrigin,
    country_code: &str,
) -> (Vec<Contact>, usize) {
    let mut skipped = parsed.skipped;
    let mut contacts = Vec::with_capacity(parsed.rows.len());

    for row in parsed.rows {
        match Contact::new(row.name, &row.phone, origin, country_code) {
            Ok(contact) => contacts.push(contact),
            Err(e) => {
                warn!(phone = %row.phone, error = %e, "import row skipped");
                skipped += 1;
            }
        }
    }
    (contacts, skipped)
}

fn import(ctx: &Context<'_>, parsed: ParsedImport, origin: ContactOrigin) -> anyhow::Result<()> {
    let (contacts, skipped) = build_contacts(parsed, origin, &ctx.config.country_code);
    if contacts.is_empty() {
        bail!("No contacts found in file ({skipped} row(s) skipped)");
    }

    ctx.db.put_many(&contacts)?;
    info!(imported = contacts.len(), skipped, %origin, "contacts imported");
    output::print_success(
        &format!(
            "imported {} contact(s), {skipped} row(s) skipped",
            contacts.len()
        ),
        ctx.json,
    );
    Ok(())
}

fn add(ctx: &Context<'_>, name: &str, phone: &str, device: bool) -> anyhow::Result<()> {
    let origin = if device {
        ContactOrigin::Device
    } else {
        ContactOrigin::File
    };
    let contact = Contact::new(name.trim(), phone, origin, &ctx.config.country_code)
        .with_context(|| format!("Invalid phone number {phone:?}"))?;

    ctx.db.put(&contact)?;
    output::print_success(
        &format!("added {} ({}) as {}", contact.name, contact.display_phone, contact.id),
        ctx.json,
    );
    Ok(())
}

fn list(ctx: &Context<'_>, keep: impl Fn(&Contact) -> bool) -> anyhow::Result<()> {
    let contacts: Vec<Contact> = ctx.db.get_all()?;

    let rows: Vec<Vec<String>> = contacts
        .iter()
        .filter(|c| keep(c))
        .map(|c| {
            vec![
                c.id.to_string(),
                c.name.clone(),
                c.display_phone.clone(),
                c.origin.to_string(),
                c.status.to_string(),
                c.last_error.clone().unwrap_or_default(),
            ]
        })
        .collect();

    output::print_table(
        &["id", "name", "phone", "origin", "status", "last error"],
        &rows,
        ctx.json,
    );
    Ok(())
}

fn delete(ctx: &Context<'_>, id: ContactId) -> anyhow::Result<()> {
    if ctx.db.get_one::<Assignment>(&id)?.is_some() {
        output::print_warning(
            "this contact has an assignment; it stays stored but is no longer queued",
            ctx.json,
        );
    }

    if !ctx.db.delete::<Contact>(&id)? {
        bail!("Contact {id} not found");
    }
    output::print_success(&format!("contact {id} deleted"), ctx.json);
    Ok(())
}
