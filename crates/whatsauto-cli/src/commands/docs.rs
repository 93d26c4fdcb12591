//! Document commands: upload, list, flag, delete, export.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context as _};
use clap::Subcommand;
use tracing::{info, warn};

use whatsauto_shared::import::looks_like_pdf;
use whatsauto_shared::types::{DocumentId, Variant};
use whatsauto_store::Document;

use super::{format_time, Context};
use crate::output;

#[derive(Subcommand)]
pub enum DocsAction {
    /// Upload one or more PDF files.
    Upload {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        /// Approve the uploads for two-member invitations.
        #[arg(long)]
        two_member: bool,
        /// Approve the uploads for all-member invitations.
        #[arg(long)]
        all_member: bool,
    },
    /// List uploaded documents.
    List,
    /// Approve or withdraw a document for one variant.
    Flag {
        id: DocumentId,
        /// `two-member` or `all-member`.
        variant: Variant,
        /// Withdraw the approval instead of granting it.
        #[arg(long)]
        off: bool,
    },
    /// Delete a document.
    Delete {
        id: DocumentId,
        /// Delete even when contacts are assigned to it.
        #[arg(long)]
        force: bool,
    },
    /// Write a stored document back to disk.
    Export { id: DocumentId, out: PathBuf },
}

pub fn run(action: DocsAction, ctx: &Context<'_>) -> anyhow::Result<()> {
    match action {
        DocsAction::Upload {
            paths,
            two_member,
            all_member,
        } => upload(ctx, &paths, two_member, all_member),
        DocsAction::List => list(ctx),
        DocsAction::Flag { id, variant, off } => flag(ctx, id, variant, !off),
        DocsAction::Delete { id, force } => delete(ctx, id, force),
        DocsAction::Export { id, out } => export(ctx, id, &out),
    }
}

/// Read and check one file. `Ok(None)` means it was rejected with a warning.
fn load_pdf(ctx: &Context<'_>, path: &Path) -> anyhow::Result<Option<Document>> {
    let size = std::fs::metadata(path)
        .with_context(|| format!("Cannot read {}", path.display()))?
        .len();
    if size > ctx.config.max_pdf_bytes as u64 {
        output::print_warning(
            &format!(
                "{}: {} exceeds the {} limit, skipped",
                path.display(),
                output::format_size(size),
                output::format_size(ctx.config.max_pdf_bytes as u64)
            ),
            ctx.json,
        );
        return Ok(None);
    }

    let document = Document::from_path(path)?;
    if !looks_like_pdf(&document.payload) {
        output::print_warning(&format!("{}: not a PDF file, skipped", path.display()), ctx.json);
        return Ok(None);
    }

    if let Some(existing) = ctx.db.find_document_by_hash(&document.content_hash)? {
        output::print_warning(
            &format!("{}: already uploaded as {existing}, skipped", path.display()),
            ctx.json,
        );
        return Ok(None);
    }

    Ok(Some(document))
}

fn upload(
    ctx: &Context<'_>,
    paths: &[PathBuf],
    two_member: bool,
    all_member: bool,
) -> anyhow::Result<()> {
    let mut accepted = Vec::new();
    for path in paths {
        if let Some(mut document) = load_pdf(ctx, path)? {
            if accepted
                .iter()
                .any(|d: &Document| d.content_hash == document.content_hash)
            {
                output::print_warning(
                    &format!("{}: same content given twice, skipped", path.display()),
                    ctx.json,
                );
                continue;
            }
            document.variants.set(Variant::TwoMember, two_member);
            document.variants.set(Variant::AllMember, all_member);
            accepted.push(document);
        }
    }

    if accepted.is_empty() {
        bail!("No documents uploaded");
    }

    ctx.db.put_many(&accepted)?;
    info!(count = accepted.len(), "documents uploaded");

    for document in &accepted {
        output::print_success(
            &format!(
                "uploaded {} ({}) as {}",
                document.name,
                output::format_size(document.size),
                document.id
            ),
            ctx.json,
        );
    }
    Ok(())
}

fn yes_no(flag: bool) -> String {
    let s = if flag { "yes" } else { "no" };
    s.to_string()
}

fn list(ctx: &Context<'_>) -> anyhow::Result<()> {
    let documents: Vec<Document> = ctx.db.get_all()?;

    let rows: Vec<Vec<String>> = documents
        .iter()
        .map(|d| {
            let integrity = if d.verify_payload() { "ok" } else { "CORRUPT" };
            if integrity != "ok" {
                warn!(document = %d.id, "payload does not match its digest");
            }
            vec![
                d.id.to_string(),
                d.name.clone(),
                output::format_size(d.size),
                yes_no(d.variants.two_member),
                yes_no(d.variants.all_member),
                format_time(&d.uploaded_at),
                integrity.to_string(),
            ]
        })
        .collect();

    output::print_table(
        &[
            "id",
            "name",
            "size",
            "two-member",
            "all-member",
            "uploaded",
            "integrity",
        ],
        &rows,
        ctx.json,
    );
    Ok(())
}

fn flag(ctx: &Context<'_>, id: DocumentId, variant: Variant, enabled: bool) -> anyhow::Result<()> {
    let document = ctx.db.set_variant_flag(id, variant, enabled)?;
    let verb = if enabled { "approved" } else { "withdrawn" };
    output::print_success(&format!("{} {verb} for {variant}", document.name), ctx.json);
    Ok(())
}

fn delete(ctx: &Context<'_>, id: DocumentId, force: bool) -> anyhow::Result<()> {
    let dependents = ctx.db.assignments_for_document(id)?;
    if !dependents.is_empty() {
        if !force {
            bail!(
                "{} contact(s) are assigned this document; reassign them first or pass --force",
                dependents.len()
            );
        }
        output::print_warning(
            &format!(
                "{} assignment(s) still point at this document and will open without an attachment",
                dependents.len()
            ),
            ctx.json,
        );
    }

    if !ctx.db.delete::<Document>(&id)? {
        bail!("Document {id} not found");
    }
    output::print_success(&format!("document {id} deleted"), ctx.json);
    Ok(())
}

fn export(ctx: &Context<'_>, id: DocumentId, out: &Path) -> anyhow::Result<()> {
    let document = ctx
        .db
        .get_one::<Document>(&id)?
        .with_context(|| format!("Document {id} not found"))?;

    std::fs::write(out, &document.payload)
        .with_context(|| format!("Cannot write {}", out.display()))?;
    output::print_success(
        &format!("{} written to {}", document.name, out.display()),
        ctx.json,
    );
    Ok(())
}
