//! # whatsauto-store
//!
//! Local persistence for WhatsAuto, backed by a single SQLite file.
//!
//! Three independent collections (documents, contacts, assignments) are
//! kept in their own tables. Every record type implements [`Record`], which
//! gives it the same put / get / delete operations and moves binary
//! payloads, timestamps and flag maps across the storage boundary.
//! Callers only ever see the decoded domain types.

pub mod assignments;
pub mod contacts;
pub mod database;
pub mod documents;
pub mod migrations;
pub mod models;
pub mod record;

mod error;

pub use database::Database;
pub use error::{Result, StoreError};
pub use models::*;
pub use record::{Collection, Record};
