//! # whatsauto-shared
//!
//! Types and pure helpers shared by every WhatsAuto crate: identifier
//! newtypes, the contact status / variant / origin enums, phone number
//! normalization, and the bulk contact import parsers.

pub mod constants;
pub mod error;
pub mod import;
pub mod phone;
pub mod types;

pub use error::{ParseTagError, PhoneError};
