use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ParseTagError;

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ContactId(pub Uuid);

impl ContactId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex characters, for log lines and compact listings.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for ContactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContactId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

// ---------------------------------------------------------------------------
// Variant
// ---------------------------------------------------------------------------

/// Which edition of an invitation suits a recipient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum Variant {
    TwoMember,
    AllMember,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::TwoMember, Variant::AllMember];

    pub fn as_str(&self) -> &'static str {
        match self {
            Variant::TwoMember => "two-member",
            Variant::AllMember => "all-member",
        }
    }
}

impl Default for Variant {
    fn default() -> Self {
        Variant::TwoMember
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Variant {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "two-member" => Ok(Variant::TwoMember),
            "all-member" => Ok(Variant::AllMember),
            other => Err(ParseTagError::new("variant", other)),
        }
    }
}

/// Per-variant approval flags of a document. Always carries exactly the two
/// known keys.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct VariantFlags {
    #[serde(rename = "two-member", default)]
    pub two_member: bool,
    #[serde(rename = "all-member", default)]
    pub all_member: bool,
}

impl VariantFlags {
    pub fn get(&self, variant: Variant) -> bool {
        match variant {
            Variant::TwoMember => self.two_member,
            Variant::AllMember => self.all_member,
        }
    }

    pub fn set(&mut self, variant: Variant, enabled: bool) {
        match variant {
            Variant::TwoMember => self.two_member = enabled,
            Variant::AllMember => self.all_member = enabled,
        }
    }

    /// Variants this document is approved for, in declaration order.
    pub fn approved(&self) -> Vec<Variant> {
        Variant::ALL
            .into_iter()
            .filter(|v| self.get(*v))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Contact status
// ---------------------------------------------------------------------------

/// Send status of a contact.
///
/// `Sent` and `Failed` are terminal: nothing moves a contact out of them
/// through [`ContactStatus::can_advance_to`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContactStatus {
    Pending,
    Assigned,
    Sent,
    Failed,
}

impl ContactStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactStatus::Pending => "pending",
            ContactStatus::Assigned => "assigned",
            ContactStatus::Sent => "sent",
            ContactStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ContactStatus::Sent | ContactStatus::Failed)
    }

    /// Whether a contact in this status still belongs in the send queue.
    pub fn is_queueable(&self) -> bool {
        matches!(self, ContactStatus::Pending | ContactStatus::Assigned)
    }

    /// Forward-only transition check.
    ///
    /// `Assigned -> Assigned` is allowed: re-opening the same conversation
    /// after a resume rewrites the status it already has.
    pub fn can_advance_to(&self, next: ContactStatus) -> bool {
        match self {
            ContactStatus::Pending => next != ContactStatus::Pending,
            ContactStatus::Assigned => next != ContactStatus::Pending,
            ContactStatus::Sent | ContactStatus::Failed => false,
        }
    }
}

impl Default for ContactStatus {
    fn default() -> Self {
        ContactStatus::Pending
    }
}

impl fmt::Display for ContactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactStatus {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pending" => Ok(ContactStatus::Pending),
            "assigned" => Ok(ContactStatus::Assigned),
            "sent" => Ok(ContactStatus::Sent),
            "failed" => Ok(ContactStatus::Failed),
            other => Err(ParseTagError::new("contact status", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Contact origin
// ---------------------------------------------------------------------------

/// Where a contact came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ContactOrigin {
    /// The device's own address book. The recipient is already saved on the
    /// phone, so the conversation can be found by name.
    Device,
    /// An imported file. The number may not be saved anywhere, so the
    /// conversation has to be addressed by number.
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressBy {
    Name,
    Phone,
}

impl ContactOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContactOrigin::Device => "device",
            ContactOrigin::File => "file",
        }
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self, ContactOrigin::Device)
    }

    pub fn address_by(&self) -> AddressBy {
        if self.is_trusted() {
            AddressBy::Name
        } else {
            AddressBy::Phone
        }
    }
}

impl fmt::Display for ContactOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContactOrigin {
    type Err = ParseTagError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "device" => Ok(ContactOrigin::Device),
            "file" => Ok(ContactOrigin::File),
            other => Err(ParseTagError::new("contact origin", other)),
        }
    }
}
