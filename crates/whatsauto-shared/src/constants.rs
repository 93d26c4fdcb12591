/// Application name
pub const APP_NAME: &str = "WhatsAuto";

/// Country code prepended to numbers entered without a leading `+`
pub const DEFAULT_COUNTRY_CODE: &str = "1";

/// Base address of the click-to-chat link
pub const WA_ME_BASE_URL: &str = "https://wa.me/";

/// Lower bound (inclusive) of the cooldown between two sends, in milliseconds
pub const COOLDOWN_MIN_MS: u64 = 60_000;

/// Upper bound (exclusive) of the cooldown between two sends, in milliseconds
pub const COOLDOWN_MAX_MS: u64 = 120_000;

/// MIME type of every uploaded document
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Leading bytes of a PDF file
pub const PDF_MAGIC: &[u8] = b"%PDF-";

/// Maximum document size in bytes (50 MiB)
pub const MAX_PDF_SIZE: usize = 50 * 1024 * 1024;

/// Name given to device contacts that carry no display name
pub const UNKNOWN_CONTACT_NAME: &str = "Unknown";
