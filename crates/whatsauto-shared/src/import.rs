//! Bulk contact import parsers.
//!
//! Both parsers are lenient: malformed rows are counted and skipped, never
//! fatal to the batch. Phone numbers come back exactly as written in the
//! source; normalization happens when the contact is built.

use crate::constants::{PDF_MAGIC, UNKNOWN_CONTACT_NAME};

/// One usable row from an import file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRow {
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedImport {
    pub rows: Vec<ImportedRow>,
    /// Rows (or cards) dropped because a field was missing.
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// name,phone files
// ---------------------------------------------------------------------------

/// Parse a two-column `name,phone` file.
///
/// The first non-blank line is a header and is discarded. Blank lines are
/// ignored. Fields may be double-quoted; a quoted field can contain commas
/// and `""` stands for a literal quote. Columns past the second are ignored.
pub fn parse_contact_csv(text: &str) -> ParsedImport {
    let mut parsed = ParsedImport::default();

    let lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    for line in lines.skip(1) {
        let fields = split_record(line);
        let name = fields.first().map(|f| f.trim()).unwrap_or_default();
        let phone = fields.get(1).map(|f| f.trim()).unwrap_or_default();

        if name.is_empty() || phone.is_empty() {
            parsed.skipped += 1;
            continue;
        }

        parsed.rows.push(ImportedRow {
            name: name.to_string(),
            phone: phone.to_string(),
        });
    }

    parsed
}

/// Split one delimited line into fields, honouring double quotes.
fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut field)),
            other => field.push(other),
        }
    }
    fields.push(field);
    fields
}

// ---------------------------------------------------------------------------
// vCard (device address book export)
// ---------------------------------------------------------------------------

/// Parse a vCard export of the device address book.
///
/// Every `TEL` of a card becomes its own row under the card's `FN`. Cards
/// without a name are kept as "Unknown"; cards without a number are skipped.
pub fn parse_vcard(text: &str) -> ParsedImport {
    let mut parsed = ParsedImport::default();

    let mut in_card = false;
    let mut name: Option<String> = None;
    let mut phones: Vec<String> = Vec::new();

    for line in unfold_lines(text) {
        let line = line.trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        // Property name without parameters, e.g. "TEL;TYPE=CELL" -> "TEL".
        let prop = key
            .split(';')
            .next()
            .unwrap_or_default()
            .rsplit('.')
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();

        match (prop.as_str(), value.trim()) {
            ("BEGIN", v) if v.eq_ignore_ascii_case("VCARD") => {
                in_card = true;
                name = None;
                phones.clear();
            }
            ("END", v) if v.eq_ignore_ascii_case("VCARD") && in_card => {
                in_card = false;
                if phones.is_empty() {
                    parsed.skipped += 1;
                    continue;
                }
                let card_name = name
                    .take()
                    .filter(|n| !n.is_empty())
                    .unwrap_or_else(|| UNKNOWN_CONTACT_NAME.to_string());
                for phone in phones.drain(..) {
                    parsed.rows.push(ImportedRow {
                        name: card_name.clone(),
                        phone,
                    });
                }
            }
            ("FN", v) if in_card => name = Some(v.to_string()),
            ("TEL", v) if in_card && !v.is_empty() => {
                phones.push(v.trim_start_matches("tel:").to_string())
            }
            _ => {}
        }
    }

    parsed
}

/// Join RFC 6350 folded lines (continuations start with a space or tab).
fn unfold_lines(text: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for raw in text.lines() {
        let raw = raw.trim_end_matches('\r');
        if let Some(cont) = raw.strip_prefix([' ', '\t']) {
            if let Some(last) = out.last_mut() {
                last.push_str(cont);
                continue;
            }
        }
        out.push(raw.to_string());
    }
    out
}

/// Whether `bytes` start with the PDF file signature.
pub fn looks_like_pdf(bytes: &[u8]) -> bool {
    bytes.starts_with(PDF_MAGIC)
}
