//! Opening a WhatsApp conversation with one contact.
//!
//! Two mechanisms exist. A share command hands the conversation link to the
//! platform share sheet (for example `termux-share` on Android); a URL
//! opener launches the system URL handler. [`FallbackOpener`] chains them:
//! share first, URL when sharing is cancelled, missing or broken.

use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Serialize;
use tokio::process::Command;
use tracing::{debug, warn};

use whatsauto_shared::constants::WA_ME_BASE_URL;
use whatsauto_shared::phone::digits_only;
use whatsauto_shared::types::Variant;

use crate::error::OpenError;
use crate::queue::QueueEntry;

/// Click-to-chat link for a canonical phone number.
pub fn wa_me_url(phone: &str) -> String {
    format!("{WA_ME_BASE_URL}{}", digits_only(phone))
}

/// Everything an opener needs to know about the conversation to open.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub url: String,
    /// Name for address-book contacts, grouped number otherwise.
    pub label: String,
    pub title: String,
    pub text: String,
    /// Name of the document the user should attach. `None` when the
    /// assigned document no longer exists.
    pub attachment: Option<String>,
    pub variant: Variant,
}

impl OpenRequest {
    pub fn for_entry(entry: &QueueEntry) -> Self {
        let label = entry.contact.label().to_string();
        Self {
            url: wa_me_url(&entry.contact.phone),
            title: format!("Send invitation to {label}"),
            text: format!("Open WhatsApp to send invitation to {label}"),
            attachment: entry.document.as_ref().map(|d| d.name.clone()),
            variant: entry.assignment.variant,
            label,
        }
    }
}

/// Which mechanism actually opened the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OpenedVia {
    Share,
    Url,
}

#[async_trait]
pub trait ConversationOpener: Send + Sync {
    async fn open(&self, request: &OpenRequest) -> Result<OpenedVia, OpenError>;
}

fn spawn_error(program: &str, err: io::Error) -> OpenError {
    if err.kind() == io::ErrorKind::NotFound {
        OpenError::Unavailable(format!("`{program}` not found"))
    } else {
        OpenError::Io(err)
    }
}

// ---------------------------------------------------------------------------
// URL handler
// ---------------------------------------------------------------------------

/// Launches the system URL handler with the conversation link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlOpener {
    program: String,
    args: Vec<String>,
}

impl UrlOpener {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// `open` on macOS, `cmd /C start` on Windows, `xdg-open` elsewhere.
    pub fn platform_default() -> Self {
        if cfg!(target_os = "macos") {
            Self::new("open", Vec::new())
        } else if cfg!(windows) {
            Self::new(
                "cmd",
                vec!["/C".to_string(), "start".to_string(), String::new()],
            )
        } else {
            Self::new("xdg-open", Vec::new())
        }
    }
}

impl Default for UrlOpener {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[async_trait]
impl ConversationOpener for UrlOpener {
    async fn open(&self, request: &OpenRequest) -> Result<OpenedVia, OpenError> {
        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(&request.url)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| spawn_error(&self.program, e))?;

        if !status.success() {
            return Err(OpenError::Launch(format!(
                "`{}` exited with {status}",
                self.program
            )));
        }

        debug!(url = %request.url, program = %self.program, "conversation opened via URL handler");
        Ok(OpenedVia::Url)
    }
}

// ---------------------------------------------------------------------------
// Share command
// ---------------------------------------------------------------------------

/// Runs a user-configured share command.
///
/// The command line is split on whitespace. Arguments may contain the
/// placeholders `{url}`, `{title}` and `{text}`; each is replaced inside its
/// own argument, so values with spaces stay one argument. When no argument
/// uses a placeholder the URL is appended. Exit status zero means the user
/// completed the share; anything else is treated as a cancellation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShareCommandOpener {
    command: Option<Vec<String>>,
}

impl ShareCommandOpener {
    pub fn new(command: Option<&str>) -> Self {
        let command = command
            .map(|c| c.split_whitespace().map(str::to_string).collect::<Vec<_>>())
            .filter(|parts| !parts.is_empty());
        Self { command }
    }

    pub fn is_configured(&self) -> bool {
        self.command.is_some()
    }

    fn argv(&self, request: &OpenRequest) -> Option<Vec<String>> {
        let command = self.command.as_ref()?;
        let mut substituted = false;

        let mut argv: Vec<String> = command
            .iter()
            .enumerate()
            .map(|(i, part)| {
                if i > 0 && ["{url}", "{title}", "{text}"].iter().any(|p| part.contains(p)) {
                    substituted = true;
                    part.replace("{url}", &request.url)
                        .replace("{title}", &request.title)
                        .replace("{text}", &request.text)
                } else {
                    part.clone()
                }
            })
            .collect();

        if !substituted {
            argv.push(request.url.clone());
        }
        Some(argv)
    }
}

#[async_trait]
impl ConversationOpener for ShareCommandOpener {
    async fn open(&self, request: &OpenRequest) -> Result<OpenedVia, OpenError> {
        let argv = self
            .argv(request)
            .ok_or_else(|| OpenError::Unavailable("no share command configured".into()))?;
        let (program, args) = argv
            .split_first()
            .ok_or_else(|| OpenError::Unavailable("empty share command".into()))?;

        let status = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| spawn_error(program, e))?;

        if !status.success() {
            debug!(%program, %status, "share command did not complete");
            return Err(OpenError::Cancelled);
        }

        debug!(url = %request.url, %program, "conversation shared");
        Ok(OpenedVia::Share)
    }
}

// ---------------------------------------------------------------------------
// Fallback chain
// ---------------------------------------------------------------------------

/// Tries `primary`, then `fallback` on any error.
#[derive(Debug, Clone)]
pub struct FallbackOpener<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> FallbackOpener<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

impl FallbackOpener<ShareCommandOpener, UrlOpener> {
    /// Share command when configured, system URL handler otherwise.
    pub fn share_then_url(share_command: Option<&str>) -> Self {
        Self::new(
            ShareCommandOpener::new(share_command),
            UrlOpener::platform_default(),
        )
    }
}

#[async_trait]
impl<P, F> ConversationOpener for FallbackOpener<P, F>
where
    P: ConversationOpener,
    F: ConversationOpener,
{
    async fn open(&self, request: &OpenRequest) -> Result<OpenedVia, OpenError> {
        match self.primary.open(request).await {
            Ok(via) => Ok(via),
            Err(e) => {
                if e.is_quiet() {
                    debug!(error = %e, "falling back to URL handler");
                } else {
                    warn!(error = %e, "share failed, falling back to URL handler");
                }
                self.fallback.open(request).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use whatsauto_shared::types::ContactOrigin;
    use whatsauto_store::{Assignment, Contact, Document};

    fn request() -> OpenRequest {
        OpenRequest {
            url: "https://wa.me/15551234567".into(),
            label: "Alice".into(),
            title: "Send invitation to Alice".into(),
            text: "Open WhatsApp to send invitation to Alice".into(),
            attachment: Some("invite.pdf".into()),
            variant: Variant::TwoMember,
        }
    }

    struct Scripted {
        result: fn() -> Result<OpenedVia, OpenError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(result: fn() -> Result<OpenedVia, OpenError>) -> Self {
            Self {
                result,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ConversationOpener for Scripted {
        async fn open(&self, _request: &OpenRequest) -> Result<OpenedVia, OpenError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    #[test]
    fn url_keeps_digits_only() {
        assert_eq!(wa_me_url("+91 98765 43210"), "https://wa.me/919876543210");
    }

    #[test]
    fn request_addresses_file_contacts_by_number() {
        let doc = Document::new("invite.pdf", b"%PDF-x".to_vec());
        let device = Contact::new("Alice", "+919876543210", ContactOrigin::Device, "1").unwrap();
        let file = Contact::new("Bob", "+919876543210", ContactOrigin::File, "1").unwrap();

        let entry = |contact: Contact, document: Option<Document>| QueueEntry {
            assignment: Assignment::new(contact.id, doc.id, Variant::AllMember),
            contact,
            document,
        };

        let by_name = OpenRequest::for_entry(&entry(device, Some(doc.clone())));
        assert_eq!(by_name.label, "Alice");
        assert_eq!(by_name.attachment.as_deref(), Some("invite.pdf"));
        assert_eq!(by_name.variant, Variant::AllMember);

        let by_number = OpenRequest::for_entry(&entry(file, None));
        assert_eq!(by_number.label, "+91 98765 43210");
        assert_eq!(by_number.title, "Send invitation to +91 98765 43210");
        assert_eq!(by_number.url, "https://wa.me/919876543210");
        assert!(by_number.attachment.is_none());
    }

    #[test]
    fn share_argv_expands_placeholders() {
        let opener = ShareCommandOpener::new(Some("termux-share -a send --title={title} {url}"));
        let argv = opener.argv(&request()).unwrap();
        assert_eq!(
            argv,
            vec![
                "termux-share",
                "-a",
                "send",
                "--title=Send invitation to Alice",
                "https://wa.me/15551234567",
            ]
        );
    }

    #[test]
    fn share_argv_appends_url_without_placeholders() {
        let opener = ShareCommandOpener::new(Some("my-share"));
        assert_eq!(
            opener.argv(&request()).unwrap(),
            vec!["my-share", "https://wa.me/15551234567"]
        );
    }

    #[tokio::test]
    async fn unconfigured_share_is_unavailable() {
        let opener = ShareCommandOpener::new(Some("   "));
        assert!(!opener.is_configured());
        let err = opener.open(&request()).await.unwrap_err();
        assert!(matches!(err, OpenError::Unavailable(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn share_exit_status_decides_outcome() {
        let ok = ShareCommandOpener::new(Some("true"));
        assert_eq!(ok.open(&request()).await.unwrap(), OpenedVia::Share);

        let cancelled = ShareCommandOpener::new(Some("false"));
        assert!(matches!(
            cancelled.open(&request()).await.unwrap_err(),
            OpenError::Cancelled
        ));
    }

    #[tokio::test]
    async fn missing_launcher_is_unavailable() {
        let opener = UrlOpener::new("whatsauto-no-such-launcher", Vec::new());
        let err = opener.open(&request()).await.unwrap_err();
        assert!(matches!(err, OpenError::Unavailable(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn fallback_used_only_when_primary_fails() {
        let chain = FallbackOpener::new(
            Scripted::new(|| Ok(OpenedVia::Share)),
            Scripted::new(|| Ok(OpenedVia::Url)),
        );
        assert_eq!(chain.open(&request()).await.unwrap(), OpenedVia::Share);
        assert_eq!(chain.fallback.calls.load(Ordering::SeqCst), 0);

        let chain = FallbackOpener::new(
            Scripted::new(|| Err(OpenError::Cancelled)),
            Scripted::new(|| Ok(OpenedVia::Url)),
        );
        assert_eq!(chain.open(&request()).await.unwrap(), OpenedVia::Url);
        assert_eq!(chain.primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(chain.fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn fallback_error_is_returned() {
        let chain = FallbackOpener::new(
            Scripted::new(|| Err(OpenError::Unavailable("none".into()))),
            Scripted::new(|| Err(OpenError::Launch("exit 3".into()))),
        );
        let err = chain.open(&request()).await.unwrap_err();
        assert!(matches!(err, OpenError::Launch(_)));
    }
}
