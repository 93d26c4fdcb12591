//! Interactive send loop.
//!
//! One-letter commands are read from stdin while cooldown wakeups arrive on
//! the walker's channel; both are handled on this task, one at a time.
//! Ctrl+C or `q` leaves the loop. Dropping the walker cancels a pending
//! cooldown.

use std::io::BufRead;

use tokio::sync::mpsc;
use tokio::time::Instant;

use whatsauto_send::opener::FallbackOpener;
use whatsauto_send::{SendWalker, WalkerError, WalkerSnapshot, WalkerState};

use super::Context;
use crate::output;

const HELP: &str = "[s] sent  [k] skip  [f] failed  [p] pause  [r] resume  [q] quit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Key {
    Sent,
    Skip,
    Failed,
    Pause,
    Resume,
    Quit,
    Help,
}

fn parse_key(line: &str) -> Option<Key> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "sent" => Some(Key::Sent),
        "k" | "skip" => Some(Key::Skip),
        "f" | "fail" | "failed" => Some(Key::Failed),
        "p" | "pause" => Some(Key::Pause),
        "r" | "resume" => Some(Key::Resume),
        "q" | "quit" => Some(Key::Quit),
        "?" | "h" | "help" => Some(Key::Help),
        _ => None,
    }
}

/// Lines from stdin, read on a plain thread so a pending read never keeps
/// the runtime alive at exit.
fn spawn_stdin_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

pub async fn run(ctx: &Context<'_>) -> anyhow::Result<()> {
    let opener = FallbackOpener::share_then_url(ctx.config.share_command.as_deref());
    let (mut walker, mut wakeups) =
        SendWalker::new(ctx.db, opener, ctx.config.cooldown_policy())?;
    let mut snapshots = walker.subscribe();

    walker.start().await?;
    println!("{HELP}");
    render(&snapshots.borrow_and_update());

    let mut input = spawn_stdin_reader();

    // `start` alone can finish the run when every open fails.
    while walker.state() != WalkerState::Completed {
        tokio::select! {
            line = input.recv() => {
                let Some(line) = line else { break };
                let key = match parse_key(&line) {
                    Some(key) => key,
                    None => {
                        if !line.trim().is_empty() {
                            output::print_error(&format!("unknown command {:?}", line.trim()), false);
                            println!("{HELP}");
                        }
                        continue;
                    }
                };
                let result = match key {
                    Key::Quit => break,
                    Key::Help => {
                        println!("{HELP}");
                        Ok(())
                    }
                    Key::Sent => walker.mark_sent(),
                    Key::Skip => walker.skip(),
                    Key::Failed => walker.mark_failed(),
                    Key::Pause => walker.pause(),
                    Key::Resume => walker.resume().await,
                };
                report(result)?;
            }
            Some(wakeup) = wakeups.recv() => {
                walker.on_wakeup(wakeup).await?;
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }

        if snapshots.has_changed().unwrap_or(false) {
            render(&snapshots.borrow_and_update());
        }
    }

    let stats = walker.stats();
    println!(
        "{} sent, {} failed, {} still pending ({:.0}% done)",
        stats.sent,
        stats.failed,
        stats.pending,
        stats.progress_percent()
    );
    Ok(())
}

/// Misuse of a control (acknowledging twice, resuming while running) is
/// reported and the loop goes on. Store failures end the run.
fn report(result: Result<(), WalkerError>) -> anyhow::Result<()> {
    match result {
        Ok(()) => Ok(()),
        Err(WalkerError::Store(e)) => Err(e.into()),
        Err(e) => {
            output::print_error(&e.to_string(), false);
            Ok(())
        }
    }
}

fn render(snap: &WalkerSnapshot) {
    match snap.state {
        WalkerState::Completed => {
            println!("All contacts processed.");
            return;
        }
        WalkerState::Paused => {
            println!("Paused. Press r to resume.");
            return;
        }
        WalkerState::Idle | WalkerState::Running => {}
    }

    if let Some(at) = snap.next_step_at {
        let secs = at.saturating_duration_since(Instant::now()).as_secs();
        println!("Next contact in {secs}s.");
        return;
    }

    let Some(entry) = &snap.current else { return };
    if !snap.awaiting_ack {
        return;
    }
    let attachment = entry
        .document
        .as_ref()
        .map_or_else(|| "no attachment".to_string(), |d| format!("attach {}", d.name));
    println!(
        "[{}/{}] {} ({}): {attachment}, {}",
        snap.cursor + 1,
        snap.queue_len,
        entry.contact.label(),
        entry.contact.display_phone,
        entry.assignment.variant
    );
    println!("Send the invitation, then press s, k or f.");
}
