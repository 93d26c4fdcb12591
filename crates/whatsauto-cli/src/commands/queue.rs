use serde::Serialize;

use whatsauto_send::queue::load_queue;
use whatsauto_send::QueueStats;

use super::Context;
use crate::output;

pub fn show_queue(ctx: &Context<'_>) -> anyhow::Result<()> {
    let queue = load_queue(ctx.db)?;

    let rows: Vec<Vec<String>> = queue
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            vec![
                (i + 1).to_string(),
                entry.contact.label().to_string(),
                entry.contact.display_phone.clone(),
                entry
                    .document
                    .as_ref()
                    .map_or_else(|| "(no attachment)".to_string(), |d| d.name.clone()),
                entry.assignment.variant.to_string(),
                entry.contact.status.to_string(),
            ]
        })
        .collect();

    output::print_table(
        &["#", "contact", "phone", "document", "variant", "status"],
        &rows,
        ctx.json,
    );
    Ok(())
}

#[derive(Serialize)]
struct StatsView {
    #[serde(flatten)]
    stats: QueueStats,
    progress_percent: f64,
}

pub fn show_stats(ctx: &Context<'_>) -> anyhow::Result<()> {
    let stats = QueueStats::load(ctx.db)?;

    if ctx.json {
        output::print_value(
            &StatsView {
                stats,
                progress_percent: stats.progress_percent(),
            },
            true,
        );
        return Ok(());
    }

    println!("Total:    {}", stats.total);
    println!("Sent:     {}", stats.sent);
    println!("Pending:  {}", stats.pending);
    println!("Failed:   {}", stats.failed);
    println!("Progress: {:.0}%", stats.progress_percent());
    Ok(())
}
