pub mod assign;
pub mod contacts;
pub mod docs;
pub mod queue;
pub mod run;

use whatsauto_store::Database;

use crate::config::CliConfig;

/// What every command handler gets.
pub struct Context<'a> {
    pub db: &'a Database,
    pub config: &'a CliConfig,
    pub json: bool,
}

/// Local time, minute precision, for listings.
pub fn format_time(at: &chrono::DateTime<chrono::Utc>) -> String {
    at.with_timezone(&chrono::Local)
        .format("%Y-%m-%d %H:%M")
        .to_string()
}
