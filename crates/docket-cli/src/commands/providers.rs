//! Providers command implementation.

use crate::error::Result;
use crate::output::Formatter;
use docket_pipeline::AppConfig;

/// Execute the providers command.
pub fn execute_providers(config: &AppConfig, formatter: &Formatter) -> Result<()> {
    let statuses = config.providers.status();
    println!("{}", formatter.format_providers(&statuses));

    let ready = statuses.iter().filter(|s| s.available).count();
    let selected = &config.event_extractor;
    let message = format!("{} of {} providers ready; selected: {}", ready, statuses.len(), selected);
    if ready == 0 {
        eprintln!("{}", formatter.warning(&message));
    } else {
        eprintln!("{}", formatter.info(&message));
    }

    Ok(())
}
