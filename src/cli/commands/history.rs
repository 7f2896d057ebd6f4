//! `sermon-auto history`

use sermon_engine::{ArtifactStore, HistoryLoader};

use crate::{Config, SermonError};

/// Print the history hint the next run would send to the selection stage.
pub(crate) fn execute_history_command(
    limit: Option<usize>,
    config: &Config,
) -> Result<(), SermonError> {
    let limit = limit.unwrap_or(config.history.max_entries);
    let loader = HistoryLoader::new(ArtifactStore::new(config.output_dir()), limit);
    let hint = loader.load();

    if hint.text.is_empty() {
        println!("No previous selections found.");
    } else {
        println!("{}", hint.text);
    }

    let skipped = hint.report.skip_reasons();
    if !skipped.is_empty() {
        eprintln!("Skipped {} unreadable file(s):", skipped.len());
        for (path, reason) in skipped {
            eprintln!("  {path}: {reason}");
        }
    }
    Ok(())
}
