//! `sermon-auto config`

use crate::{Config, SermonError};

/// Print effective configuration with the source of each value.
pub(crate) fn execute_config_command(config: &Config) -> Result<(), SermonError> {
    match &config.config_path {
        Some(path) => println!("Config file: {path}"),
        None => println!("Config file: (none found)"),
    }
    println!();

    let rows = config.effective_config();
    let width = rows.iter().map(|(key, _, _)| key.len()).max().unwrap_or(0);
    for (key, value, source) in rows {
        println!("{key:<width$} = {value}  ({source})");
    }
    Ok(())
}
