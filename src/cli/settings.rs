use std::error::Error;
use std::io::Write;
use std::path::Path;

use crate::cli::ConfigCommands;
use crate::core::config::data::path_display;
use crate::core::config::Config;

pub fn run<W: Write>(
    command: &ConfigCommands,
    config_path: &Path,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load_from_path(config_path)?;
    match command {
        ConfigCommands::Show => {
            writeln!(out, "Config file: {}", path_display(config_path))?;
            config.print_all(out)?;
        }
        ConfigCommands::Set { key, value } => {
            config.set_value(key, value)?;
            config.save_to_path(config_path)?;
            writeln!(out, "✅ Set {key} to: {}", value.trim())?;
        }
        ConfigCommands::Unset { key } => {
            config.unset_value(key)?;
            config.save_to_path(config_path)?;
            writeln!(out, "✅ Unset {key}")?;
        }
    }
    Ok(())
}
