use anyhow::Result;
use colored::Colorize;

use crate::cli::ConfigCommands;
use crate::config::Config;

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show => show(),
        ConfigCommands::Set { key, value } => set(&key, &value),
    }
}

fn show() -> Result<()> {
    let path = Config::path()?;
    println!("Config file: {}", path.display().to_string().cyan());
    println!();

    match Config::load() {
        Ok(config) => {
            let yaml = serde_yaml::to_string(&config)?;
            print!("{yaml}");
        }
        Err(_) => {
            println!("{}", "No configuration file found. Defaults in effect:".yellow());
            println!();
            println!("chat:");
            println!("  model: {}", crate::chat::DEFAULT_MODEL);
            println!("  api-key: (from {})", crate::config::API_KEY_ENV_VAR);
            println!("generation:");
            println!("  min-chars: 2000");
            println!("  lookahead-chars: 750");
        }
    }
    Ok(())
}

fn set(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load_or_default();
    config.set(key, value)?;
    let path = config.save()?;
    println!(
        "{} {key} = {value}",
        "Saved".green().bold()
    );
    println!("Config written to {}", path.display());
    Ok(())
}
