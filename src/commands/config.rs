use std::path::Path;

use crate::cli::ConfigCmd;
use anyhow::Result;
use colored::Colorize;
use curls::config::{Config, KNOWN_KEYS};

pub fn handle(cmd: ConfigCmd, mut cfg: Config, config_path: &Path) -> Result<()> {
    match cmd {
        ConfigCmd::List => {
            if cfg.map.is_empty() {
                println!("{}", "(no config set)".dimmed());
            } else {
                println!("{}", "Config:".cyan().bold());
                for (k, v) in &cfg.map {
                    println!("  {} = {}", k.green(), v);
                }
            }
        }

        ConfigCmd::Get { key } => match cfg.get(&key) {
            Some(val) => println!("{}", val),
            None => println!("{} key `{}` not found", "warning:".yellow().bold(), key),
        },

        ConfigCmd::Set { key, val } => {
            if !KNOWN_KEYS.contains(&key.as_str()) {
                println!(
                    "{} unknown key `{}`, known keys: {}",
                    "error:".red().bold(),
                    key,
                    KNOWN_KEYS.join(", ")
                );
                return Ok(());
            }
            cfg.map.insert(key.clone(), val.clone());
            cfg.save(config_path)?;
            println!("{} set `{}` = `{}`", "info:".blue().bold(), key.green(), val);
        }

        ConfigCmd::Unset { key } => {
            if cfg.map.remove(&key).is_some() {
                cfg.save(config_path)?;
                println!("{} removed `{}`", "info:".blue().bold(), key.green());
            } else {
                println!("{} key `{}` not found", "warning:".yellow().bold(), key);
            }
        }
    }

    Ok(())
}
