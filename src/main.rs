mod app_bootstrap;
mod backends;
mod config;
mod console_view;
mod debounce;
mod protocol;
mod search;

use std::io::BufRead;
use std::time::Duration;

use log::{info, warn};
use tokio::sync::broadcast;

use crate::app_bootstrap::services::{spawn_background_services, BackgroundServicesConfig};
use crate::debounce::spawn_debounced_query_dispatcher;
use crate::protocol::{ConfigMessage, Message, SearchFilter, SearchMessage};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    colog::init();

    let config_root = dirs::config_dir()
        .ok_or("Could not determine the user config directory")?
        .join("quaver");
    std::fs::create_dir_all(&config_root).map_err(|err| {
        format!(
            "Failed to create config directory {}: {}",
            config_root.display(),
            err
        )
    })?;
    let config_file = config_root.join("config.toml");
    let config = config::load_or_create(&config_file)?;
    info!(
        "Searching catalog at {} (debounce {} ms, cache {} entries / {} s)",
        config.backend.endpoint,
        config.search.debounce_ms,
        config.search.cache_capacity,
        config.search.cache_ttl_secs
    );

    let (bus_sender, _) = broadcast::channel::<Message>(64);
    spawn_background_services(BackgroundServicesConfig {
        bus_sender: bus_sender.clone(),
        config: config.clone(),
    });

    let query_bus_sender = bus_sender.clone();
    let query_tx = spawn_debounced_query_dispatcher(
        Duration::from_millis(config.search.debounce_ms),
        move |query| {
            let _ = query_bus_sender.send(Message::Search(SearchMessage::SetQuery(query)));
        },
    );

    println!("quaver catalog search");
    println!("Type a query, :filter <all|songs|albums|artists>, :reload, or :quit.");
    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = line.map_err(|err| format!("Failed to read input: {}", err))?;
        let trimmed = line.trim();
        if trimmed == ":quit" {
            break;
        }
        if trimmed == ":reload" {
            match config::load_or_create(&config_file) {
                Ok(updated) => {
                    info!("Configuration reloaded");
                    let _ = bus_sender.send(Message::Config(ConfigMessage::ConfigChanged(updated)));
                }
                Err(err) => warn!("Config reload failed: {}", err),
            }
            continue;
        }
        if let Some(label) = trimmed.strip_prefix(":filter") {
            match SearchFilter::parse(label) {
                Some(filter) => {
                    let _ = bus_sender.send(Message::Search(SearchMessage::SetFilter(filter)));
                }
                None => warn!("Unknown filter '{}'", label.trim()),
            }
            continue;
        }
        // Raw line goes through the debouncer; trimming and normalization
        // happen downstream so empty input clears immediately.
        let _ = query_tx.send(line);
    }

    info!("Shutting down");
    Ok(())
}
