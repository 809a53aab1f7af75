//! `chatclaw memory`: Inspect or clear one session's memory.

use chatclaw_agent::SessionManager;
use chatclaw_config::AppConfig;
use chatclaw_core::{Role, SessionKey, SessionStore};
use chatclaw_memory::PersistedMemory;

pub async fn show(config: &AppConfig, key: &SessionKey) -> Result<(), Box<dyn std::error::Error>> {
    warn_if_ephemeral(config);
    let store = chatclaw_memory::build_store(&config.memory)?;

    let Some(raw) = store.get(&key.storage_key()).await? else {
        println!("No stored memory for session {key}.");
        return Ok(());
    };
    let record = PersistedMemory::decode(&raw)?;

    println!("Session:   {key}");
    println!("Updated:   {}", record.timestamp.to_rfc3339());
    println!();
    if let Some(summary) = &record.summary {
        println!("Summary:");
        for line in summary.lines() {
            println!("  {line}");
        }
        println!();
    }
    println!("Recent messages ({}):", record.messages.len());
    for message in &record.messages {
        let who = match message.role {
            Role::Human => "user",
            Role::Agent => "agent",
            Role::System => "system",
        };
        println!(
            "  [{}] {who:>6}: {}",
            message.timestamp.format("%H:%M:%S"),
            message.content
        );
    }
    Ok(())
}

pub async fn summary(
    config: &AppConfig,
    key: &SessionKey,
) -> Result<(), Box<dyn std::error::Error>> {
    warn_if_ephemeral(config);
    let llm = chatclaw_providers::build_from_config(config)?;
    let sessions = SessionManager::from_config(config, llm)?;
    println!("{}", sessions.memory_summary(key).await);
    Ok(())
}

pub async fn clear(config: &AppConfig, key: &SessionKey) -> Result<(), Box<dyn std::error::Error>> {
    warn_if_ephemeral(config);
    let store = chatclaw_memory::build_store(&config.memory)?;
    if store.del(&key.storage_key()).await? {
        println!("Cleared memory for session {key}.");
    } else {
        println!("No stored memory for session {key}.");
    }
    Ok(())
}

fn warn_if_ephemeral(config: &AppConfig) {
    if config.memory.backend != "file" {
        eprintln!(
            "note: memory.backend = \"{}\" does not outlive a process; set it to \"file\" to inspect sessions between runs",
            config.memory.backend
        );
    }
}
