//! `chatclaw chat`: Interactive or single-message chat mode.

use chatclaw_agent::{AgentEvent, ChatResponse, SessionManager};
use chatclaw_config::AppConfig;
use chatclaw_core::SessionKey;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn run(
    config: &AppConfig,
    message: Option<String>,
    key: SessionKey,
) -> Result<(), Box<dyn std::error::Error>> {
    let llm = match chatclaw_providers::build_from_config(config) {
        Ok(llm) => llm,
        Err(e) => {
            print_setup_help();
            return Err(e.into());
        }
    };

    let (tx, rx) = mpsc::unbounded_channel();
    let sessions = Arc::new(SessionManager::from_config(config, llm)?.with_events(tx));
    let printer = tokio::spawn(print_activity(rx));
    info!(session = %key, interactive = message.is_none(), "Chat starting");

    if let Some(msg) = message {
        let response = sessions.chat(&key, &msg).await?;
        print_response(&response, "");
    } else {
        repl(config, &sessions, &key).await?;
    }

    // Closing the manager closes the event channel and ends the printer.
    drop(sessions);
    let _ = printer.await;
    Ok(())
}

async fn repl(
    config: &AppConfig,
    sessions: &SessionManager,
    key: &SessionKey,
) -> Result<(), Box<dyn std::error::Error>> {
    println!();
    println!("  ChatClaw Interactive Mode");
    println!();
    println!("  Provider:  {}", config.provider.name);
    println!("  Model:     {}", config.provider.model);
    println!("  Tools:     {}", sessions.tools().names().join(", "));
    println!("  Session:   {key}");
    println!("  Memory:    {}", config.memory.backend);
    println!();
    println!("  Type your message and press Enter.");
    println!("  Commands: /summary, /clear, exit");
    println!();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        match input {
            "" => continue,
            "exit" | "quit" => break,
            "/clear" => {
                sessions.clear_memory(key).await;
                println!("  Memory cleared.");
                println!();
                continue;
            }
            "/summary" => {
                let summary = sessions.memory_summary(key).await;
                println!();
                for line in summary.lines() {
                    println!("  Summary > {line}");
                }
                println!();
                continue;
            }
            _ => {}
        }

        match sessions.chat(key, input).await {
            Ok(response) => {
                println!();
                print_response(&response, "  Assistant > ");
                println!();
            }
            Err(e) => {
                warn!(session = %key, error = %e, "Turn failed");
                eprintln!("  [Error] {e}");
                println!();
            }
        }
    }

    println!();
    println!("  Goodbye!");
    println!();
    Ok(())
}

fn print_response(response: &ChatResponse, prefix: &str) {
    for line in response.response.lines() {
        println!("{prefix}{line}");
    }
    if response.incomplete {
        eprintln!(
            "  (stopped after {} steps without a final answer)",
            response.iterations
        );
    }
}

/// Show tool activity on stderr while a turn runs.
async fn print_activity(mut rx: mpsc::UnboundedReceiver<AgentEvent>) {
    while let Some(event) = rx.recv().await {
        match event {
            AgentEvent::ToolCall { name, input, .. } => {
                eprintln!("  [tool] {name} {input}");
            }
            AgentEvent::ToolResult {
                name,
                error: Some(kind),
                output,
                ..
            } => {
                eprintln!("  [tool] {name} failed ({}): {output}", kind.as_str());
            }
            AgentEvent::Retry {
                attempt, delay_ms, ..
            } => {
                eprintln!("  [retry] attempt {attempt} failed, retrying in {delay_ms}ms");
            }
            _ => {}
        }
    }
}

fn print_setup_help() {
    eprintln!();
    eprintln!("  ERROR: No API key configured!");
    eprintln!();
    eprintln!("  Set one of these environment variables:");
    eprintln!("    CHATCLAW_API_KEY     = 'sk-...'");
    eprintln!("    OPENAI_API_KEY       = 'sk-...'");
    eprintln!("    OPENROUTER_API_KEY   = 'sk-or-v1-...'");
    eprintln!();
    eprintln!("  Or add it to your config file:");
    eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
    eprintln!();
}
