//! `chatclaw tools`: List the registered tools.

use chatclaw_config::AppConfig;

pub async fn list(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    let registry = chatclaw_tools::default_registry(&config.tools);

    println!("Registered tools ({}), timeout {}s:", registry.len(), config.tools.timeout_secs);
    println!();
    for definition in registry.definitions() {
        println!("  {}", definition.name);
        println!("      {}", definition.description);
        println!("      parameters: {}", definition.parameters);
    }
    Ok(())
}
