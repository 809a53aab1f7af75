//! `chatclaw config`: Configuration management commands.

use chatclaw_config::AppConfig;

pub async fn show(config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", render(config)?);
    Ok(())
}

pub async fn init(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let dir = AppConfig::config_dir();
    let path = dir.join("config.toml");
    if path.exists() && !force {
        println!("Config already exists at {}", path.display());
        println!("Run with --force to overwrite it.");
        return Ok(());
    }

    std::fs::create_dir_all(&dir)?;
    std::fs::write(&path, AppConfig::default_toml())?;
    println!("Wrote default config to {}", path.display());
    Ok(())
}

/// TOML rendering of `config` with the API key masked.
fn render(config: &AppConfig) -> Result<String, toml::ser::Error> {
    let mut shown = config.clone();
    if shown.api_key.is_some() {
        shown.api_key = Some("[REDACTED]".into());
    }
    toml::to_string_pretty(&shown)
}
