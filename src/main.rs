// src/main.rs

use clap::Parser;

mod cli;

use activedir::config::AppConfig;
use activedir::logging;
use cli::Cli;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::load_or_default(cli.config.as_deref())?;
    if let Err(e) = logging::init(&config.logging) {
        eprintln!("❌ Логирование не настроено: {}", e);
    }

    if let Err(e) = cli.run(&config) {
        eprintln!("❌ {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
