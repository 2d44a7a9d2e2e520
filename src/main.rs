mod app;
mod cli;
mod config;
mod dispatch;
mod error;
mod input;
mod logging;
mod panel;

use color_eyre::eyre::Result;
use cli::Cli;
use config::{ConfigManager, Options};

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse_args();
    let mut manager = ConfigManager::new(cli.config.as_deref())?;

    if cli.write_default_config {
        manager.write_default_config()?;
        println!("Config: {}", manager.config_path().display());
        return Ok(());
    }

    if let Some(update_ms) = cli.update_ms {
        manager.app_config_mut().monitor.update_ms = update_ms;
    }

    let general = &manager.app_config().general;
    let _logging = logging::init(
        cli.log_level.as_deref(),
        &general.log_level,
        general.log_file.as_deref(),
    );

    let options = Options::from_config(&manager.app_config().monitor);
    let mut app = app::App::new(options)?;
    app.run()?;

    Ok(())
}
