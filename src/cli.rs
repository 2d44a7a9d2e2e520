use clap::Parser;

/// Vitals: terminal system monitor with keyboard and mouse control
#[derive(Parser, Debug, Clone)]
#[command(name = "vitals")]
#[command(version)]
#[command(about = "Terminal system monitor", long_about = None)]
pub struct Cli {
    /// Read configuration from this file instead of the default location
    #[arg(short, long, value_name = "FILE", env = "VITALS_CONFIG")]
    pub config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Sampling interval in milliseconds. Overrides the config file.
    #[arg(short, long, value_name = "MS")]
    pub update_ms: Option<u64>,

    /// Write a default config file and exit
    #[arg(long, default_value_t = false)]
    pub write_default_config: bool,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
