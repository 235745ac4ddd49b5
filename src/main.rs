use clap::{Parser, Subcommand};

use linechat::infrastructure::config::Config;

#[derive(Parser)]
#[command(name = "linechat")]
#[command(about = "A line-oriented multi-user chat server", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, default_value = "config.yaml")]
    config: String,

    /// Listen port (overrides config)
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Show version
    Version,
    /// Generate default config
    InitConfig,
}

fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            if let Err(e) = run_server(cli.config, cli.port) {
                tracing::error!("Server stopped: {}", e);
                std::process::exit(1);
            }
        }
        Commands::Version => {
            println!("linechat v{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::InitConfig => {
            if let Err(e) = init_config() {
                eprintln!("Failed to render config: {}", e);
                std::process::exit(1);
            }
        }
    }
}

fn load_config(config_path: &str) -> Config {
    if std::path::Path::new(config_path).exists() {
        Config::load(config_path).unwrap_or_else(|e| {
            tracing::warn!("Failed to load config: {}, using defaults", e);
            Config::load_env()
        })
    } else {
        Config::load_env()
    }
}

fn run_server(config_path: String, port_override: Option<u16>) -> Result<(), linechat::application::errors::ChatError> {
    let mut config = load_config(&config_path);
    if let Some(port) = port_override {
        config.server.port = port;
    }

    tracing::info!("Starting {}", config.server.name);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let adapter = linechat::bind(&config).await?;
        tracing::info!("Server started on {}", adapter.local_addr()?);
        adapter.run().await
    })
}

fn init_config() -> Result<(), serde_yaml::Error> {
    let config = Config::default();
    let yaml = serde_yaml::to_string(&config)?;
    println!("{}", yaml);
    println!("\nSave this to config.yaml and adjust as needed.");
    Ok(())
}
