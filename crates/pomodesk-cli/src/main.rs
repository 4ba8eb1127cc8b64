use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "pomodesk", version, about = "Pomodoro desktop timer")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the timer, or forward COMMAND to the instance already running
    Run {
        /// Initial command, e.g. `start` or `preset "Deep Work"`
        command: Vec<String>,
    },
    /// Send a command to the running instance
    Send {
        #[arg(required = true)]
        command: Vec<String>,
    },
    /// Preset management
    Preset {
        #[command(subcommand)]
        action: commands::preset::PresetAction,
    },
    /// Timer button management
    Button {
        #[command(subcommand)]
        action: commands::button::ButtonAction,
    },
    /// Statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Settings management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_logging(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("pomodesk={default_level},pomodesk_core={default_level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(if matches!(cli.command, Commands::Run { .. }) {
        "info"
    } else {
        "warn"
    });

    let result = match cli.command {
        Commands::Run { command } => commands::daemon::run(command),
        Commands::Send { command } => commands::send::run(command),
        Commands::Preset { action } => commands::preset::run(action),
        Commands::Button { action } => commands::button::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
