use clap::{Parser, Subcommand};
use classmate_core::Config;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "classmate-cli", version, about = "ClassMate CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Session countdown control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Session storage management
    Session {
        #[command(subcommand)]
        action: commands::session::SessionAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Quizzes and hints from the tutoring backend
    Quiz {
        #[command(subcommand)]
        action: commands::quiz::QuizAction,
    },
    /// Chat with the tutor
    Tutor {
        #[command(subcommand)]
        action: commands::tutor::TutorAction,
    },
    /// Learner profile and level assessment
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
}

fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.logging.level;
        EnvFilter::new(format!("classmate_core={level},classmate_cli={level}"))
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = Config::load_or_default();
    init_tracing(&config);

    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, &config).await,
        Commands::Session { action } => commands::session::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Quiz { action } => commands::quiz::run(action, &config).await,
        Commands::Tutor { action } => commands::tutor::run(action, &config).await,
        Commands::Profile { action } => commands::profile::run(action, &config).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
