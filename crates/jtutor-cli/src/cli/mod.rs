//! CLI entry and dispatch.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jtutor_core::catalog::Difficulty;
use jtutor_core::config::{self, paths};
use jtutor_core::core::Orchestrator;
use jtutor_core::logging;
use jtutor_core::prompts::Prompts;
use jtutor_core::providers::GeminiClient;

mod commands;
mod output;

#[derive(Parser)]
#[command(name = "jtutor")]
#[command(version)]
#[command(about = "Learn Java in the terminal with an AI tutor")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the model from config
    #[arg(short, long, global = true, env = "JTUTOR_MODEL")]
    model: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// List the course topics by category
    Topics,
    /// Stream a lesson for a topic
    Explain {
        /// Topic id (see `jtutor topics`)
        #[arg(value_name = "TOPIC")]
        topic: String,

        #[command(flatten)]
        level: LevelArgs,

        /// Mark the topic complete once the lesson has finished
        #[arg(long)]
        done: bool,
    },
    /// Code lab: simulate, analyze, visualize and share programs
    Lab {
        #[command(subcommand)]
        command: LabCommands,
    },
    /// Take a generated multiple-choice quiz on a topic
    Quiz {
        /// Topic id (see `jtutor topics`)
        #[arg(value_name = "TOPIC")]
        topic: String,

        #[command(flatten)]
        level: LevelArgs,
    },
    /// Chat with the tutor (`/clear` starts over, `/quit` exits)
    Chat,
    /// Show or change completed topics
    Progress {
        #[command(subcommand)]
        command: Option<ProgressCommands>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Args, Debug, Clone)]
struct LevelArgs {
    /// Difficulty (beginner, intermediate, advanced)
    #[arg(short, long, default_value_t = Difficulty::Beginner)]
    difficulty: Difficulty,
}

/// Where the program for a lab command comes from.
#[derive(clap::Args, Debug, Clone, Default)]
#[group(multiple = false)]
pub struct SourceArgs {
    /// Read the program from a file
    #[arg(long, value_name = "PATH")]
    file: Option<PathBuf>,

    /// Use a built-in example (see `jtutor lab examples`)
    #[arg(long, value_name = "ID")]
    example: Option<String>,

    /// Use the program embedded in a share link
    #[arg(long, value_name = "LINK")]
    url: Option<String>,
}

#[derive(clap::Subcommand)]
enum LabCommands {
    /// List the built-in example programs
    Examples,
    /// Predict the console output of a program
    Run {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Get a compile check, predicted output and explanation
    Analyze {
        #[command(flatten)]
        source: SourceArgs,
    },
    /// Draw the program's control flow as SVG
    Visualize {
        #[command(flatten)]
        source: SourceArgs,

        /// Write the SVG to a file instead of stdout
        #[arg(short, long, value_name = "PATH")]
        out: Option<PathBuf>,
    },
    /// Print a share link carrying the program
    Share {
        #[command(flatten)]
        source: SourceArgs,

        /// Page the link points at
        #[arg(long, default_value = commands::lab::DEFAULT_SHARE_BASE)]
        base: String,
    },
}

#[derive(clap::Subcommand)]
enum ProgressCommands {
    /// Mark a topic complete, or incomplete if it already is
    Toggle {
        #[arg(value_name = "TOPIC")]
        topic: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to a file so stdout only carries tutor output. A broken log
    // directory is not worth failing the command over.
    let _log_guard = match logging::init(&paths::logs_dir()) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {e:#}");
            None
        }
    };

    // one tokio runtime for everything
    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let mut config = config::Config::load().context("load config")?;
    if let Some(model) = cli.model {
        config.model = model;
    }
    tracing::debug!(model = %config.model, "config loaded");

    match cli.command {
        Commands::Topics => commands::topics::run(),
        Commands::Explain { topic, level, done } => {
            let tutor = Tutor::connect(&config)?;
            commands::explain::run(&tutor, &topic, level.difficulty, done).await
        }
        Commands::Lab { command } => match command {
            LabCommands::Examples => {
                commands::lab::examples();
                Ok(())
            }
            LabCommands::Run { source } => {
                let tutor = Tutor::connect(&config)?;
                commands::lab::run(&tutor, &source).await
            }
            LabCommands::Analyze { source } => {
                let tutor = Tutor::connect(&config)?;
                commands::lab::analyze(&tutor, &source).await
            }
            LabCommands::Visualize { source, out } => {
                let tutor = Tutor::connect(&config)?;
                commands::lab::visualize(&tutor, &source, out.as_deref()).await
            }
            LabCommands::Share { source, base } => commands::lab::share(&source, &base),
        },
        Commands::Quiz { topic, level } => {
            let tutor = Tutor::connect(&config)?;
            commands::quiz::run(&tutor, &topic, level.difficulty).await
        }
        Commands::Chat => {
            let tutor = Tutor::connect(&config)?;
            commands::chat::run(&tutor).await
        }
        Commands::Progress { command } => match command {
            None => commands::progress::show(),
            Some(ProgressCommands::Toggle { topic }) => commands::progress::toggle(&topic),
        },
        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

/// What every model-backed command needs: the client, the prompts and the
/// loaded config.
pub struct Tutor {
    pub model: Arc<GeminiClient>,
    pub prompts: Arc<Prompts>,
    pub config: config::Config,
}

impl Tutor {
    fn connect(config: &config::Config) -> Result<Self> {
        let gemini = config.gemini().context(
            "configure Gemini (set GEMINI_API_KEY or providers.gemini.api_key in config)",
        )?;
        let prompts = Prompts::new(&config.language).context("load prompt templates")?;
        Ok(Self {
            model: Arc::new(GeminiClient::new(gemini)),
            prompts: Arc::new(prompts),
            config: config.clone(),
        })
    }

    pub fn orchestrator(&self) -> Orchestrator<GeminiClient> {
        Orchestrator::new(
            Arc::clone(&self.model),
            Arc::clone(&self.prompts),
            self.config.quiz_questions,
        )
    }
}
