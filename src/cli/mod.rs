//! Command-line interface parsing and handling
//!
//! This module handles parsing command-line arguments and executing the appropriate commands.

pub mod account;
pub mod chat;
pub mod history;
pub mod profile;
pub mod settings;

use std::error::Error;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::core::client::ResiliaClient;
use crate::core::config::Config;
use crate::core::constants::LOG_FILTER_ENV;

const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("VERGEN_GIT_SHA"), ")");

#[derive(Parser)]
#[command(name = "resilia", version = VERSION)]
#[command(about = "Terminal client for the Resilia mental health companion")]
#[command(
    long_about = "Resilia is a mental health companion. This client signs you in, keeps your \
session between runs and lets you talk with the companion from the terminal.\n\n\
Environment Variables:\n\
  RESILIA_BASE_URL  Backend address (defaults to http://localhost:8080/api)\n\
  RESILIA_PASSWORD  Password used by 'login' when --password is not given\n\
  RESILIA_LOG       Diagnostic log filter, e.g. 'debug' (defaults to 'warn')\n\n\
Chat commands:\n\
  /new              Start a new conversation\n\
  /log <filename>   Enable transcript logging to the specified file\n\
  /log              Toggle transcript logging pause/resume\n\
  /quit             Leave the chat"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Backend address, overriding RESILIA_BASE_URL and the config file
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create an account and sign in
    Register(account::RegisterArgs),
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Falls back to RESILIA_PASSWORD, then a prompt
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// View or edit your profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// List past conversations, newest first as returned by the backend
    History {
        /// Show at most this many conversations
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Print the messages of one conversation
    Show {
        conversation_id: i64,
    },
    /// Send a single message and print the reply
    Say {
        /// Continue this conversation instead of starting a new one
        #[arg(long)]
        conversation: Option<i64>,
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        message: Vec<String>,
    },
    /// Talk with the companion interactively
    Chat {
        /// Continue an existing conversation
        #[arg(long, conflicts_with = "resume")]
        conversation: Option<i64>,
        /// Continue the conversation from the previous chat
        #[arg(long)]
        resume: bool,
        /// Append a transcript to this file
        #[arg(short = 'l', long, value_name = "FILE")]
        log: Option<PathBuf>,
    },
    /// Show or change client settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Print the stored profile
    Show,
    /// Change profile fields; only the given fields are sent
    Update(profile::ProfileUpdateArgs),
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the current configuration
    Show,
    /// Set base-url, storage (file|keyring) or data-dir
    Set { key: String, value: String },
    /// Remove a setting
    Unset { key: String },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    let Args { command, base_url } = Args::parse();
    if let Err(e) = dispatch(command, base_url.as_deref()).await {
        eprintln!("❌ {e}");
        std::process::exit(1);
    }
    Ok(())
}

fn connect(config_path: &Path, base_url: Option<&str>) -> Result<ResiliaClient, Box<dyn Error>> {
    let config = Config::load_from_path(config_path)?;
    ResiliaClient::from_config(&config, base_url).map_err(|e| format!("Error: {e}").into())
}

async fn dispatch(command: Commands, base_url: Option<&str>) -> Result<(), Box<dyn Error>> {
    let config_path = Config::get_config_path()?;
    let client = || connect(&config_path, base_url);
    let mut out = std::io::stdout();
    match command {
        Commands::Register(register) => {
            let client = client()?;
            let password = account::resolve_password(register.password.clone())?;
            account::register(&client, register, password, &mut out).await
        }
        Commands::Login { email, password } => {
            let client = client()?;
            let password = account::resolve_password(password)?;
            account::login(&client, email, password, &mut out).await
        }
        Commands::Logout => account::logout(&client()?, &mut out),
        Commands::Whoami => account::whoami(&client()?, &mut out),
        Commands::Profile { command } => match command {
            ProfileCommands::Show => profile::show(&client()?, &mut out),
            ProfileCommands::Update(update) => {
                profile::update(&client()?, update, &mut out).await
            }
        },
        Commands::History { limit } => history::list(&client()?, limit, &mut out).await,
        Commands::Show { conversation_id } => {
            history::show(&client()?, conversation_id, &mut out).await
        }
        Commands::Say {
            conversation,
            message,
        } => chat::say(&client()?, conversation, &message, &mut out).await,
        Commands::Chat {
            conversation,
            resume,
            log,
        } => {
            let options = chat::ChatOptions {
                conversation,
                resume,
                log,
            };
            chat::run_chat(&client()?, options).await
        }
        // Runs without a client.
        Commands::Config { command } => settings::run(&command, &config_path, &mut out),
    }
}
