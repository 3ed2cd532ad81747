//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use greenshield_core::capture::Platform;
use greenshield_core::logging;

mod app;
mod commands;

use app::App;

#[derive(Parser)]
#[command(name = "greenshield")]
#[command(version)]
#[command(about = "GreenShield plant disease scanner")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    #[command(flatten)]
    Session(SessionCommands),
}

/// Commands that run with a loaded session.
#[derive(clap::Subcommand)]
enum SessionCommands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GREENSHIELD_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Signup(commands::auth::SignupArgs),
    /// Confirm a new account with the emailed code
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
    },
    /// Email a fresh verification code
    ResendCode {
        #[arg(long)]
        email: String,
    },
    /// Request a password reset code
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    /// Set a new password using the emailed reset code
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        code: String,
        #[arg(long, env = "GREENSHIELD_PASSWORD", hide_env_values = true)]
        password: String,
        /// Repeat of the new password (defaults to --password)
        #[arg(long)]
        confirm_password: Option<String>,
    },
    /// Sign out and forget the stored token
    Logout,
    /// Show whether a session is active
    Status,
    /// Show the signed-in user's profile
    Profile,
    /// Upload a leaf photo for diagnosis
    Scan {
        /// Image file path or file:// URI
        #[arg(value_name = "IMAGE")]
        image: String,
        /// Override the platform used for URI normalization
        #[arg(long)]
        platform: Option<Platform>,
    },
    /// List recent scans
    History {
        /// Number of scans to request (default from config)
        #[arg(long)]
        limit: Option<u32>,
        /// Print rows as JSON
        #[arg(long)]
        json: bool,
    },
    /// List scans that need treatment
    Treatments {
        #[arg(long)]
        limit: Option<u32>,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
    /// Show the effective settings
    Show,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("create tokio runtime")?;
    rt.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<()> {
    let command = match cli.command {
        // config commands must work even when the config file is broken
        Commands::Config { command } => {
            return match command {
                ConfigCommands::Path => {
                    commands::config::path();
                    Ok(())
                }
                ConfigCommands::Init => commands::config::init(),
                ConfigCommands::Show => commands::config::show(),
            };
        }
        Commands::Session(command) => command,
    };

    let mut app = App::start().await?;

    match command {
        SessionCommands::Login { email, password } => {
            commands::auth::login(&mut app, &email, &password).await
        }
        SessionCommands::Signup(args) => commands::auth::signup(&mut app, args).await,
        SessionCommands::Verify { email, code } => {
            commands::auth::verify(&mut app, &email, &code).await
        }
        SessionCommands::ResendCode { email } => commands::auth::resend_code(&mut app, &email).await,
        SessionCommands::ForgotPassword { email } => {
            commands::auth::forgot_password(&mut app, &email).await
        }
        SessionCommands::ResetPassword {
            email,
            code,
            password,
            confirm_password,
        } => {
            let confirm = confirm_password.unwrap_or_else(|| password.clone());
            commands::auth::reset_password(&mut app, &email, &code, &password, &confirm).await
        }
        SessionCommands::Logout => commands::auth::logout(&mut app).await,
        SessionCommands::Status => {
            commands::auth::status(&app);
            Ok(())
        }
        SessionCommands::Profile => commands::auth::profile(&mut app).await,
        SessionCommands::Scan { image, platform } => {
            commands::scan::run(&mut app, &image, platform).await
        }
        SessionCommands::History { limit, json } => {
            commands::history::list(&mut app, limit, json).await
        }
        SessionCommands::Treatments { limit } => {
            commands::history::treatments(&mut app, limit).await
        }
    }
}
