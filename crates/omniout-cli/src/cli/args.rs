use crate::cli::{commands::Commands, handlers};
use crate::context::AppContext;
use crate::error::Result;
use clap::Parser;
use clap_verbosity_flag::{OffLevel, Verbosity};
use std::path::PathBuf;

/// OmniOut CLI - CRM records from the terminal
#[derive(Parser, Debug)]
#[command(
    name = "omniout",
    author = "OmniOut Team",
    version,
    about = "OmniOut CLI - CRM records from the terminal",
    long_about = "Command-line client for a CRM org.

QUICK START:
  omniout login                     # Sign in through the browser
  omniout accounts                  # List accounts
  omniout logout                    # Forget the session

AUTHENTICATION:
  omniout login --no-browser        # Print the sign-in URL only
  omniout complete-login <url>      # Finish a login from a pasted redirect
  omniout login-password -u <user>  # Username/password login
  omniout status                    # Show the current session

RECORDS:
  omniout contacts | leads | opportunities
  omniout create-account --name <name>
  omniout create-lead --last-name <name> --company <company>
  omniout update-contact <id> --title <title>

CONFIGURATION:
  omniout config show               # Show configuration
  omniout config example            # Print an example omniout.toml"
)]
pub struct Args {
    /// Configuration file path (defaults to ./omniout.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format as JSON
    #[arg(long, global = true)]
    pub json: bool,

    #[command(flatten)]
    pub verbosity: Verbosity<OffLevel>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Args {
    /// Execute the CLI command
    pub async fn run(self) -> Result<()> {
        let ctx = AppContext::load(self.config.as_deref()).await?;

        match self.command {
            // Authentication
            Commands::Login { no_browser } => handlers::auth::handle_login(&ctx, !no_browser).await,
            Commands::CompleteLogin { redirect_url } => {
                handlers::auth::handle_complete_login(&ctx, &redirect_url).await
            }
            Commands::LoginPassword { options } => {
                handlers::auth::handle_password_login(&ctx, options).await
            }
            Commands::Logout => handlers::auth::handle_logout(&ctx).await,
            Commands::Status => handlers::auth::handle_status(&ctx, self.json).await,

            // Records
            Commands::Accounts { options } => {
                handlers::records::handle_accounts(&ctx, options, self.json).await
            }
            Commands::Contacts { options } => {
                handlers::records::handle_contacts(&ctx, options, self.json).await
            }
            Commands::Leads { options } => {
                handlers::records::handle_leads(&ctx, options, self.json).await
            }
            Commands::Opportunities { options } => {
                handlers::records::handle_opportunities(&ctx, options, self.json).await
            }
            Commands::CreateAccount { fields } => {
                handlers::records::handle_create_account(&ctx, fields, self.json).await
            }
            Commands::CreateLead { fields } => {
                handlers::records::handle_create_lead(&ctx, fields, self.json).await
            }
            Commands::UpdateContact { id, fields } => {
                handlers::records::handle_update_contact(&ctx, &id, fields).await
            }

            Commands::Config { action } => handlers::config::handle_config(&ctx, action, self.json),
        }
    }
}
