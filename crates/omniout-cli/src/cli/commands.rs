use clap::{Args as ClapArgs, Subcommand};
use omniout_sdk::{Account, Contact, Lead};

/// Main CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in through the browser
    Login {
        /// Print the authorization URL instead of opening a browser
        #[arg(long)]
        no_browser: bool,
    },

    /// Finish a login from a redirect URL pasted from the browser
    CompleteLogin {
        /// Full redirect URL, or just its query string
        redirect_url: String,
    },

    /// Log in with username and password
    LoginPassword {
        #[command(flatten)]
        options: PasswordLoginOptions,
    },

    /// Forget the stored session
    Logout,

    /// Show the current session
    Status,

    /// List accounts
    Accounts {
        #[command(flatten)]
        options: ListOptions,
    },

    /// List contacts
    Contacts {
        #[command(flatten)]
        options: ListOptions,
    },

    /// List unconverted leads
    Leads {
        #[command(flatten)]
        options: ListOptions,
    },

    /// List open opportunities
    Opportunities {
        #[command(flatten)]
        options: ListOptions,
    },

    /// Create an account
    CreateAccount {
        #[command(flatten)]
        fields: AccountFields,
    },

    /// Create a lead
    CreateLead {
        #[command(flatten)]
        fields: LeadFields,
    },

    /// Update fields of a contact
    UpdateContact {
        /// Contact ID
        id: String,

        #[command(flatten)]
        fields: ContactFields,
    },

    /// Manage CLI configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print an example configuration file
    Example,
}

/// Options for record listings
#[derive(ClapArgs, Debug, Clone)]
pub struct ListOptions {
    /// Maximum number of records to fetch
    #[arg(long, default_value_t = omniout_sdk::client::DEFAULT_LIMIT)]
    pub limit: u32,
}

/// Options for the password login
#[derive(ClapArgs, Debug, Clone)]
pub struct PasswordLoginOptions {
    /// CRM username
    #[arg(long, short)]
    pub username: String,

    /// Password; prompted for when omitted
    #[arg(long, env = "OMNIOUT_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Login or instance host (defaults to the configured login URL)
    #[arg(long)]
    pub instance_url: Option<String>,

    /// Security token appended to the password
    #[arg(long, env = "OMNIOUT_SECURITY_TOKEN", hide_env_values = true)]
    pub security_token: Option<String>,
}

/// Fields for a new account
#[derive(ClapArgs, Debug, Clone)]
pub struct AccountFields {
    /// Account name
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub website: Option<String>,

    #[arg(long)]
    pub industry: Option<String>,

    /// Account type, e.g. "Customer - Direct"
    #[arg(long = "type")]
    pub account_type: Option<String>,

    #[arg(long)]
    pub billing_city: Option<String>,

    #[arg(long)]
    pub billing_country: Option<String>,
}

impl From<AccountFields> for Account {
    fn from(fields: AccountFields) -> Self {
        Account {
            name: Some(fields.name),
            phone: fields.phone,
            website: fields.website,
            industry: fields.industry,
            account_type: fields.account_type,
            billing_city: fields.billing_city,
            billing_country: fields.billing_country,
            ..Account::default()
        }
    }
}

/// Fields for a new lead
#[derive(ClapArgs, Debug, Clone)]
pub struct LeadFields {
    #[arg(long)]
    pub last_name: String,

    #[arg(long)]
    pub company: String,

    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    /// Lead status, e.g. "Open - Not Contacted"
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub lead_source: Option<String>,
}

impl From<LeadFields> for Lead {
    fn from(fields: LeadFields) -> Self {
        Lead {
            last_name: Some(fields.last_name),
            company: Some(fields.company),
            first_name: fields.first_name,
            email: fields.email,
            phone: fields.phone,
            status: fields.status,
            lead_source: fields.lead_source,
            ..Lead::default()
        }
    }
}

/// Contact fields to change; unset flags are left untouched
#[derive(ClapArgs, Debug, Clone)]
pub struct ContactFields {
    #[arg(long)]
    pub first_name: Option<String>,

    #[arg(long)]
    pub last_name: Option<String>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub phone: Option<String>,

    #[arg(long)]
    pub title: Option<String>,
}

impl ContactFields {
    pub fn is_empty(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.title.is_none()
    }
}

impl From<ContactFields> for Contact {
    fn from(fields: ContactFields) -> Self {
        Contact {
            first_name: fields.first_name,
            last_name: fields.last_name,
            email: fields.email,
            phone: fields.phone,
            title: fields.title,
            ..Contact::default()
        }
    }
}
