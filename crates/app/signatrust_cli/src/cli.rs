use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use signatrust_core::config::{ConsoleConfig, Variant};
use signatrust_core::models::{KeyValue, SearchField, Visibility};
use signatrust_core::state::CountWay;
use signatrust_core::state::statistics::{DEFAULT_WINDOW_HOURS, MAX_WINDOW_HOURS};
use url::Url;

use crate::views::keys::MAX_EXPIRE_DAYS;

#[derive(Parser, Debug)]
#[command(name = "signatrust", version, about = "Signatrust administrative console")]
pub struct Cli {
    /// Backend base URL.
    #[arg(long, global = true, env = "SIGNATRUST_URL")]
    pub url: Option<Url>,

    /// Console flavour: `signatrust` or `certification`.
    #[arg(long, global = true, env = "SIGNATRUST_VARIANT")]
    pub variant: Option<Variant>,

    /// File holding the session token.
    #[arg(long, global = true, env = "SIGNATRUST_SESSION_FILE")]
    pub session_file: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, env = "SIGNATRUST_TIMEOUT_SECS")]
    pub timeout: Option<u64>,

    /// Print raw JSON instead of tables.
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Applies command-line overrides on top of the environment config.
    pub fn apply(&self, mut config: ConsoleConfig) -> ConsoleConfig {
        if let Some(url) = &self.url {
            let default_login = ConsoleConfig::new(config.base_url.clone()).login_url;
            let login_overridden = config.login_url != default_login;
            config.base_url = url.clone();
            if !login_overridden {
                config.login_url = ConsoleConfig::new(url.clone()).login_url;
            }
        }
        if let Some(variant) = self.variant {
            config.variant = variant;
        }
        if let Some(path) = &self.session_file {
            config.session_path = path.clone();
        }
        if let Some(secs) = self.timeout {
            config.timeout = std::time::Duration::from_secs(secs);
        }
        config
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print version information.
    Version,

    /// Log in. Without options, prints where to log in.
    Login(LoginArgs),

    /// Log out on the server and forget the local session.
    Logout,

    /// Show the logged-in user.
    Whoami {
        /// Also print the session as a `Set-Cookie` value for the browser console.
        #[arg(long)]
        cookie: bool,
        /// Also print the identity record the backend checks permissions against.
        #[arg(long)]
        permissions: bool,
    },

    /// Show the view behind a console route (`/`, `/tokens`, `/apiTokens`).
    Open { path: String },

    /// Data keys.
    #[command(subcommand)]
    Keys(KeyCommand),

    /// API tokens of the logged-in user.
    #[command(subcommand)]
    Tokens(TokenCommand),

    /// Certificate records (certification console).
    #[command(subcommand)]
    Cert(CertCommand),

    /// Cooperators and certificate types (certification console).
    #[command(subcommand)]
    Cooperator(CooperatorCommand),

    /// Certificate statistics (certification console).
    #[command(subcommand)]
    Stats(StatsCommand),
}

#[derive(Args, Debug)]
#[group(multiple = false)]
pub struct LoginArgs {
    /// Redirect URL the identity provider sent the browser to.
    #[arg(long)]
    pub callback: Option<Url>,

    /// Use an API key instead of the browser flow.
    #[arg(long)]
    pub api_key: Option<String>,

    /// Import a browser session from a `Cookie:` header value.
    #[arg(long)]
    pub cookie: Option<String>,
}

/// Free-form `key=value` parameters for the certification backend.
#[derive(Args, Debug, Default)]
pub struct ParamArgs {
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE")]
    pub params: Vec<KeyValue>,
}

#[derive(Subcommand, Debug)]
pub enum KeyCommand {
    /// List keys. Both scopes unless `--visibility` is given.
    List {
        #[arg(long)]
        visibility: Option<Visibility>,
        #[arg(long, default_value_t = 1)]
        page: u64,
        #[arg(long, default_value_t = signatrust_core::state::keys::DEFAULT_PAGE_SIZE)]
        page_size: u64,
        /// Search text.
        #[arg(long)]
        search: Option<String>,
        /// Field the search text is matched against: `name` or `description`.
        #[arg(long, default_value = "name")]
        select: SearchField,
    },

    /// Show one key.
    Show { id: i32 },

    /// Create a key.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        visibility: Option<Visibility>,
        /// `pgp`, `x509ca`, `x509ica` or `x509ee`.
        #[arg(long)]
        key_type: String,
        /// Key attribute, e.g. `key_length=2048`.
        #[arg(short = 'a', long = "attr", value_name = "KEY=VALUE")]
        attributes: Vec<KeyValue>,
        #[arg(long)]
        parent_id: Option<i32>,
        /// Validity in days.
        #[arg(long, default_value_t = 365, value_parser = clap::value_parser!(i64).range(1..=MAX_EXPIRE_DAYS))]
        expire_days: i64,
    },

    /// Import existing key material.
    Import {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        visibility: Option<Visibility>,
        #[arg(long)]
        key_type: String,
        #[arg(short = 'a', long = "attr", value_name = "KEY=VALUE")]
        attributes: Vec<KeyValue>,
        #[arg(long)]
        private_key: PathBuf,
        #[arg(long)]
        public_key: PathBuf,
        #[arg(long)]
        certificate: Option<PathBuf>,
    },

    Enable { id: i32 },
    Disable { id: i32 },

    /// Export key material, to stdout or into a directory.
    Export {
        id: i32,
        #[arg(long)]
        out: Option<PathBuf>,
    },

    RequestDelete { id: i32 },
    CancelDelete { id: i32 },

    /// Check whether a key name is still free.
    CheckName {
        name: String,
        #[arg(long, default_value = "public")]
        visibility: Visibility,
    },
}

#[derive(Subcommand, Debug)]
pub enum TokenCommand {
    List,
    Create { description: String },
    Delete { id: i32 },
}

#[derive(Subcommand, Debug)]
pub enum CertCommand {
    Search(ParamArgs),
    /// Export matching certificates as CSV.
    Export {
        #[command(flatten)]
        params: ParamArgs,
        #[arg(long, default_value = "certificates.csv")]
        out: PathBuf,
    },
    Edit(ParamArgs),
    UploadInfo(ParamArgs),
    Delete(ParamArgs),
}

#[derive(Subcommand, Debug)]
pub enum CooperatorCommand {
    List(ParamArgs),
    /// Certificate categories of cooperators.
    Categories(ParamArgs),
    /// Certificate types.
    Types,
    /// Create or update a cooperator from a JSON document.
    Save {
        /// JSON file; `-` reads stdin.
        file: PathBuf,
    },
    Delete(ParamArgs),
    Detail(ParamArgs),
    UploadLogo {
        file: PathBuf,
        #[arg(long)]
        mime: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    /// Certificate distribution per cooperator.
    Types,
    /// Certificate growth over a time window.
    Growth {
        /// Window length in hours, ending now.
        #[arg(
            long,
            default_value_t = DEFAULT_WINDOW_HOURS,
            value_parser = clap::value_parser!(i64).range(1..=MAX_WINDOW_HOURS)
        )]
        hours: i64,
        /// `day`, `week` or `month`.
        #[arg(long, default_value = "month")]
        count_way: CountWay,
    },
}
