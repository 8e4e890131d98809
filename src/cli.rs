// Argument parsing and dispatch. Handlers live in `commands`; this module
// only turns parsed arguments into handler calls and maps errors to the
// message shown to the user.

use crate::api::ShopifyClient;
use crate::commands::{self, kit::ConfigRequest, Session};
use crate::credentials::{self, Auth, Partial};
use crate::error::{self, Action};
use crate::kit::{self, ThemeKit};
use crate::sync::{SyncOptions, Transfer};
use crate::ui::{Always, Prompt, Terminal};
use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::debug;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(
    name = "shopify-cli",
    bin_name = "shopify-cli",
    version,
    about = "Manage the themes of a Shopify store"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[command(flatten)]
    pub auth: AuthArgs,

    /// Print JSON instead of the human readable output
    #[arg(long, global = true)]
    pub json: bool,

    /// Answer yes to every confirmation prompt
    #[arg(short, long, global = true)]
    pub yes: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Credentials given on the command line.
#[derive(Args, Debug, Clone, Default)]
pub struct AuthArgs {
    /// Store domain, e.g. sample.myshopify.com
    #[arg(short, long, global = true)]
    pub domain: Option<String>,

    /// Private app API key
    #[arg(short, long, global = true)]
    pub key: Option<String>,

    /// Private app password
    #[arg(short, long, global = true)]
    pub password: Option<String>,
}

impl From<AuthArgs> for Partial {
    fn from(args: AuthArgs) -> Self {
        Partial {
            domain: args.domain,
            api_key: args.key,
            password: args.password,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Save credentials so other commands can omit -d, -k and -p
    Config {
        /// Save to the home directory instead of the current one
        #[arg(long)]
        global: bool,
    },
    /// Manage the store's themes
    #[command(alias = "themes", subcommand)]
    Theme(ThemeCommand),
    /// Theme Kit integration
    #[command(aliases = ["stk", "themekit"], subcommand)]
    Kit(KitCommand),
}

#[derive(Subcommand, Debug)]
pub enum ThemeCommand {
    /// List all themes
    List,
    /// Make a theme the live theme
    Activate {
        #[arg(required_unless_present = "id_flag")]
        id: Option<u64>,
        #[arg(long = "id", conflicts_with = "id")]
        id_flag: Option<u64>,
    },
    /// Rename a theme. %name% and %id% are replaced with the old theme's values
    Rename {
        id: u64,
        #[arg(required_unless_present = "name_flag")]
        name: Option<String>,
        #[arg(short = 'n', long = "name", conflicts_with = "name")]
        name_flag: Option<String>,
    },
    /// Remove one or more themes
    #[command(alias = "delete")]
    Remove {
        #[arg(required_unless_present = "all")]
        ids: Vec<u64>,
        /// Remove every theme except the live one
        #[arg(long, conflicts_with = "ids")]
        all: bool,
    },
    /// Copy a theme into a new unpublished theme
    Duplicate {
        id: u64,
        /// Name for the new theme (default: "Copy of <name>")
        #[arg(short, long)]
        name: Option<String>,
        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Copy assets from one theme to another
    Sync {
        source: u64,
        target: u64,
        /// Asset keys to copy (default: every asset)
        files: Vec<String>,
        #[command(flatten)]
        sync: SyncArgs,
    },
    /// Install free themes from the catalogue
    #[command(alias = "install")]
    Bootstrap {
        #[arg(required_unless_present = "all")]
        names: Vec<String>,
        /// Install every theme in the catalogue
        #[arg(long, conflicts_with = "names")]
        all: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    /// Copy through the Theme Kit binary instead of the API
    #[arg(long)]
    pub kit: bool,

    /// Pause between asset copies, in milliseconds
    #[arg(long, default_value_t = 500)]
    pub delay_ms: u64,
}

#[derive(Subcommand, Debug)]
pub enum KitCommand {
    /// Install Theme Kit (requires curl and python)
    Install,
    /// Write a Theme Kit config file for the store's themes
    Config {
        /// Include every theme
        #[arg(short, long)]
        all: bool,
        /// Output directory
        #[arg(short, long, default_value = ".")]
        out: PathBuf,
        /// File name
        #[arg(short, long, default_value = kit::DEFAULT_CONFIG_NAME)]
        name: String,
        /// Comma separated theme ids to include
        #[arg(short, long = "theme", value_delimiter = ',')]
        themes: Vec<u64>,
    },
}

impl ThemeCommand {
    fn action(&self) -> Action {
        match self {
            ThemeCommand::List => Action::List,
            ThemeCommand::Activate { .. } => Action::Activate,
            ThemeCommand::Rename { .. } => Action::Rename,
            ThemeCommand::Remove { .. } => Action::Remove,
            ThemeCommand::Duplicate { .. } => Action::Duplicate,
            ThemeCommand::Sync { .. } => Action::Sync,
            ThemeCommand::Bootstrap { .. } => Action::Bootstrap,
        }
    }
}

/// Set up logging: `warn` by default, `debug` with `--verbose`, and
/// `RUST_LOG` when set.
pub fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Run the parsed command, printing errors to stderr.
pub fn run(cli: Cli) -> ExitCode {
    match dispatch(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn dispatch(cli: Cli) -> Result<(), String> {
    let cwd = std::env::current_dir().map_err(|e| format!("An error occurred: {e}"))?;
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut terminal = Terminal;
    let mut always = Always(true);
    let prompt: &mut dyn Prompt = if cli.yes { &mut always } else { &mut terminal };

    match cli.command {
        Command::Config { global } => {
            commands::config::run(&mut out, cli.auth.into(), &cwd, global)
                .map_err(|e| format!("An error occurred: {e:#}"))
        }
        Command::Theme(action) => {
            let kind = action.action();
            connect(cli.auth, &cwd)
                .and_then(|(client, auth)| {
                    let mut session = Session {
                        api: &client,
                        out: &mut out,
                        prompt,
                        json: cli.json,
                        progress: true,
                        sync: SyncOptions::new(&cwd),
                    };
                    theme(&mut session, &auth, action)
                })
                .map_err(|e| error::describe(&e, kind))
        }
        Command::Kit(KitCommand::Install) => {
            let output = kit::install().map_err(|e| format!("An error occurred: {e:#}"))?;
            write!(out, "{output}").map_err(|e| e.to_string())
        }
        Command::Kit(KitCommand::Config {
            all,
            out: dir,
            name,
            themes,
        }) => connect(cli.auth, &cwd)
            .and_then(|(client, auth)| {
                let mut session = Session {
                    api: &client,
                    out: &mut out,
                    prompt,
                    json: cli.json,
                    progress: false,
                    sync: SyncOptions::new(&cwd),
                };
                let req = ConfigRequest {
                    all,
                    dir,
                    filename: name,
                    themes,
                };
                commands::kit::config(&mut session, &auth, &req)
            })
            .map_err(|e| error::describe(&e, Action::KitConfig)),
    }
}

/// Resolve credentials and build the HTTP client.
fn connect(args: AuthArgs, cwd: &Path) -> Result<(ShopifyClient, Auth)> {
    let auth = credentials::resolve(args.into(), cwd)?;
    let client = ShopifyClient::new(&auth).context("building HTTP client")?;
    debug!("using {}", client.base_url());
    Ok((client, auth))
}

fn theme(s: &mut Session, auth: &Auth, action: ThemeCommand) -> Result<()> {
    use commands::theme as t;
    match action {
        ThemeCommand::List => t::list(s),
        ThemeCommand::Activate { id, id_flag } => {
            t::activate(s, id_flag.or(id).context("theme id required")?)
        }
        ThemeCommand::Rename {
            id,
            name,
            name_flag,
        } => {
            let name = name_flag.or(name).context("new name required")?;
            t::rename(s, id, &name)
        }
        ThemeCommand::Remove { ids, all } => t::remove(s, &ids, all),
        ThemeCommand::Duplicate { id, name, sync } => {
            configure_sync(s, auth, &sync);
            t::duplicate(s, id, name.as_deref())
        }
        ThemeCommand::Sync {
            source,
            target,
            files,
            sync,
        } => {
            configure_sync(s, auth, &sync);
            t::sync(s, source, target, &files)
        }
        ThemeCommand::Bootstrap { names, all } => t::bootstrap(s, &names, all),
    }
}

fn configure_sync(s: &mut Session, auth: &Auth, args: &SyncArgs) {
    s.sync.delay = Duration::from_millis(args.delay_ms);
    if args.kit {
        s.sync.transfer = Transfer::Kit {
            kit: ThemeKit::from_env(&auth.domain, &auth.password),
            auth: auth.clone(),
        };
    }
}
