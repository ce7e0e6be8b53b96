use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use docsaver::about;
use docsaver::cli::{handle_record_command, handle_user_command, RecordCommands, UserCommands};
use docsaver::config::{SaverPaths, Settings};
use docsaver::display::format_logs;
use docsaver::identity::Identity;
use docsaver::storage::FileStore;
use docsaver::users::get_user;

#[derive(Parser)]
#[command(
    name = "docsaver",
    version,
    about = "Change-tracked records with an append-only audit log",
    long_about = "docsaver stores user accounts and other records as JSON documents. \
                  Every change is committed together with an audit entry holding a \
                  structural diff of the record, with secrets masked."
)]
struct Cli {
    /// Debug logging output
    #[arg(short, long, global = true)]
    debug: bool,

    /// Record changes as made by this user
    #[arg(long = "as", global = true, value_name = "USERNAME", env = "DOCSAVER_USER")]
    acting_as: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory
    Init,

    /// Show current configuration and paths
    Config,

    /// Show the most recent audit entries
    Log {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// User account commands
    #[command(subcommand)]
    User(UserCommands),

    /// Record inspection and attachment commands
    #[command(subcommand)]
    Record(RecordCommands),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = SaverPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    init_tracing(cli.debug || settings.log_debug);

    let Some(command) = cli.command else {
        println!("docsaver - change-tracked records");
        println!();
        println!("Run 'docsaver --help' for usage information.");
        return Ok(());
    };

    match command {
        Commands::Init => {
            println!("Initializing docsaver at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            let store = FileStore::open(&paths)?;
            tracing::info!(records = store.count()?, "data directory ready");
            println!("Initialization complete!");
            println!();
            println!("Run 'docsaver user create --admin' to create the first admin.");
        }
        Commands::Config => {
            println!("docsaver Configuration");
            println!("======================");
            for software in about::software(settings.schema_version) {
                println!("{:<18}{}", format!("{}:", software.name), software.version);
            }
            println!();
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Records file:     {}", paths.records_file().display());
            println!("Audit log:        {}", paths.audit_log().display());
            println!("Attachments:      {}", paths.attachments_dir().display());
            println!();
            println!("Settings:");
            println!("  Site name:                {}", settings.site_name);
            println!("  Debug logging:            {}", settings.log_debug);
            println!("  Min password length:      {}", settings.min_password_length);
            println!("  Enable users immediately: {}", settings.user_enable_immediately);
            println!(
                "  E-mail whitelist:         {}",
                join_or_none(&settings.user_enable_email_whitelist)
            );
            println!(
                "  Hidden user fields:       {}",
                join_or_none(&settings.hidden_fields)
            );
        }
        Commands::Log { limit } => {
            let store = FileStore::open(&paths)?;
            let log = store.audit_log();
            let entries = log.read_recent(limit)?;
            println!("{}", format_logs(&entries));
            if !entries.is_empty() {
                println!();
                println!("Showing {} of {} entries", entries.len(), log.entry_count()?);
            }
        }
        Commands::User(cmd) => {
            let store = FileStore::open(&paths)?;
            let identity = resolve_identity(&store, cli.acting_as.as_deref())?;
            handle_user_command(&store, &settings, &identity, cmd)?;
        }
        Commands::Record(cmd) => {
            let store = FileStore::open(&paths)?;
            let identity = resolve_identity(&store, cli.acting_as.as_deref())?;
            let mut hidden = vec!["password", "apikey"];
            hidden.extend(settings.hidden_fields.iter().map(String::as_str));
            handle_record_command(&store, &identity, &hidden, cmd)?;
        }
    }

    Ok(())
}

fn init_tracing(debug: bool) {
    let default = if debug { "docsaver=debug" } else { "docsaver=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// The principal named by `--as` must be an existing user
fn resolve_identity(store: &FileStore, acting_as: Option<&str>) -> Result<Identity> {
    match acting_as {
        Some(name) => {
            let user = get_user(store, name)?;
            let username = user.get_str("username").unwrap_or(name).to_string();
            Ok(Identity::user(username))
        }
        None => Ok(Identity::anonymous()),
    }
}

fn join_or_none(values: &[String]) -> String {
    if values.is_empty() {
        "(none)".to_string()
    } else {
        values.join(", ")
    }
}
