mod commands;
mod helpers;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::Result;
use tracing::info;
use triage_db::{ExceptionKind, Severity};

#[derive(Parser)]
#[command(name = "triage")]
#[command(about = "Error catalog with stack-trace ownership resolution")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Database file path (overrides config)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Owner directory management
    Owner {
        #[command(subcommand)]
        cmd: OwnerCommands,
    },
    /// Team management
    Team {
        #[command(subcommand)]
        cmd: TeamCommands,
    },
    /// Owner path patterns
    Pattern {
        #[command(subcommand)]
        cmd: PatternCommands,
    },
    /// Record an error
    Capture {
        /// Error message
        #[arg(long, short = 'm')]
        message: String,
        /// Exception kind (e.g. no_method_error, argument_error)
        #[arg(long, short = 'k', default_value = "standard_error")]
        kind: ExceptionKind,
        /// File containing the stack trace
        #[arg(long)]
        trace_file: Option<PathBuf>,
        /// Severity (low, medium, high, critical); defaults to the configured one
        #[arg(long)]
        severity: Option<Severity>,
    },
    /// Resolve the owner of a stack trace without recording it
    Resolve {
        /// Stack trace text
        #[arg(long, conflicts_with = "trace_file")]
        trace: Option<String>,
        /// File containing the stack trace (stdin if neither is given)
        #[arg(long)]
        trace_file: Option<PathBuf>,
        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Resolve and store the owner of a recorded error
    Assign {
        /// Error ID; every unassigned error when omitted
        error_id: Option<String>,
    },
    /// Ownership file inspection
    OwnershipFile {
        #[command(subcommand)]
        cmd: OwnershipFileCommands,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        cmd: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum OwnerCommands {
    /// List all owners
    List,
    /// Add an owner
    Add {
        name: String,
        email: String,
        /// Code-host handle used in ownership files
        #[arg(long)]
        handle: Option<String>,
    },
    /// Mark an owner inactive (by id, email or name)
    Deactivate { owner: String },
}

#[derive(Subcommand)]
enum TeamCommands {
    /// List all teams
    List,
    /// Create a team
    Add { name: String },
    /// Add an owner to a team
    AddMember {
        team: String,
        /// Owner id, email or name
        owner: String,
        /// Add as team lead
        #[arg(long)]
        lead: bool,
    },
    /// List a team's members
    Members { team: String },
}

#[derive(Subcommand)]
enum PatternCommands {
    /// List active rules, or all rules of one owner
    List {
        #[arg(long)]
        owner: Option<String>,
    },
    /// Register a path glob for an owner
    Add {
        /// Owner id, email or name
        owner: String,
        /// Glob such as `app/controllers/*` or `app/models/**`
        pattern: String,
        #[arg(long, short = 'd')]
        description: Option<String>,
    },
    /// Disable a rule
    Disable { rule_id: String },
}

#[derive(Subcommand)]
enum OwnershipFileCommands {
    /// Show the rule and owners covering a repository path
    Check { path: String },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Show catalog statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .with_cause_chain()
                .color(true)
                .context_lines(3)
                .build(),
        )
    }))?;
    miette::set_panic_hook();
    let cli = Cli::parse();

    use tracing_appender::rolling;
    use tracing_subscriber::{
        EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt,
    };

    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("triage")
        .join("logs");
    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = rolling::daily(&log_dir, "triage.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.debug {
            EnvFilter::new("triage_core=debug,triage_db=debug,triage_cli=debug,warn")
        } else {
            EnvFilter::new("triage_core=warn,triage_db=warn,triage_cli=info,warn")
        }
    });

    let terminal_layer = if cli.debug {
        fmt::layer()
            .with_file(true)
            .with_line_number(true)
            .with_writer(std::io::stderr)
            .pretty()
            .boxed()
    } else {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .boxed()
    };

    let file_layer = fmt::layer()
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false)
        .with_writer(non_blocking);

    tracing_subscriber::registry()
        .with(terminal_layer.with_filter(env_filter))
        .with(file_layer.with_filter(EnvFilter::new(
            "triage_core=debug,triage_db=debug,triage_cli=debug,info",
        )))
        .init();

    let mut config = triage_core::load_config_or_default(cli.config.as_deref()).await?;
    if let Some(db_path) = cli.db_path {
        config.database.path = db_path;
    }
    info!(
        "Using catalog at {} (logs in {})",
        config.database.path.display(),
        log_dir.display()
    );

    match cli.command {
        Commands::Owner { cmd } => match cmd {
            OwnerCommands::List => commands::owner::list(&config).await?,
            OwnerCommands::Add {
                name,
                email,
                handle,
            } => commands::owner::add(&name, &email, handle.as_deref(), &config).await?,
            OwnerCommands::Deactivate { owner } => {
                commands::owner::deactivate(&owner, &config).await?
            }
        },
        Commands::Team { cmd } => match cmd {
            TeamCommands::List => commands::team::list(&config).await?,
            TeamCommands::Add { name } => commands::team::add(&name, &config).await?,
            TeamCommands::AddMember { team, owner, lead } => {
                commands::team::add_member(&team, &owner, lead, &config).await?
            }
            TeamCommands::Members { team } => commands::team::members(&team, &config).await?,
        },
        Commands::Pattern { cmd } => match cmd {
            PatternCommands::List { owner } => {
                commands::pattern::list(owner.as_deref(), &config).await?
            }
            PatternCommands::Add {
                owner,
                pattern,
                description,
            } => {
                commands::pattern::add(&owner, &pattern, description.as_deref(), &config).await?
            }
            PatternCommands::Disable { rule_id } => {
                commands::pattern::disable(&rule_id, &config).await?
            }
        },
        Commands::Capture {
            message,
            kind,
            trace_file,
            severity,
        } => {
            commands::resolve::capture(&message, kind, trace_file.as_deref(), severity, &config)
                .await?
        }
        Commands::Resolve {
            trace,
            trace_file,
            json,
        } => {
            commands::resolve::resolve(trace.as_deref(), trace_file.as_deref(), json, &config)
                .await?
        }
        Commands::Assign { error_id } => {
            commands::resolve::assign(error_id.as_deref(), &config).await?
        }
        Commands::OwnershipFile { cmd } => match cmd {
            OwnershipFileCommands::Check { path } => {
                commands::ownership_file::check(&path, &config).await?
            }
        },
        Commands::Config { cmd } => match cmd {
            ConfigCommands::Show => commands::config::show(&config)?,
            ConfigCommands::Stats => commands::config::stats(&config).await?,
        },
    }

    Ok(())
}
