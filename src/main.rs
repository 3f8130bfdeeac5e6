//! Binary entrypoint for the grouptitles CLI.
//!
//! Commands:
//! - `init` - create a starter `config.toml` and the data directory
//! - `status` - print user/title counts and a rule summary
//! - `check` - validate the configured rules, reporting non-fatal problems
//! - `apply --user <name> | --all` - re-evaluate titles through the resolver
//!
//! See the library crate docs for module-level details: `grouptitles::`.
use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use grouptitles::config::Config;
use grouptitles::storage::Storage;
use grouptitles::titles::{RuleSet, TitleEngine};

#[derive(Parser)]
#[command(name = "grouptitles")]
#[command(about = "Automatic group-based display titles for forum users")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (can be used before or after subcommand)
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: String,

    /// Verbose logging (-v, -vv for more; may appear before or after subcommand)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new grouptitles configuration
    Init,
    /// Show stored user counts and the configured rules
    Status,
    /// Validate the configured rules and report problems
    Check,
    /// Re-evaluate titles for one user or for every stored user
    Apply {
        /// Username to re-evaluate
        #[arg(short, long)]
        user: Option<String>,

        /// Re-evaluate every stored user
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config early to configure logging (except for Init which writes it)
    let pre_config = match cli.command {
        Commands::Init => None,
        _ => Config::load(&cli.config).await.ok(),
    };
    init_logging(&pre_config, cli.verbose);

    match cli.command {
        Commands::Init => {
            info!("Initializing new grouptitles configuration");
            Config::create_default(&cli.config).await?;
            info!("Configuration file created at {}", cli.config);

            let cfg = Config::default();
            Storage::new(&cfg.storage.data_dir).await?;
            info!("Data directory initialized at {}", cfg.storage.data_dir);
        }
        Commands::Status => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let storage = Storage::new(&config.storage.data_dir).await?;
            let stats = storage.get_statistics().await?;
            let rules = RuleSet::parse(&config.titles.rules);

            println!("grouptitles v{}", env!("CARGO_PKG_VERSION"));
            println!(
                "Feature enabled: {}",
                if config.titles.enabled { "yes" } else { "no" }
            );
            println!(
                "Rules: {} configured, {} well-formed",
                rules.len(),
                rules.iter().filter(|r| r.is_well_formed()).count()
            );
            println!(
                "Users: {} stored, {} titled",
                stats.total_users, stats.titled_users
            );
            let recent = storage.get_title_audit_page(1, 5).await?;
            if !recent.is_empty() {
                println!("Recent title changes:");
                for entry in recent {
                    println!(
                        "  {} {} -> '{}' ({})",
                        entry.timestamp.format("%Y-%m-%d %H:%M"),
                        entry.username,
                        entry.new_title,
                        entry.source
                    );
                }
            }
        }
        Commands::Check => {
            let config = match pre_config {
                Some(c) => c,
                None => Config::load(&cli.config).await?,
            };
            let rules = RuleSet::parse(&config.titles.rules);
            let mut problems = 0u32;
            let mut seen_groups: Vec<String> = Vec::new();

            for rule in rules.iter() {
                let key = rule.group().to_lowercase();
                if !rule.is_well_formed() {
                    println!(
                        "warning: rule for group '{}' has no title fields and can never apply",
                        rule.group()
                    );
                    problems += 1;
                }
                if seen_groups.contains(&key) {
                    println!(
                        "warning: duplicate rule for group '{}' is shadowed by an earlier rule",
                        rule.group()
                    );
                    problems += 1;
                }
                seen_groups.push(key);
            }

            if !config.titles.enabled {
                println!("note: titles are disabled; rules are kept but never applied");
            }
            println!(
                "{} rule(s) checked, {} problem(s) found",
                rules.len(),
                problems
            );
            if problems > 0 {
                std::process::exit(1);
            }
        }
        Commands::Apply { user, all } => {
            let mut engine = TitleEngine::new(&cli.config).await?;
            match (user, all) {
                (Some(username), false) => {
                    let applied = engine.apply_username(&username, "cli").await?;
                    if applied {
                        println!("Title updated for '{}'", username);
                    } else {
                        println!("No change for '{}'", username);
                    }
                }
                (None, true) => {
                    let (applied, total) = engine.apply_all("cli").await?;
                    println!("{} of {} user(s) updated", applied, total);
                }
                _ => {
                    eprintln!("Error: specify exactly one of --user <name> or --all");
                    std::process::exit(2);
                }
            }
        }
    }

    Ok(())
}

fn init_logging(config: &Option<Config>, verbosity: u8) {
    use std::io::Write;
    let mut builder = env_logger::Builder::new();
    // CLI verbosity overrides the configured level
    let base_level = match verbosity {
        0 => config
            .as_ref()
            .and_then(|c| c.logging.level.parse().ok())
            .unwrap_or(log::LevelFilter::Info),
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    builder.filter_level(base_level);

    if let Some(cfg) = config {
        if let Some(ref file) = cfg.logging.file {
            if let Ok(f) = std::fs::OpenOptions::new().create(true).append(true).open(file) {
                let mutex = std::sync::Arc::new(std::sync::Mutex::new(f));

                // When stdout is a terminal, echo log lines to the console as
                // well as the log file.
                let is_tty = atty::is(atty::Stream::Stdout);

                builder.format(move |fmt, record| {
                    let ts = chrono::Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
                    let line = format!("{} [{}] {}", ts, record.level(), record.args());

                    if let Ok(mut guard) = mutex.lock() {
                        let _ = writeln!(guard, "{}", line);
                    }

                    if is_tty {
                        writeln!(fmt, "{}", line)?;
                    }
                    Ok(())
                });
            }
        }
    }

    let _ = builder.try_init();
}
