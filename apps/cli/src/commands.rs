//! CLI command definitions, routing, and tracing setup.

use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use partnerscout_core::Pipeline;
use partnerscout_shared::{
    AppConfig, IndustryReport, SearchPhase, init_config, load_config, validate_provider_keys,
};
use partnerscout_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// PartnerScout — discover and score potential partners in an industry.
#[derive(Parser)]
#[command(
    name = "partnerscout",
    version,
    about = "Discover companies in an industry and score them as potential partners.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Run a discovery search for an industry.
    Search {
        /// Free-text industry query (e.g. "sports analytics").
        industry: Vec<String>,

        /// Print the full report as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },

    /// List saved potential partners, highest score first.
    Partners {
        /// Print records as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show recent search history.
    History {
        /// Maximum entries to show.
        #[arg(long, default_value = "20")]
        limit: u32,
    },

    /// Clear saved partners, search history, and the considered-company list.
    Reset {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "partnerscout=info",
        1 => "partnerscout=debug",
        _ => "partnerscout=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Search { industry, json } => cmd_search(&industry.join(" "), json).await,
        Command::Partners { json } => cmd_partners(json).await,
        Command::History { limit } => cmd_history(limit).await,
        Command::Reset { yes } => cmd_reset(yes).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show().await,
        },
    }
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_search(industry: &str, json: bool) -> Result<()> {
    let config = load_config()?;
    validate_provider_keys(&config)?;

    let pipeline = Arc::new(Pipeline::new(&config).await?);
    let receipt = pipeline.start(industry).await;
    if !receipt.accepted {
        return Err(eyre!(receipt.message));
    }

    info!(industry, "discovery run started");
    let spinner = make_spinner();
    let tracker = pipeline.tracker();

    let status = loop {
        let status = tracker.snapshot().await;
        spinner.set_message(format!("[{:>3}%] {}", status.progress, status.message));
        if status.completed {
            break status;
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    };
    spinner.finish_and_clear();

    if status.phase == SearchPhase::Error {
        return Err(eyre!(
            status
                .error
                .unwrap_or_else(|| "search failed for an unknown reason".into())
        ));
    }

    let report = status
        .results
        .ok_or_else(|| eyre!("search completed without a report"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &IndustryReport) {
    println!();
    println!("  Industry: {}", report.industry);
    if !report.analysis.industry_overview.is_empty() {
        println!("  {}", report.analysis.industry_overview);
    }
    println!();

    if report.analysis.companies.is_empty() {
        println!("  No new companies found to analyze.");
        println!();
        return;
    }

    println!(
        "  {:<30} {:>6}  {}",
        "Company", "Score", "Notes"
    );
    for company in &report.analysis.companies {
        let notes = if company.analysis.competes_with_partners {
            format!(
                "conflicts with {}",
                company.analysis.competing_partners.join(", ")
            )
        } else if !company.enriched {
            "profile unavailable".to_string()
        } else {
            String::new()
        };
        println!(
            "  {:<30} {:>5.1}/10  {}",
            company.analysis.name, company.partnership_score, notes
        );
    }
    println!();
    println!(
        "  {} suitable partner(s), {} saved",
        report.analysis.suitable_partners.len(),
        report.saved_count
    );
    println!();
}

async fn cmd_partners(json: bool) -> Result<()> {
    let storage = open_storage().await?;
    let partners = storage.list_partners().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&partners)?);
        return Ok(());
    }

    if partners.is_empty() {
        println!("No potential partners saved yet. Run a search first.");
        return Ok(());
    }

    println!();
    println!("  {:<30} {:>6}  {:<24} {}", "Company", "Score", "Industry", "HQ");
    for partner in &partners {
        println!(
            "  {:<30} {:>5.1}/10  {:<24} {}",
            partner.name, partner.score, partner.industry, partner.hq_location
        );
    }
    println!();
    println!("  {} potential partner(s)", partners.len());
    Ok(())
}

async fn cmd_history(limit: u32) -> Result<()> {
    let storage = open_storage().await?;
    let entries = storage.list_history(limit).await?;

    if entries.is_empty() {
        println!("No search history yet.");
        return Ok(());
    }

    for entry in &entries {
        println!(
            "{}  {:<10} {:<40} {} result(s)",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            entry.search_type,
            entry.query,
            entry.results_count
        );
    }
    Ok(())
}

async fn cmd_reset(yes: bool) -> Result<()> {
    if !yes {
        return Err(eyre!(
            "this deletes all saved partners, history, and the considered-company list; \
             re-run with --yes to confirm"
        ));
    }

    let storage = open_storage().await?;
    storage.clear_all().await?;
    info!("database cleared");
    println!("Saved partners, search history, and considered companies cleared.");
    Ok(())
}

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show() -> Result<()> {
    let config: AppConfig = load_config()?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn open_storage() -> Result<Storage> {
    let config = load_config()?;
    let db_path = config.store.resolved_db_path()?;
    Ok(Storage::open(&db_path).await?)
}

fn make_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}
