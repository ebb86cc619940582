//! ApplyTrack command line.
//!
//! Reads applications and notes from YAML/JSON files, generates insights
//! and note summaries through the configured model chain, and prints
//! dashboard analytics.

use anyhow::{anyhow, bail, Context, Result};
use applytrack_core::{
    Application, ApplicationBook, ApplicationQuery, ApplicationStage, ApplicationStats, Dataset,
    NoteBook,
};
use applytrack_runtime::{
    CachedInsights, CachedSummary, Orchestrator, ProviderRegistry, RuntimeConfig, StoreSettings,
    StoredResults, SummaryTarget,
};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "applytrack", version, about = "Job application tracker with AI insights", long_about = None)]
struct Cli {
    /// Runtime configuration file (YAML)
    #[arg(short, long, global = true, env = "APPLYTRACK_CONFIG")]
    config: Option<PathBuf>,

    /// Where results and rate-limit records are kept when no config names a store
    #[arg(long, global = true, env = "APPLYTRACK_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate or show cached insights for a user
    Insights {
        /// User the insights belong to
        #[arg(short, long)]
        user: String,

        /// Applications file
        #[arg(short, long, required_unless_present = "cached")]
        applications: Option<PathBuf>,

        /// Regenerate even if the cached insights are fresh
        #[arg(long)]
        force: bool,

        /// Only show what is cached
        #[arg(long, conflicts_with = "force")]
        cached: bool,
    },

    /// Summarize the notes of one application
    Summarize {
        #[arg(short, long)]
        user: String,

        /// Applications file (company and role are taken from it)
        #[arg(short, long, required_unless_present = "cached")]
        applications: Option<PathBuf>,

        /// Application to summarize
        #[arg(long)]
        id: String,

        /// Notes file for that application
        #[arg(short, long, required_unless_present = "cached")]
        notes: Option<PathBuf>,

        #[arg(long)]
        force: bool,

        #[arg(long, conflicts_with = "force")]
        cached: bool,
    },

    /// Stage counts, rates and monthly activity
    Analytics {
        #[arg(short, long)]
        applications: PathBuf,
    },

    /// List applications, optionally filtered
    List {
        #[arg(short, long)]
        applications: PathBuf,

        /// Case-insensitive match on company or role
        #[arg(short, long)]
        search: Option<String>,

        /// applied, interview, offer or rejected
        #[arg(long)]
        stage: Option<ApplicationStage>,
    },

    /// Show models throttled on a given day
    RateLimits {
        /// Day as YYYY-MM-DD (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// List the generation providers this build knows about
    Providers,
}

/// Store root used when neither a config file nor `--data-dir` names one.
const DEFAULT_DATA_DIR: &str = "applytrack-data";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Insights {
            user,
            applications,
            force,
            cached,
        } => {
            let insights = if *cached {
                open_results(&cli)?.cached_insights(user).await?
            } else {
                let book = load_applications(required(applications, "--applications")?)?;
                let orchestrator = build_orchestrator(&cli).await?;
                Some(orchestrator.insights(user, &book.applications, *force).await?)
            };
            print_insights(cli.json, insights.as_ref())
        }

        Commands::Summarize {
            user,
            applications,
            id,
            notes: notes_file,
            force,
            cached,
        } => {
            let summary = if *cached {
                open_results(&cli)?.cached_summary(user, id).await?
            } else {
                let book = load_applications(required(applications, "--applications")?)?;
                let app = find_application(&book, id)?;
                let notes_file = required(notes_file, "--notes")?;
                let notes = NoteBook::from_file(notes_file).with_context(|| {
                    format!("Failed to load notes from {}", notes_file.display())
                })?;
                let orchestrator = build_orchestrator(&cli).await?;
                let target = SummaryTarget {
                    user_id: user,
                    application_id: id,
                    company: &app.company_name,
                    role: &app.role,
                };
                Some(orchestrator.summary(target, &notes.notes, *force).await?)
            };
            print_summary(cli.json, summary.as_ref())
        }

        Commands::Analytics { applications } => {
            let book = load_applications(applications)?;
            let stats = ApplicationStats::from_applications(&book.applications);
            print_stats(cli.json, &stats)
        }

        Commands::List {
            applications,
            search,
            stage,
        } => {
            let book = load_applications(applications)?;
            let mut query = ApplicationQuery::new();
            if let Some(text) = search {
                query = query.search(text.as_str());
            }
            if let Some(stage) = stage {
                query = query.stage(*stage);
            }
            print_applications(cli.json, &query.apply(&book.applications))
        }

        Commands::RateLimits { date } => {
            let results = open_results(&cli)?;
            let record = match date {
                Some(day) => results.rate_limits_on(*day).await?,
                None => results.rate_limits_today().await?,
            };
            match record {
                Some(record) if cli.json => print_json(&record),
                Some(record) => {
                    println!("{} (updated {})", record.date, record.last_updated);
                    for model in &record.failed_models {
                        println!("  {}", model);
                    }
                    Ok(())
                }
                None => {
                    println!("No rate-limited models recorded.");
                    Ok(())
                }
            }
        }

        Commands::Providers => {
            let registry = ProviderRegistry::with_defaults();
            let providers = registry.descriptions();
            if cli.json {
                let listed: Vec<_> = providers
                    .iter()
                    .map(|(name, description)| serde_json::json!({"type": name, "description": description}))
                    .collect();
                return print_json(&listed);
            }
            if providers.is_empty() {
                println!("No providers compiled in.");
            }
            for (name, description) in providers {
                println!("{:<10} {}", name, description);
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "applytrack=debug,applytrack_runtime=debug,applytrack_core=debug"
    } else {
        "applytrack=info,applytrack_runtime=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Config from `--config`, or defaults with a file store under the data dir.
///
/// An explicit `--data-dir` overrides the store of a config file too.
fn load_config(path: Option<&Path>, data_dir: Option<&Path>) -> Result<RuntimeConfig> {
    let mut config = match path {
        Some(path) => RuntimeConfig::from_yaml_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RuntimeConfig {
            store: StoreSettings::File {
                root: PathBuf::from(DEFAULT_DATA_DIR),
            },
            ..RuntimeConfig::default()
        },
    };
    if let Some(root) = data_dir {
        config.store = StoreSettings::File {
            root: root.to_path_buf(),
        };
    }

    tracing::debug!(
        config = %path.map_or_else(|| "defaults".to_string(), |p| p.display().to_string()),
        store = ?config.store,
        "Runtime config loaded"
    );
    Ok(config)
}

fn cli_config(cli: &Cli) -> Result<RuntimeConfig> {
    load_config(cli.config.as_deref(), cli.data_dir.as_deref())
}

/// Read-only access to stored results; no provider credentials needed.
fn open_results(cli: &Cli) -> Result<StoredResults> {
    Orchestrator::builder()
        .config(cli_config(cli)?)
        .build_results()
        .context("Failed to open stored results")
}

async fn build_orchestrator(cli: &Cli) -> Result<Orchestrator> {
    let config = cli_config(cli)?;
    let registry = ProviderRegistry::with_defaults();
    let provider = registry
        .create(&config.provider.kind, &config.provider.settings)
        .with_context(|| format!("Failed to create '{}' provider", config.provider.kind))?;

    let orchestrator = Orchestrator::builder()
        .provider(provider)
        .config(config)
        .build()
        .context("Failed to build runtime")?;

    if !orchestrator.provider_ready().await {
        bail!("Provider '{}' is not usable", orchestrator.provider_name());
    }
    Ok(orchestrator)
}

fn required<'a>(value: &'a Option<PathBuf>, flag: &str) -> Result<&'a Path> {
    value
        .as_deref()
        .ok_or_else(|| anyhow!("{} is required unless --cached is set", flag))
}

fn load_applications(path: &Path) -> Result<ApplicationBook> {
    ApplicationBook::from_file(path)
        .with_context(|| format!("Failed to load applications from {}", path.display()))
}

fn find_application<'a>(book: &'a ApplicationBook, id: &str) -> Result<&'a Application> {
    book.applications
        .iter()
        .find(|app| app.id == id)
        .ok_or_else(|| anyhow!("No application with id '{}'", id))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_insights(json: bool, insights: Option<&CachedInsights>) -> Result<()> {
    match insights {
        Some(insights) if json => print_json(insights),
        Some(insights) => {
            for line in &insights.insights {
                println!("* {}", line);
            }
            println!();
            println!(
                "Generated {} by {}",
                insights.generated_at.format("%Y-%m-%d %H:%M UTC"),
                insights.model_used.as_deref().unwrap_or("no model")
            );
            Ok(())
        }
        None => {
            println!("No cached insights.");
            Ok(())
        }
    }
}

fn print_summary(json: bool, summary: Option<&CachedSummary>) -> Result<()> {
    match summary {
        Some(summary) if json => print_json(summary),
        Some(summary) => {
            println!("{}", summary.summary);
            if !summary.takeaways.is_empty() {
                println!();
                println!("Key takeaways:");
                for takeaway in &summary.takeaways {
                    println!("  - {}", takeaway);
                }
            }
            Ok(())
        }
        None => {
            println!("No cached summary.");
            Ok(())
        }
    }
}

fn print_stats(json: bool, stats: &ApplicationStats) -> Result<()> {
    if json {
        return print_json(stats);
    }

    println!("Total applications: {}", stats.total);
    for stage in ApplicationStage::ALL {
        println!("  {:<10} {}", stage.label(), stats.stage_count(stage));
    }
    println!("Response rate:  {}%", stats.response_rate);
    println!("Interview rate: {}%", stats.interview_rate);
    println!("Success rate:   {}%", stats.success_rate);

    if !stats.monthly.is_empty() {
        println!();
        println!("Applications per month:");
        for month in &stats.monthly {
            println!("  {:<9} {}", month.label, month.applications);
        }
    }
    Ok(())
}

fn print_applications(json: bool, applications: &[&Application]) -> Result<()> {
    if json {
        return print_json(&applications);
    }

    if applications.is_empty() {
        println!("No applications match.");
        return Ok(());
    }
    for app in applications {
        println!(
            "{}  {:<24} {:<28} {}",
            app.application_date.format("%Y-%m-%d"),
            app.company_name,
            app.role,
            app.stage.label()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use applytrack_runtime::providers::{CompletionResponse, TokenUsage};
    use applytrack_runtime::{CompletionConfig, GenerationRequest, LlmProvider, ProviderError};
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use clap::CommandFactory;
    use std::sync::Arc;

    struct CannedProvider;

    #[async_trait]
    impl LlmProvider for CannedProvider {
        async fn complete(
            &self,
            _request: &GenerationRequest,
            config: &CompletionConfig,
        ) -> Result<CompletionResponse, ProviderError> {
            Ok(CompletionResponse {
                content: "Interviews cluster around backend roles.".to_string(),
                usage: TokenUsage::default(),
                model: config.model.clone(),
                stop_reason: None,
            })
        }

        async fn health_check(&self) -> bool {
            true
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_list_filters() {
        let cli = Cli::parse_from([
            "applytrack",
            "list",
            "-a",
            "apps.yaml",
            "--search",
            "acme",
            "--stage",
            "interview",
        ]);
        match cli.command {
            Commands::List { search, stage, .. } => {
                assert_eq!(search.as_deref(), Some("acme"));
                assert_eq!(stage, Some(ApplicationStage::Interview));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cached_conflicts_with_force() {
        let result = Cli::try_parse_from([
            "applytrack",
            "insights",
            "-u",
            "u1",
            "-a",
            "apps.yaml",
            "--force",
            "--cached",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rate_limit_date_parses() {
        let cli = Cli::parse_from(["applytrack", "rate-limits", "--date", "2025-04-02"]);
        match cli.command {
            Commands::RateLimits { date } => {
                assert_eq!(date, NaiveDate::from_ymd_opt(2025, 4, 2));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cached_insights_need_no_applications() {
        let cli = Cli::parse_from(["applytrack", "insights", "-u", "u1", "--cached"]);
        match cli.command {
            Commands::Insights { applications, cached, .. } => {
                assert!(cached);
                assert!(applications.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }

        assert!(Cli::try_parse_from(["applytrack", "insights", "-u", "u1"]).is_err());
        assert!(Cli::try_parse_from([
            "applytrack", "summarize", "-u", "u1", "--id", "a1", "--cached"
        ])
        .is_ok());
    }

    #[test]
    fn test_default_config_uses_file_store() {
        let config = load_config(None, None).unwrap();
        assert_eq!(
            config.store,
            StoreSettings::File {
                root: PathBuf::from(DEFAULT_DATA_DIR)
            }
        );

        let config = load_config(None, Some(Path::new("/tmp/tracker"))).unwrap();
        assert_eq!(
            config.store,
            StoreSettings::File {
                root: PathBuf::from("/tmp/tracker")
            }
        );
    }

    #[tokio::test]
    async fn test_results_survive_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let applications = vec![Application::new(
            "a1",
            "Initech",
            "Backend",
            ApplicationStage::Interview,
            Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).unwrap(),
        )];

        let first_run = Orchestrator::builder()
            .provider(Arc::new(CannedProvider))
            .config(load_config(None, Some(dir.path())).unwrap())
            .build()
            .unwrap();
        let generated = first_run.insights("u1", &applications, false).await.unwrap();

        let second_run = Orchestrator::builder()
            .config(load_config(None, Some(dir.path())).unwrap())
            .build_results()
            .unwrap();
        let cached = second_run.cached_insights("u1").await.unwrap();

        assert_eq!(cached, Some(generated));
    }

    #[test]
    fn test_providers_lists_gemini() {
        let registry = ProviderRegistry::with_defaults();
        let types: Vec<&str> = registry.descriptions().into_iter().map(|(name, _)| name).collect();
        assert_eq!(types, vec!["gemini"]);
    }
}
