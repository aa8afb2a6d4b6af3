use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use carebox_order::backend::{load_catalog, HttpBackend};
use carebox_order::catalog::Catalog;
use carebox_order::config::Config;
use carebox_order::domain::wizard::{WizardError, WizardSession};
use carebox_order::draft::OrderDraft;
use carebox_order::metrics::Metrics;
use carebox_order::submission::{
    display_order_number, ArtifactKind, ArtifactOutcome, SubmissionController, SubmitOutcome,
};

#[derive(Parser)]
#[command(
    name = "carebox-order",
    version,
    about = "Configure and place a monthly care-supply box order"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Backend base URL.
    #[arg(long = "backend-url", env = "CAREBOX_BACKEND_URL", global = true)]
    backend_url: Option<String>,

    /// Directory for downloaded order documents.
    #[arg(long = "output-dir", env = "CAREBOX_OUTPUT_DIR", value_name = "DIR", global = true)]
    output_dir: Option<PathBuf>,

    /// Timeout for each document download, in seconds.
    #[arg(long = "artifact-timeout-secs", env = "CAREBOX_ARTIFACT_TIMEOUT_SECS", global = true)]
    artifact_timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// List the product catalog with prices.
    Catalog,

    /// Run an order draft through the wizard, submit it and fetch its documents.
    Order(OrderArgs),
}

#[derive(Parser)]
struct OrderArgs {
    /// Path to the order draft JSON.
    #[arg(value_name = "DRAFT")]
    draft: PathBuf,

    /// Validate the draft and print the payload without submitting.
    #[arg(long = "dry-run")]
    dry_run: bool,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(url) = &self.backend_url {
            config = config.with_backend_url(url.clone());
        }
        if let Some(dir) = &self.output_dir {
            config = config.with_output_dir(dir.clone());
        }
        if let Some(secs) = self.artifact_timeout_secs {
            config = config.with_artifact_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,carebox_order=debug"))
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config();
    config.validate()?;

    let metrics = Arc::new(Metrics::new()?);
    let backend = Arc::new(HttpBackend::new(&config.backend_url, config.artifact_timeout)?);

    // No partial catalog: the configurator does not start without one
    let catalog = Arc::new(load_catalog(backend.as_ref()).await?);

    match cli.command {
        Command::Catalog => print_catalog(&catalog),
        Command::Order(args) => run_order(&config, args, catalog, backend, metrics.clone()).await?,
    }

    tracing::info!("Metrics registry holds {} metric families", metrics.registry().gather().len());
    Ok(())
}

fn print_catalog(catalog: &Catalog) {
    for item in catalog.items() {
        let size_note = if item.is_gloves() { " (size S-XL)" } else { "" };
        println!("{:<16} {:>8} EUR  {} - {}{}", item.id, item.price, item.name, item.meta, size_note);
    }
}

async fn run_order(
    config: &Config,
    args: OrderArgs,
    catalog: Arc<Catalog>,
    backend: Arc<HttpBackend>,
    metrics: Arc<Metrics>,
) -> anyhow::Result<()> {
    let draft = OrderDraft::load(&args.draft).await?;

    let mut session = WizardSession::new(catalog)
        .with_budget_limit(config.budget_limit)
        .with_metrics(metrics.clone());

    if let Err(err) = draft.drive(&mut session) {
        print_refusal(&err);
        anyhow::bail!("Draft {} cannot be ordered", args.draft.display());
    }

    print_summary(&session);

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&session.order_payload())?);
        return Ok(());
    }

    let controller = SubmissionController::new(backend).with_metrics(metrics);
    let order_id = match session.submit(&controller).await? {
        SubmitOutcome::Created { order_id } => order_id,
        SubmitOutcome::Failed { message } => anyhow::bail!("Order submission failed: {}", message),
        SubmitOutcome::InFlight => anyhow::bail!("An order submission is already in flight"),
        SubmitOutcome::AlreadySubmitted { order_id } => {
            anyhow::bail!("Order {} was already submitted", display_order_number(&order_id))
        }
        SubmitOutcome::Discarded { .. } => anyhow::bail!("Order submission was cancelled by a reset"),
    };
    println!("Order number: {}", display_order_number(&order_id));

    let last_name = session.state().customer.last_name.trim().to_string();
    save_artifacts(&controller, &config.output_dir, &last_name).await
}

fn print_refusal(err: &WizardError) {
    match err.gate_report() {
        Some(report) => {
            eprintln!("Step '{}' is incomplete:", report.step);
            for violation in &report.violations {
                eprintln!("  {:<20} {}", violation.field(), violation);
            }
        }
        None => eprintln!("{}", err),
    }
}

fn print_summary(session: &WizardSession) {
    for line in session.projection() {
        let size = line.size.map(|s| format!(" [{}]", s.as_str())).unwrap_or_default();
        println!(
            "{:>3} x {:<40} {:>8} EUR{}",
            line.quantity, line.name, line.line_total, size
        );
    }

    let status = session.budget_status();
    println!("Total {} of {} EUR ({} remaining)", status.total, status.limit, status.remaining);

    let extra = session.state().extra_allowance;
    if extra > 0 {
        println!("Plus {} washable bed pad(s) at no cost", extra);
    }
}

async fn save_artifacts(
    controller: &SubmissionController<HttpBackend>,
    output_dir: &Path,
    last_name: &str,
) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output directory {}", output_dir.display()))?;

    for (kind, outcome) in controller.fetch_artifacts(&ArtifactKind::ALL, last_name).await {
        match outcome {
            ArtifactOutcome::Downloaded { file_name, bytes, .. } => {
                let path = output_dir.join(&file_name);
                tokio::fs::write(&path, &bytes)
                    .await
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!("{:<20} saved {}", kind.to_string(), path.display());
            }
            ArtifactOutcome::Fallback { url } => {
                println!("{:<20} download failed, open {}", kind.to_string(), url);
            }
            ArtifactOutcome::Busy | ArtifactOutcome::NoOrder => {
                tracing::warn!(kind = %kind, "Artifact not fetched");
            }
        }
    }

    Ok(())
}
