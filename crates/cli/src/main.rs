use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::error;

use convo_cfn::{route, LifecycleRequest, ResponseStatus};
use convo_client::RestClient;
use convo_core::bot::{Bot, BotProps};
use convo_core::intent::{Intent, IntentProps};
use convo_core::slot_type::{SlotType, SlotTypeProps};
use convo_core::{Declaration, Kind, Outcome, LATEST_VERSION};
use convo_reconcile::{Reconciler, Store};

#[derive(Parser, Debug)]
#[command(name = "convoctl", version, about = "Convo CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output {
    Human,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum KindArg {
    Bot,
    Intent,
    SlotType,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Upsert a declaration read from a YAML or JSON file
    Apply {
        kind: KindArg,
        file: PathBuf,
    },
    /// Run the full update protocol against a previous declaration
    Sync {
        kind: KindArg,
        file: PathBuf,
        /// Declaration the resource was last deployed with
        #[arg(long = "previous")]
        previous: PathBuf,
        /// Physical id tracked by the orchestrator (default: previous name)
        #[arg(long = "physical-id")]
        physical_id: Option<String>,
    },
    /// Report the live checksum/version for a resource
    Status {
        kind: KindArg,
        name: String,
    },
    /// Remove a resource (best-effort)
    Delete {
        kind: KindArg,
        name: String,
    },
    /// Process a lifecycle request envelope and print the response
    Handle {
        file: PathBuf,
    },
}

fn init_tracing() {
    let env = std::env::var("CONVO_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("CONVO_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => tracing::info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => tracing::warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            tracing::warn!(addr = %addr, "invalid CONVO_METRICS_ADDR; expected host:port");
        }
    }
}

fn read_decl<P: serde::de::DeserializeOwned>(path: &Path) -> Result<P> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_yaml::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_outcome(out: &Outcome, output: Output) -> Result<()> {
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(out)?),
        Output::Human => match &out.attributes {
            Some(attrs) => {
                println!("{} • checksum={} • version={}", out.physical_id, attrs.checksum, attrs.version)
            }
            None => println!("{}", out.physical_id),
        },
    }
    Ok(())
}

async fn apply_cmd<K: Kind>(client: Arc<RestClient>, file: &Path, output: Output) -> Result<()> {
    let props: K::Props = read_decl(file)?;
    let out = Reconciler::<K, _>::new(client).create(&props).await?;
    print_outcome(&out, output)
}

async fn sync_cmd<K: Kind>(
    client: Arc<RestClient>,
    file: &Path,
    previous: &Path,
    physical_id: Option<String>,
    output: Output,
) -> Result<()> {
    let desired: K::Props = read_decl(file)?;
    let previous: K::Props = read_decl(previous)?;
    let physical_id = physical_id.unwrap_or_else(|| previous.name().to_string());
    let out = Reconciler::<K, _>::new(client).update(&physical_id, &desired, &previous).await?;
    print_outcome(&out, output)
}

async fn status_cmd<K: Kind>(client: Arc<RestClient>, name: &str, output: Output) -> Result<()> {
    let attrs = <RestClient as Store<K>>::get(&client, name, LATEST_VERSION).await?;
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&attrs)?),
        Output::Human => println!("{} • checksum={} • version={}", name, attrs.checksum, attrs.version),
    }
    Ok(())
}

async fn delete_cmd<K: Kind>(client: Arc<RestClient>, props: K::Props, output: Output) -> Result<()> {
    let physical_id = props.name().to_string();
    let out = Reconciler::<K, _>::new(client).delete(&physical_id, &props).await?;
    print_outcome(&out, output)
}

async fn handle_cmd(client: Arc<RestClient>, file: &Path, output: Output) -> Result<()> {
    let text = std::fs::read_to_string(file).with_context(|| format!("reading {}", file.display()))?;
    let req: LifecycleRequest =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", file.display()))?;
    let resp = route(req, client).await;
    match output {
        Output::Json => println!("{}", serde_json::to_string_pretty(&resp)?),
        Output::Human => {
            let status = match resp.status {
                ResponseStatus::Success => "SUCCESS",
                ResponseStatus::Failed => "FAILED",
            };
            println!("{} • {}", status, resp.physical_resource_id);
            if let Some(reason) = &resp.reason {
                println!("  reason: {}", reason);
            }
            if let Some(data) = &resp.data {
                println!("  checksum={} version={}", data.checksum, data.version);
            }
        }
    }
    Ok(())
}

async fn run(cli: Cli, client: Arc<RestClient>) -> Result<()> {
    let output = cli.output;
    match cli.command {
        Commands::Apply { kind, file } => match kind {
            KindArg::Bot => apply_cmd::<Bot>(client, &file, output).await,
            KindArg::Intent => apply_cmd::<Intent>(client, &file, output).await,
            KindArg::SlotType => apply_cmd::<SlotType>(client, &file, output).await,
        },
        Commands::Sync { kind, file, previous, physical_id } => match kind {
            KindArg::Bot => sync_cmd::<Bot>(client, &file, &previous, physical_id, output).await,
            KindArg::Intent => sync_cmd::<Intent>(client, &file, &previous, physical_id, output).await,
            KindArg::SlotType => {
                sync_cmd::<SlotType>(client, &file, &previous, physical_id, output).await
            }
        },
        Commands::Status { kind, name } => match kind {
            KindArg::Bot => status_cmd::<Bot>(client, &name, output).await,
            KindArg::Intent => status_cmd::<Intent>(client, &name, output).await,
            KindArg::SlotType => status_cmd::<SlotType>(client, &name, output).await,
        },
        Commands::Delete { kind, name } => match kind {
            KindArg::Bot => delete_cmd::<Bot>(client, BotProps::named(name), output).await,
            KindArg::Intent => delete_cmd::<Intent>(client, IntentProps::named(name), output).await,
            KindArg::SlotType => {
                delete_cmd::<SlotType>(client, SlotTypeProps::named(name), output).await
            }
        },
        Commands::Handle { file } => handle_cmd(client, &file, output).await,
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();

    let client = match RestClient::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!(error = %e, "client setup failed");
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, client).await {
        error!(error = ?e, "command failed");
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
