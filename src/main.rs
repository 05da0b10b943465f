mod config;
mod render;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use pipewright_catalog::FsScriptCatalog;
use pipewright_client::HttpBackend;
use pipewright_compiler::{Compiler, catalog_path};
use pipewright_config::{Pipeline, PipelineId};
use pipewright_editor::EditorSession;
use pipewright_graph::GraphStore;
use pipewright_livelog::{DryRunExecutor, LogConsumer, LogEvent, LogView};
use pipewright_resolver::{CachingResolver, ScriptSource};

use crate::config::Settings;
use crate::render::{StderrNotifier, TerminalRenderer};

/// Pipewright - compile host/script pipeline graphs into workflows
#[derive(Parser)]
#[command(name = "pipewright")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.pipewright)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Compile a saved pipeline into a workflow document
  Compile {
    /// Path to the pipeline file (editor JSON)
    pipeline_file: PathBuf,

    /// Script catalog directory
    #[arg(long)]
    catalog: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = Format::Yaml)]
    format: Format,

    /// Also write the document into the catalog's pipelines directory
    #[arg(long)]
    publish: bool,
  },

  /// Dry-run a pipeline and show the live log
  Simulate {
    /// Path to the pipeline file (editor JSON)
    pipeline_file: PathBuf,

    /// Script catalog directory
    #[arg(long)]
    catalog: Option<PathBuf>,

    /// Show output bodies instead of collapsing them
    #[arg(long)]
    expand: bool,
  },

  /// Show a live log from JSON-lines events on stdin
  Watch {
    /// Show output bodies instead of collapsing them
    #[arg(long)]
    expand: bool,
  },

  /// Submit a saved pipeline for execution on the server
  Run {
    /// Server-assigned pipeline id
    pipeline_id: PipelineId,

    #[arg(long)]
    dry_run: bool,

    /// Server base URL
    #[arg(long)]
    server: Option<String>,
  },

  /// List the scripts of the catalog
  Catalog {
    /// Script catalog directory
    #[arg(long)]
    catalog: Option<PathBuf>,
  },
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
  Yaml,
  Json,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("pipewright=info,warn")),
    )
    .with_writer(std::io::stderr)
    .with_target(false)
    .init();

  let cli = Cli::parse();

  let data_dir = match cli.data_dir {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".pipewright"),
  };
  let settings = Settings::load(&data_dir)?;

  let Some(command) = cli.command else {
    println!("pipewright - use --help to see available commands");
    return Ok(());
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async move {
    match command {
      Commands::Compile {
        pipeline_file,
        catalog,
        format,
        publish,
      } => {
        let catalog = catalog.unwrap_or_else(|| settings.catalog_dir(&data_dir));
        compile(pipeline_file, catalog, format, publish).await
      }
      Commands::Simulate {
        pipeline_file,
        catalog,
        expand,
      } => {
        let catalog = catalog.unwrap_or_else(|| settings.catalog_dir(&data_dir));
        simulate(pipeline_file, catalog, expand, settings.channel_capacity).await
      }
      Commands::Watch { expand } => watch(expand, settings.channel_capacity).await,
      Commands::Run {
        pipeline_id,
        dry_run,
        server,
      } => {
        let server = server.unwrap_or(settings.server_url);
        run(pipeline_id, dry_run, server).await
      }
      Commands::Catalog { catalog } => {
        let catalog = catalog.unwrap_or_else(|| settings.catalog_dir(&data_dir));
        list_catalog(catalog).await
      }
    }
  })
}

async fn load_store(pipeline_file: &Path) -> Result<GraphStore> {
  let content = tokio::fs::read_to_string(pipeline_file)
    .await
    .with_context(|| format!("failed to read pipeline file: {}", pipeline_file.display()))?;

  let pipeline = Pipeline::from_json(&content)
    .with_context(|| format!("failed to parse pipeline file: {}", pipeline_file.display()))?;

  GraphStore::from_pipeline(pipeline)
    .with_context(|| format!("invalid pipeline: {}", pipeline_file.display()))
}

async fn catalog_resolver(catalog: PathBuf) -> Result<Arc<CachingResolver<FsScriptCatalog>>> {
  let resolver = Arc::new(CachingResolver::new(FsScriptCatalog::new(catalog)));
  resolver
    .initialize()
    .await
    .context("failed to load local script library")?;
  Ok(resolver)
}

async fn compile(
  pipeline_file: PathBuf,
  catalog: PathBuf,
  format: Format,
  publish: bool,
) -> Result<()> {
  let store = load_store(&pipeline_file).await?;
  eprintln!("Loaded pipeline: {} ({} nodes)", store.name(), store.len());

  let resolver = catalog_resolver(catalog).await?;
  let workflow = Compiler::new(resolver.clone()).compile(&store).await;

  for diagnostic in &workflow.diagnostics {
    warn!(job_key = %diagnostic.job_key(), "{}", diagnostic);
  }

  let document = workflow.document();
  let yaml = document.to_yaml().context("failed to render workflow YAML")?;

  match format {
    Format::Yaml => print!("{}", yaml),
    Format::Json => println!(
      "{}",
      document.to_json().context("failed to render workflow JSON")?
    ),
  }

  if publish {
    let target = resolver
      .source()
      .write_remote(&catalog_path(&document.name), &yaml)
      .await
      .context("failed to publish workflow to catalog")?;
    eprintln!("Published to {}", target.display());
  }

  Ok(())
}

async fn simulate(
  pipeline_file: PathBuf,
  catalog: PathBuf,
  expand: bool,
  capacity: usize,
) -> Result<()> {
  let store = load_store(&pipeline_file).await?;
  let resolver = catalog_resolver(catalog).await?;

  let (sender, consumer) = LogConsumer::with_capacity(TerminalRenderer::new(expand), capacity);
  let cancel = close_on_ctrl_c();

  let executor = DryRunExecutor::new(resolver);
  let producer = async move {
    let result = executor.run(&store, &sender).await;
    drop(sender);
    result
  };

  let (produced, view) = tokio::join!(producer, consumer.run(cancel));
  if let Err(e) = produced {
    info!(error = %e, "dry run stopped early");
  }
  summarize(&view);

  Ok(())
}

async fn watch(expand: bool, capacity: usize) -> Result<()> {
  let (sender, consumer) = LogConsumer::with_capacity(TerminalRenderer::new(expand), capacity);
  let cancel = close_on_ctrl_c();

  let reader = tokio::spawn(read_events(sender));
  let view = consumer.run(cancel).await;
  reader.abort();
  summarize(&view);

  Ok(())
}

/// Forward JSON-lines events from stdin until EOF or the view closes.
async fn read_events(sender: mpsc::Sender<LogEvent>) -> Result<()> {
  let mut lines = BufReader::new(tokio::io::stdin()).lines();

  while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
    if line.trim().is_empty() {
      continue;
    }

    match LogEvent::from_json(&line) {
      Ok(event) => {
        if sender.send(event).await.is_err() {
          break;
        }
      }
      Err(e) => warn!(error = %e, "skipping malformed event"),
    }
  }

  Ok(())
}

async fn run(pipeline_id: PipelineId, dry_run: bool, server: String) -> Result<()> {
  let backend = Arc::new(HttpBackend::new(&server).context("invalid server url")?);
  let resolver = Arc::new(CachingResolver::new(backend.clone()));

  let mut session = EditorSession::new(resolver, backend.clone(), backend)
    .with_notifier(Arc::new(StderrNotifier));

  session
    .load(pipeline_id)
    .await
    .with_context(|| format!("failed to load pipeline {}", pipeline_id))?;
  session
    .run(dry_run)
    .await
    .context("failed to start pipeline run")?;

  Ok(())
}

async fn list_catalog(catalog: PathBuf) -> Result<()> {
  let source = FsScriptCatalog::new(&catalog);

  let local = source
    .list_local_scripts()
    .await
    .context("failed to list local scripts")?;
  println!("Local scripts:");
  for script in &local {
    println!("  {:>4}  {:<18} {}", script.id, script.script_type, script.name);
  }

  let remote = source
    .list_remote_scripts()
    .await
    .context("failed to list remote scripts")?;
  println!("Remote catalog:");
  for script in &remote {
    println!("  {:<18} {}", script.script_type, script.path);
  }

  Ok(())
}

fn close_on_ctrl_c() -> CancellationToken {
  let cancel = CancellationToken::new();
  let token = cancel.clone();
  tokio::spawn(async move {
    if tokio::signal::ctrl_c().await.is_ok() {
      token.cancel();
    }
  });
  cancel
}

fn summarize(view: &LogView) {
  eprintln!("{} log entries", view.len());
  if let Some(index) = view.in_flight() {
    eprintln!("step #{} did not report completion", index);
  }
}
