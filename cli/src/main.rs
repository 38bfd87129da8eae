//! CLI entrypoint for conformity-bench
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, anyhow, bail};
use clap::Parser;
use conformity_application::{
    BackfillUseCase, ComputeMetricsError, ComputeMetricsUseCase, ExperimentRunner,
    InferenceClient, NoProgress, NoTranscriptLogger, ProgressNotifier, ResultStore,
    TranscriptLogger,
};
use conformity_domain::{MitigationMethod, Model, OutputFormat};
use conformity_infrastructure::{
    ConfigLoader, FileConfig, JsonDatasetLoader, JsonResultStore, JsonlTranscriptLogger,
    OpenAiCompatibleGateway,
};
use conformity_presentation::{
    BackfillArgs, Cli, Command, ConfigArgs, ConsoleFormatter, MetricsArgs, ProgressReporter,
    RunArgs,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _guard = init_logging(cli.verbose, cli.log_file.as_deref())?;

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };

    match cli.command {
        Command::Config(args) => show_config(&config, &args),
        Command::Run(args) => run(config, args, cli.quiet).await,
        Command::Metrics(args) => metrics(config, args),
        Command::Backfill(args) => backfill(&config, args),
    }
}

/// Stderr logging from the verbosity count, plus an optional plain-text log file.
///
/// `RUST_LOG` overrides the verbosity-derived level when set.
fn init_logging(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(filter());

    let Some(path) = log_file else {
        tracing_subscriber::registry().with(stderr_layer).init();
        return Ok(None);
    };

    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(dir, file_name));
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_filter(filter());

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(Some(guard))
}

/// Print issues; fail if any is an error
fn check_config(config: &FileConfig) -> Result<()> {
    let issues = config.validate();
    if !issues.is_empty() {
        eprint!("{}", ConsoleFormatter::format_issues(&issues));
    }
    if issues.iter().any(|i| i.is_error()) {
        bail!("Configuration has errors; fix them or run `conformity-bench config`");
    }
    Ok(())
}

fn show_config(config: &FileConfig, args: &ConfigArgs) -> Result<()> {
    ConfigLoader::print_config_sources();
    if args.sources {
        return Ok(());
    }

    println!();
    println!(
        "{}",
        toml::to_string_pretty(config).context("Failed to render configuration")?
    );

    let issues = config.validate();
    if issues.is_empty() {
        println!("No configuration issues.");
    } else {
        print!("{}", ConsoleFormatter::format_issues(&issues));
    }
    Ok(())
}

fn parse_models(names: &[String]) -> Result<Vec<Model>> {
    names
        .iter()
        .map(|name| name.parse::<Model>().map_err(|e| anyhow!(e)))
        .collect()
}

fn parse_method(method: &str) -> Result<MitigationMethod> {
    method.parse().map_err(|e: String| anyhow!(e))
}

fn store_for(config: &FileConfig) -> Arc<dyn ResultStore> {
    Arc::new(JsonResultStore::new(
        config.output.dir.clone(),
        config.output.base_filename.clone(),
    ))
}

/// Command-line flags take precedence over every configuration source
fn apply_run_overrides(config: &mut FileConfig, args: RunArgs) {
    let experiment = &mut config.experiment;
    if !args.model.is_empty() {
        experiment.models = args.model;
    }
    if !args.protocol.is_empty() {
        experiment.protocols = args.protocol;
    }
    if let Some(method) = args.method {
        experiment.method = method;
    }
    if let Some(dataset) = args.dataset {
        experiment.dataset = dataset.to_string_lossy().into_owned();
    }
    if let Some(n) = args.data_length {
        experiment.data_length = n;
    }
    if let Some(n) = args.concurrency {
        experiment.concurrency = n;
    }
    if let Some(n) = args.votes {
        experiment.votes = n;
    }
    if args.seed.is_some() {
        experiment.seed = args.seed;
    }
    if args.transcript.is_some() {
        config.output.transcript = args.transcript;
    }
}

async fn run(mut config: FileConfig, args: RunArgs, quiet: bool) -> Result<()> {
    apply_run_overrides(&mut config, args);
    check_config(&config)?;

    let params = config.to_experiment_params();
    let protocols = config.protocols();
    let models = config.models();
    if protocols.is_empty() || models.is_empty() {
        bail!("Nothing to run: configure at least one model and one protocol");
    }

    let dataset_path = PathBuf::from(&config.experiment.dataset);
    let dataset = JsonDatasetLoader::new(config.experiment.data_length)
        .with_seed(params.seed)
        .load(&dataset_path)?;
    let dataset = Arc::new(dataset);

    // === Dependency Injection ===
    let gateway_config = config.to_gateway_config();
    if gateway_config.api_key.is_none() {
        warn!(
            "No API key found (set provider.api_key or ${}); sending unauthenticated requests",
            config.provider.api_key_env
        );
    }
    let gateway = Arc::new(OpenAiCompatibleGateway::new(gateway_config)?);
    let client = Arc::new(InferenceClient::new(gateway).with_params(config.to_inference_params()));

    let transcript: Arc<dyn TranscriptLogger> = match &config.output.transcript {
        Some(path) => Arc::new(
            JsonlTranscriptLogger::open(path)
                .with_context(|| format!("Failed to open transcript {}", path.display()))?,
        ),
        None => Arc::new(NoTranscriptLogger),
    };
    let store = store_for(&config);

    let runner = ExperimentRunner::new(client)
        .with_panel(config.to_panel())
        .with_params(params.clone())
        .with_transcript(transcript)
        .with_store(store.clone());

    let progress: Box<dyn ProgressNotifier> = if quiet {
        Box::new(NoProgress)
    } else {
        Box::new(ProgressReporter::new())
    };

    info!(
        "Running {} protocols on {} models ({} items, method {})",
        protocols.len(),
        models.len(),
        dataset.len(),
        params.method
    );

    let metrics = ComputeMetricsUseCase::new(store);
    for model in &models {
        let runs = runner
            .run_all(dataset.clone(), &protocols, model, progress.as_ref())
            .await?;
        print!("{}", ConsoleFormatter::format_runs(model, &runs));

        let (summary, path) = metrics.execute_and_save(model, params.method)?;
        print!(
            "{}",
            ConsoleFormatter::format_summary(&summary, config.output_format())
        );
        println!("Summary saved to {}", path.display());
    }

    Ok(())
}

fn metrics(config: FileConfig, args: MetricsArgs) -> Result<()> {
    let method = match &args.method {
        Some(m) => parse_method(m)?,
        None => config.method(),
    };
    let format = args
        .format
        .map(OutputFormat::from)
        .unwrap_or_else(|| config.output_format());

    let store = store_for(&config);
    let models = if args.model.is_empty() {
        store.models()?
    } else {
        parse_models(&args.model)?
    };
    if models.is_empty() {
        bail!("No stored results under {}", config.output.dir.display());
    }

    let use_case = ComputeMetricsUseCase::new(store);
    for model in &models {
        let result = if args.no_save {
            use_case.execute(model, method).map(|s| (s, None))
        } else {
            use_case
                .execute_and_save(model, method)
                .map(|(s, path)| (s, Some(path)))
        };

        match result {
            Ok((summary, path)) => {
                print!("{}", ConsoleFormatter::format_summary(&summary, format));
                if format == OutputFormat::Json {
                    println!();
                }
                if let Some(path) = path {
                    info!("Summary saved to {}", path.display());
                }
            }
            Err(ComputeMetricsError::NoResults(model)) => {
                warn!("No {} results stored for {}", method, model);
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}

fn backfill(config: &FileConfig, args: BackfillArgs) -> Result<()> {
    let methods = match &args.method {
        Some(m) => vec![parse_method(m)?],
        None => vec![
            MitigationMethod::Baseline,
            MitigationMethod::Role,
            MitigationMethod::Reflection,
            MitigationMethod::SelfConsistency,
        ],
    };

    let store = store_for(config);
    let models = if args.model.is_empty() {
        store.models()?
    } else {
        parse_models(&args.model)?
    };

    let use_case = BackfillUseCase::new(store);
    for model in &models {
        for &method in &methods {
            let report = use_case.execute(model, method)?;
            print!("{}", ConsoleFormatter::format_backfill(model, &report));
        }
    }

    Ok(())
}
