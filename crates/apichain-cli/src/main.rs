//! apichain CLI - run OpenAPI endpoints in dependency order, learning ids as you go

mod storage;

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use apichain_core::report::outcome_line;
use apichain_core::{
    BatchReport, Config, Endpoint, EndpointOutcome, ResultLog, RunContext, RunObserver,
    SharedContext, Summary, TestData, select_suites, suite_names,
};
use apichain_runner::{HttpExecutor, load_catalog};

use storage::Store;

#[derive(Parser)]
#[command(name = "apichain")]
#[command(about = "Run OpenAPI endpoints in dependency order, learning ids as you go")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: .apichain.toml)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output format
    #[arg(long, global = true, default_value = "terminal")]
    output: OutputFormat,

    /// Strict mode: "not found" warnings fail the run too
    #[arg(long, global = true)]
    strict: bool,

    /// Verbose logging (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a batch: producers first, consumers last, ids learned along the way
    Run {
        /// Only endpoints tagged with this suite (repeatable)
        #[arg(short, long)]
        suite: Vec<String>,

        /// Run each selected suite as its own batch, concurrently
        #[arg(long, requires = "suite")]
        concurrent: bool,

        /// Ignore the stored context and start from config variables only
        #[arg(long)]
        fresh: bool,
    },

    /// Run one endpoint against the stored context
    Call {
        /// HTTP method, e.g. GET
        method: String,

        /// Path template as written in the OpenAPI document, e.g. /drivers/{driver_id}
        path: String,

        /// Inline test data for this call: {"parameters": {...}, "body": {...}}
        #[arg(long)]
        data: Option<String>,
    },

    /// List suites (tags) and their endpoints
    Suites,

    /// Inspect or clear the learned context
    Context {
        #[command(subcommand)]
        action: ContextAction,
    },

    /// Initialize config file
    Init,

    /// Export JSON Schema for the report format
    Schema,
}

#[derive(Subcommand)]
enum ContextAction {
    /// Print learned identifiers
    Show,
    /// Forget all learned identifiers
    Reset,
}

#[derive(Clone, Copy, ValueEnum, PartialEq, Eq)]
enum OutputFormat {
    Terminal,
    Json,
    Silent,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => ExitCode::from(u8::try_from(code).unwrap_or(1)),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(3)
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Prints each endpoint to stderr as the batch reaches it.
struct Progress {
    done: usize,
    total: usize,
    quiet: bool,
}

impl RunObserver for Progress {
    fn endpoint_started(&mut self, endpoint: &Endpoint, resolved_path: &str) {
        if self.quiet {
            return;
        }
        eprintln!(
            "[{}/{}] {} {resolved_path}",
            self.done + 1,
            self.total,
            endpoint.method
        );
    }

    fn endpoint_finished(&mut self, _outcome: &EndpointOutcome) {
        self.done += 1;
    }
}

fn load_config(path: Option<&str>) -> Result<Config> {
    Ok(match path {
        Some(p) => Config::load(Path::new(p))?,
        None => Config::load_default()?,
    })
}

fn load_test_data(cfg: &Config) -> Result<TestData> {
    match &cfg.test_data {
        Some(path) => Ok(TestData::load(path)?),
        None => Ok(TestData::default()),
    }
}

/// Combine reports into one exit code: failures first, then tool errors.
fn combined_exit_code(reports: &[BatchReport], strict: bool) -> i32 {
    let codes: Vec<i32> = reports.iter().map(|r| r.exit_code(strict)).collect();
    if codes.contains(&1) {
        1
    } else if codes.contains(&3) {
        3
    } else {
        0
    }
}

/// Fold a run's results into the log, one live entry per endpoint.
///
/// Every selected endpoint loses its stale entry even if this run produced
/// no result for it. An endpoint that ran in several batches keeps the
/// result of the last one.
fn record_reports(log: &mut ResultLog, selected: &[Endpoint], reports: &[BatchReport]) {
    log.supersede(selected);
    for result in reports
        .iter()
        .flat_map(|r| &r.outcomes)
        .filter_map(EndpointOutcome::result)
    {
        log.replace(result.clone());
    }
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Commands::Run {
            suite,
            concurrent,
            fresh,
        } => {
            let cfg = load_config(cli.config.as_deref())?;
            let catalog = load_catalog(&cfg.spec)?;
            let executor = HttpExecutor::from_config(&cfg, load_test_data(&cfg)?)?;
            let store = Store::new(cfg.state_dir());

            let mut start = cfg.seed_context();
            if !fresh {
                start.merge(&store.load_context()?);
            }

            let selected = if suite.is_empty() {
                catalog.clone()
            } else {
                select_suites(&catalog, &suite)
            };
            if selected.is_empty() {
                bail!("no endpoints match suites: {}", suite.join(", "));
            }

            if cli.output != OutputFormat::Silent {
                eprintln!("Config:");
                eprintln!("  spec:     {}", cfg.spec.display());
                eprintln!("  base_url: {}", cfg.base_url);
                eprintln!("  state:    {}", store.dir().display());
                eprintln!("  known:    {} identifiers", start.len());
                eprintln!();
            }

            let runner = cfg.batch_runner();
            let ambient = SharedContext::new(start);

            let reports: Vec<BatchReport> = if concurrent && suite.len() > 1 {
                let batches: Vec<Vec<Endpoint>> = suite
                    .iter()
                    .map(|s| select_suites(&catalog, std::slice::from_ref(s)))
                    .collect();
                runner
                    .run_concurrently(&batches, &ambient, &executor)
                    .into_iter()
                    .zip(&suite)
                    .map(|(outcome, name)| BatchReport::new(Some(name.clone()), outcome))
                    .collect()
            } else {
                let mut progress = Progress {
                    done: 0,
                    total: selected.len(),
                    quiet: cli.output != OutputFormat::Terminal,
                };
                let outcome = runner.run(&selected, &ambient.snapshot(), &executor, &mut progress);
                ambient.commit(&outcome.context);
                let name = (suite.len() == 1).then(|| suite[0].clone());
                vec![BatchReport::new(name, outcome)]
            };

            let mut log = store.load_results()?;
            record_reports(&mut log, &selected, &reports);

            let context = ambient.into_inner();
            store.save_context(&context)?;
            store.save_results(&log)?;
            if let Err(e) = store.save_last_run(&reports) {
                tracing::warn!(error = %e, "failed to save run report");
            }

            match cli.output {
                OutputFormat::Terminal => {
                    for report in &reports {
                        println!("\n{}", report.to_terminal());
                    }
                    println!("\nContext: {} identifiers known", context.len());
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&reports)?);
                }
                OutputFormat::Silent => {}
            }

            Ok(combined_exit_code(&reports, cli.strict))
        }

        Commands::Call { method, path, data } => {
            let cfg = load_config(cli.config.as_deref())?;
            let catalog = load_catalog(&cfg.spec)?;
            let endpoint = catalog
                .iter()
                .find(|ep| ep.matches(&path, &method))
                .cloned()
                .with_context(|| format!("{} {path} is not in {}", method.to_uppercase(), cfg.spec.display()))?;

            // Malformed inline data fails this call only.
            let test_data = match data {
                Some(raw) => {
                    let entry: serde_json::Value =
                        serde_json::from_str(&raw).context("invalid --data JSON")?;
                    let mut wrapped = serde_json::Map::new();
                    wrapped.insert(endpoint.operation_key(), entry);
                    TestData::parse(&serde_json::Value::Object(wrapped).to_string())?
                }
                None => load_test_data(&cfg)?,
            };
            let executor = HttpExecutor::from_config(&cfg, test_data)?;
            let store = Store::new(cfg.state_dir());

            let mut start = cfg.seed_context();
            start.merge(&store.load_context()?);
            let ambient = SharedContext::new(start);

            let outcome = cfg.batch_runner().run_single(&endpoint, &ambient, &executor);

            let mut log = store.load_results()?;
            log.supersede(std::slice::from_ref(&endpoint));
            if let Some(result) = outcome.result() {
                log.replace(result.clone());
            }
            store.save_context(&ambient.into_inner())?;
            store.save_results(&log)?;

            match cli.output {
                OutputFormat::Terminal => {
                    println!("{}", outcome_line(&outcome));
                    if let Some(body) = outcome.result().and_then(|r| r.response.as_ref()) {
                        println!("{}", serde_json::to_string_pretty(body)?);
                    }
                }
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&outcome)?);
                }
                OutputFormat::Silent => {}
            }

            let summary = Summary::of(std::iter::once(&outcome));
            Ok(if summary.failures > 0 || (cli.strict && summary.warnings > 0) {
                1
            } else if summary.transport_errors > 0 {
                3
            } else {
                0
            })
        }

        Commands::Suites => {
            let cfg = load_config(cli.config.as_deref())?;
            let catalog = load_catalog(&cfg.spec)?;
            let store = Store::new(cfg.state_dir());
            let log = store.load_results()?;

            match cli.output {
                OutputFormat::Json => {
                    let suites: Vec<serde_json::Value> = suite_names(&catalog)
                        .into_iter()
                        .map(|name| {
                            let endpoints: Vec<String> = catalog
                                .iter()
                                .filter(|ep| ep.in_suite(&name))
                                .map(Endpoint::label)
                                .collect();
                            serde_json::json!({"suite": name, "endpoints": endpoints})
                        })
                        .collect();
                    println!("{}", serde_json::to_string_pretty(&suites)?);
                }
                OutputFormat::Terminal => {
                    for name in suite_names(&catalog) {
                        let members: Vec<&Endpoint> =
                            catalog.iter().filter(|ep| ep.in_suite(&name)).collect();
                        let summary = Summary::of_results(
                            members
                                .iter()
                                .filter_map(|ep| log.current(&ep.path, &ep.method)),
                        );
                        println!(
                            "{name} ({} endpoints, {} run: {} passed, {} warnings, {} failures)",
                            members.len(),
                            summary.total,
                            summary.passed,
                            summary.warnings,
                            summary.failures
                        );
                        for ep in members {
                            match &ep.summary {
                                Some(s) => println!("  {:<7} {}  {s}", ep.method, ep.path),
                                None => println!("  {:<7} {}", ep.method, ep.path),
                            }
                        }
                    }
                }
                OutputFormat::Silent => {}
            }
            Ok(0)
        }

        Commands::Context { action } => {
            let cfg = load_config(cli.config.as_deref())?;
            let store = Store::new(cfg.state_dir());
            match action {
                ContextAction::Show => {
                    let ctx: RunContext = store.load_context()?;
                    match cli.output {
                        OutputFormat::Terminal => {
                            if ctx.is_empty() {
                                println!("(no identifiers learned yet)");
                            }
                            for (k, v) in ctx.iter() {
                                println!("{k} = {v}");
                            }
                        }
                        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ctx)?),
                        OutputFormat::Silent => {}
                    }
                }
                ContextAction::Reset => {
                    store.reset_context()?;
                    if cli.output != OutputFormat::Silent {
                        println!("Context cleared ({})", store.dir().display());
                    }
                }
            }
            Ok(0)
        }

        Commands::Init => {
            let config_path = ".apichain.toml";
            if Path::new(config_path).exists() {
                eprintln!("{config_path} already exists");
                return Ok(1);
            }

            std::fs::write(config_path, Config::example())?;
            println!("Created {config_path}");
            println!("\nEdit the file to configure:");
            println!("  - spec: path to your OpenAPI spec");
            println!("  - base_url: server to test");
            println!("  - headers: auth tokens, API keys");
            println!("  - variables: identifiers known up front");
            Ok(0)
        }

        Commands::Schema => {
            println!("{}", apichain_core::schema::generate_schema());
            Ok(0)
        }
    }
}
