//! Wikiprobe CLI: run the Wikipedia end-to-end suites
//!
//! ## Usage
//!
//! ```bash
//! wikiprobe list                          # Suites and cases in run order
//! wikiprobe run                           # Run every suite headless
//! wikiprobe run -s search --headed        # Watch one suite run
//! wikiprobe run -f login --format json    # Machine-readable report
//! wikiprobe config                        # Effective configuration
//! ```

use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use wikiprobe::{DriverFactory, RunObserver};
use wikiprobe_cli::{
    resolve_suites, Cli, CliConfig, CliError, CliResult, Commands, ListArgs, OutputFormat,
    ProgressReporter, RunArgs, RunPlan, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let verbosity = Verbosity::from_flags(cli.verbose, cli.quiet);
    init_tracing(verbosity);

    let config = CliConfig::new()
        .with_verbosity(verbosity)
        .with_color(cli.color.into())
        .with_config_file(cli.config.clone());

    match cli.command {
        Commands::List(args) => {
            run_list(&args);
            Ok(())
        }
        Commands::Run(args) => run_suites(&config, &args),
        Commands::Config => run_config(&config),
    }
}

/// Log to stderr; `RUST_LOG` wins over `-v/-q`
fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.log_directive()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run_list(args: &ListArgs) {
    for kind in resolve_suites(&args.suites) {
        println!("{kind}");
        for name in kind.case_names() {
            println!("  {name}");
        }
    }
}

fn run_config(config: &CliConfig) -> CliResult<()> {
    let probe = config.probe_config()?;
    print!("{}", probe.to_yaml()?);
    Ok(())
}

fn run_suites(config: &CliConfig, args: &RunArgs) -> CliResult<()> {
    let plan = RunPlan::new(config.probe_config()?, args);
    tracing::info!(
        suites = ?plan.suites.iter().map(|k| k.name()).collect::<Vec<_>>(),
        headless = plan.config.browser.headless,
        "starting run"
    );

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(run_plan(config, &plan, args))
}

#[cfg(feature = "browser")]
async fn run_plan(config: &CliConfig, plan: &RunPlan, args: &RunArgs) -> CliResult<()> {
    let launcher = wikiprobe::ChromiumLauncher::new(Arc::clone(&plan.config));
    execute_and_report(config, plan, args, &launcher).await
}

#[cfg(not(feature = "browser"))]
async fn run_plan(_config: &CliConfig, _plan: &RunPlan, _args: &RunArgs) -> CliResult<()> {
    Err(wikiprobe::ProbeError::BrowserUnavailable.into())
}

#[cfg_attr(not(feature = "browser"), allow(dead_code))]
async fn execute_and_report<F>(
    config: &CliConfig,
    plan: &RunPlan,
    args: &RunArgs,
    factory: &F,
) -> CliResult<()>
where
    F: DriverFactory,
    F::Driver: 'static,
{
    let format = OutputFormat::from(args.format);
    let reporter = Arc::new(ProgressReporter::new(
        config.color.should_color(),
        config.verbosity.is_quiet(),
    ));
    reporter.header("Wikiprobe");
    reporter.start_progress(plan.case_count() as u64, "launching browser");

    let observer: Arc<dyn RunObserver> = reporter.clone();
    let summary = plan.execute(factory, observer).await;
    reporter.finish();

    // Report on stdout (or a file), progress and summary on stderr
    let rendered = summary.render(format)?;
    match &args.output {
        Some(path) => std::fs::write(path, &rendered)?,
        None => print!("{rendered}"),
    }
    reporter.summary(&summary);

    if summary.is_success() {
        Ok(())
    } else {
        Err(CliError::CasesFailed {
            failed: summary.failed,
            total: summary.total(),
        })
    }
}
