use std::path::PathBuf;

use crate::cli::Cli;
use recon::config::{ListSource, ProbeSettings, ReconConfig};
use recon::pipeline::{Collaborators, Recon, RunOutcome};

fn init_logging(cli: &Cli) {
    // Our crate at the requested level; resolver and HTTP stacks stay quiet
    // unless --debug asks for everything.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "trace" } else if cli.verbose { "debug" } else { "info" };
    let deps_level = if cli.debug { "debug" } else { "warn" };
    let filter_str = format!(
        "recon={crate},hickory_resolver={deps},hickory_proto={deps},reqwest={deps},hyper={deps}",
        crate = crate_level,
        deps = deps_level,
    );
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&filter_str))
        .unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .init();
}

fn build_config(cli: &Cli) -> anyhow::Result<ReconConfig> {
    let timestamp = recon::utils::run_timestamp();
    let mut config = ReconConfig::new(cli.name.trim().to_lowercase(), timestamp);
    if let Some(path) = &cli.config {
        config.probes = ProbeSettings::load(path)?;
    }
    if cli.icann {
        config.tlds = ListSource::File(cli.tld_list.clone());
    }
    if cli.seclist {
        config.subdomains = ListSource::File(cli.wordlist.clone());
    }
    config.workers = cli.threads.max(1);
    config.http_concurrency = cli.http_concurrency.max(1);
    config.screenshot_dir = cli.screenshot_dir.clone();
    if let Some(output) = &cli.output {
        config.output = output.clone();
    }
    config.jsonl = cli.jsonl.clone();
    Ok(config)
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        tracing::warn!("Could not listen for Ctrl-C; the run can only end on its own");
        std::future::pending::<()>().await;
    }
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(&cli);

    if cli.name.trim().is_empty() {
        anyhow::bail!("target name must not be empty");
    }

    let config = build_config(&cli)?;
    if cli.skip_deps_check {
        tracing::warn!("Skipping dependency check; missing tools will yield empty results");
    } else {
        recon::external::tools::check_dependencies(&config.probes)?;
    }

    let tools = Collaborators::system(&config.probes, config.http_concurrency)?;
    let output: PathBuf = config.output.clone();
    let jsonl = config.jsonl.clone();
    let recon = Recon::new(config, tools)?;

    println!("[>] Target: {}", cli.name);
    println!("[~] TLDs: {} | Workers: {}", recon.tlds().len(), cli.threads.max(1));
    println!("\n{}\n", "-".repeat(60));

    let result = recon.run_until(shutdown_signal()).await;

    if result.outcome == RunOutcome::Interrupted {
        tracing::error!("Process interrupted by user");
    }

    // Completed domains are kept even when interrupted.
    result.report.save_csv(&output)?;
    if let Some(path) = jsonl {
        result.report.save_jsonl(&path)?;
    }

    tracing::info!(
        checked = result.domains_checked,
        found = result.domains_found,
        rows = result.report.len(),
        "Recon finished in {:.2} seconds",
        result.elapsed.as_secs_f64()
    );

    match result.outcome {
        RunOutcome::Completed => Ok(()),
        RunOutcome::Interrupted => anyhow::bail!(
            "interrupted after {:.2} seconds; partial results saved to {}",
            result.elapsed.as_secs_f64(),
            output.display()
        ),
    }
}
