use anyhow::Result;
use clap::Parser;
use closure2esm::{cli::Cli, config::Config, orchestrator};
use log::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.log_level())
        .parse_default_env()
        .init();

    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply_to(&mut config);

    let report = orchestrator::convert(config)?;

    if report.is_clean() {
        info!(
            "Converted {} files ({} modules), applied {} patches",
            report.files_written, report.modules_declared, report.patches_applied
        );
    } else {
        warn!(
            "Converted {} files ({} modules) with {} issues",
            report.files_written,
            report.modules_declared,
            report.issues.len()
        );
    }
    Ok(())
}
