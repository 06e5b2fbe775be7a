//! semmeta - SEM TIFF metadata extraction.
//!
//! Processes a single image: writes the raw and cleaned metadata artifacts,
//! then renders the metadata table and figure.

use std::fmt::Display;
use std::process::ExitCode;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use semmeta::{
    config::Config,
    pipeline::Pipeline,
    render::{FigureRenderer, Renderer},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::parse();

    init_logging(config.verbose);

    if let Err(e) = config.validate() {
        return halt(e);
    }

    if let Err(e) = tokio::fs::create_dir_all(&config.output_dir).await {
        return halt(format_args!(
            "cannot create output directory {}: {}",
            config.output_dir.display(),
            e
        ));
    }

    info!("Processing SEM image {}", config.image.display());

    let pipeline = Pipeline::new(config.pipeline_config());
    let output = match pipeline.run(&config.image).await {
        Ok(output) => output,
        Err(e) => return halt(e),
    };

    info!("  Standard tags found: {}", output.standard_tags_found);
    info!("  Instrument pairs: {}", output.instrument_pairs);
    info!("  Raw metadata: {}", output.raw_path.display());
    info!("  Cleaned metadata: {}", output.cleaned_path.display());

    if config.no_render {
        return ExitCode::SUCCESS;
    }

    let renderer = FigureRenderer::new(&config.output_dir);
    match renderer.render(&output.cleaned_path, &config.image).await {
        Ok(files) => {
            for file in files {
                info!("  Rendered: {}", file.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => halt(e),
    }
}

/// Report a halting error as the single `Error:` line on stderr.
fn halt(error: impl Display) -> ExitCode {
    eprintln!("Error: {}", error);
    ExitCode::FAILURE
}

/// Initialize the tracing/logging subsystem.
fn init_logging(verbose: bool) {
    let env_filter = if verbose { "semmeta=debug" } else { "semmeta=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| env_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
