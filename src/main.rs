//! voxelpipe - Command-line pipeline runner
//!
//! ```text
//! voxelpipe run <pipeline.json>        preflight, then execute
//! voxelpipe preflight <pipeline.json>  validate only
//! voxelpipe filters                    list registered filters
//! ```

use anyhow::{bail, Context};
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};
use voxelpipe::{
    config::{LoggingSettings, VoxelPipeConfig},
    pipeline::{self, FilterPipeline, FilterRegistry, MessageKind, PipelineFile},
};

const USAGE: &str = "usage: voxelpipe <run|preflight> <pipeline.json> | voxelpipe filters";

fn main() -> anyhow::Result<()> {
    let (config, config_error) = VoxelPipeConfig::load_or_default_reporting();
    let _guard = init_logging(&config.logging);
    if let Some(e) = config_error {
        tracing::warn!("Failed to load config, using defaults: {}", e);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let registry = FilterRegistry::with_builtin();

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["filters"] => {
            list_filters(&registry);
            Ok(())
        }
        ["run", path] => run(&registry, &config, Path::new(path), true),
        ["preflight", path] => run(&registry, &config, Path::new(path), false),
        _ => bail!(USAGE),
    }
}

/// Console output plus an optional daily rolling file. The returned guard
/// flushes the file writer on drop.
fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let env_filter = || {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&settings.filter))
    };
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_filter(env_filter());

    match &settings.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "voxelpipe.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(env_filter());
            tracing_subscriber::registry().with(console).with(file).init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            None
        }
    }
}

fn list_filters(registry: &FilterRegistry) {
    let mut descriptors: Vec<_> = registry.descriptors().collect();
    descriptors.sort_by_key(|d| (d.group, d.name));
    for d in descriptors {
        println!("{:<12} {:<32} {}", d.group, d.name, d.human_label);
    }
}

fn run(
    registry: &FilterRegistry,
    config: &VoxelPipeConfig,
    path: &Path,
    execute: bool,
) -> anyhow::Result<()> {
    let file = PipelineFile::load(path)
        .with_context(|| format!("Failed to load pipeline {}", path.display()))?;
    let mut pipeline = file
        .build(registry)
        .with_context(|| format!("Failed to build pipeline {}", path.display()))?;
    pipeline.set_stop_on_error(config.pipeline.stop_on_error);
    pipeline.set_parallel_settings(&config.parallel);

    let (tx, rx) = pipeline::message::channel();
    pipeline.set_observer(Some(tx));

    let result = if execute {
        pipeline.run()
    } else {
        pipeline.preflight_pipeline()
    };

    // Errors and warnings already went through tracing.
    for msg in pipeline::message::drain(&rx) {
        if msg.kind == MessageKind::Status {
            println!("{}", msg);
        }
    }
    print_summary(&pipeline);

    let dca = result.with_context(|| format!("Pipeline '{}' failed", pipeline.name()))?;
    for container in dca.data_containers() {
        println!("{}", container.name());
        for matrix in container.attribute_matrices() {
            println!(
                "  {} [{}] {:?}",
                matrix.name(),
                matrix.matrix_type(),
                matrix.tuple_dims()
            );
            for array in matrix.attribute_arrays() {
                let info = array.info();
                println!(
                    "    {} {} {:?}",
                    info.name, info.element_type, info.component_dims
                );
            }
        }
    }
    Ok(())
}

fn print_summary(pipeline: &FilterPipeline) {
    for (index, filter) in pipeline.filters().enumerate() {
        println!(
            "[{:>2}] {:<40} {:?}",
            index,
            filter.human_label(),
            filter.status().state()
        );
    }
}
