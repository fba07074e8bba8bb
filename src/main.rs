// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use serde_yaml::Mapping;
use std::env;
use std::path::Path;
use std::process;
use std::time::Instant;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pipewright::components::SyntheticClassificationTask;
use pipewright::config::{load_config, ComponentConfig, RuntimeContext};
use pipewright::engine::{ComponentFactory, PipelineManager};
use pipewright::errors::LoadError;
use pipewright::statistics::{StatisticsAggregator, StatisticsCollector};
use pipewright::traits::Task;

const DEFAULT_EPISODES: u64 = 3;
const DEFAULT_BATCH_SIZE: usize = 16;

const TASK_SECTION: &str = "task";
const PIPELINE_SECTION: &str = "pipeline";
const BATCH_SIZE_KEY: &str = "batch_size";
const CHECKPOINT_DIRECTORY: &str = "checkpoints";

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <config.yaml|config.toml> [episodes]", args[0]);
        eprintln!("Example: {} configs/demo-pipeline.yaml 5", args[0]);
        process::exit(1);
    }

    let episodes = match args.get(2).map(|raw| raw.parse::<u64>()) {
        None => DEFAULT_EPISODES,
        Some(Ok(episodes)) => episodes,
        Some(Err(_)) => {
            eprintln!("Episodes must be a non-negative integer, got '{}'", args[2]);
            process::exit(1);
        }
    };

    if let Err(err) = run(Path::new(&args[1]), episodes) {
        error!("{:#}", err);
        let code = if err.downcast_ref::<LoadError>().is_some() {
            LoadError::EXIT_CODE
        } else {
            1
        };
        process::exit(code);
    }
}

/// Build the pipeline described by `config_file` and train it on the
/// synthetic task for `episodes` episodes.
///
/// A run file may keep the task next to the pipeline (`task:` and `pipeline:`
/// at the root); otherwise the whole document is the pipeline and the task
/// uses its defaults.
fn run(config_file: &Path, episodes: u64) -> Result<()> {
    let start_time = Instant::now();

    let root = load_config(config_file)
        .with_context(|| format!("failed to load configuration '{}'", config_file.display()))?;
    let pipeline_config = root.nested(PIPELINE_SECTION).unwrap_or_else(|| root.clone());
    let task_config = root
        .section(TASK_SECTION)
        .unwrap_or_else(|| ComponentConfig::new(TASK_SECTION, Mapping::new()));

    let mut manager = PipelineManager::new(pipeline_config, RuntimeContext::new());

    // The task publishes the global sizes the models read while being built.
    let task = SyntheticClassificationTask::new(TASK_SECTION, &task_config, manager.context_mut())?;
    let batch_size = task_config.get_usize(BATCH_SIZE_KEY, DEFAULT_BATCH_SIZE)?.max(1);

    let errors = manager.build(&ComponentFactory::with_builtins());
    println!("{}", manager.summarize_all_components_header());
    print!("{}", manager.summarize_all_components());
    if errors > 0 {
        bail!(
            "found {} configuration error(s) while building pipeline '{}'",
            errors,
            manager.name()
        );
    }

    let mut schema = task.data_definitions();
    let errors = manager.handshake(&mut schema);
    if errors > 0 {
        bail!(
            "found {} schema error(s) during the handshake of pipeline '{}'",
            errors,
            manager.name()
        );
    }

    manager.load_models()?;
    manager.load_from_config()?;
    manager.freeze_models()?;
    manager.to_device();

    println!("{}", manager.summarize_models_header());
    print!("{}", manager.summarize_models());

    let checkpoints = config_file
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join(CHECKPOINT_DIRECTORY);

    let mut collector = StatisticsCollector::new();
    manager.add_statistics(&mut collector);
    let mut aggregator = StatisticsAggregator::new();
    manager.add_aggregators(&mut aggregator);

    let indices: Vec<usize> = (0..task.len()).collect();
    for episode in 0..episodes {
        manager.context_mut().episode = episode;
        manager.train();
        collector.empty();

        for chunk in indices.chunks(batch_size) {
            let mut streams = task.batch(chunk)?;
            manager.forward(&mut streams)?;
            manager.backward(&streams)?;
            manager.collect_statistics(&mut collector, &streams)?;
        }

        manager.eval();
        manager.aggregate_statistics(&collector, &mut aggregator)?;
        println!("Episode {:>4}: {}", episode, aggregator.export());

        let loss = manager.return_loss_on_set(&aggregator).unwrap_or(f64::INFINITY);
        let status = if episode + 1 == episodes { "finished" } else { "training" };
        let improved = manager.save(&checkpoints, status, loss)?;
        info!(
            episode,
            loss,
            improved,
            plateau = manager.validation_loss_down_counter(),
            "Episode completed"
        );
    }

    info!(
        pipeline = manager.name(),
        episodes,
        best_loss = manager.best_loss(),
        elapsed_ms = start_time.elapsed().as_millis() as u64,
        "Run completed"
    );
    Ok(())
}
