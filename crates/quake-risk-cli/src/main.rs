//! `quake-risk` binary: village earthquake vulnerability and risk index.
//!
//! ```bash
//! quake-risk --config pipeline.json --output-dir out --metrics-out out/metrics.prom
//! ```

mod config;


use anyhow::Context;
use clap::{Parser, ValueEnum};
use config::PipelineConfig;
use hazard_core::geojson::FeatureCollection;
use hazard_core::{
    load_area_hazards, load_linear_hazards, load_point_hazards, DegeneratePolicy, HazardLayers,
    RegionSet, BUILDING_LAYER, LIQUEFACTION_LAYER, SLOPE_LAYER,
};
use hazard_scorers::score_layers;
use prometheus_bridge::{observe_matrix, observe_outcome, PipelineMetrics, StageTimer};
use quake_risk::{
    density_collection, risk_collection, write_risk_table, PopulationDensityIndex,
    PopulationTable, RiskIndexCalculator, RunReport, VulnerabilityAggregator, VulnerabilityCache,
};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{error, info};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DegenerateArg {
    Zero,
    Half,
    Fail,
}

impl From<DegenerateArg> for DegeneratePolicy {
    fn from(arg: DegenerateArg) -> Self {
        match arg {
            DegenerateArg::Zero => DegeneratePolicy::Zero,
            DegenerateArg::Half => DegeneratePolicy::Half,
            DegenerateArg::Fail => DegeneratePolicy::Fail,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "quake-risk",
    version,
    about = "Village earthquake vulnerability and risk index",
    long_about = None
)]
struct Args {
    /// JSON pipeline configuration. Defaults apply to anything it omits.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the artifact directory from the config.
    #[arg(long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Override the point-scoring worker count.
    #[arg(long)]
    workers: Option<usize>,

    /// Override how equal-valued score vectors normalize.
    #[arg(long, value_enum)]
    degenerate: Option<DegenerateArg>,

    /// Write the Prometheus text exposition here after the run.
    #[arg(long, value_name = "FILE")]
    metrics_out: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Emit logs as JSON lines.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn main() {
    let args = Args::parse();

    let level = args
        .log_level
        .parse::<tracing_subscriber::filter::LevelFilter>()
        .unwrap_or(tracing_subscriber::filter::LevelFilter::INFO);
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);
    if args.json_logs {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    if let Err(e) = run_cli(args) {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn run_cli(args: Args) -> anyhow::Result<()> {
    let mut config = match args.config.as_deref() {
        Some(path) => {
            info!(path = %path.display(), "loading configuration");
            PipelineConfig::from_json(path)?
        }
        None => PipelineConfig::default(),
    };
    if let Some(dir) = args.output_dir {
        config.output_dir = dir;
    }
    if let Some(workers) = args.workers {
        config.scoring.workers = workers;
    }
    if let Some(policy) = args.degenerate {
        config.scoring.degenerate = policy.into();
    }
    config.validate()?;

    let metrics = PipelineMetrics::new().context("registering pipeline metrics")?;
    let report = run(&config, &metrics)?;
    info!(
        regions = report.regions,
        cached = report.vulnerability_cached,
        artifacts = report.artifacts.len(),
        "run complete"
    );

    if let Some(path) = args.metrics_out {
        metrics.write_to(&path)?;
    }
    Ok(())
}

fn read_layer(path: &Path, layer: &str) -> hazard_core::Result<FeatureCollection> {
    info!(layer, path = %path.display(), "reading layer");
    FeatureCollection::read(path)
}

fn load_layers(config: &PipelineConfig, metrics: &PipelineMetrics) -> hazard_core::Result<HazardLayers> {
    let inputs = &config.inputs;
    let slopes = load_linear_hazards(&read_layer(&inputs.slopes, SLOPE_LAYER)?, &config.schema)?;
    let buildings = load_point_hazards(
        &read_layer(&inputs.buildings, BUILDING_LAYER)?,
        &config.schema,
        &config.scoring,
    )?;
    let liquefaction = load_area_hazards(
        &read_layer(&inputs.liquefaction, LIQUEFACTION_LAYER)?,
        &config.schema,
    )?;

    metrics.set_features_loaded(SLOPE_LAYER, slopes.len());
    metrics.set_features_loaded(BUILDING_LAYER, buildings.len());
    metrics.set_features_loaded(LIQUEFACTION_LAYER, liquefaction.len());
    Ok(HazardLayers {
        slopes,
        buildings,
        liquefaction,
    })
}

/// Runs the whole pipeline and writes every artifact under `output_dir`.
pub fn run(config: &PipelineConfig, metrics: &PipelineMetrics) -> anyhow::Result<RunReport> {
    fs::create_dir_all(&config.output_dir)
        .with_context(|| format!("creating {}", config.output_dir.display()))?;
    let name_key = config.schema.region_name_key.as_str();

    let regions_path = &config.inputs.regions;
    let regions = RegionSet::from_features(
        &FeatureCollection::read(regions_path)
            .with_context(|| format!("reading regions {}", regions_path.display()))?,
        &config.schema,
    )?;
    metrics.set_features_loaded("regions", regions.len());

    let vulnerability_path = config.artifact(&config.artifacts.vulnerability);
    let aggregator = VulnerabilityAggregator::new(config.scoring.degenerate)
        .with_precision(config.scoring.normalized_precision)
        .with_cache(VulnerabilityCache::new(&vulnerability_path, name_key));
    let outcome = {
        let _timer = StageTimer::start(metrics, "vulnerability");
        aggregator
            .resolve(&regions, || {
                let layers = load_layers(config, metrics)?;
                score_layers(&regions, &layers, &config.scoring)
            })
            .context("resolving vulnerability index")?
    };
    observe_outcome(metrics, &outcome);

    let density = {
        let _timer = StageTimer::start(metrics, "population");
        let population_path = &config.inputs.population;
        let table = PopulationTable::read(population_path, &config.population)
            .with_context(|| format!("reading population {}", population_path.display()))?;
        PopulationDensityIndex::from_table(&regions, &table, config.scoring.degenerate)?
    };

    let matrix = {
        let _timer = StageTimer::start(metrics, "risk");
        RiskIndexCalculator.compute(&regions, outcome.index(), &density)?
    };
    observe_matrix(metrics, &matrix);

    let mut report = RunReport::new(&outcome, &matrix);
    report.record_artifact(&vulnerability_path);

    let risk_path = config.artifact(&config.artifacts.risk);
    risk_collection(&regions, name_key, &matrix)?
        .write(&risk_path)
        .with_context(|| format!("writing {}", risk_path.display()))?;
    report.record_artifact(&risk_path);

    let table_path = config.artifact(&config.artifacts.risk_table);
    let file = File::create(&table_path)
        .with_context(|| format!("creating {}", table_path.display()))?;
    write_risk_table(BufWriter::new(file), &matrix)?;
    report.record_artifact(&table_path);

    let density_path = config.artifact(&config.artifacts.density);
    density_collection(&regions, name_key, &density)?
        .write(&density_path)
        .with_context(|| format!("writing {}", density_path.display()))?;
    report.record_artifact(&density_path);

    let report_path = config.artifact(&config.artifacts.report);
    report
        .write(&report_path)
        .with_context(|| format!("writing {}", report_path.display()))?;
    Ok(report)
}
