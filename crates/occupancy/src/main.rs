use anyhow::Context;
use clap::{Parser, Subcommand};
use common::{TelemetryGuard, setup_logging};
use inference::backend::ort::OrtBackend;
use inference::{InferenceBackend, ModelHandle, ModelStatus};
use occupancy::store::{
    JsonSlotStore, JsonlHistory, SlotRegistry, SlotSource, latest_with_layout,
};
use occupancy::{
    DEFAULT_LOT_ID, LotId, OccupancyConfig, OccupancyError, OccupancyPipeline, OccupancyReport,
    OccupancyService,
};
use schema::ParkingSlot;
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::{task, time};

#[derive(Parser, Debug)]
#[command(name = "occupancy", version, about = "Parking-lot occupancy from camera frames")]
struct Cli {
    /// Slot layout file (overrides SLOT_STORE_PATH)
    #[arg(long, global = true)]
    slots_file: Option<PathBuf>,

    /// Detection history log (overrides HISTORY_PATH)
    #[arg(long, global = true)]
    history_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute occupancy for one or more images
    Detect {
        #[arg(long, default_value_t = DEFAULT_LOT_ID)]
        lot: LotId,
        /// ONNX model (overrides MODEL_PATH)
        #[arg(long)]
        model: Option<String>,
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Print the active slots of a lot
    Slots {
        #[arg(long, default_value_t = DEFAULT_LOT_ID)]
        lot: LotId,
    },
    /// Insert or replace slots from a JSON array of slots
    Register {
        #[arg(long, default_value_t = DEFAULT_LOT_ID)]
        lot: LotId,
        layout: PathBuf,
    },
    /// Remove every slot of a lot
    Clear {
        #[arg(long, default_value_t = DEFAULT_LOT_ID)]
        lot: LotId,
    },
    /// Print the most recent detection record of a lot with its layout
    Latest {
        #[arg(long, default_value_t = DEFAULT_LOT_ID)]
        lot: LotId,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = OccupancyConfig::from_env()?;
    if let Some(path) = cli.slots_file {
        config.slot_store_path = path;
    }
    if let Some(path) = cli.history_file {
        config.history_path = path;
    }

    // TelemetryGuard installs the subscriber itself; only fall back to plain
    // logging when no collector is configured.
    let _telemetry = match config.otel_endpoint.as_deref() {
        Some(endpoint) => Some(TelemetryGuard::init("occupancy", endpoint, config.environment())?),
        None => {
            setup_logging(config.environment())?;
            None
        }
    };

    tracing::debug!(?config, "Occupancy CLI starting");

    match cli.command {
        Command::Detect { lot, model, images } => {
            if let Some(model) = model {
                config.inference.model_path = model;
            }
            detect(config, lot, images).await
        }
        Command::Slots { lot } => {
            let slots = JsonSlotStore::new(&config.slot_store_path).fetch_slots(lot)?;
            println!("{}", serde_json::to_string_pretty(&slots)?);
            Ok(())
        }
        Command::Register { lot, layout } => {
            let raw = fs::read_to_string(&layout)
                .with_context(|| format!("failed to read {}", layout.display()))?;
            let slots: Vec<ParkingSlot> = serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse {}", layout.display()))?;

            let written = JsonSlotStore::new(&config.slot_store_path).register_slots(lot, &slots)?;
            println!("{}", json!({ "lot_id": lot, "registered": written }));
            Ok(())
        }
        Command::Clear { lot } => {
            let removed = JsonSlotStore::new(&config.slot_store_path).delete_slots(lot)?;
            println!("{}", json!({ "lot_id": lot, "removed": removed }));
            Ok(())
        }
        Command::Latest { lot } => {
            let history = JsonlHistory::new(&config.history_path);
            let slots = JsonSlotStore::new(&config.slot_store_path);
            match latest_with_layout(&history, &slots, lot)? {
                Some(latest) => println!("{}", serde_json::to_string_pretty(&latest)?),
                None => anyhow::bail!("no detection results found for lot {}", lot),
            }
            Ok(())
        }
    }
}

async fn detect(config: OccupancyConfig, lot: LotId, images: Vec<PathBuf>) -> anyhow::Result<()> {
    let inference_config = config.inference.clone();
    let (model, loader) = ModelHandle::spawn_load(move || OrtBackend::load_model(&inference_config));

    task::spawn_blocking(move || loader.join())
        .await?
        .map_err(|_| anyhow::anyhow!("model loader thread panicked"))?;

    if let ModelStatus::Failed(reason) = model.status() {
        tracing::error!(model_path = %config.inference.model_path, %reason, "Model unavailable");
    }

    let pipeline = OccupancyPipeline::new(model, config.pipeline_config());
    let service = Arc::new(OccupancyService::new(
        pipeline,
        Arc::new(JsonSlotStore::new(&config.slot_store_path)),
        Arc::new(JsonlHistory::new(&config.history_path)),
    ));
    let timeout = Duration::from_millis(config.request_timeout_ms);

    let tasks: Vec<_> = images
        .into_iter()
        .map(|path| {
            let service = Arc::clone(&service);
            tokio::spawn(async move {
                let label = path.display().to_string();
                let work = task::spawn_blocking(move || -> Result<OccupancyReport, OccupancyError> {
                    let bytes = fs::read(&path).map_err(|e| {
                        OccupancyError::InvalidImage(format!("{}: {}", path.display(), e))
                    })?;
                    service.process(lot, &bytes, path.to_str())
                });

                let outcome = match time::timeout(timeout, work).await {
                    Ok(Ok(outcome)) => outcome,
                    Ok(Err(join_err)) => Err(OccupancyError::InferenceFailed(anyhow::anyhow!(
                        "worker failed: {}",
                        join_err
                    ))),
                    Err(_) => Err(OccupancyError::InferenceFailed(anyhow::anyhow!(
                        "timed out after {} ms",
                        timeout.as_millis()
                    ))),
                };
                (label, outcome)
            })
        })
        .collect();

    for handle in tasks {
        let (image, outcome) = handle.await?;
        println!("{}", render(&image, outcome));
    }

    Ok(())
}

fn render(image: &str, outcome: Result<OccupancyReport, OccupancyError>) -> Value {
    match outcome {
        Ok(report) => {
            let mut out = json!({
                "image": image,
                "success": true,
                "occupied": report.result.occupied,
                "available": report.result.available,
                "total": report.result.total,
            });
            if let Some(warning) = report.persistence_warning {
                out["warning"] = Value::String(warning.to_string());
            }
            out
        }
        Err(e) => json!({
            "image": image,
            "success": false,
            "error": e.to_string(),
            "kind": e.kind().as_str(),
        }),
    }
}
