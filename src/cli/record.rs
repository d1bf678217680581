// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use std::process;
use std::time::Instant;

use crate::cli::args::Cli;
use crate::cli::logging::set_verbose;
use crate::error::Result;
use crate::recorder::{CategoryReport, Recorder};
use crate::{ModelInfo, PoseEstimator, VERSION, YOLOPoseModel};
use crate::{error, info, verbose, warn};

/// Load the model and record every configured category.
///
/// Exits the process with status 1 if the model can't be loaded or warmed up.
/// Per-image and per-category problems are reported and never abort the run.
pub fn run_recording(args: &Cli) {
    set_verbose(args.verbose);

    let model = match load_model(args) {
        Ok(model) => model,
        Err(e) => {
            error!("Error loading model: {e}");
            process::exit(1);
        }
    };

    let info = model.info();
    let precision = if args.half || model.metadata().half { "FP16" } else { "FP32" };
    verbose!("Ultralytics {VERSION} 🚀 Rust ONNX {precision} {}", info.accelerator);
    info!("{}", model_banner(&info));

    let start = Instant::now();
    let mut recorder = Recorder::new(model, args.recorder_config());
    let reports = recorder.run();
    print_summary(&reports, start.elapsed().as_secs_f64());
}

/// Load the model and run one dummy inference so a broken session fails here.
fn load_model(args: &Cli) -> Result<YOLOPoseModel> {
    let mut model = YOLOPoseModel::load_with_config(&args.model, args.inference_config())?;
    model.warmup()?;
    Ok(model)
}

/// Startup block, ending in a blank line.
fn model_banner(info: &ModelInfo) -> String {
    format!(
        "Loaded model:\n{}\n\nEngine: {}\nAccelerator: {}\n",
        info.model_id, info.engine, info.accelerator
    )
}

fn print_summary(reports: &[CategoryReport], seconds: f64) {
    let images: usize = reports.iter().map(|r| r.images).sum();
    let rows: usize = reports.iter().map(|r| r.rows).sum();
    let skipped: usize = reports.iter().map(|r| r.skipped).sum();
    let failed: usize = reports.iter().map(|r| r.failed).sum();
    let unwritten = reports.iter().filter(|r| !r.is_written()).count();

    verbose!();
    verbose!(
        "{} categories, {images} images: {rows} rows, {skipped} without a pose, {failed} failed ({seconds:.1}s)",
        reports.len()
    );
    if unwritten > 0 {
        warn!("{unwritten} output file(s) could not be written");
    }
}
