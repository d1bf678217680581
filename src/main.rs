// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license

use clap::Parser;

use pose_recorder::cli::args::Cli;
use pose_recorder::cli::record::run_recording;

fn main() {
    let cli = Cli::parse();
    run_recording(&cli);
}
