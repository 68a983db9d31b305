use std::process::ExitCode;

use clap::Parser;
use eframe::egui;

use photostudio::app::StudioApp;
use photostudio::{cli, logger};

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        let args = cli::CliArgs::parse();
        logger::init(args.verbose);
        let code = cli::run(args);
        std::process::exit(if code == ExitCode::SUCCESS { 0 } else { 1 });
    }

    // -- GUI mode -----------------------------------------------------
    logger::init(false);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1280.0, 820.0])
            .with_min_inner_size([900.0, 600.0])
            .with_title("AI PhotoStudio"),
        ..Default::default()
    };

    eframe::run_native(
        "PhotoStudio",
        options,
        Box::new(|cc| Box::new(StudioApp::new(cc))),
    )
}
