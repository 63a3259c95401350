use log::{error, info};
use std::env;
use std::process;
use std::sync::Arc;

use black_hole_bot::config::Config;
use black_hole_bot::controller::TurnController;
use black_hole_bot::error::EngineError;
use black_hole_bot::evaluator::Evaluator;
use black_hole_bot::match_log::MatchLogger;
use black_hole_bot::strategy::Strategy;
use black_hole_bot::topology::Topology;
use black_hole_bot::transport::StdioTransport;

/// Exit status for any fatal engine error
const EXIT_FAILURE: i32 = 2;

fn play(config: Config) -> Result<(), EngineError> {
    let evaluator = Arc::new(Evaluator::from_config(&config.evaluator)?);
    let strategy = Strategy::from_config(&config, &evaluator)?;
    info!("Playing with strategy {}", strategy.label());

    let match_log = MatchLogger::new(config.debug.enabled, &config.debug.log_file_path);
    let mut controller = TurnController::new(Arc::new(Topology::new()), strategy, config.protocol)
        .with_match_log(match_log);

    controller.run(&mut StdioTransport::new())
}

fn main() {
    // stdout carries the protocol, so only warnings and errors reach stderr
    // unless RUST_LOG says otherwise
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "warn");
    }

    env_logger::init();

    info!("Starting Black Hole bot...");

    let config = Config::load_or_default();

    if let Err(e) = play(config) {
        error!("{}", e);
        process::exit(EXIT_FAILURE);
    }
}
