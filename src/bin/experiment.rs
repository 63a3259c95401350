//! Runs many local matches between two strategies and reports averages
//!
//! Usage: experiment [--matches N] [--first NAME] [--second NAME]
//!                   [--config PATH] [--fixed] [--seed S]
//!
//! Matches run in parallel. Unless --fixed is given, every match draws its
//! own neutral cells from a generator seeded with `seed + match index`.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::prelude::*;
use std::env;
use std::process;
use std::sync::Arc;
use std::time::Duration;

use black_hole_bot::config::{Config, StrategyKind};
use black_hole_bot::error::EngineError;
use black_hole_bot::evaluator::Evaluator;
use black_hole_bot::referee::{random_neutral_cells, MatchReport, Referee};
use black_hole_bot::strategy::Strategy;
use black_hole_bot::topology::Topology;
use black_hole_bot::types::Side;

struct Options {
    config_path: String,
    matches: Option<usize>,
    first: Option<StrategyKind>,
    second: Option<StrategyKind>,
    fixed: bool,
    seed: u64,
}

fn usage(program: &str) -> ! {
    eprintln!(
        "Usage: {} [--matches N] [--first NAME] [--second NAME] [--config PATH] [--fixed] [--seed S]",
        program
    );
    let names: Vec<_> = StrategyKind::all().iter().map(|k| k.as_str()).collect();
    eprintln!("  strategies: {}", names.join(", "));
    process::exit(1);
}

fn parse_options(args: &[String]) -> Options {
    let program = args.first().map(String::as_str).unwrap_or("experiment");
    let mut options = Options {
        config_path: "BlackHole.toml".to_string(),
        matches: None,
        first: None,
        second: None,
        fixed: false,
        seed: 0,
    };

    let mut i = 1;
    while i < args.len() {
        let flag = args[i].as_str();
        if flag == "--fixed" {
            options.fixed = true;
            i += 1;
            continue;
        }
        if flag == "--help" {
            usage(program);
        }

        let Some(value) = args.get(i + 1) else {
            eprintln!("Error: {} requires an argument", flag);
            usage(program);
        };
        match flag {
            "--matches" => options.matches = Some(value.parse().unwrap_or_else(|_| usage(program))),
            "--seed" => options.seed = value.parse().unwrap_or_else(|_| usage(program)),
            "--config" => options.config_path = value.clone(),
            "--first" | "--second" => {
                let Some(kind) = StrategyKind::from_name(value) else {
                    eprintln!("Error: unknown strategy '{}'", value);
                    usage(program);
                };
                if flag == "--first" {
                    options.first = Some(kind);
                } else {
                    options.second = Some(kind);
                }
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", flag);
                usage(program);
            }
        }
        i += 2;
    }

    options
}

fn play_match(
    index: usize,
    options: &Options,
    config: &Config,
    evaluator: &Arc<Evaluator>,
    topology: &Arc<Topology>,
    kinds: (StrategyKind, StrategyKind),
) -> Result<MatchReport, EngineError> {
    let neutral = if options.fixed || !config.referee.randomize_neutral {
        config.referee.neutral_cells.clone()
    } else {
        let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(index as u64));
        random_neutral_cells(topology, &mut rng)
    };

    let referee = Referee::new(
        Strategy::from_kind(kinds.0, config, evaluator)?,
        Strategy::from_kind(kinds.1, config, evaluator)?,
        neutral,
        config.protocol.clone(),
        Arc::clone(topology),
    );
    referee.run()
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let options = parse_options(&args);

    let config = Config::from_file(&options.config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", options.config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    let evaluator = match Evaluator::from_config(&config.evaluator) {
        Ok(evaluator) => Arc::new(evaluator),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };
    let topology = Arc::new(Topology::new());

    let kinds = (
        options.first.unwrap_or(config.referee.first),
        options.second.unwrap_or(config.referee.second),
    );
    let matches = options.matches.unwrap_or(config.referee.matches);

    println!("\n═══════════════════════════════════════════════════════════");
    println!("                 BLACK HOLE EXPERIMENT");
    println!("═══════════════════════════════════════════════════════════");
    println!("First:               {}", kinds.0.as_str());
    println!("Second:              {}", kinds.1.as_str());
    println!("Matches:             {}", matches);
    println!(
        "Neutral cells:       {}",
        if options.fixed || !config.referee.randomize_neutral {
            config.referee.neutral_cells.join(" ")
        } else {
            format!("random (seed {})", options.seed)
        }
    );
    println!("Threads:             {}", rayon::current_num_threads());
    println!("═══════════════════════════════════════════════════════════\n");

    let results: Vec<Result<MatchReport, EngineError>> = (0..matches)
        .into_par_iter()
        .map(|index| play_match(index, &options, &config, &evaluator, &topology, kinds))
        .collect();

    let mut reports = Vec::with_capacity(results.len());
    for (index, result) in results.into_iter().enumerate() {
        match result {
            Ok(report) => reports.push(report),
            Err(e) => eprintln!("Match {} failed: {}", index, e),
        }
    }

    if reports.is_empty() {
        eprintln!("Error: no match completed");
        process::exit(2);
    }

    let n = reports.len() as f64;
    let average = |f: &dyn Fn(&MatchReport) -> f64| reports.iter().map(f).sum::<f64>() / n;
    let wins = |side: Side| reports.iter().filter(|r| r.winner() == Some(side)).count();
    let millis = |d: Duration| d.as_secs_f64() * 1000.0;

    println!("═══════════════════════════════════════════════════════════");
    println!("                        RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!("Completed:           {}/{}", reports.len(), matches);
    println!(
        "First  ({:<12}) avg score {:>6.2}  wins {:>4}  avg time {:>8.2}ms",
        kinds.0.as_str(),
        average(&|r: &MatchReport| r.first_score as f64),
        wins(Side::First),
        average(&|r: &MatchReport| millis(r.first_time))
    );
    println!(
        "Second ({:<12}) avg score {:>6.2}  wins {:>4}  avg time {:>8.2}ms",
        kinds.1.as_str(),
        average(&|r: &MatchReport| r.second_score as f64),
        wins(Side::Second),
        average(&|r: &MatchReport| millis(r.second_time))
    );
    println!(
        "Draws:               {}",
        reports.iter().filter(|r| r.winner().is_none()).count()
    );
    println!("═══════════════════════════════════════════════════════════\n");
}
