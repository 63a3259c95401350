// Standalone replay tool for checking Black Hole match logs
//
// Usage:
//   cargo run --bin replay -- <log_file> [options]
//
// Options:
//   --all                  Replay all moves
//   --moves <m1,m2>        Replay specific move indices (comma-separated)
//   --validate             Check logged moves against acceptable ones
//   --verbose              Show detailed output for each move
//   --config <path>        Path to BlackHole.toml (default: BlackHole.toml)

use std::env;
use std::process;

use black_hole_bot::config::Config;
use black_hole_bot::replay::ReplayEngine;

fn print_usage() {
    eprintln!("Black Hole Replay Tool");
    eprintln!();
    eprintln!("USAGE:");
    eprintln!("  replay <log_file> [OPTIONS]");
    eprintln!();
    eprintln!("OPTIONS:");
    eprintln!("  --all                   Replay all moves in the log");
    eprintln!("  --moves <M1,M2,...>     Replay specific move indices (comma-separated)");
    eprintln!("  --validate <M:X,...>    Validate logged moves (format: index:cell=value,...)");
    eprintln!("  --verbose               Show detailed output for each move");
    eprintln!("  --config <path>         Path to BlackHole.toml (default: BlackHole.toml)");
    eprintln!("  --help                  Show this help message");
    eprintln!();
    eprintln!("EXAMPLES:");
    eprintln!("  # Replay all moves");
    eprintln!("  replay black_hole_debug.jsonl --all");
    eprintln!();
    eprintln!("  # Replay specific moves");
    eprintln!("  replay black_hole_debug.jsonl --moves 0,7,12");
    eprintln!();
    eprintln!("  # Validate expected moves, alternatives separated by '|'");
    eprintln!("  replay black_hole_debug.jsonl --validate 0:B6=15,14:A1=1|A2=1");
}

fn parse_indices(s: &str) -> Result<Vec<usize>, String> {
    s.split(',')
        .map(|t| {
            t.trim()
                .parse::<usize>()
                .map_err(|e| format!("Invalid move index '{}': {}", t, e))
        })
        .collect()
}

fn parse_expected_moves(s: &str) -> Result<Vec<(usize, Vec<String>)>, String> {
    s.split(',')
        .map(|pair| {
            let (index, moves) = pair
                .trim()
                .split_once(':')
                .ok_or_else(|| format!("Invalid format '{}'. Expected 'index:move'", pair))?;

            let index = index
                .parse::<usize>()
                .map_err(|e| format!("Invalid move index '{}': {}", index, e))?;
            let moves = moves.split('|').map(|m| m.trim().to_string()).collect();

            Ok((index, moves))
        })
        .collect()
}

fn argument_of<'a>(args: &'a [String], flag: &str) -> &'a str {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .map(String::as_str)
        .unwrap_or_default()
}

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 2 || args.contains(&"--help".to_string()) {
        print_usage();
        process::exit(if args.contains(&"--help".to_string()) {
            0
        } else {
            1
        });
    }

    let log_file = &args[1];
    let mut config_path = "BlackHole.toml".to_string();
    let mut verbose = false;
    let mut mode = None;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--all" => {
                mode = Some("all");
            }
            "--moves" | "--validate" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: {} requires an argument", args[i]);
                    process::exit(1);
                }
                mode = Some(if args[i] == "--moves" { "moves" } else { "validate" });
                i += 1;
            }
            "--config" => {
                if i + 1 >= args.len() {
                    eprintln!("Error: --config requires an argument");
                    process::exit(1);
                }
                config_path = args[i + 1].clone();
                i += 1;
            }
            "--verbose" => {
                verbose = true;
            }
            _ => {
                eprintln!("Error: Unknown option '{}'", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let Some(mode) = mode else {
        eprintln!("Error: Must specify --all, --moves, or --validate");
        print_usage();
        process::exit(1);
    };

    let config = Config::from_file(&config_path).unwrap_or_else(|e| {
        eprintln!("Warning: Could not load config from '{}': {}", config_path, e);
        eprintln!("Using default configuration");
        Config::default_hardcoded()
    });

    println!("Loaded configuration from: {}", config_path);
    println!("Replay log file: {}", log_file);
    println!();

    let engine = match ReplayEngine::new(config, verbose) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error building replay engine: {}", e);
            process::exit(1);
        }
    };

    let entries = match engine.load_log_file(log_file) {
        Ok(entries) => entries,
        Err(e) => {
            eprintln!("Error loading log file: {}", e);
            process::exit(1);
        }
    };

    if entries.is_empty() {
        eprintln!("Error: Log file is empty");
        process::exit(1);
    }

    match mode {
        "all" => {
            println!("Replaying all {} moves...\n", entries.len());
            let results = engine.replay_all(&entries);
            engine.print_report(&results);
        }
        "moves" => {
            let indices = match parse_indices(argument_of(&args, "--moves")) {
                Ok(indices) => indices,
                Err(e) => {
                    eprintln!("Error parsing move indices: {}", e);
                    process::exit(1);
                }
            };

            println!("Replaying {} specific move(s)...\n", indices.len());
            match engine.replay_moves(&entries, &indices) {
                Ok(results) => engine.print_report(&results),
                Err(e) => {
                    eprintln!("Error during replay: {}", e);
                    process::exit(1);
                }
            }
        }
        _ => {
            let expected_moves = match parse_expected_moves(argument_of(&args, "--validate")) {
                Ok(m) => m,
                Err(e) => {
                    eprintln!("Error parsing expected moves: {}", e);
                    process::exit(1);
                }
            };

            println!("Validating {} expected move(s)...\n", expected_moves.len());
            match engine.validate_expected_moves(&entries, &expected_moves) {
                Ok(()) => println!("✓ All expected moves validated successfully!"),
                Err(e) => {
                    eprintln!("✗ Validation failed: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}
