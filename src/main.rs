use erdcore::{Command, Database, Engine, EngineConfig, ErdError};
use std::env;
use std::fs;
use std::process;
use tracing_subscriber::EnvFilter;

fn read(path: &str) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to read {}: {}", path, e);
            process::exit(1);
        }
    }
}

/// Engine rejections, malformed inputs included, print the payload and exit 2.
fn reject(err: ErdError) -> ! {
    eprintln!("{}", err.payload().to_json());
    process::exit(2);
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!("Usage: {} <snapshot.json> <command.json> [options]", args[0]);
        eprintln!();
        eprintln!("Options:");
        eprintln!("  -c, --config <file>   Engine configuration (default: built-in MySQL rules)");
        eprintln!("  -o, --output <file>   Output file (default: stdout)");
        process::exit(1);
    }

    let snapshot_path = &args[1];
    let command_path = &args[2];
    let mut config_path: Option<String> = None;
    let mut output_path: Option<String> = None;

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "-c" | "--config" => {
                i += 1;
                if i < args.len() {
                    config_path = Some(args[i].clone());
                }
            }
            "-o" | "--output" => {
                i += 1;
                if i < args.len() {
                    output_path = Some(args[i].clone());
                }
            }
            _ => {
                eprintln!("Unknown option: {}", args[i]);
                process::exit(1);
            }
        }
        i += 1;
    }

    let config = match config_path {
        Some(path) => EngineConfig::from_json(&read(&path)).unwrap_or_else(|e| {
            eprintln!("Invalid config {}: {}", path, e);
            process::exit(1);
        }),
        None => EngineConfig::default(),
    };
    let engine = Engine::new(config);

    let database: Database = serde_json::from_str(&read(snapshot_path))
        .unwrap_or_else(|e| reject(ErdError::parse_invalid(e)));
    let command: Command = serde_json::from_str(&read(command_path))
        .unwrap_or_else(|e| reject(ErdError::parse_invalid(e)));

    tracing::info!(kind = command.kind(), "applying command");
    let next = engine
        .apply(&database, &command)
        .unwrap_or_else(|e| reject(e));

    let output = match serde_json::to_string_pretty(&next) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to encode snapshot: {}", e);
            process::exit(1);
        }
    };

    match output_path {
        Some(path) => {
            if let Err(e) = fs::write(&path, &output) {
                eprintln!("Failed to write {}: {}", path, e);
                process::exit(1);
            }
        }
        None => println!("{}", output),
    }
}
