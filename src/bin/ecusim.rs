use clap::{App, Arg};
use std::time::Duration;
use tokio::time;
use tracing::{debug, error, info};

use ecusim::config::{DEFAULT_INPUT_PATH, DEFAULT_OUTPUT_PATH};
use ecusim::mailbox::Mailbox;
use ecusim::{EcuAgent, EcuConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let matches = App::new("ecusim")
        .version("0.1.0")
        .about("🚗 Virtual car ECU simulator with OBD mailbox and seed/key security access")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("input")
                .short("i")
                .long("input")
                .value_name("PATH")
                .help("Input mailbox record path")
                .takes_value(true)
                .default_value(DEFAULT_INPUT_PATH),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("PATH")
                .help("Output snapshot record path")
                .takes_value(true)
                .default_value(DEFAULT_OUTPUT_PATH),
        )
        .arg(
            Arg::with_name("period")
                .short("p")
                .long("period")
                .value_name("MS")
                .help("Simulation period in milliseconds")
                .takes_value(true)
                .validator(|v| match v.parse::<u64>() {
                    Ok(ms) if ms > 0 => Ok(()),
                    _ => Err("Period must be a positive number of milliseconds".into()),
                }),
        )
        .arg(
            Arg::with_name("ecu-id")
                .long("ecu-id")
                .value_name("ID")
                .help("ECU identifier used as the seed/key prefix")
                .takes_value(true)
                .validator(|v| match v.parse::<u32>() {
                    Ok(id) if id > 0 => Ok(()),
                    _ => Err("ECU identifier must be a positive number".into()),
                }),
        )
        .arg(
            Arg::with_name("seed-digits")
                .long("seed-digits")
                .value_name("N")
                .help("Number of random digits in the seed suffix")
                .takes_value(true)
                .validator(|v| match v.parse::<u32>() {
                    Ok(n) if n > 0 => Ok(()),
                    _ => Err("Seed suffix width must be a positive number".into()),
                }),
        )
        .arg(
            Arg::with_name("debug-access")
                .long("debug-access")
                .help("Preset the security gate to unlocked (development only)"),
        )
        .get_matches();

    let mut config = match matches.value_of("config") {
        Some(path) => EcuConfig::load(path)?,
        None => EcuConfig::default(),
    };
    if matches.occurrences_of("input") > 0 {
        config.input_path = matches.value_of("input").unwrap_or(DEFAULT_INPUT_PATH).to_string();
    }
    if matches.occurrences_of("output") > 0 {
        config.output_path = matches
            .value_of("output")
            .unwrap_or(DEFAULT_OUTPUT_PATH)
            .to_string();
    }
    if let Some(ms) = matches.value_of("period") {
        config.cycle_ms = ms.parse()?;
    }
    if let Some(id) = matches.value_of("ecu-id") {
        config.ecu_id = id.parse()?;
    }
    if let Some(n) = matches.value_of("seed-digits") {
        config.seed_suffix_digits = n.parse()?;
    }
    if matches.is_present("debug-access") {
        config.debug_access = true;
    }
    config.validate()?;

    println!("🚗 Virtual Car ECU Simulator");
    println!("============================");

    let mailbox = Mailbox::new(&config.input_path, &config.output_path);
    if let Some(parent) = mailbox.output_path().parent() {
        std::fs::create_dir_all(parent)?;
    }

    info!(
        input = %mailbox.input_path().display(),
        output = %mailbox.output_path().display(),
        period_ms = config.cycle_ms,
        debug_access = config.debug_access,
        "simulator starting"
    );

    let cycle_ms = config.cycle_ms;
    let mut agent = EcuAgent::new(config);

    let mut interval = time::interval(Duration::from_millis(cycle_ms));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let input = mailbox.read_input();
                let snapshot = agent.run_cycle(&input);
                if let Err(e) = mailbox.write_snapshot(&snapshot) {
                    error!("Failed to publish snapshot: {}", e);
                }
                debug!(cycle = agent.cycle_count(), "snapshot published");
            }
            _ = tokio::signal::ctrl_c() => {
                break;
            }
        }
    }

    println!("🛑 ECU simulator stopped");
    Ok(())
}
