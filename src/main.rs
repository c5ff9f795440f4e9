use clap::{value_parser, Arg, ArgAction, Command};
use log::{error, info};
use simplelog::{
    format_description, ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger,
    TermLogger, TerminalMode, WriteLogger,
};
use std::fs::File;
use std::path::Path;
use std::process::exit;

use run_rc_drive::application;
use run_rc_drive::config::Config;

fn main() {
    // Parse the command line arguments
    let matches = Command::new("rc drive")
        .about("Drive the steering and drive servos from a gamepad.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .help("Configuration file. The default values are used if it does not exist.")
                .default_value("config/parameters_drive.yaml"),
        )
        .arg(
            Arg::new("joystick")
                .short('j')
                .long("joystick")
                .help("Input device of the gamepad to override the configuration file."),
        )
        .arg(
            Arg::new("maestro")
                .short('m')
                .long("maestro")
                .help("Serial device of the controller to override the configuration file."),
        )
        .arg(
            Arg::new("baud")
                .short('b')
                .long("baud")
                .help("Baud rate to override the configuration file.")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("simulate")
                .short('s')
                .long("simulate")
                .action(ArgAction::SetTrue)
                .help("Run with the simulated controller and gamepad"),
        )
        .arg(
            Arg::new("level")
                .short('l')
                .long("log-level")
                .help("Log level: 0 (Off), 1 (Error), 2 (Warn), 3 (Info), 4 (Debug), 5 (Trace)")
                .default_value("3")
                .value_parser(value_parser!(u32)),
        )
        .get_matches();

    // Check the log filter
    let log_filter = get_log_filter(matches.get_one::<u32>("level"));

    // Initiate the logger
    initiate_logger(log_filter, "drive.log");
    info!("Log level: {log_filter}.");

    // Read the configuration and apply the overrides
    let filepath = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("config/parameters_drive.yaml");
    let mut config = match Config::from_file_or_default(Path::new(filepath)) {
        Ok(config) => config,
        Err(err) => {
            error!("{err}");
            exit(err.exit_code());
        }
    };

    if let Some(path) = matches.get_one::<String>("joystick") {
        config.joystick_path = path.clone();
    }
    if let Some(path) = matches.get_one::<String>("maestro") {
        config.maestro_path = path.clone();
    }
    if let Some(baud_rate) = matches.get_one::<u32>("baud") {
        config.baud_rate = *baud_rate;
    }

    // Run the application
    if let Err(err) = application::run(&config, matches.get_flag("simulate")) {
        error!("{err}");
        exit(err.exit_code());
    }
}

/// Get the log filter.
///
/// # Arguments
/// * `log_level` - Log level.
///
/// # Returns
/// Log filter.
fn get_log_filter(log_level: Option<&u32>) -> LevelFilter {
    match log_level {
        Some(0) => LevelFilter::Off,
        Some(1) => LevelFilter::Error,
        Some(2) => LevelFilter::Warn,
        Some(3) => LevelFilter::Info,
        Some(4) => LevelFilter::Debug,
        Some(5) => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Initiate the logger. Fall back to the terminal only if the log file can
/// not be created.
///
/// # Arguments
/// * `level` - Log level.
/// * `filepath` - Log file path.
fn initiate_logger(level: LevelFilter, filepath: &str) {
    let config = ConfigBuilder::new()
        .set_time_format_custom(format_description!(
            "[year]/[month]/[day] [hour]:[minute]:[second].[subsecond]"
        ))
        .build();

    // Log to the terminal
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    loggers.push(TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    ));

    // Log to the file
    match File::create(filepath) {
        Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
        Err(err) => eprintln!("Failed to create the log file: {err}."),
    }

    let _ = CombinedLogger::init(loggers);
}
