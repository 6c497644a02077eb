use std::path::PathBuf;

use anyhow::{Result, bail};

pub const DEFAULT_DATA_PATH: &str = "data/co2_emissions_kt_by_country.csv";
pub const DEFAULT_GEOMETRY_PATH: &str = "data/countries.geojson";

pub const DATA_ENV: &str = "CO2_DATA";
pub const GEOMETRY_ENV: &str = "CO2_GEOMETRY";

pub const USAGE: &str = "\
Usage: co2-dashboard [DATA_FILE] [GEOMETRY_FILE]

  DATA_FILE      .csv, .parquet or .json with columns
                 country_name, country_code, year, value
                 (default: $CO2_DATA or data/co2_emissions_kt_by_country.csv)
  GEOMETRY_FILE  GeoJSON country outlines for the map view
                 (default: $CO2_GEOMETRY or data/countries.geojson)

Set RUST_LOG=debug for verbose logging.";

/// Startup configuration.
///
/// Precedence: positional arguments, then environment, then defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_path: PathBuf,
    pub geometry_path: PathBuf,
}

/// What the command line asked for.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Run(Config),
    Help,
}

impl Config {
    /// Resolve from process arguments (without the program name) and an
    /// environment lookup.
    pub fn resolve<I, F>(args: I, env: F) -> Result<Command>
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut positional = Vec::new();
        for arg in args {
            match arg.as_str() {
                "-h" | "--help" => return Ok(Command::Help),
                flag if flag.starts_with('-') => bail!("Unknown option: {flag}\n\n{USAGE}"),
                _ => positional.push(PathBuf::from(arg)),
            }
        }
        if positional.len() > 2 {
            bail!("Too many arguments\n\n{USAGE}");
        }

        let mut positional = positional.into_iter();
        let data_path = positional
            .next()
            .or_else(|| env(DATA_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));
        let geometry_path = positional
            .next()
            .or_else(|| env(GEOMETRY_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_GEOMETRY_PATH));

        Ok(Command::Run(Config {
            data_path,
            geometry_path,
        }))
    }

    pub fn from_env() -> Result<Command> {
        Self::resolve(std::env::args().skip(1), |key| std::env::var(key).ok())
    }
}
