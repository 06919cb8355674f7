//! Command-line interface handling for the image generator.
//!
//! Every option overrides the matching configuration file setting.

use crate::config::AppConfig;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

pub const DEFAULT_CONFIG_PATH: &str = "ig.toml";

/// Command line arguments parsed from user input.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CliArgs {
    /// Path to the configuration file
    pub config_path: PathBuf,
    /// Optional override for the UDP bind address
    pub bind_address: Option<String>,
    /// Optional override for the Host address
    pub host_address: Option<String>,
    /// Optional override for the CIGI version, e.g. "3.3"
    pub cigi_version: Option<String>,
    /// Optional override for log level
    pub log_level: Option<String>,
    /// Whether to force JSON log output
    pub json_logs: bool,
    /// Optional number of frames to run before shutting down
    pub frames: Option<u64>,
}

fn command() -> Command {
    Command::new("CIGI Image Generator")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Horizon Team")
        .about("CIGI image generator host with a plugin-driven frame loop")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDRESS")
                .help("UDP address to receive Host messages on (e.g., 0.0.0.0:8004)"),
        )
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("ADDRESS")
                .help("Address to send Start Of Frame messages to (e.g., 10.0.0.5:8005)"),
        )
        .arg(
            Arg::new("cigi-version")
                .long("cigi-version")
                .value_name("MAJOR.MINOR")
                .help("CIGI version to speak (3.0, 3.1, 3.2, 3.3 or 4.0)"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("frames")
                .long("frames")
                .value_name("COUNT")
                .help("Shut down after this many frames")
                .value_parser(value_parser!(u64)),
        )
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage help on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses `args`; the first item is the program name.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Ok(Self::from_matches(&command().try_get_matches_from(args)?))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            bind_address: matches.get_one::<String>("bind").cloned(),
            host_address: matches.get_one::<String>("host").cloned(),
            cigi_version: matches.get_one::<String>("cigi-version").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
            frames: matches.get_one::<u64>("frames").copied(),
        }
    }

    /// Applies the command-line overrides to `config`.
    ///
    /// # Returns
    ///
    /// An error if the CIGI version is not written as `MAJOR.MINOR`.
    pub fn apply_to(&self, config: &mut AppConfig) -> Result<(), String> {
        if let Some(bind_address) = &self.bind_address {
            config.host.bind_address = bind_address.clone();
        }
        if let Some(host_address) = &self.host_address {
            config.host.host_address = Some(host_address.clone());
        }
        if let Some(text) = &self.cigi_version {
            let version = cigi_protocol::CigiVersion::parse(text)
                .ok_or_else(|| format!("Invalid CIGI version: {text}"))?;
            config.host.cigi_major = version.major;
            config.host.cigi_minor = version.minor;
        }
        if let Some(log_level) = &self.log_level {
            config.logging.level = log_level.clone();
        }
        if self.json_logs {
            config.logging.json_format = true;
        }
        if let Some(frames) = self.frames {
            config.frame.frame_limit = Some(frames);
        }
        Ok(())
    }
}
