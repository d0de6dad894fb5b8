//!
//! Configuration and logging.
//!
//! The configuration lives in `pretty-der6y/pretty-der6y.ini` in the
//! user's config directory. A default file is written on the first start.
//!
use crate::toast::ToastQueue;
use anyhow::{anyhow, Error};
use configparser::ini::Ini;
use dirs::{config_dir, data_dir};
use log::LevelFilter;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

pub const APP_NAME: &str = "pretty-der6y";

pub const USAGE: &str = "\
Usage: pretty-der6y [options]

Options:
    -v, --verbose       debug logging, -vv for trace logging
    --config <file>     use this configuration file
    -h, --help          show this help
";

const DEFAULT_INI: &str = "\
; Pretty Der6y configuration

[log]
file = log.log
; off, error, warn, info, debug, trace
level = info
; minimum level shown as toast
toast_level = info

[backend]
daily_limit = 5.0
; directory for uploads.jsonl, empty for the data directory
record_dir =

[upload]
accept = .geojson,application/geo+json
; start directory of the file browser, empty for the current directory
start_dir =

[map]
; lat, lon
center = 30.5, 114.3
";

/// Command line.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Args {
    /// Number of `-v`.
    pub verbose: u8,
    /// Explicit configuration file.
    pub config: Option<PathBuf>,
    pub help: bool,
}

impl Args {
    /// Parse the arguments without the program name.
    pub fn parse<I, S>(args: I) -> Result<Args, Error>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut r = Args::default();
        let mut it = args.into_iter().map(Into::into);
        while let Some(arg) = it.next() {
            match arg.as_str() {
                "-v" | "--verbose" => r.verbose = r.verbose.saturating_add(1),
                "-vv" => r.verbose = r.verbose.saturating_add(2),
                "-h" | "--help" => r.help = true,
                "--config" => match it.next() {
                    Some(file) => r.config = Some(PathBuf::from(file)),
                    None => return Err(anyhow!("--config needs a file")),
                },
                _ => return Err(anyhow!("unknown argument {}", arg)),
            }
        }
        Ok(r)
    }
}

/// Configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// File the configuration was read from.
    pub file: Option<PathBuf>,

    pub log_file: PathBuf,
    pub log_level: LevelFilter,
    pub toast_level: LevelFilter,

    /// Daily limit of the offline backend.
    pub daily_limit: f64,
    /// Records of the offline backend.
    pub record_dir: PathBuf,

    /// Accept list of the uploader.
    pub accept: String,
    /// Start directory of the file browser.
    pub start_dir: PathBuf,

    /// `(lat, lon)`
    pub map_center: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            file: None,
            log_file: PathBuf::from("log.log"),
            log_level: LevelFilter::Info,
            toast_level: LevelFilter::Info,
            daily_limit: 5.0,
            record_dir: default_record_dir(),
            accept: ".geojson,application/geo+json".into(),
            start_dir: PathBuf::from("."),
            map_center: (30.5, 114.3),
        }
    }
}

fn default_record_dir() -> PathBuf {
    match data_dir() {
        Some(v) => v.join(APP_NAME),
        None => PathBuf::from("."),
    }
}

/// Default location of the configuration.
pub fn default_config_file() -> Option<PathBuf> {
    config_dir().map(|v| v.join(APP_NAME).join(format!("{}.ini", APP_NAME)))
}

impl Config {
    /// Load the configuration.
    ///
    /// An explicit file must exist. The default file is created
    /// if it doesn't.
    pub fn load(args: &Args) -> Result<Config, Error> {
        let file = match &args.config {
            Some(file) => {
                if !file.exists() {
                    return Err(anyhow!("config file {:?} not found", file));
                }
                Some(file.clone())
            }
            None => match default_config_file() {
                Some(file) => {
                    if !file.exists() {
                        write_default(&file)?;
                    }
                    Some(file)
                }
                None => None,
            },
        };

        let mut config = match &file {
            Some(file) => Config::read(file)?,
            None => Config::default(),
        };
        config.apply_args(args);
        Ok(config)
    }

    /// Read a configuration file.
    pub fn read(file: &Path) -> Result<Config, Error> {
        let mut ini = Ini::new();
        ini.load(file).map_err(|e| anyhow!(e))?;
        let mut config = Config::from_ini(&ini);
        config.file = Some(file.to_path_buf());
        Ok(config)
    }

    /// Configuration from ini-text.
    pub fn from_ini_str(text: &str) -> Result<Config, Error> {
        let mut ini = Ini::new();
        ini.read(text.to_string()).map_err(|e| anyhow!(e))?;
        Ok(Config::from_ini(&ini))
    }

    fn from_ini(ini: &Ini) -> Config {
        let def = Config::default();

        let map_center = match text(ini, "map", "center") {
            Some(v) => parse_center(&v).unwrap_or(def.map_center),
            None => def.map_center,
        };

        Config {
            file: None,
            log_file: text(ini, "log", "file")
                .map(PathBuf::from)
                .unwrap_or(def.log_file),
            log_level: parse_val(ini, "log", "level", def.log_level),
            toast_level: parse_val(ini, "log", "toast_level", def.toast_level),
            daily_limit: parse_val(ini, "backend", "daily_limit", def.daily_limit),
            record_dir: text(ini, "backend", "record_dir")
                .map(PathBuf::from)
                .unwrap_or(def.record_dir),
            accept: text(ini, "upload", "accept").unwrap_or(def.accept),
            start_dir: text(ini, "upload", "start_dir")
                .map(PathBuf::from)
                .unwrap_or(def.start_dir),
            map_center,
        }
    }

    /// `-v` raises the file log level.
    pub fn apply_args(&mut self, args: &Args) {
        match args.verbose {
            0 => {}
            1 => self.log_level = self.log_level.max(LevelFilter::Debug),
            _ => self.log_level = LevelFilter::Trace,
        }
    }
}

fn write_default(file: &Path) -> Result<(), Error> {
    if let Some(dir) = file.parent() {
        fs::create_dir_all(dir)?;
    }
    fs::write(file, DEFAULT_INI)?;
    Ok(())
}

/// Non-empty value.
fn text(ini: &Ini, sec: &str, key: &str) -> Option<String> {
    ini.get(sec, key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_val<T: FromStr>(ini: &Ini, sec: &str, key: &str, default: T) -> T {
    match text(ini, sec, key) {
        Some(v) => v.parse::<T>().unwrap_or(default),
        None => default,
    }
}

fn parse_center(text: &str) -> Option<(f64, f64)> {
    let (lat, lon) = text.split_once(',')?;
    let lat = lat.trim().parse::<f64>().ok()?;
    let lon = lon.trim().parse::<f64>().ok()?;
    if (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon) {
        Some((lat, lon))
    } else {
        None
    }
}

/// Log to the log file and to the toasts.
///
/// The log file is replaced on each start. Toasts only show records of
/// this crate.
pub fn setup_logging(config: &Config, toasts: &ToastQueue) -> Result<(), Error> {
    _ = fs::remove_file(&config.log_file);

    let file = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} {:5} {} {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(config.log_level)
        .chain(fern::log_file(&config.log_file)?);

    let toast = fern::Dispatch::new()
        .level(LevelFilter::Off)
        .level_for(env!("CARGO_CRATE_NAME"), config.toast_level)
        .chain(toasts.output());

    fern::Dispatch::new().chain(file).chain(toast).apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args() {
        assert_eq!(Args::parse(Vec::<String>::new()).unwrap(), Args::default());
        let args = Args::parse(["-v", "--config", "x.ini", "-v"]).unwrap();
        assert_eq!(args.verbose, 2);
        assert_eq!(args.config, Some(PathBuf::from("x.ini")));
        assert_eq!(Args::parse(["-vv"]).unwrap().verbose, 2);
        assert!(Args::parse(["--help"]).unwrap().help);
        assert!(Args::parse(["--config"]).is_err());
        assert!(Args::parse(["--frobnicate"]).is_err());
    }

    #[test]
    fn test_default_ini() {
        let config = Config::from_ini_str(DEFAULT_INI).unwrap();
        let def = Config::default();
        assert_eq!(config.log_file, PathBuf::from("log.log"));
        assert_eq!(config.log_level, LevelFilter::Info);
        assert_eq!(config.daily_limit, 5.0);
        assert_eq!(config.record_dir, def.record_dir);
        assert_eq!(config.accept, ".geojson,application/geo+json");
        assert_eq!(config.start_dir, PathBuf::from("."));
        assert_eq!(config.map_center, (30.5, 114.3));
    }

    #[test]
    fn test_values() {
        let config = Config::from_ini_str(
            "[log]\nlevel = debug\ntoast_level = warn\n\
             [backend]\ndaily_limit = 12.5\nrecord_dir = /tmp/records\n\
             [map]\ncenter = 48.2, 16.37\n",
        )
        .unwrap();
        assert_eq!(config.log_level, LevelFilter::Debug);
        assert_eq!(config.toast_level, LevelFilter::Warn);
        assert_eq!(config.daily_limit, 12.5);
        assert_eq!(config.record_dir, PathBuf::from("/tmp/records"));
        assert_eq!(config.map_center, (48.2, 16.37));

        let config = Config::from_ini_str("[backend]\ndaily_limit = lots\n[map]\ncenter = 100, 0\n")
            .unwrap();
        assert_eq!(config.daily_limit, 5.0);
        assert_eq!(config.map_center, (30.5, 114.3));
    }

    #[test]
    fn test_verbose() {
        let mut config = Config::default();
        config.apply_args(&Args {
            verbose: 1,
            ..Default::default()
        });
        assert_eq!(config.log_level, LevelFilter::Debug);
        config.apply_args(&Args {
            verbose: 2,
            ..Default::default()
        });
        assert_eq!(config.log_level, LevelFilter::Trace);
    }

    #[test]
    fn test_load_explicit() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("test.ini");
        fs::write(&file, "[upload]\naccept = .gpx\nstart_dir = /data\n").unwrap();

        let config = Config::load(&Args {
            verbose: 0,
            config: Some(file.clone()),
            help: false,
        })
        .unwrap();
        assert_eq!(config.file, Some(file));
        assert_eq!(config.accept, ".gpx");
        assert_eq!(config.start_dir, PathBuf::from("/data"));

        assert!(Config::load(&Args {
            verbose: 0,
            config: Some(dir.path().join("missing.ini")),
            help: false,
        })
        .is_err());
    }

    #[test]
    fn test_write_default() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("sub").join("pretty-der6y.ini");
        write_default(&file).unwrap();
        let config = Config::read(&file).unwrap();
        assert_eq!(config.daily_limit, 5.0);
    }
}
