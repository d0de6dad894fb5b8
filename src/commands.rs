//!
//! Remote operations.
//!
//! The screens talk to the backend only through [Commands].
//! [OfflineBackend] is a local implementation that keeps the
//! uploads as JSON lines in a directory.
//!
use crate::track::{Track, TrackError};
use log::debug;
use serde_json::json;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// File name of the upload records.
pub const RECORD_FILE: &str = "uploads.jsonl";

/// Errors of the remote operations.
#[derive(Debug)]
pub enum CommandError {
    /// Empty username or password.
    InvalidCredentials,
    /// Upload before login.
    NotLoggedIn,
    /// Mileage must be in `0 < mileage <= limit`.
    InvalidMileage { mileage: f64, limit: f64 },
    /// The track doesn't parse.
    InvalidTrack(TrackError),
    /// Storing the record failed.
    Io(io::Error),
    /// Anything else the backend reports.
    Backend(String),
}

impl Display for CommandError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandError::InvalidCredentials => write!(f, "invalid username or password"),
            CommandError::NotLoggedIn => write!(f, "not logged in"),
            CommandError::InvalidMileage { mileage, limit } => {
                write!(f, "mileage {:.2}km outside of 0..={:.2}km", mileage, limit)
            }
            CommandError::InvalidTrack(e) => write!(f, "invalid track: {}", e),
            CommandError::Io(e) => write!(f, "{}", e),
            CommandError::Backend(e) => write!(f, "{}", e),
        }
    }
}

impl Error for CommandError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            CommandError::InvalidTrack(e) => Some(e),
            CommandError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TrackError> for CommandError {
    fn from(value: TrackError) -> Self {
        CommandError::InvalidTrack(value)
    }
}

impl From<io::Error> for CommandError {
    fn from(value: io::Error) -> Self {
        CommandError::Io(value)
    }
}

/// The three remote operations.
///
/// They are called from the task pool, never from the event loop.
pub trait Commands: Send + Sync + Debug {
    /// Login.
    fn login(&self, username: &str, password: &str) -> Result<(), CommandError>;

    /// Maximum mileage per day in km.
    fn get_daily_limit(&self) -> Result<f64, CommandError>;

    /// Upload a run.
    ///
    /// * geojson: the text of the track file.
    /// * mileage: km
    /// * end_time: epoch millis
    fn upload(&self, geojson: &str, mileage: f64, end_time: i64) -> Result<(), CommandError>;
}

/// Local backend.
#[derive(Debug)]
pub struct OfflineBackend {
    daily_limit: f64,
    record_dir: PathBuf,
    user: Mutex<Option<String>>,
}

impl OfflineBackend {
    pub fn new(daily_limit: f64, record_dir: impl Into<PathBuf>) -> Self {
        Self {
            daily_limit,
            record_dir: record_dir.into(),
            user: Mutex::new(None),
        }
    }

    pub fn record_dir(&self) -> &Path {
        &self.record_dir
    }

    /// The file with the upload records.
    pub fn record_file(&self) -> PathBuf {
        self.record_dir.join(RECORD_FILE)
    }

    fn current_user(&self) -> Option<String> {
        match self.user.lock() {
            Ok(v) => v.clone(),
            Err(e) => e.into_inner().clone(),
        }
    }
}

impl Commands for OfflineBackend {
    fn login(&self, username: &str, password: &str) -> Result<(), CommandError> {
        if username.trim().is_empty() || password.is_empty() {
            return Err(CommandError::InvalidCredentials);
        }
        debug!("offline login {}", username);
        let mut user = match self.user.lock() {
            Ok(v) => v,
            Err(e) => e.into_inner(),
        };
        *user = Some(username.to_string());
        Ok(())
    }

    fn get_daily_limit(&self) -> Result<f64, CommandError> {
        if self.current_user().is_none() {
            return Err(CommandError::NotLoggedIn);
        }
        Ok(self.daily_limit)
    }

    fn upload(&self, geojson: &str, mileage: f64, end_time: i64) -> Result<(), CommandError> {
        let Some(user) = self.current_user() else {
            return Err(CommandError::NotLoggedIn);
        };
        if !(mileage > 0.0 && mileage <= self.daily_limit) {
            return Err(CommandError::InvalidMileage {
                mileage,
                limit: self.daily_limit,
            });
        }
        let track = Track::parse(geojson)?;

        fs::create_dir_all(&self.record_dir)?;
        let record = json!({
            "user": user,
            "mileage": mileage,
            "end_time": end_time,
            "track_km": track.length_km(),
            "points": track.len(),
        });
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.record_file())?;
        writeln!(file, "{}", record)?;
        debug!("offline upload {}", record);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"{"type":"FeatureCollection","features":[{"type":"Feature",
        "geometry":{"type":"LineString","coordinates":[[114.30,30.50],[114.31,30.50]]}}]}"#;

    #[test]
    fn test_login() {
        let dir = tempfile::tempdir().unwrap();
        let backend = OfflineBackend::new(5.0, dir.path());
        assert!(matches!(
            backend.get_daily_limit(),
            Err(CommandError::NotLoggedIn)
        ));
        assert!(matches!(
            backend.login("", "secret"),
            Err(CommandError::InvalidCredentials)
        ));
        backend.login("runner", "secret").unwrap();
        assert_eq!(backend.get_daily_limit().unwrap(), 5.0);
    }

    #[test]
    fn test_upload() {
        let dir = tempfile::tempdir().unwrap();
        let backend = OfflineBackend::new(5.0, dir.path().join("records"));
        assert!(matches!(
            backend.upload(TRACK, 1.0, 0),
            Err(CommandError::NotLoggedIn)
        ));
        backend.login("runner", "secret").unwrap();

        assert!(matches!(
            backend.upload(TRACK, 0.0, 0),
            Err(CommandError::InvalidMileage { .. })
        ));
        assert!(matches!(
            backend.upload(TRACK, 5.5, 0),
            Err(CommandError::InvalidMileage { .. })
        ));
        assert!(matches!(
            backend.upload("{}", 1.0, 0),
            Err(CommandError::InvalidTrack(_))
        ));

        backend.upload(TRACK, 2.5, 1720598400000).unwrap();
        backend.upload(TRACK, 5.0, 1720598400000).unwrap();

        let text = fs::read_to_string(backend.record_file()).unwrap();
        let lines = text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 2);
        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["user"], "runner");
        assert_eq!(first["mileage"], 2.5);
        assert_eq!(first["end_time"], 1720598400000i64);
        assert_eq!(first["points"], 2);
    }
}
