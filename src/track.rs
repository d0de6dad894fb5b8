//!
//! GeoJSON running tracks.
//!
//! A track file is a FeatureCollection. The first feature must carry
//! a LineString geometry, its positions are `[lon, lat]` pairs.
//!
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Mean earth radius in km.
pub const EARTH_RADIUS_KM: f64 = 6371.0088;

/// Errors when reading a track.
#[derive(Debug)]
pub enum TrackError {
    /// Not JSON at all.
    Json(serde_json::Error),
    /// Not a FeatureCollection.
    InvalidGeoJson,
    /// The collection has no features.
    NoFeature,
    /// The first feature has no geometry.
    NoGeometry,
    /// The geometry is no LineString or has a broken position.
    InvalidGeometry,
    /// The LineString is empty.
    NoCoordinates,
}

impl Display for TrackError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackError::Json(e) => write!(f, "invalid json: {}", e),
            TrackError::InvalidGeoJson => write!(f, "not a GeoJSON FeatureCollection"),
            TrackError::NoFeature => write!(f, "no feature in the collection"),
            TrackError::NoGeometry => write!(f, "feature without geometry"),
            TrackError::InvalidGeometry => write!(f, "geometry is not a valid LineString"),
            TrackError::NoCoordinates => write!(f, "LineString without coordinates"),
        }
    }
}

impl Error for TrackError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            TrackError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(value: serde_json::Error) -> Self {
        TrackError::Json(value)
    }
}

/// Bounding box.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_lon - self.min_lon
    }

    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    /// Grow each side by `pct` of the extent. A degenerate side
    /// gets a small fixed margin.
    pub fn with_margin(&self, pct: f64) -> Bounds {
        let dx = (self.width() * pct).max(0.0005);
        let dy = (self.height() * pct).max(0.0005);
        Bounds {
            min_lon: self.min_lon - dx,
            min_lat: self.min_lat - dy,
            max_lon: self.max_lon + dx,
            max_lat: self.max_lat + dy,
        }
    }
}

/// A parsed track.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// `(lon, lat)`
    points: Vec<(f64, f64)>,
}

impl Track {
    /// Parse the text of a GeoJSON file.
    pub fn parse(text: &str) -> Result<Track, TrackError> {
        let json: Value = serde_json::from_str(text)?;

        if json.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
            return Err(TrackError::InvalidGeoJson);
        }
        let features = json
            .get("features")
            .and_then(Value::as_array)
            .ok_or(TrackError::InvalidGeoJson)?;
        let feature = features.first().ok_or(TrackError::NoFeature)?;

        let geometry = match feature.get("geometry") {
            None | Some(Value::Null) => return Err(TrackError::NoGeometry),
            Some(v) => v,
        };
        if geometry.get("type").and_then(Value::as_str) != Some("LineString") {
            return Err(TrackError::InvalidGeometry);
        }
        let coordinates = geometry
            .get("coordinates")
            .and_then(Value::as_array)
            .ok_or(TrackError::InvalidGeometry)?;

        let points = coordinates
            .iter()
            .map(position)
            .collect::<Result<Vec<_>, _>>()?;
        if points.is_empty() {
            return Err(TrackError::NoCoordinates);
        }

        Ok(Track { points })
    }

    pub fn points(&self) -> &[(f64, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        let mut bounds = Bounds {
            min_lon: f64::MAX,
            min_lat: f64::MAX,
            max_lon: f64::MIN,
            max_lat: f64::MIN,
        };
        for (lon, lat) in &self.points {
            bounds.min_lon = bounds.min_lon.min(*lon);
            bounds.min_lat = bounds.min_lat.min(*lat);
            bounds.max_lon = bounds.max_lon.max(*lon);
            bounds.max_lat = bounds.max_lat.max(*lat);
        }
        bounds
    }

    /// Length along the track.
    pub fn length_km(&self) -> f64 {
        self.points
            .windows(2)
            .map(|w| haversine_km(w[0], w[1]))
            .sum()
    }
}

/// Great circle distance between two `(lon, lat)` points.
pub fn haversine_km(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lon1, lat1) = (a.0.to_radians(), a.1.to_radians());
    let (lon2, lat2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

fn position(value: &Value) -> Result<(f64, f64), TrackError> {
    let pos = value.as_array().ok_or(TrackError::InvalidGeometry)?;
    if pos.len() < 2 {
        return Err(TrackError::InvalidGeometry);
    }
    let lon = pos[0].as_f64().ok_or(TrackError::InvalidGeometry)?;
    let lat = pos[1].as_f64().ok_or(TrackError::InvalidGeometry)?;
    if !(-180.0..=180.0).contains(&lon) || !(-90.0..=90.0).contains(&lat) {
        return Err(TrackError::InvalidGeometry);
    }
    Ok((lon, lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TRACK: &str = r#"{
        "type": "FeatureCollection",
        "features": [{
            "type": "Feature",
            "properties": {},
            "geometry": {
                "type": "LineString",
                "coordinates": [[114.30, 30.50], [114.31, 30.50], [114.31, 30.51, 12.0]]
            }
        }]
    }"#;

    #[test]
    fn test_parse() {
        let track = Track::parse(TRACK).unwrap();
        assert_eq!(track.len(), 3);
        assert_eq!(track.points()[0], (114.30, 30.50));

        let b = track.bounds();
        assert_eq!(b.min_lon, 114.30);
        assert_eq!(b.max_lat, 30.51);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(Track::parse("{"), Err(TrackError::Json(_))));
        assert!(matches!(
            Track::parse(r#"{"type":"Feature"}"#),
            Err(TrackError::InvalidGeoJson)
        ));
        assert!(matches!(
            Track::parse(r#"{"type":"FeatureCollection","features":[]}"#),
            Err(TrackError::NoFeature)
        ));
        assert!(matches!(
            Track::parse(r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":null}]}"#),
            Err(TrackError::NoGeometry)
        ));
        assert!(matches!(
            Track::parse(r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"Point","coordinates":[1,2]}}]}"#),
            Err(TrackError::InvalidGeometry)
        ));
        assert!(matches!(
            Track::parse(r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"LineString","coordinates":[["a",2]]}}]}"#),
            Err(TrackError::InvalidGeometry)
        ));
        assert!(matches!(
            Track::parse(r#"{"type":"FeatureCollection","features":[{"type":"Feature","geometry":{"type":"LineString","coordinates":[]}}]}"#),
            Err(TrackError::NoCoordinates)
        ));
    }

    #[test]
    fn test_length() {
        // one degree of latitude
        let d = haversine_km((0.0, 0.0), (0.0, 1.0));
        assert!((d - 111.195).abs() < 0.01);

        let track = Track::parse(TRACK).unwrap();
        let len = track.length_km();
        assert!(len > 2.0 && len < 2.2, "{}", len);
    }
}
