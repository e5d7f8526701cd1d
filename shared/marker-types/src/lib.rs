//! Marker data model shared between the signing service and the aggregator

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

/// Classification of a marker, selecting the icon family on the map
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MarkerType {
    /// Road hazard (pothole, debris, ...)
    Hazard,
    /// Traffic congestion level
    Congestion,
}

/// A single map marker as it appears in the stored JSON documents
///
/// Markers are immutable once fetched; they live for one aggregation cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Unique within a dataset
    pub id: i64,
    /// Longitude, degrees in [-180, 180]
    pub lng: f64,
    /// Latitude, degrees in [-90, 90]
    pub lat: f64,
    /// Marker classification (wire name `type`)
    #[serde(rename = "type")]
    pub kind: MarkerType,
    /// Category key selecting the display icon, e.g. `pothole` or `low`
    pub val: String,
    /// Optional RFC 3339 timestamp of when the marker was reported
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

/// Validation failures for a fetched marker
#[derive(Error, Debug, PartialEq)]
pub enum MarkerError {
    /// Longitude outside [-180, 180]
    #[error("marker {id}: longitude {lng} out of range")]
    LongitudeOutOfRange {
        /// Offending marker id
        id: i64,
        /// Offending longitude
        lng: f64,
    },

    /// Latitude outside [-90, 90]
    #[error("marker {id}: latitude {lat} out of range")]
    LatitudeOutOfRange {
        /// Offending marker id
        id: i64,
        /// Offending latitude
        lat: f64,
    },
}

impl Marker {
    /// Checks that the coordinates are within valid WGS84 bounds
    ///
    /// # Errors
    ///
    /// Returns `MarkerError` naming the offending field when a coordinate is
    /// out of range or not finite.
    pub fn validate(&self) -> Result<(), MarkerError> {
        if !self.lng.is_finite() || !(-180.0..=180.0).contains(&self.lng) {
            return Err(MarkerError::LongitudeOutOfRange {
                id: self.id,
                lng: self.lng,
            });
        }
        if !self.lat.is_finite() || !(-90.0..=90.0).contains(&self.lat) {
            return Err(MarkerError::LatitudeOutOfRange {
                id: self.id,
                lat: self.lat,
            });
        }
        Ok(())
    }
}

/// Per-type visibility toggles applied by marker consumers
///
/// Filtering affects only what a consumer renders, never the fetched set.
/// Types without an explicit entry are visible.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    visibility: HashMap<MarkerType, bool>,
}

impl FilterState {
    /// Creates a filter state with every type visible
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the visibility flag for a marker type
    pub fn set_visible(&mut self, kind: MarkerType, visible: bool) {
        self.visibility.insert(kind, visible);
    }

    /// Whether a marker passes the current toggles
    #[must_use]
    pub fn visible(&self, marker: &Marker) -> bool {
        self.visibility.get(&marker.kind).copied().unwrap_or(true)
    }

    /// Returns the markers that pass the current toggles, preserving order
    #[must_use]
    pub fn apply<'a>(&self, markers: &'a [Marker]) -> Vec<&'a Marker> {
        markers.iter().filter(|m| self.visible(m)).collect()
    }
}
