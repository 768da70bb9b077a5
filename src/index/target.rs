//! One observed target and its timeline
//!
//! Observations are appended in arrival order and sorted lazily: the
//! `sorted` flag is cleared by every append and set again by the first
//! mutable read or an explicit [`Target::sort`].

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::borrow::Cow;

use super::metadata::TargetMetadata;
use crate::range::TimeWindow;
use crate::stac::CatalogItem;

/// Timeline ordering key; a missing start sorts last
#[inline]
pub fn timeline_key(item: &CatalogItem) -> i64 {
    item.start_millis().unwrap_or(i64::MAX)
}

/// A logical target with every observation of it
#[derive(Debug, Clone)]
pub struct Target {
    pub id: String,
    pub display_name: String,
    pub target_type: String,
    pub altitude: Option<f64>,
    pub location: Option<(f64, f64)>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    observations: Vec<CatalogItem>,
    sorted: bool,
}

impl Target {
    /// Empty target described by its metadata record
    pub fn new(metadata: &TargetMetadata) -> Self {
        Self {
            id: metadata.target_id.clone(),
            display_name: metadata.target_name.clone(),
            target_type: metadata.target_type.clone(),
            altitude: metadata.target_altitude,
            location: metadata.location(),
            start_time: None,
            end_time: None,
            observations: Vec::new(),
            sorted: false,
        }
    }

    /// Append an observation and widen the time envelope to cover it
    ///
    /// Bounds only move outward. A missing timestamp leaves the bound
    /// alone, and an unset bound takes the first value that shows up.
    pub fn add_observation(&mut self, item: CatalogItem) {
        if let Some(start) = item.start_time() {
            if self.start_time.map_or(true, |current| start < current) {
                self.start_time = Some(start);
            }
        }
        if let Some(end) = item.end_time() {
            if self.end_time.map_or(true, |current| end > current) {
                self.end_time = Some(end);
            }
        }

        self.observations.push(item);
        self.sorted = false;
    }

    /// Sort the timeline in place (stable)
    pub fn sort(&mut self) {
        if !self.sorted {
            self.observations.sort_by_key(timeline_key);
            self.sorted = true;
        }
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted
    }

    /// Sorted timeline, sorting in place first if needed
    pub fn timeline(&mut self) -> &[CatalogItem] {
        self.sort();
        &self.observations
    }

    /// Sorted timeline without mutating
    ///
    /// Borrows when already sorted, otherwise returns a sorted copy.
    pub fn all(&self) -> Cow<'_, [CatalogItem]> {
        if self.sorted {
            Cow::Borrowed(&self.observations)
        } else {
            let mut copy = self.observations.clone();
            copy.sort_by_key(timeline_key);
            Cow::Owned(copy)
        }
    }

    /// Observations starting inside `window`, in timeline order
    ///
    /// Undated observations trail the timeline and never fall in a window;
    /// only the dated prefix is searched.
    pub fn in_window(&self, window: &TimeWindow) -> Vec<CatalogItem> {
        let timeline = self.all();
        let dated = timeline.partition_point(|item| item.start_millis().is_some());
        window.apply(&timeline[..dated]).to_vec()
    }

    /// Chronologically first observation, sorting in place first if needed
    pub fn representative(&mut self) -> Option<&CatalogItem> {
        self.sort();
        self.observations.first()
    }

    /// Chronologically first observation without mutating
    pub fn peek_representative(&self) -> Option<&CatalogItem> {
        if self.sorted {
            self.observations.first()
        } else {
            // min_by_key keeps the first of equal keys, matching the stable sort
            self.observations.iter().min_by_key(|item| timeline_key(item))
        }
    }

    /// Observation by id (linear scan)
    pub fn get_by_id(&self, observation_id: &str) -> Option<&CatalogItem> {
        self.observations.iter().find(|item| item.id == observation_id)
    }

    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.end_time
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Serializable description without the observations
    pub fn summary(&self) -> TargetSummary {
        TargetSummary {
            id: self.id.clone(),
            display_name: self.display_name.clone(),
            target_type: self.target_type.clone(),
            altitude: self.altitude,
            location: self.location.map(|(lon, lat)| [lon, lat]),
            start_time: self.start_time,
            end_time: self.end_time,
            observation_count: self.observations.len(),
        }
    }
}

/// Target fields as exposed to clients
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TargetSummary {
    pub id: String,
    pub display_name: String,
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<[f64; 2]>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub observation_count: usize,
}
