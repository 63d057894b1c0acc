//! Day-partitioned aggregation of artifacts.
//!
//! A [`Travelogue`] owns one [`Day`] per calendar date (in a fixed reference
//! offset) and tracks the overall time range. It is populated with
//! [`Travelogue::insert`], sorted once with [`Travelogue::sort_days`], and
//! read-only afterwards.

use chrono::{FixedOffset, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::models::Artifact;

/// Artifacts whose start timestamp falls on one calendar date.
#[derive(Debug, Clone, PartialEq)]
pub struct Day {
    date: NaiveDate,
    artifacts: Vec<Artifact>,
}

impl Day {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            artifacts: Vec::new(),
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    /// ISO date string used as the export key.
    pub fn key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn len(&self) -> usize {
        self.artifacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifacts.is_empty()
    }

    /// Artifacts in storage order.
    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    fn push(&mut self, artifact: Artifact) {
        self.artifacts.push(artifact);
    }

    /// Stable sort by timestamp; unknown timestamps sort first.
    pub fn sort(&mut self) {
        self.artifacts.sort_by_key(Artifact::timestamp);
    }

    /// Artifacts in timestamp order without touching storage order.
    ///
    /// Each call starts a fresh pass.
    pub fn sorted(&self) -> impl Iterator<Item = &Artifact> + '_ {
        let mut refs: Vec<&Artifact> = self.artifacts.iter().collect();
        refs.sort_by_key(|a| a.timestamp());
        refs.into_iter()
    }
}

/// The day-partitioned timeline produced by one batch run.
#[derive(Debug, Clone)]
pub struct Travelogue {
    offset: FixedOffset,
    days: BTreeMap<NaiveDate, Day>,
    undated: Vec<Artifact>,
    start_date: Option<i64>,
    end_date: Option<i64>,
}

impl Travelogue {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            days: BTreeMap::new(),
            undated: Vec::new(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }

    /// Earliest known timestamp across all dated artifacts.
    pub fn start_date(&self) -> Option<i64> {
        self.start_date
    }

    /// Latest known timestamp across all dated artifacts.
    ///
    /// Widened by each artifact's end bound, so a GPX track extends it to
    /// its last timed point rather than its first.
    pub fn end_date(&self) -> Option<i64> {
        self.end_date
    }

    /// Place an artifact in its day and widen the time range.
    ///
    /// Artifacts with no start timestamp cannot be keyed by date; they are
    /// kept aside in [`Travelogue::undated`] and do not affect the range.
    pub fn insert(&mut self, artifact: Artifact) {
        let Some(date) = artifact.day_key(&self.offset) else {
            debug!(path = %artifact.path.display(), "no start time, keeping as undated");
            self.undated.push(artifact);
            return;
        };

        if let Some(start) = artifact.time_bounds.start {
            let end = artifact.time_bounds.end.unwrap_or(start).max(start);
            self.start_date = Some(self.start_date.map_or(start, |s| s.min(start)));
            self.end_date = Some(self.end_date.map_or(end, |e| e.max(end)));
        }

        self.days
            .entry(date)
            .or_insert_with(|| Day::new(date))
            .push(artifact);
    }

    /// Sort every day. Idempotent.
    pub fn sort_days(&mut self) {
        for day in self.days.values_mut() {
            day.sort();
        }
    }

    /// Days in ascending date order.
    pub fn days(&self) -> impl Iterator<Item = &Day> + '_ {
        self.days.values()
    }

    pub fn day(&self, date: NaiveDate) -> Option<&Day> {
        self.days.get(&date)
    }

    pub fn day_count(&self) -> usize {
        self.days.len()
    }

    /// Artifacts whose start time is unknown.
    pub fn undated(&self) -> &[Artifact] {
        &self.undated
    }

    /// Dated and undated artifacts together.
    pub fn artifact_count(&self) -> usize {
        self.days.values().map(Day::len).sum::<usize>() + self.undated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.artifact_count() == 0
    }
}
