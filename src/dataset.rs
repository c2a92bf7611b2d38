//! Dataset formatting: raw observation records to a canonical, sorted,
//! windowed dataset.
//!
//! Raw records arrive with a status that may be a numeric code, an English
//! label, or a caller-defined label (for example a translated one). The
//! formatter normalizes the status, validates each record, computes
//! per-unit interarrival times, filters to the analysis window and sorts by
//! right-interval time.
//!
//! The canonical row layout is `[left, right, quantity, status_code,
//! interarrival]`.
//!
//! # Examples
//!
//! ```
//! use u_reliability::config::AnalysisConfig;
//! use u_reliability::dataset::{format_dataset, RawRecord, Status};
//!
//! let records = vec![
//!     RawRecord::new("A", 0.0, 30.0, "failure", 1),
//!     RawRecord::new("B", 0.0, 10.0, 2, 2), // code 2 = right censored
//!     RawRecord::new("A", 30.0, 45.0, Status::IntervalCensored, 1),
//! ];
//! let data = format_dataset(&records, &AnalysisConfig::default()).unwrap();
//! let rows = data.to_rows();
//! assert_eq!(rows[0], [0.0, 10.0, 2.0, 2.0, f64::INFINITY]);
//! assert_eq!(rows[1], [0.0, 30.0, 1.0, 1.0, 30.0]);
//! assert_eq!(data.n_failures(), 2);
//! assert_eq!(data.n_suspensions(), 2);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use tracing::debug;

use crate::config::AnalysisConfig;
use crate::error::{ReliabilityError, Result};

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Censoring status of one observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Status {
    /// Exact failure time known.
    Event,
    /// Survived past the observation time.
    RightCensored,
    /// Failed at some time before the observation time.
    LeftCensored,
    /// Failed somewhere inside `[left, right]`.
    IntervalCensored,
}

impl Status {
    /// Numeric status code used in canonical rows (1 to 4).
    pub fn code(self) -> u8 {
        match self {
            Status::Event => 1,
            Status::RightCensored => 2,
            Status::LeftCensored => 3,
            Status::IntervalCensored => 4,
        }
    }

    /// Parses a numeric status code.
    pub fn from_code(code: i64) -> Result<Self> {
        match code {
            1 => Ok(Status::Event),
            2 => Ok(Status::RightCensored),
            3 => Ok(Status::LeftCensored),
            4 => Ok(Status::IntervalCensored),
            other => Err(ReliabilityError::invalid(format!(
                "unknown status code {other}"
            ))),
        }
    }

    /// Whether the observation records a failure (exact or censored).
    pub fn is_failure(self) -> bool {
        !matches!(self, Status::RightCensored)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Status::Event => "Event",
            Status::RightCensored => "Right Censored",
            Status::LeftCensored => "Left Censored",
            Status::IntervalCensored => "Interval Censored",
        };
        f.write_str(label)
    }
}

impl FromStr for Status {
    type Err = ReliabilityError;

    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .to_ascii_lowercase()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        match key.as_str() {
            "1" | "event" | "failure" | "fail" | "f" | "exact" => Ok(Status::Event),
            "2" | "rightcensored" | "right" | "suspension" | "suspended" | "s" | "censored"
            | "survivor" => Ok(Status::RightCensored),
            "3" | "leftcensored" | "left" => Ok(Status::LeftCensored),
            "4" | "intervalcensored" | "interval" => Ok(Status::IntervalCensored),
            _ => Err(ReliabilityError::invalid(format!("unknown status label {s:?}"))),
        }
    }
}

/// Caller-supplied status labels, such as translated UI strings.
///
/// Lookup is case-insensitive; labels not in the map fall back to the
/// built-in English labels and numeric codes.
///
/// ```
/// use u_reliability::dataset::{Status, StatusAliases};
/// let mut aliases = StatusAliases::default();
/// aliases.insert("Fallo", Status::Event);
/// assert_eq!(aliases.resolve("fallo").unwrap(), Status::Event);
/// assert_eq!(aliases.resolve("suspension").unwrap(), Status::RightCensored);
/// ```
#[derive(Debug, Clone, Default)]
pub struct StatusAliases {
    labels: HashMap<String, Status>,
}

impl StatusAliases {
    /// Registers `label` for `status`.
    pub fn insert(&mut self, label: &str, status: Status) {
        self.labels.insert(label.trim().to_lowercase(), status);
    }

    /// Resolves a label through the aliases, then the built-in labels.
    pub fn resolve(&self, label: &str) -> Result<Status> {
        match self.labels.get(&label.trim().to_lowercase()) {
            Some(&status) => Ok(status),
            None => label.parse(),
        }
    }
}

/// Status as it appears in a raw record.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RawStatus {
    /// Already normalized.
    Known(Status),
    /// Numeric code 1 to 4.
    Code(i64),
    /// Text label.
    Label(String),
}

impl From<Status> for RawStatus {
    fn from(s: Status) -> Self {
        RawStatus::Known(s)
    }
}

impl From<i64> for RawStatus {
    fn from(code: i64) -> Self {
        RawStatus::Code(code)
    }
}

impl From<i32> for RawStatus {
    fn from(code: i32) -> Self {
        RawStatus::Code(i64::from(code))
    }
}

impl From<&str> for RawStatus {
    fn from(label: &str) -> Self {
        RawStatus::Label(label.to_string())
    }
}

impl From<String> for RawStatus {
    fn from(label: String) -> Self {
        RawStatus::Label(label)
    }
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

/// One raw observation tuple as supplied by the caller.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RawRecord {
    /// Unit (system, serial number) identifier.
    pub unit: String,
    /// Interval start time.
    pub left: f64,
    /// Interval end time.
    pub right: f64,
    /// Status in any accepted form.
    pub status: RawStatus,
    /// Number of simultaneous occurrences.
    pub quantity: u32,
    /// Observation date.
    pub date: Option<NaiveDate>,
}

impl RawRecord {
    /// Creates a record without a date.
    pub fn new(
        unit: impl Into<String>,
        left: f64,
        right: f64,
        status: impl Into<RawStatus>,
        quantity: u32,
    ) -> Self {
        Self {
            unit: unit.into(),
            left,
            right,
            status: status.into(),
            quantity,
            date: None,
        }
    }

    /// Attaches an observation date.
    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }
}

/// A validated observation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Observation {
    /// Unit identifier.
    pub unit: String,
    /// Interval start, `left <= right`.
    pub left: f64,
    /// Interval end.
    pub right: f64,
    /// Multiplicity, at least 1.
    pub quantity: u32,
    /// Censoring status.
    pub status: Status,
    /// Observation date.
    pub date: Option<NaiveDate>,
    /// Time since the unit's previous failure; infinite for suspensions.
    pub interarrival: f64,
}

impl Observation {
    /// Representative time: the right time for exact failures and
    /// suspensions, the interval midpoint for left/interval censoring.
    pub fn time(&self) -> f64 {
        match self.status {
            Status::Event | Status::RightCensored => self.right,
            Status::LeftCensored | Status::IntervalCensored => 0.5 * (self.left + self.right),
        }
    }

    /// Multiplicity as a likelihood weight.
    pub fn weight(&self) -> f64 {
        f64::from(self.quantity)
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Sorted, windowed, immutable set of observations.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Dataset {
    observations: Vec<Observation>,
    start: f64,
    end: f64,
    grouped: bool,
}

impl Dataset {
    /// Dataset of exact failures, one unit per time.
    ///
    /// # Errors
    /// Same as [`format_dataset`].
    pub fn from_failures(times: &[f64]) -> Result<Self> {
        let records: Vec<RawRecord> = times
            .iter()
            .enumerate()
            .map(|(i, &t)| RawRecord::new(i.to_string(), 0.0, t, Status::Event, 1))
            .collect();
        format_dataset(&records, &AnalysisConfig::default())
    }

    /// Observations sorted by right time.
    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.observations.len()
    }

    /// Whether there are no rows.
    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Analysis window `[start, end]`.
    pub fn window(&self) -> (f64, f64) {
        (self.start, self.end)
    }

    /// Whether counts are grouped into intervals.
    pub fn is_grouped(&self) -> bool {
        self.grouped
    }

    /// Canonical `[left, right, quantity, status_code, interarrival]` rows.
    pub fn to_rows(&self) -> Vec<[f64; 5]> {
        self.observations
            .iter()
            .map(|o| {
                [
                    o.left,
                    o.right,
                    f64::from(o.quantity),
                    f64::from(o.status.code()),
                    o.interarrival,
                ]
            })
            .collect()
    }

    /// Copy with every row of quantity `q` split into `q` unit rows.
    pub fn expanded(&self) -> Dataset {
        let observations = self
            .observations
            .iter()
            .flat_map(|o| {
                (0..o.quantity).map(move |_| Observation {
                    quantity: 1,
                    ..o.clone()
                })
            })
            .collect();
        Dataset {
            observations,
            ..self.clone_meta()
        }
    }

    fn clone_meta(&self) -> Dataset {
        Dataset {
            observations: Vec::new(),
            start: self.start,
            end: self.end,
            grouped: self.grouped,
        }
    }

    /// Exact failures.
    pub fn events(&self) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(|o| o.status == Status::Event)
    }

    /// Suspensions.
    pub fn right_censored(&self) -> impl Iterator<Item = &Observation> {
        self.observations
            .iter()
            .filter(|o| o.status == Status::RightCensored)
    }

    /// Left- and interval-censored failures.
    pub fn interval_censored(&self) -> impl Iterator<Item = &Observation> {
        self.observations.iter().filter(|o| {
            matches!(o.status, Status::LeftCensored | Status::IntervalCensored)
        })
    }

    /// Total failures (any failure status), counting quantities.
    pub fn n_failures(&self) -> usize {
        self.observations
            .iter()
            .filter(|o| o.status.is_failure())
            .map(|o| o.quantity as usize)
            .sum()
    }

    /// Total suspensions, counting quantities.
    pub fn n_suspensions(&self) -> usize {
        self.right_censored().map(|o| o.quantity as usize).sum()
    }

    /// Total weight of all rows.
    pub fn total_quantity(&self) -> usize {
        self.observations.iter().map(|o| o.quantity as usize).sum()
    }

    /// Pooled failure times, one entry per failure, ascending.
    pub fn failure_times(&self) -> Vec<f64> {
        let mut times: Vec<f64> = self
            .observations
            .iter()
            .filter(|o| o.status.is_failure())
            .flat_map(|o| std::iter::repeat(o.time()).take(o.quantity as usize))
            .collect();
        times.sort_by(f64::total_cmp);
        times
    }

    /// Per-unit times between failures of the failure rows, in row order.
    ///
    /// A row of quantity `q` contributes its interarrival time followed by
    /// `q − 1` zero gaps.
    pub fn times_between_failures(&self) -> Vec<f64> {
        self.observations
            .iter()
            .filter(|o| o.status.is_failure())
            .flat_map(|o| {
                std::iter::once(o.interarrival)
                    .chain(std::iter::repeat(0.0).take(o.quantity as usize - 1))
            })
            .collect()
    }

    /// Distinct unit identifiers in first-seen order.
    pub fn units(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for o in &self.observations {
            if !seen.contains(&o.unit.as_str()) {
                seen.push(&o.unit);
            }
        }
        seen
    }
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

/// Formats raw records using the built-in status labels.
///
/// # Errors
/// - [`ReliabilityError::InvalidInput`] for an unknown status, non-finite
///   times, `left > right`, or zero quantity.
/// - [`ReliabilityError::InsufficientData`] when nothing remains after
///   windowing.
pub fn format_dataset(records: &[RawRecord], config: &AnalysisConfig) -> Result<Dataset> {
    format_dataset_with(records, config, &StatusAliases::default())
}

/// Formats raw records, resolving text statuses through `aliases`.
pub fn format_dataset_with(
    records: &[RawRecord],
    config: &AnalysisConfig,
    aliases: &StatusAliases,
) -> Result<Dataset> {
    let start = config.start_time;
    let end = config.end();

    let mut observations = Vec::with_capacity(records.len());
    for rec in records {
        let obs = normalize(rec, aliases)?;
        if (start..=end).contains(&obs.right) {
            observations.push(obs);
        }
    }

    if observations.is_empty() {
        return Err(ReliabilityError::insufficient(1, 0));
    }

    assign_interarrival(&mut observations);
    observations.sort_by(|a, b| {
        a.right
            .total_cmp(&b.right)
            .then(a.status.cmp(&b.status))
            .then_with(|| a.unit.cmp(&b.unit))
    });

    let data = Dataset {
        observations,
        start,
        end,
        grouped: config.grouped,
    };
    debug!(
        rows = data.len(),
        failures = data.n_failures(),
        suspensions = data.n_suspensions(),
        "formatted dataset"
    );
    Ok(data)
}

fn normalize(rec: &RawRecord, aliases: &StatusAliases) -> Result<Observation> {
    let status = match &rec.status {
        RawStatus::Known(s) => *s,
        RawStatus::Code(c) => Status::from_code(*c)?,
        RawStatus::Label(l) => aliases.resolve(l)?,
    };

    if !rec.left.is_finite() || !rec.right.is_finite() {
        return Err(ReliabilityError::invalid(format!(
            "unit {}: interval [{}, {}] is not finite",
            rec.unit, rec.left, rec.right
        )));
    }
    if rec.quantity == 0 {
        return Err(ReliabilityError::invalid(format!(
            "unit {}: quantity must be at least 1",
            rec.unit
        )));
    }

    // Suspensions are often recorded with only the left (survival) time.
    let right = if status == Status::RightCensored && rec.right < rec.left {
        rec.left
    } else {
        rec.right
    };
    if rec.left > right {
        return Err(ReliabilityError::invalid(format!(
            "unit {}: left time {} exceeds right time {}",
            rec.unit, rec.left, right
        )));
    }

    Ok(Observation {
        unit: rec.unit.clone(),
        left: rec.left,
        right,
        quantity: rec.quantity,
        status,
        date: rec.date,
        interarrival: 0.0,
    })
}

fn assign_interarrival(observations: &mut [Observation]) {
    let mut by_unit: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (i, o) in observations.iter().enumerate() {
        by_unit.entry(o.unit.clone()).or_default().push(i);
    }
    for indices in by_unit.values_mut() {
        indices.sort_by(|&a, &b| observations[a].right.total_cmp(&observations[b].right));
        let mut previous = 0.0;
        for &i in indices.iter() {
            let o = &mut observations[i];
            if o.status == Status::RightCensored {
                o.interarrival = f64::INFINITY;
            } else {
                let t = o.time();
                o.interarrival = t - previous;
                previous = t;
            }
        }
    }
}
