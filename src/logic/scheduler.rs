//! Match time scheduling from players' UTC offsets.
//!
//! With history for an offset set, the scheduler returns the running mean of past match
//! times. Without history it computes the UTC hours when every player is awake.

use crate::logic::store::TimeRecordStore;
use crate::models::{
    normalize_hour, OffsetKey, Proposal, SchedulerError, SchedulerSettings, TimeRecord,
    TimeUpdate, TimeWindow, HOURS_PER_DAY,
};

/// Attempts at the read-modify-write in `set_time` before giving up.
pub const MAX_UPDATE_ATTEMPTS: usize = 8;

/// Parse raw offsets ("+9", "-5", "5.5"), truncating toward zero.
/// Unparseable values, trailing garbage ("5abc"), and anything not strictly within
/// 24 hours of UTC are dropped; the result is sorted and deduplicated.
pub fn verify_offsets<I, S>(raw: I) -> OffsetKey
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    OffsetKey::new(raw.into_iter().filter_map(|s| {
        let v: f64 = s.as_ref().trim().parse().ok()?;
        (v.abs() < HOURS_PER_DAY).then(|| v.trunc() as i32)
    }))
}

/// Pick whichever of `observed`, `observed - 24`, `observed + 24` is strictly closest to `mean`.
pub fn unwrap_toward(mean: f64, observed: f64) -> f64 {
    let mut best = observed;
    for candidate in [observed - HOURS_PER_DAY, observed + HOURS_PER_DAY] {
        if (mean - candidate).abs() < (mean - best).abs() {
            best = candidate;
        }
    }
    best
}

/// Fold one observed match time into an existing record.
///
/// The spread adds the new sample's squared deviation from the midpoint of the old and
/// new means, which damps the effect of a single outlier.
pub fn update_record(existing: &TimeRecord, observed: f64) -> TimeRecord {
    if existing.count == 0 {
        return TimeRecord::first(observed);
    }
    let observed = unwrap_toward(existing.time, normalize_hour(observed));
    let n = f64::from(existing.count);
    let mean = (existing.time * n + observed) / (n + 1.0);

    let mut variance_sum = existing.stdev.map_or(0.0, |s| s * s * (n - 1.0));
    let centre = (existing.time + mean) / 2.0;
    variance_sum += (observed - centre).powi(2);

    TimeRecord {
        time: normalize_hour(mean),
        count: existing.count + 1,
        stdev: Some((variance_sum / n).sqrt()),
    }
}

pub struct Scheduler<S> {
    store: S,
    settings: SchedulerSettings,
}

impl<S: TimeRecordStore> Scheduler<S> {
    pub fn new(store: S, settings: SchedulerSettings) -> Self {
        Self { store, settings }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn settings(&self) -> SchedulerSettings {
        self.settings
    }

    /// Recorded mean for exactly this offset set, if any match used it before.
    pub fn get_time(&self, key: &OffsetKey) -> Option<TimeRecord> {
        self.store.get(key)
    }

    /// Record a played match starting at `observed` (UTC hours).
    ///
    /// The update is an optimistic read-modify-write: if another writer changed the record
    /// in between, the new value is recomputed from the fresh record.
    pub fn set_time(&self, key: &OffsetKey, observed: f64) -> Result<TimeUpdate, SchedulerError> {
        if !observed.is_finite() {
            return Err(SchedulerError::InvalidTime(observed));
        }
        if key.is_empty() {
            return Err(SchedulerError::NoOffsets);
        }
        for attempt in 1..=MAX_UPDATE_ATTEMPTS {
            let previous = self.store.get(key);
            let current = match &previous {
                Some(existing) => update_record(existing, observed),
                None => TimeRecord::first(observed),
            };
            if self.store.compare_and_swap(key, previous.as_ref(), current) {
                log::info!(
                    "Match time for {} is now {} ({} match(es))",
                    key,
                    current.clock().format("%H:%M"),
                    current.count
                );
                return Ok(TimeUpdate {
                    key: key.clone(),
                    previous,
                    current,
                });
            }
            log::warn!("Time record for {} changed concurrently (attempt {})", key, attempt);
        }
        Err(SchedulerError::Contended(key.to_string(), MAX_UPDATE_ATTEMPTS))
    }

    /// True when `offset`'s local time at `utc_hour` is within the waking window.
    pub fn good_time(&self, utc_hour: u32, offset: i32) -> bool {
        let local = (utc_hour as i32 % 24 + offset.rem_euclid(24)).rem_euclid(24) as u32;
        (self.settings.earliest_local_hour..=self.settings.latest_local_hour).contains(&local)
    }

    fn all_good(&self, utc_hour: u32, key: &OffsetKey) -> bool {
        key.offsets().iter().all(|&o| self.good_time(utc_hour, o))
    }

    /// Every maximal run of UTC hours where all players are awake, in scan order.
    ///
    /// The scan starts just after the first bad hour so a window crossing midnight UTC
    /// is not split in two.
    pub fn generate_windows(&self, key: &OffsetKey) -> Vec<TimeWindow> {
        if key.is_empty() {
            return Vec::new();
        }
        let Some(first_bad) = (0..24).find(|&h| !self.all_good(h, key)) else {
            return vec![TimeWindow { start: 0, end: 23 }];
        };
        let mut windows = Vec::new();
        let mut start = None;
        for step in 1..=24 {
            let hour = (first_bad + step) % 24;
            match (self.all_good(hour, key), start) {
                (true, None) => start = Some(hour),
                (false, Some(s)) => {
                    windows.push(TimeWindow {
                        start: s,
                        end: (hour + 23) % 24,
                    });
                    start = None;
                }
                _ => {}
            }
        }
        windows
    }

    /// Longest window where every player is awake; `None` if there is none.
    pub fn generate_times(&self, key: &OffsetKey) -> Option<TimeWindow> {
        let mut best: Option<TimeWindow> = None;
        for w in self.generate_windows(key) {
            if best.map_or(true, |b| w.hours() > b.hours()) {
                best = Some(w);
            }
        }
        best
    }

    /// History if there is any, else a computed window, else `None` (schedule manually).
    pub fn propose(&self, key: &OffsetKey) -> Option<Proposal> {
        if let Some(record) = self.get_time(key) {
            return Some(Proposal::Consensus { record });
        }
        self.generate_times(key)
            .map(|window| Proposal::Window { window })
    }
}
