//! Picks the last day whose counts can be trusted.
//!
//! The newest days of the feed are still being backfilled and show up as a
//! cliff: the day before is several times larger. We walk back over such
//! cliffs on the bellwether area and then drop one more day, which is still
//! typically under-reported by around ten percent.

use tracing::{debug,info};

use super::area::Area;
use super::dates::Day;
use super::error::{Result,Error};
use super::ingest::Ingested;


pub const CLIFF_FACTOR: u64 = 4;
pub const SAFETY_MARGIN: Day = 1;


/// Steps back from `start` while the preceding day is more than
/// `CLIFF_FACTOR` times the candidate. Stops at day 0.
pub fn scan_back(area: &Area, start: Day) -> Day {
    let mut day = start;
    while day > 0 && area.cases_on(day - 1) > area.cases_on(day).saturating_mul(CLIFF_FACTOR) {
	debug!(day, before = area.cases_on(day - 1), count = area.cases_on(day), "cliff");
	day -= 1;
    }
    day
}

/// Scans back from the area's own last day (never past `newest`) and
/// drops `SAFETY_MARGIN` days, never below day 0. Rerunning `scan_back`
/// on the series cut at its result returns the same day; the margin is
/// applied once on top of that and is not itself a fixed point.
pub fn reference_day(area: &Area, newest: Day) -> Result<Day> {
    let last = area.last_day().ok_or(Error::MissingData)?;
    let start = newest.min(last);
    Ok((scan_back(area, start) - SAFETY_MARGIN).max(0))
}

/// Reference day of an ingested feed, judged on the bellwether area.
pub fn detect(ingested: &Ingested, bellwether: &str) -> Result<Day> {
    let area = ingested.areas.get(bellwether)
	.ok_or_else(|| Error::MissingRegion(bellwether.to_string()))?;
    let day = reference_day(area, ingested.newest)?;
    info!(bellwether, newest = %ingested.newest_date(), reference = %ingested.epoch.day(day),
	  "reference day");
    Ok(day)
}
