use chrono::Duration;
use chrono::naive::NaiveDate;

use super::error::Result;


/// Number of days since the epoch. Signed, so that "last week" of an early
/// reference day can be expressed without wrapping.
pub type Day = i64;

/// Day zero of every series. Fixed once per run.
#[derive(Clone,Copy,Debug,PartialEq,Eq)]
pub struct Epoch(NaiveDate);

impl Epoch {

    pub fn new(date: NaiveDate) -> Self {
	Self(date)
    }

    pub fn date(&self) -> NaiveDate {
	self.0
    }

    pub fn offset(&self, date: NaiveDate) -> Day {
	date.signed_duration_since(self.0).num_days()
    }

    pub fn day(&self, day: Day) -> NaiveDate {
	self.0 + Duration::days(day)
    }

    /// Calendar dates of the days `start..=end`.
    pub fn range(&self, start: Day, end: Day) -> NaiveDateRange {
	NaiveDateRange(self.day(start), Some(self.day(end)))
    }

}

impl Default for Epoch {
    fn default() -> Self {
	Self(NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or(NaiveDate::MIN))
    }
}


pub fn parse_date(value: &str) -> Result<NaiveDate> {
    Ok(NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")?)
}


#[derive(Clone,Debug)]
pub struct NaiveDateRange(pub NaiveDate, pub Option<NaiveDate>);

impl Iterator for NaiveDateRange {
    type Item = NaiveDate;
    fn next(&mut self) -> Option<NaiveDate> {
	match self.1.map_or(true, |end| self.0 <= end) {
	    false => None,
	    true => {
		let current = self.0;
		self.0 = self.0.succ_opt()?;
		Some(current)
	    }
	}
    }
}
