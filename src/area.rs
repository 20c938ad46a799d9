use std::collections::{BTreeMap,HashMap};

use lazy_static::lazy_static;
use serde::Serialize;

use super::dates::Day;
use super::error::{Result,Error};


lazy_static! {
    static ref CATEGORIES: HashMap<&'static str,&'static str> = vec![
	("E06", "UTLA"),
	("E07", "LTLA"),
	("E08", "Borough"),
	("E09", "London Borough"),
	("E10", "County"),
	("E12", "Region"),
	("E92", "Nation"),
    ].into_iter().collect();
}

pub const UNKNOWN_CATEGORY: &str = "Unknown";

/// Administrative level label, looked up from the first three characters
/// of the area code.
pub fn category(id: &str) -> &'static str {
    id.get(0..3).and_then(|prefix| CATEGORIES.get(prefix))
	.copied().unwrap_or(UNKNOWN_CATEGORY)
}


#[derive(Clone,Copy,Debug,PartialEq,Serialize)]
pub struct Vaccinations {
    pub count: u64,
    pub day: Day,
}


/// Mutable form of an area, alive only while a feed is being ingested.
#[derive(Debug)]
pub struct AreaBuilder {
    id: String,
    name: String,
    population: f64,
    cases: BTreeMap<usize,u64>,
    vaccinations: Option<Vaccinations>,
}

impl AreaBuilder {

    pub fn new(id: impl Into<String>, name: impl Into<String>, population: f64) -> Result<Self> {
	let name = name.into();
	match population.is_finite() && population > 0.0 {
	    false => Err(Error::InvalidPopulation { name, population }),
	    true => Ok(Self {
		id: id.into(),
		name,
		population,
		cases: BTreeMap::new(),
		vaccinations: None,
	    })
	}
    }

    pub fn id(&self) -> &str {
	&self.id
    }

    /// Sets the count for `day`; a repeated day overwrites the earlier value.
    /// Days before the epoch are never stored.
    pub fn record_case(&mut self, day: Day, count: u64) {
	if day >= 0 {
	    self.cases.insert(day as usize, count);
	}
    }

    /// Keeps the highest cumulative total seen so far. Lower or equal
    /// values (stale or duplicate rows) are ignored, and the watermark
    /// date never moves backwards.
    pub fn record_vaccination(&mut self, day: Day, count: u64) {
	match self.vaccinations.as_mut() {
	    Some(current) if count <= current.count => {},
	    Some(current) => {
		current.count = count;
		current.day = current.day.max(day);
	    },
	    None => self.vaccinations = Some(Vaccinations { count, day }),
	}
    }

    pub fn freeze(self) -> Area {
	let len = self.cases.keys().next_back().map_or(0, |last| last + 1);
	let mut cases = vec![0; len];
	for (day,count) in self.cases {
	    cases[day] = count;
	}
	Area {
	    category: category(&self.id),
	    id: self.id,
	    name: self.name,
	    population: self.population,
	    cases,
	    vaccinations: self.vaccinations,
	}
    }

}


/// A UK subdivision or a country, read-only once ingestion has finished.
#[derive(Clone,Debug,PartialEq)]
pub struct Area {
    id: String,
    name: String,
    population: f64,
    category: &'static str,
    cases: Vec<u64>,
    vaccinations: Option<Vaccinations>,
}

impl Area {

    pub fn id(&self) -> &str {
	&self.id
    }

    pub fn name(&self) -> &str {
	&self.name
    }

    pub fn population(&self) -> f64 {
	self.population
    }

    pub fn category(&self) -> &'static str {
	self.category
    }

    /// Daily counts from day 0 up to the last day this area was reported.
    pub fn cases(&self) -> &[u64] {
	&self.cases
    }

    pub fn cases_on(&self, day: Day) -> u64 {
	match day < 0 {
	    true => 0,
	    false => self.cases.get(day as usize).copied().unwrap_or(0)
	}
    }

    /// Last day with a stored count, if any.
    pub fn last_day(&self) -> Option<Day> {
	match self.cases.len() {
	    0 => None,
	    n => Some(n as Day - 1)
	}
    }

    pub fn vaccinations(&self) -> Option<Vaccinations> {
	self.vaccinations
    }

    /// Cumulative vaccinations per 100 population, zero when unknown.
    pub fn vaccination_share(&self) -> f64 {
	self.vaccinations.map_or(0.0, |v| v.count as f64 / self.population * 100.0)
    }

    /// Cases over the window `end - days + 1 ..= end`. Days outside the
    /// stored series count as zero.
    pub fn cases_over_interval(&self, end: Day, days: Day) -> u64 {
	let start = (end - days + 1).max(0);
	let stop = (end + 1).min(self.cases.len() as Day);
	match start < stop {
	    false => 0,
	    true => self.cases[start as usize..stop as usize].iter().sum()
	}
    }

    /// Incidence per 100,000 population over the window ending at `end`.
    pub fn rate_over_interval(&self, end: Day, days: Day) -> f64 {
	self.cases_over_interval(end, days) as f64 / self.population * 100000.0
    }

    /// Rate over the whole series up to `day`, using `day` as the window
    /// length, which leaves out day 0 itself.
    pub fn total_rate(&self, day: Day) -> f64 {
	self.rate_over_interval(day, day)
    }

}
