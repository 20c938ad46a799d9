//! Folding unordered feed rows into per-area daily series.
//!
//! Two membership modes exist. A population list closes the set of valid
//! areas up front (UK feed); otherwise areas are opened the first time the
//! feed mentions them, using the population carried on the row itself
//! (world feed).

use std::collections::{HashMap,HashSet};
use std::io;

use chrono::naive::NaiveDate;
use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug,info,warn};

use super::area::{Area,AreaBuilder};
use super::dates::{Day,Epoch,parse_date};
use super::error::{Result,Error};


pub const UK_CASES_URL: &str = "https://coronavirus.data.gov.uk/downloads/csv/coronavirus-cases_latest.csv";
pub const OWID_URL: &str = "https://covid.ourworldindata.org/data/owid-covid-data.csv";


/// Column positions of a feed, in place of per-script constants.
#[derive(Clone,Debug,PartialEq,Deserialize)]
pub struct FeedLayout {
    pub url: String,
    pub id_column: usize,
    pub name_column: usize,
    pub date_column: usize,
    pub new_case_column: usize,
    #[serde(default)]
    pub population_column: Option<usize>,
    #[serde(default)]
    pub vaccination_column: Option<usize>,
    /// Names of pseudo-areas to ignore altogether.
    #[serde(default)]
    pub excluded: Vec<String>,
    /// Leave zero counts unrecorded, so a series ends at its last non-zero
    /// report.
    #[serde(default)]
    pub skip_zero_cases: bool,
}

impl FeedLayout {

    pub fn uk() -> Self {
	Self {
	    url: UK_CASES_URL.to_string(),
	    id_column: 1,
	    name_column: 0,
	    date_column: 3,
	    new_case_column: 4,
	    population_column: None,
	    vaccination_column: None,
	    excluded: vec![],
	    skip_zero_cases: false,
	}
    }

    pub fn world() -> Self {
	Self {
	    url: OWID_URL.to_string(),
	    id_column: 2,
	    name_column: 2,
	    date_column: 3,
	    new_case_column: 5,
	    population_column: Some(37),
	    vaccination_column: Some(34),
	    excluded: vec!["International".to_string()],
	    skip_zero_cases: true,
	}
    }

    pub fn parse(&self, row: &StringRecord, line: u64) -> Result<Record> {
	let field = |column: usize| row.get(column).ok_or_else(|| Error::malformed(
	    line, format!("expected at least {} columns, found {}", column + 1, row.len())));
	Ok(Record {
	    id: field(self.id_column)?.to_string(),
	    name: field(self.name_column)?.to_string(),
	    date: parse_date(field(self.date_column)?).map_err(
		|err| Error::malformed(line, err.to_string()))?,
	    cases: parse_count(field(self.new_case_column)?, line)?.unwrap_or(0),
	    population: match self.population_column {
		Some(column) => Some(field(column)?.to_string()),
		None => None
	    },
	    vaccinations: match self.vaccination_column {
		Some(column) => parse_count(field(column)?, line)?,
		None => None
	    },
	})
    }

}


#[derive(Clone,Debug,PartialEq)]
pub struct Record {
    pub id: String,
    pub name: String,
    pub date: NaiveDate,
    pub cases: u64,
    pub population: Option<String>,
    pub vaccinations: Option<u64>,
}


/// Empty means no value. Counts may come float-formatted ("12.0"); negative
/// corrections are clamped to zero.
fn parse_count(value: &str, line: u64) -> Result<Option<u64>> {
    let value = value.trim();
    if value.is_empty() {
	return Ok(None);
    }
    match value.parse::<f64>() {
	Ok(count) if count.is_finite() => Ok(Some(count.max(0.0) as u64)),
	_ => Err(Error::malformed(line, format!("bad count {:?}", value)))
    }
}


/// Parses a population that may use comma thousands separators.
pub fn parse_population(name: &str, value: &str) -> Result<f64> {
    value.trim().replace(',', "").parse::<f64>()
	.map_err(|_| Error::MalformedPopulation {
	    name: name.to_string(),
	    value: value.to_string()
	})
}


/// Areas read from the bootstrap `code,name,population` table.
#[derive(Debug,Default)]
pub struct PopulationList {
    areas: Vec<AreaBuilder>,
    skipped: Vec<Error>,
}

impl PopulationList {

    pub fn read<R: io::Read>(reader: R) -> Result<Self> {
	let mut list = Self::default();
	for row in csv::Reader::from_reader(reader).into_records() {
	    let row = row?;
	    let (id, name, population) = match (row.get(0), row.get(1), row.get(2)) {
		(Some(id), Some(name), Some(population)) => (id, name, population),
		_ => {
		    let line = row.position().map_or(0, |p| p.line());
		    return Err(Error::malformed(line, "population rows need code, name and population"));
		}
	    };
	    match parse_population(name, population)
		.and_then(|population| AreaBuilder::new(id, name, population)) {
		Ok(area) => list.areas.push(area),
		Err(err) => {
		    warn!("{}", err);
		    list.skipped.push(err);
		}
	    }
	}
	Ok(list)
    }

    pub fn len(&self) -> usize {
	self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
	self.areas.is_empty()
    }

}


enum Membership {
    Closed,
    Open,
}


pub struct SeriesBuilder {
    epoch: Epoch,
    membership: Membership,
    areas: Vec<AreaBuilder>,
    index: HashMap<String,usize>,
    newest: Option<Day>,
    skipped: Vec<Error>,
    warned: HashSet<String>,
}

impl SeriesBuilder {

    /// Only areas on the population list are accepted.
    pub fn closed(epoch: Epoch, population: PopulationList) -> Self {
	let mut builder = Self::new(epoch, Membership::Closed);
	builder.skipped = population.skipped;
	for area in population.areas {
	    match builder.index.get(area.id()) {
		Some(&i) => builder.areas[i] = area,
		None => {
		    builder.index.insert(area.id().to_string(), builder.areas.len());
		    builder.areas.push(area);
		}
	    }
	}
	builder
    }

    /// Areas are created on first sighting in the feed.
    pub fn open(epoch: Epoch) -> Self {
	Self::new(epoch, Membership::Open)
    }

    fn new(epoch: Epoch, membership: Membership) -> Self {
	Self {
	    epoch,
	    membership,
	    areas: Vec::new(),
	    index: HashMap::new(),
	    newest: None,
	    skipped: Vec::new(),
	    warned: HashSet::new(),
	}
    }

    /// Reads a whole CSV feed. The first line is a header and is discarded.
    pub fn ingest(&mut self, layout: &FeedLayout, text: &str) -> Result<()> {
	let mut reader = csv::ReaderBuilder::new()
	    .has_headers(true)
	    .flexible(true)
	    .from_reader(text.as_bytes());
	let mut rows = 0;
	for row in reader.records() {
	    let row = row?;
	    let line = row.position().map_or(0, |p| p.line());
	    self.push(layout, layout.parse(&row, line)?);
	    rows += 1;
	}
	info!(rows, areas = self.areas.len(), skipped = self.skipped.len(), "ingested feed");
	Ok(())
    }

    pub fn push(&mut self, layout: &FeedLayout, record: Record) {

	if layout.excluded.iter().any(|name| *name == record.name) {
	    return;
	}

	// rows before the epoch still open a world country, fixing its
	// first-seen order, but never carry a count
	let day = self.epoch.offset(record.date);
	let before_epoch = day < 0;
	match before_epoch {
	    true => {
		debug!(id = %record.id, date = %record.date, "row before epoch");
		if let Membership::Closed = self.membership {
		    return;
		}
	    },
	    false => self.newest = Some(self.newest.map_or(day, |newest| newest.max(day))),
	}

	let index = match self.index.get(&record.id).copied() {
	    Some(i) => i,
	    None => match self.membership {
		Membership::Closed => {
		    return self.skip(&record.id, Error::UnknownArea {
			id: record.id.clone(),
			name: record.name.clone()
		    });
		},
		Membership::Open => match self.open_area(&record) {
		    Ok(i) => i,
		    Err(err) => return self.skip(&record.id, err)
		}
	    }
	};
	if before_epoch {
	    return;
	}

	let area = &mut self.areas[index];
	if record.cases != 0 || !layout.skip_zero_cases {
	    area.record_case(day, record.cases);
	}
	if let Some(count) = record.vaccinations {
	    area.record_vaccination(day, count);
	}

    }

    fn open_area(&mut self, record: &Record) -> Result<usize> {
	let population = record.population.as_deref().unwrap_or("");
	let area = parse_population(&record.name, population)
	    .and_then(|population| AreaBuilder::new(record.id.as_str(), record.name.as_str(), population))?;
	let index = self.areas.len();
	self.index.insert(record.id.clone(), index);
	self.areas.push(area);
	Ok(index)
    }

    /// Each offending id is logged once; every dropped row is kept.
    fn skip(&mut self, id: &str, err: Error) {
	match self.warned.insert(id.to_string()) {
	    true => warn!("{}", err),
	    false => debug!("{}", err),
	}
	self.skipped.push(err);
    }

    pub fn finish(self) -> Result<Ingested> {
	let newest = self.newest.ok_or(Error::MissingData)?;
	Ok(Ingested {
	    epoch: self.epoch,
	    newest,
	    areas: self.areas.into_iter().map(AreaBuilder::freeze).collect(),
	    skipped: self.skipped,
	})
    }

}


/// Frozen result of an ingestion pass.
#[derive(Debug)]
pub struct Ingested {
    pub epoch: Epoch,
    /// Most recent day seen anywhere in the feed.
    pub newest: Day,
    pub areas: Areas,
    /// Rows and population entries that were dropped, in feed order.
    pub skipped: Vec<Error>,
}

impl Ingested {

    pub fn newest_date(&self) -> NaiveDate {
	self.epoch.day(self.newest)
    }

}


/// Areas in first-seen order, addressable by id.
#[derive(Clone,Debug,Default)]
pub struct Areas {
    areas: Vec<Area>,
    index: HashMap<String,usize>,
}

impl Areas {

    pub fn get(&self, id: &str) -> Option<&Area> {
	self.index.get(id).map(|&i| &self.areas[i])
    }

    pub fn iter(&self) -> std::slice::Iter<'_,Area> {
	self.areas.iter()
    }

    pub fn len(&self) -> usize {
	self.areas.len()
    }

    pub fn is_empty(&self) -> bool {
	self.areas.is_empty()
    }

    /// Looks up each id in turn; unknown ones are logged and left out.
    pub fn select<'a, I, S>(&'a self, ids: I) -> Vec<&'a Area>
    where I: IntoIterator<Item = S>, S: AsRef<str> {
	ids.into_iter().filter_map(|id| {
	    let id = id.as_ref();
	    let area = self.get(id);
	    if area.is_none() {
		warn!("Unrecognised place code: {}", id);
	    }
	    area
	}).collect()
    }

}

impl std::iter::FromIterator<Area> for Areas {
    fn from_iter<I: IntoIterator<Item = Area>>(iter: I) -> Self {
	let mut areas = Self::default();
	for area in iter {
	    match areas.index.get(area.id()) {
		Some(&i) => areas.areas[i] = area,
		None => {
		    areas.index.insert(area.id().to_string(), areas.areas.len());
		    areas.areas.push(area);
		}
	    }
	}
	areas
    }
}

impl<'a> IntoIterator for &'a Areas {
    type Item = &'a Area;
    type IntoIter = std::slice::Iter<'a,Area>;
    fn into_iter(self) -> Self::IntoIter {
	self.areas.iter()
    }
}
