//! Line reports and the CSV extracts used for plotting.

use std::{fmt,fs,io};
use std::fs::File;
use std::path::{Path,PathBuf};

use chrono::naive::NaiveDate;
use serde::Serialize;
use tracing::info;

use super::area::Area;
use super::dates::{Day,Epoch,parse_date};
use super::error::{Result,Error};
use super::ingest::Ingested;
use super::ranking::{self,WEEK};


const DATE_FORMAT: &str = "%Y-%m-%d";
const LEADING_COLUMNS: [&str; 4] = ["Code", "Name", "Population", "Type"];


pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}


/// One line of the rates report.
#[derive(Clone,Debug,PartialEq,Serialize)]
pub struct AreaRates {
    pub code: String,
    pub name: String,
    pub this_week: f64,
    pub last_week: f64,
    pub total: f64,
    pub population: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_day: Option<Day>,
}

impl AreaRates {

    pub fn at(area: &Area, day: Day) -> Self {
	Self {
	    code: area.id().to_string(),
	    name: area.name().to_string(),
	    this_week: area.rate_over_interval(day, WEEK),
	    last_week: area.rate_over_interval(day - WEEK, WEEK),
	    total: area.total_rate(day),
	    population: area.population(),
	    ref_day: None,
	}
    }

    /// Rates at the area's own latest day, which is also printed.
    pub fn latest(area: &Area) -> Self {
	let day = area.last_day().unwrap_or(0);
	Self { ref_day: Some(day), ..Self::at(area, day) }
    }

}

impl fmt::Display for AreaRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	write!(f, "{}, This Week: {:.2}, Last Week: {:.2}, Total: {:.2}, Population: {:.0}",
	       self.name, self.this_week, self.last_week, self.total, self.population)?;
	if let Some(day) = self.ref_day {
	    write!(f, ", Ref Day: {}", day)?;
	}
	Ok(())
    }
}


#[derive(Clone,Debug,PartialEq,Serialize)]
pub struct VaccinationRates {
    pub name: String,
    pub vaccinations: u64,
    pub per_hundred: f64,
    pub as_of: Option<NaiveDate>,
}

impl VaccinationRates {
    pub fn of(area: &Area, epoch: Epoch) -> Self {
	let vaccinations = area.vaccinations();
	Self {
	    name: area.name().to_string(),
	    vaccinations: vaccinations.map_or(0, |v| v.count),
	    per_hundred: area.vaccination_share(),
	    as_of: vaccinations.map(|v| epoch.day(v.day)),
	}
    }
}

impl fmt::Display for VaccinationRates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	write!(f, "{}, Vaccinations: {}, Per 100: {:.2}, As Of: ", self.name, self.vaccinations, self.per_hundred)?;
	match self.as_of {
	    Some(date) => write!(f, "{}", date.format(DATE_FORMAT)),
	    None => write!(f, "-"),
	}
    }
}


/// Everything printed by the areas report, kept for the JSON summary.
#[derive(Clone,Debug,Serialize)]
pub struct Summary {
    pub newest_date: NaiveDate,
    pub reference_date: NaiveDate,
    pub places: Vec<AreaRates>,
    /// Configured length of the highest-rates list.
    pub top_n: usize,
    pub top: Vec<AreaRates>,
    pub bellwether: String,
    pub alert_multiplier: f64,
    pub alert_threshold: f64,
    pub alerts: Vec<AreaRates>,
}

impl Summary {

    pub fn build(ingested: &Ingested, ref_day: Day, places: &[String], bellwether: &str,
		 top: usize, alert_multiplier: f64) -> Result<Self> {
	let areas = &ingested.areas;
	let nation = areas.get(bellwether).ok_or_else(|| Error::MissingRegion(bellwether.to_string()))?;
	let threshold = ranking::alert_threshold(nation, ref_day, alert_multiplier);
	let rates = |selected: Vec<&Area>| -> Vec<AreaRates> {
	    selected.into_iter().map(|area| AreaRates::at(area, ref_day)).collect()
	};
	Ok(Self {
	    newest_date: ingested.newest_date(),
	    reference_date: ingested.epoch.day(ref_day),
	    places: rates(areas.select(places)),
	    top_n: top,
	    top: rates(ranking::top_by_rate(areas, ref_day, top)),
	    bellwether: nation.name().to_string(),
	    alert_multiplier,
	    alert_threshold: threshold,
	    alerts: rates(ranking::above_threshold(areas, ref_day, threshold)),
	})
    }

    pub fn lines(&self) -> Vec<String> {
	let mut lines = vec![format!("Reference date: {}", self.reference_date.format(DATE_FORMAT)),
			     "Rates in defined places".to_string()];
	lines.extend(self.places.iter().map(AreaRates::to_string));
	lines.push(String::new());
	lines.push(format!("{} highest rates over the past week", self.top_n));
	lines.extend(self.top.iter().map(AreaRates::to_string));
	lines.push(String::new());
	lines.push(format!("Places above {} x the {} rate ({:.2} per 100k)",
			   self.alert_multiplier, self.bellwether, self.alert_threshold));
	lines.extend(self.alerts.iter().map(AreaRates::to_string));
	lines
    }

    pub fn save(&self, path: &Path) -> Result<()> {
	serde_json::to_writer_pretty(io::BufWriter::new(File::create(path)?), self)?;
	info!(path = %path.display(), "wrote summary");
	Ok(())
    }

}


/// Countries at their own latest day, plus vaccination progress.
#[derive(Clone,Debug,Serialize)]
pub struct WorldSummary {
    pub top_n: usize,
    pub top: Vec<AreaRates>,
    pub places: Vec<AreaRates>,
    pub vaccinations: Vec<VaccinationRates>,
}

impl WorldSummary {

    pub fn build(ingested: &Ingested, places: &[String], top: usize) -> Self {
	let areas = &ingested.areas;
	Self {
	    top_n: top,
	    top: ranking::top_by_latest_rate(areas, top).into_iter().map(AreaRates::latest).collect(),
	    places: areas.select(places).into_iter().map(AreaRates::latest).collect(),
	    vaccinations: ranking::top_by_vaccination(areas, top).into_iter()
		.map(|area| VaccinationRates::of(area, ingested.epoch)).collect(),
	}
    }

    pub fn lines(&self) -> Vec<String> {
	let mut lines: Vec<String> = self.top.iter().map(AreaRates::to_string).collect();
	lines.push(String::new());
	lines.extend(self.places.iter().map(AreaRates::to_string));
	lines.push(String::new());
	lines.push(format!("{} highest vaccination rates", self.top_n));
	lines.extend(self.vaccinations.iter().map(VaccinationRates::to_string));
	lines
    }

}


/// Writes the raw, 7-day and (with a graph start) per-place extracts into
/// `dir`, returning the paths written.
pub fn save_extracts(dir: &Path, prefix: &str, ingested: &Ingested, ref_day: Day,
		     places: &[String], graph_start: Option<NaiveDate>) -> Result<Vec<PathBuf>> {

    let epoch = ingested.epoch;
    let stamp = ingested.newest_date().format("%Y%m%d");
    let mut written = Vec::new();

    let raw = dir.join(format!("{}-{}places-raw.csv", stamp, prefix));
    Extract::raw(&ingested.areas, epoch, 0, ingested.newest).save(&raw)?;
    written.push(raw);

    let seven_day = dir.join(format!("{}places-7day.csv", prefix));
    Extract::seven_day(&ingested.areas, epoch, 0, ref_day).save(&seven_day)?;
    written.push(seven_day);

    if let Some(start) = graph_start {
	let graph = dir.join(format!("{}places-graph.csv", prefix));
	Extract::seven_day(ingested.areas.select(places), epoch, epoch.offset(start), ref_day)
	    .save(&graph)?;
	written.push(graph);
    }

    Ok(written)

}


#[derive(Clone,Debug,PartialEq)]
pub struct ExtractRow {
    pub code: String,
    pub name: String,
    pub population: f64,
    pub category: String,
    pub values: Vec<f64>,
}

/// A table with one row per area and one column per calendar day.
#[derive(Clone,Debug,PartialEq)]
pub struct Extract {
    pub dates: Vec<NaiveDate>,
    pub rows: Vec<ExtractRow>,
}

impl Extract {

    fn build<'a, I, F>(areas: I, epoch: Epoch, start: Day, end: Day, value: F) -> Self
    where I: IntoIterator<Item = &'a Area>, F: Fn(&Area, Day) -> f64 {
	let start = start.max(0);
	Self {
	    dates: epoch.range(start, end).collect(),
	    rows: areas.into_iter().map(|area| ExtractRow {
		code: area.id().to_string(),
		name: area.name().to_string(),
		population: area.population(),
		category: area.category().to_string(),
		values: (start..=end).map(|day| value(area, day)).collect(),
	    }).collect(),
	}
    }

    /// Daily counts for `start..=end`, zero where nothing was reported.
    pub fn raw<'a, I>(areas: I, epoch: Epoch, start: Day, end: Day) -> Self
    where I: IntoIterator<Item = &'a Area> {
	Self::build(areas, epoch, start, end, |area, day| area.cases_on(day) as f64)
    }

    /// Trailing 7-day rates, rounded to two decimals. Columns start no
    /// earlier than the first day with a full week behind it.
    pub fn seven_day<'a, I>(areas: I, epoch: Epoch, start: Day, end: Day) -> Self
    where I: IntoIterator<Item = &'a Area> {
	Self::build(areas, epoch, start.max(WEEK - 1), end,
		    |area, day| round2(area.rate_over_interval(day, WEEK)))
    }

    pub fn write<W: io::Write>(&self, writer: W) -> Result<()> {
	let mut writer = csv::Writer::from_writer(writer);
	let header = LEADING_COLUMNS.iter().map(|c| c.to_string())
	    .chain(self.dates.iter().map(|d| d.format(DATE_FORMAT).to_string()));
	writer.write_record(header)?;
	for row in &self.rows {
	    let fields = vec![row.code.clone(), row.name.clone(),
			      row.population.to_string(), row.category.clone()].into_iter()
		.chain(row.values.iter().map(|v| v.to_string()));
	    writer.write_record(fields)?;
	}
	writer.flush()?;
	Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
	if let Some(dir) = path.parent() {
	    fs::create_dir_all(dir)?;
	}
	self.write(io::BufWriter::new(File::create(path)?))?;
	info!(path = %path.display(), rows = self.rows.len(), days = self.dates.len(), "wrote extract");
	Ok(())
    }

    pub fn read<R: io::Read>(reader: R) -> Result<Self> {

	let mut reader = csv::Reader::from_reader(reader);
	let header = reader.headers()?.clone();
	if header.len() < LEADING_COLUMNS.len() {
	    return Err(Error::malformed(1, "extract header is too short"));
	}
	let dates = header.iter().skip(LEADING_COLUMNS.len())
	    .map(parse_date).collect::<Result<Vec<_>>>()?;

	let mut rows = Vec::new();
	for record in reader.records() {
	    let record = record?;
	    let line = record.position().map_or(0, |p| p.line());
	    let number = |value: &str| value.parse::<f64>().map_err(
		|_| Error::malformed(line, format!("bad number {:?}", value)));
	    rows.push(ExtractRow {
		code: record[0].to_string(),
		name: record[1].to_string(),
		population: number(&record[2])?,
		category: record[3].to_string(),
		values: record.iter().skip(LEADING_COLUMNS.len())
		    .map(&number).collect::<Result<_>>()?,
	    });
	}

	Ok(Self { dates, rows })

    }

    pub fn load(path: &Path) -> Result<Self> {
	Self::read(io::BufReader::new(File::open(path)?))
    }

}


#[cfg(test)]
mod tests {

    use super::*;
    use crate::area::AreaBuilder;

    fn area(id: &str, name: &str, population: f64, cases: &[u64]) -> Area {
	let mut builder = AreaBuilder::new(id, name, population).unwrap();
	for (day,count) in cases.iter().enumerate() {
	    builder.record_case(day as Day, *count);
	}
	builder.freeze()
    }

    #[test]
    fn line_report_format() {
	let hartlepool = area("E06000001", "Hartlepool", 93663.0,
			      &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14]);
	assert_eq!(AreaRates::at(&hartlepool, 14).to_string(),
		   "Hartlepool, This Week: 82.21, Last Week: 29.89, Total: 112.10, Population: 93663");
    }

    #[test]
    fn world_line_carries_the_ref_day() {
	let israel = area("Israel", "Israel", 9000000.0, &[0, 900, 90]);
	assert_eq!(AreaRates::latest(&israel).to_string(),
		   "Israel, This Week: 11.00, Last Week: 0.00, Total: 11.00, Population: 9000000, Ref Day: 2");
    }

    #[test]
    fn vaccination_line() {
	let mut builder = AreaBuilder::new("Israel", "Israel", 9000000.0).unwrap();
	builder.record_vaccination(10, 1800000);
	let line = VaccinationRates::of(&builder.freeze(), Epoch::default()).to_string();
	assert_eq!(line, "Israel, Vaccinations: 1800000, Per 100: 20.00, As Of: 2020-01-11");
	let none = AreaBuilder::new("Chad", "Chad", 16000000.0).unwrap().freeze();
	assert_eq!(VaccinationRates::of(&none, Epoch::default()).to_string(),
		   "Chad, Vaccinations: 0, Per 100: 0.00, As Of: -");
    }

    #[test]
    fn raw_extract_pads_short_series() {
	let areas = vec![area("E06000001", "Hartlepool", 93663.0, &[1, 2]),
			 area("W06000001", "Anglesey", 70000.0, &[1, 2, 3, 4])];
	let extract = Extract::raw(&areas, Epoch::default(), 0, 3);
	let mut out = Vec::new();
	extract.write(&mut out).unwrap();
	assert_eq!(String::from_utf8(out).unwrap(), "\
Code,Name,Population,Type,2020-01-01,2020-01-02,2020-01-03,2020-01-04
E06000001,Hartlepool,93663,UTLA,1,2,0,0
W06000001,Anglesey,70000,Unknown,1,2,3,4
");
    }

    #[test]
    fn seven_day_extract_starts_after_a_full_week() {
	let areas = vec![area("E06000001", "Hartlepool", 100000.0, &[1; 10])];
	let extract = Extract::seven_day(&areas, Epoch::default(), 0, 9);
	assert_eq!(extract.dates.first().map(|d| d.to_string()).as_deref(), Some("2020-01-07"));
	assert_eq!(extract.dates.len(), 4);
	assert_eq!(extract.rows[0].values, vec![7.0; 4]);
    }

    #[test]
    fn extract_survives_a_write_and_read() {
	let areas = vec![area("E06000001", "Hartlepool, Town", 93663.0, &[3, 1, 4, 1, 5, 9, 2, 6])];
	let extract = Extract::seven_day(&areas, Epoch::default(), 6, 7);
	let mut out = Vec::new();
	extract.write(&mut out).unwrap();
	assert_eq!(Extract::read(out.as_slice()).unwrap(), extract);
    }

    #[test]
    fn malformed_extracts_are_rejected() {
	let bad_date = "Code,Name,Population,Type,yesterday\nX,Y,1,Unknown,2\n";
	assert!(Extract::read(bad_date.as_bytes()).is_err());
	let bad_value = "Code,Name,Population,Type,2020-01-01\nX,Y,1,Unknown,two\n";
	assert!(matches!(Extract::read(bad_value.as_bytes()), Err(Error::FeedMalformed { line: 2, .. })));
    }

    #[test]
    fn rounding() {
	assert_eq!(round2(0.499999), 0.5);
	assert_eq!(round2(12.344), 12.34);
	assert_eq!(round2(0.0), 0.0);
    }

}
