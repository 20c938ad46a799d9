use std::fs;
use std::path::{Path,PathBuf};

use chrono::naive::NaiveDate;
use serde::Deserialize;

use super::dates::{Epoch,parse_date};
use super::error::{Result,Error};
use super::ingest::FeedLayout;
use super::ranking::TOP;


pub const DEFAULT_BELLWETHER: &str = "E92000001";
pub const DEFAULT_ALERT_MULTIPLIER: f64 = 4.0;


#[derive(Deserialize)]
struct RawConfig {
    data_dir: Option<PathBuf>,
    places: Option<String>,
    graph_start: Option<String>,
    epoch: Option<String>,
    bellwether: Option<String>,
    alert_multiplier: Option<f64>,
    top: Option<usize>,
    cache_dir: Option<PathBuf>,
    population_file: Option<PathBuf>,
    world_places: Option<Vec<String>>,
    feed: Option<FeedLayout>,
    world_feed: Option<FeedLayout>,
}


#[derive(Clone,Debug,PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub places: Vec<String>,
    pub graph_start: Option<NaiveDate>,
    pub epoch: Epoch,
    pub bellwether: String,
    pub alert_multiplier: f64,
    pub top: usize,
    pub cache_dir: PathBuf,
    pub population_file: PathBuf,
    pub world_places: Vec<String>,
    pub feed: FeedLayout,
    pub world_feed: FeedLayout,
}

impl Config {

    pub fn load(path: &Path) -> Result<Self> {
	Self::parse(&fs::read_to_string(path)?)
    }

    pub fn parse(text: &str) -> Result<Self> {
	let raw: RawConfig = toml::from_str(text)?;
	let data_dir = raw.data_dir.ok_or(Error::MissingConfigKey("data_dir"))?;
	let places = raw.places.ok_or(Error::MissingConfigKey("places"))?
	    .lines().map(str::trim).filter(|code| !code.is_empty())
	    .map(str::to_string).collect();
	Ok(Self {
	    population_file: data_dir.join(raw.population_file
					   .unwrap_or_else(|| PathBuf::from("population.csv"))),
	    data_dir,
	    places,
	    graph_start: raw.graph_start.as_deref().map(parse_date).transpose()?,
	    epoch: raw.epoch.as_deref().map(parse_date).transpose()?
		.map_or_else(Epoch::default, Epoch::new),
	    bellwether: raw.bellwether.unwrap_or_else(|| DEFAULT_BELLWETHER.to_string()),
	    alert_multiplier: raw.alert_multiplier.unwrap_or(DEFAULT_ALERT_MULTIPLIER),
	    top: raw.top.unwrap_or(TOP),
	    cache_dir: raw.cache_dir.unwrap_or_else(|| PathBuf::from("cache")),
	    world_places: raw.world_places.unwrap_or_default(),
	    feed: raw.feed.unwrap_or_else(FeedLayout::uk),
	    world_feed: raw.world_feed.unwrap_or_else(FeedLayout::world),
	})
    }

}


#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn minimal_config_gets_defaults() {
	let config = Config::parse(r#"
data_dir = "/srv/covid"
places = """
E92000001

E08000025
"""
"#).unwrap();
	assert_eq!(config.places, vec!["E92000001", "E08000025"]);
	assert_eq!(config.population_file, PathBuf::from("/srv/covid/population.csv"));
	assert_eq!(config.epoch, Epoch::default());
	assert_eq!(config.bellwether, DEFAULT_BELLWETHER);
	assert_eq!(config.top, 15);
	assert_eq!(config.graph_start, None);
	assert_eq!(config.feed, FeedLayout::uk());
	assert_eq!(config.world_feed, FeedLayout::world());
    }

    #[test]
    fn overrides() {
	let config = Config::parse(r#"
data_dir = "data"
places = "W06000001"
graph_start = "2020-09-01"
epoch = "2021-01-01"
alert_multiplier = 2.5
world_places = ["France", "Italy"]

[world_feed]
url = "http://localhost/owid.csv"
id_column = 0
name_column = 0
date_column = 1
new_case_column = 2
population_column = 3
"#).unwrap();
	assert_eq!(config.graph_start, NaiveDate::from_ymd_opt(2020, 9, 1));
	assert_eq!(config.epoch.date(), NaiveDate::from_ymd_opt(2021, 1, 1).unwrap());
	assert_eq!(config.alert_multiplier, 2.5);
	assert_eq!(config.world_places, vec!["France", "Italy"]);
	assert_eq!(config.world_feed.population_column, Some(3));
	assert_eq!(config.world_feed.vaccination_column, None);
	assert!(!config.world_feed.skip_zero_cases);
    }

    #[test]
    fn missing_keys_are_named() {
	assert!(matches!(Config::parse("places = \"E92000001\""),
			 Err(Error::MissingConfigKey("data_dir"))));
	assert!(matches!(Config::parse("data_dir = \"data\""),
			 Err(Error::MissingConfigKey("places"))));
    }

    #[test]
    fn malformed_values_are_errors() {
	assert!(matches!(Config::parse("data_dir = \"d\"\nplaces = \"x\"\ngraph_start = \"soon\""),
			 Err(Error::ParseDate(_))));
	assert!(matches!(Config::parse("data_dir = 3\nplaces = \"x\""),
			 Err(Error::Toml(_))));
    }

}
