use std::fs::File;
use std::io;
use std::path::{Path,PathBuf};
use std::process;

use clap::{Parser,Subcommand};
use tracing::{error,info};
use tracing_subscriber::EnvFilter;

use covid19_rates::{Config,Epoch,FeedLayout,PopulationList,SeriesBuilder};
use covid19_rates::error::Result;
use covid19_rates::{feed,refday,report};
use covid19_rates::ranking::TOP;
use covid19_rates::report::{Summary,WorldSummary};


#[derive(Parser)]
#[command(name = "covid19-rates")]
#[command(about = "Rolling 7-day case rates for UK areas and world countries", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// UK areas: rates report, alerts and CSV extracts
    Areas {
	/// TOML configuration file
	#[arg(value_name = "CONFIG")]
	config: PathBuf,

	/// Ignore the cached feed and download it again
	#[arg(long)]
	refresh: bool,

	/// Number of areas in the highest-rates list
	#[arg(long)]
	top: Option<usize>,
    },
    /// World countries: rates and vaccination progress
    World {
	/// TOML configuration file; built-in defaults are used without one
	#[arg(short, long)]
	config: Option<PathBuf>,

	/// Ignore the cached feed and download it again
	#[arg(long)]
	refresh: bool,

	/// Number of countries in each ranking
	#[arg(long)]
	top: Option<usize>,
    },
}


fn main() {

    tracing_subscriber::fmt()
	.with_env_filter(EnvFilter::try_from_default_env()
			 .unwrap_or_else(|_| EnvFilter::new("info")))
	.with_writer(io::stderr)
	.init();

    let result = match Cli::parse().command {
	Command::Areas { config, refresh, top } => areas(&config, refresh, top),
	Command::World { config, refresh, top } => world(config.as_deref(), refresh, top),
    };

    if let Err(err) = result {
	error!("{}", err);
	process::exit(1);
    }

}


fn areas(config_path: &Path, refresh: bool, top: Option<usize>) -> Result<()> {

    let config = Config::load(config_path)?;
    let population = PopulationList::read(File::open(&config.population_file)?)?;
    info!(areas = population.len(), path = %config.population_file.display(), "read population list");

    let text = feed::fetch(&config.feed.url, &config.cache_dir, "uk-cases", refresh)?;
    let mut builder = SeriesBuilder::closed(config.epoch, population);
    builder.ingest(&config.feed, &text)?;
    let ingested = builder.finish()?;

    let ref_day = refday::detect(&ingested, &config.bellwether)?;
    let summary = Summary::build(&ingested, ref_day, &config.places, &config.bellwether,
				 top.unwrap_or(config.top), config.alert_multiplier)?;
    for line in summary.lines() {
	println!("{}", line);
    }

    report::save_extracts(&config.data_dir, "", &ingested, ref_day,
			  &config.places, config.graph_start)?;
    summary.save(&config.data_dir.join(format!("{}-summary.json",
					       ingested.newest_date().format("%Y%m%d"))))?;

    Ok(())

}


fn world(config_path: Option<&Path>, refresh: bool, top: Option<usize>) -> Result<()> {

    let config = config_path.map(Config::load).transpose()?;
    let (layout, epoch, cache_path, places, n) = match &config {
	Some(config) => (config.world_feed.clone(), config.epoch, config.cache_dir.clone(),
			 config.world_places.clone(), config.top),
	None => (FeedLayout::world(), Epoch::default(), PathBuf::from("cache"),
		 ["United Kingdom", "France", "Italy", "Germany"].iter()
		 .map(|name| name.to_string()).collect(), TOP),
    };

    let text = feed::fetch(&layout.url, &cache_path, "owid", refresh)?;
    let mut builder = SeriesBuilder::open(epoch);
    builder.ingest(&layout, &text)?;
    let ingested = builder.finish()?;

    for line in WorldSummary::build(&ingested, &places, top.unwrap_or(n)).lines() {
	println!("{}", line);
    }

    if let Some(config) = &config {
	report::save_extracts(&config.data_dir, "world-", &ingested, ingested.newest,
			      &config.world_places, config.graph_start)?;
    }

    Ok(())

}
