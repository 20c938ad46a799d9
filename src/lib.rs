pub mod area;
pub mod config;
pub mod dates;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod ranking;
pub mod refday;
pub mod report;

pub use area::{Area,AreaBuilder};
pub use config::Config;
pub use dates::{Day,Epoch};
pub use error::{Result,Error};
pub use ingest::{FeedLayout,Ingested,PopulationList,SeriesBuilder};
