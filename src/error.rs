use std::{io,fmt};
use std::convert::From;


pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
    IO(io::Error),
    CSV(csv::Error),
    JSON(serde_json::Error),
    Toml(toml::de::Error),
    Reqwest(reqwest::Error),
    HttpError(reqwest::StatusCode),
    ParseDate(chrono::format::ParseError),
    UnknownArea { id: String, name: String },
    MalformedPopulation { name: String, value: String },
    InvalidPopulation { name: String, population: f64 },
    MissingConfigKey(&'static str),
    FeedMalformed { line: u64, reason: String },
    MissingRegion(String),
    MissingData,
}

impl Error {

    pub(crate) fn malformed(line: u64, reason: impl Into<String>) -> Self {
	Self::FeedMalformed { line, reason: reason.into() }
    }

}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
	Self::IO(err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
	Self::CSV(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
	Self::JSON(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
	Self::Toml(err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
	Self::Reqwest(err)
    }
}

impl From<chrono::format::ParseError> for Error {
    fn from(err: chrono::format::ParseError) -> Self {
	Self::ParseDate(err)
    }
}


impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
	match self {
	    Self::IO(err) => write!(f, "I/O error: {}", err),
	    Self::CSV(err) => write!(f, "CSV error: {}", err),
	    Self::JSON(err) => write!(f, "JSON error: {}", err),
	    Self::Toml(err) => write!(f, "Config error: {}", err),
            Self::Reqwest(err) => write!(f, "Feed unreachable: {}", err),
	    Self::HttpError(err) => write!(f, "Feed unreachable: HTTP {}", err),
	    Self::ParseDate(err) => write!(f, "Date parse error: {}", err),
	    Self::UnknownArea { id, name } => write!(f, "Unknown place {} ({})", id, name),
	    Self::MalformedPopulation { name, value } =>
		write!(f, "Malformed population for {}: {:?}", name, value),
	    Self::InvalidPopulation { name, population } =>
		write!(f, "Invalid population for {}: {}", name, population),
	    Self::MissingConfigKey(key) => write!(f, "Missing config key: {}", key),
	    Self::FeedMalformed { line, reason } =>
		write!(f, "Malformed feed at line {}: {}", line, reason),
	    Self::MissingRegion(name) => write!(f, "Missing region: {}", name),
	    Self::MissingData => write!(f, "No data!"),
	}
    }
}

impl std::error::Error for Error {}
