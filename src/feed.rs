use std::fs;
use std::path::Path;
use std::time::Duration;

use encoding_rs::UTF_8;
use tracing::{debug,info};

use super::error::{Result,Error};


const MAX_CACHE_AGE: Duration = Duration::from_secs(1800);


/// Returns the feed text, from `cache_path/<name>.csv` when that copy is
/// less than half an hour old and `refresh` is not set.
pub fn fetch(url: &str, cache_path: &Path, name: &str, refresh: bool) -> Result<String> {

    let cache_file = cache_path.join(format!("{}.csv", name));

    if !refresh && cache_file.exists() && fs::metadata(&cache_file)?.modified()?.elapsed()
	.map_or(false, |age| age < MAX_CACHE_AGE) {
	debug!(path = %cache_file.display(), "using cached feed");
	return Ok(decode(&fs::read(&cache_file)?));
    }

    let data = download(url)?;
    fs::create_dir_all(cache_path)?;
    fs::write(&cache_file, &data)?;
    Ok(decode(&data))

}


fn download(url: &str) -> Result<Vec<u8>> {
    info!(url, "downloading feed");
    let res = reqwest::blocking::get(url)?;
    match res.status().as_u16() {
	200 => Ok(res.bytes()?.to_vec()),
	_ => Err(Error::HttpError(res.status())),
    }
}


/// UTF-8 with an optional byte order mark; invalid sequences are replaced.
pub fn decode(bytes: &[u8]) -> String {
    UTF_8.decode_with_bom_removal(bytes).0.into_owned()
}
