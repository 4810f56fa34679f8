use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::consolidated::ConsolidatedMenu;
use crate::error::SourceError;

/// Where the consolidated menu comes from.
pub trait MenuSource: Send + Sync {
    fn describe(&self) -> String;

    fn fetch(&self) -> Result<ConsolidatedMenu, SourceError>;
}

/// Menu document on local disk.
#[derive(Debug, Clone)]
pub struct FileMenuSource {
    path: PathBuf,
}

impl FileMenuSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MenuSource for FileMenuSource {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn fetch(&self) -> Result<ConsolidatedMenu, SourceError> {
        let content = fs::read_to_string(&self.path)?;
        ConsolidatedMenu::from_json(&content)
    }
}

/// Menu document published over HTTP.
pub struct HttpMenuSource {
    url: String,
    client: Client,
}

impl HttpMenuSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url: url.into(),
            client,
        })
    }
}

impl MenuSource for HttpMenuSource {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn fetch(&self) -> Result<ConsolidatedMenu, SourceError> {
        debug!(url = %self.url, "fetching menu");
        let response = self.client.get(&self.url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status.as_u16()));
        }
        Ok(response.json::<ConsolidatedMenu>()?)
    }
}

/// Pick a source by location: `http(s)://` URLs are fetched, anything else
/// is read as a file path.
pub fn source_for(location: &str, timeout: Duration) -> Result<Box<dyn MenuSource>, SourceError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpMenuSource::new(location, timeout)?))
    } else {
        Ok(Box::new(FileMenuSource::new(location)))
    }
}
