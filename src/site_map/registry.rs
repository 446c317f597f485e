use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SiteMapError;

// ---------------------------------------------------------------------------
// Collaborator contracts
// ---------------------------------------------------------------------------

/// One observatory record as returned by the observatory listing service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observatory {
    pub uid: String,
    pub geodetic_latitude: f64,
    pub geodetic_longitude: f64,
}

/// Lists the observatories of an instrument array, optionally narrowed to
/// one site UID.
pub trait ObservatorySource {
    fn list_observatories(
        &self,
        instrument_array: &str,
        uid: Option<&str>,
    ) -> anyhow::Result<Vec<Observatory>>;
}

impl<F> ObservatorySource for F
where
    F: Fn(&str, Option<&str>) -> anyhow::Result<Vec<Observatory>>,
{
    fn list_observatories(
        &self,
        instrument_array: &str,
        uid: Option<&str>,
    ) -> anyhow::Result<Vec<Observatory>> {
        self(instrument_array, uid)
    }
}

/// Result of a file listing query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FileListingResult {
    pub count: usize,
    #[serde(default)]
    pub urls: Vec<String>,
}

/// Counts the data files of a dataset in a time range, optionally for one
/// site.
pub trait FileListing {
    fn get_urls(
        &self,
        dataset_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        site_uid: Option<&str>,
    ) -> anyhow::Result<FileListingResult>;
}

impl<F> FileListing for F
where
    F: Fn(&str, DateTime<Utc>, DateTime<Utc>, Option<&str>) -> anyhow::Result<FileListingResult>,
{
    fn get_urls(
        &self,
        dataset_name: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        site_uid: Option<&str>,
    ) -> anyhow::Result<FileListingResult> {
        self(dataset_name, start, end, site_uid)
    }
}

// ---------------------------------------------------------------------------
// Resolved sites
// ---------------------------------------------------------------------------

/// A site with its geodetic location in degrees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub uid: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<&Observatory> for Site {
    fn from(o: &Observatory) -> Self {
        Site {
            uid: o.uid.clone(),
            latitude: o.geodetic_latitude,
            longitude: o.geodetic_longitude,
        }
    }
}

// ---------------------------------------------------------------------------
// SiteRegistry – cached site resolution
// ---------------------------------------------------------------------------

/// Resolves `(instrument array, site UID)` pairs to locations, remembering
/// every answer so repeated map builds do not query the source again.
pub struct SiteRegistry<S> {
    source: S,
    sites: HashMap<(String, String), Site>,
    full_lists: HashMap<String, Vec<Site>>,
}

impl<S: ObservatorySource> SiteRegistry<S> {
    pub fn new(source: S) -> Self {
        SiteRegistry {
            source,
            sites: HashMap::new(),
            full_lists: HashMap::new(),
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Sites of `instrument_array`, in listing order when `uids` is `None`,
    /// otherwise in the requested order (duplicates collapse onto their
    /// first position). A UID the source does not know is an error.
    pub fn resolve(
        &mut self,
        instrument_array: &str,
        uids: Option<&[String]>,
    ) -> Result<Vec<Site>, SiteMapError> {
        let Some(uids) = uids else {
            return self.resolve_all(instrument_array);
        };

        let mut resolved: Vec<Site> = Vec::with_capacity(uids.len());
        for uid in uids {
            let site = self.resolve_one(instrument_array, uid)?;
            match resolved.iter_mut().find(|s| s.uid == site.uid) {
                Some(existing) => *existing = site,
                None => resolved.push(site),
            }
        }
        Ok(resolved)
    }

    fn resolve_all(&mut self, instrument_array: &str) -> Result<Vec<Site>, SiteMapError> {
        if let Some(sites) = self.full_lists.get(instrument_array) {
            return Ok(sites.clone());
        }
        let records = self
            .source
            .list_observatories(instrument_array, None)
            .map_err(SiteMapError::Collaborator)?;
        let sites: Vec<Site> = records.iter().map(Site::from).collect();
        log::debug!("Listed {} sites for {instrument_array}", sites.len());

        for site in &sites {
            self.sites.insert(
                (instrument_array.to_string(), site.uid.to_lowercase()),
                site.clone(),
            );
        }
        self.full_lists
            .insert(instrument_array.to_string(), sites.clone());
        Ok(sites)
    }

    fn resolve_one(&mut self, instrument_array: &str, uid: &str) -> Result<Site, SiteMapError> {
        let key = (instrument_array.to_string(), uid.to_lowercase());
        if let Some(site) = self.sites.get(&key) {
            return Ok(site.clone());
        }

        let records = self
            .source
            .list_observatories(instrument_array, Some(uid))
            .map_err(SiteMapError::Collaborator)?;
        let site = records
            .first()
            .map(Site::from)
            .ok_or_else(|| SiteMapError::SiteNotFound {
                uid: uid.to_string(),
                instrument_array: instrument_array.to_string(),
            })?;
        self.sites.insert(key, site.clone());
        Ok(site)
    }
}
