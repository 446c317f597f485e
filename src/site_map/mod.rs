//! Site maps: where instruments are, drawn on a projected basemap.
//!
//! Architecture:
//! ```text
//!  ObservatorySource            FileListing
//!        │                           │
//!        ▼                           ▼
//!   ┌────────────┐   create_map  ┌──────────────────┐
//!   │SiteRegistry│ ────────────▶ │     SiteMap      │ ◀── add_geo_contours /
//!   └────────────┘               │ groups, contours │     add_mag_contours
//!                                │ availability     │
//!                                └──────────────────┘
//!                                         │ plot
//!                                         ▼
//!                             Figure ──▶ display / save / return
//! ```

pub mod basemap;
pub mod contour;
pub mod geomag;
pub mod projection;
pub mod registry;
mod render;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::color::{parse_color, Rgb};
use crate::error::SiteMapError;
use crate::figure::Figure;
use crate::output::{deliver, OutputOptions, Rendered, Viewer};
use crate::style::{Marker, OneOrMany};

pub use basemap::Basemap;
pub use contour::{Contour, ContourOptions};
pub use geomag::{DipoleModel, GeomagneticModel};
pub use projection::Projection;
pub use registry::{
    FileListing, FileListingResult, Observatory, ObservatorySource, Site, SiteRegistry,
};
pub use render::DEFAULT_OCEAN_COLOR;

/// Per-site availability, keyed by instrument array then site UID.
pub type Availability = BTreeMap<String, BTreeMap<String, bool>>;

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// How one instrument array's sites are drawn.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteStyle {
    pub color: Rgb,
    pub marker: Marker,
    /// Marker size in points.
    pub size: f64,
}

/// The sites of one instrument array.
#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentGroup {
    pub instrument_array: String,
    pub sites: Vec<Site>,
    pub style: SiteStyle,
}

// ---------------------------------------------------------------------------
// create_map
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CreateMapOptions {
    /// One UID list shared by every instrument array, or one list per
    /// array. Unset means every site of each array.
    pub site_uids: Option<OneOrMany<Vec<String>>>,
    pub color: OneOrMany<String>,
    pub symbol: OneOrMany<String>,
    pub sym_size: OneOrMany<f64>,
}

impl Default for CreateMapOptions {
    fn default() -> Self {
        CreateMapOptions {
            site_uids: None,
            color: OneOrMany::One("black".to_string()),
            symbol: OneOrMany::One("o".to_string()),
            sym_size: OneOrMany::One(1.0),
        }
    }
}

/// Resolve the sites of each instrument array and build a [`SiteMap`].
pub fn create_map<S: ObservatorySource>(
    registry: &mut SiteRegistry<S>,
    projection: Projection,
    instrument_arrays: &[&str],
    options: &CreateMapOptions,
) -> Result<SiteMap, SiteMapError> {
    let n = instrument_arrays.len();
    if n == 0 {
        return Err(SiteMapError::NoInstrumentArrays);
    }

    let uid_lists: Vec<Option<Vec<String>>> = match &options.site_uids {
        None => vec![None; n],
        Some(OneOrMany::One(uids)) => vec![Some(uids.clone()); n],
        Some(OneOrMany::Many(lists)) if lists.len() == n => {
            lists.iter().cloned().map(Some).collect()
        }
        Some(OneOrMany::Many(lists)) => {
            return Err(SiteMapError::SiteListCount {
                expected: n,
                got: lists.len(),
            })
        }
    };

    let style_count = |name: &'static str| {
        move |got: usize| SiteMapError::StyleCount {
            name,
            expected: n,
            got,
        }
    };
    let colors = options.color.broadcast(n).map_err(style_count("color"))?;
    let symbols = options.symbol.broadcast(n).map_err(style_count("symbol"))?;
    let sizes = options.sym_size.broadcast(n).map_err(style_count("sym_size"))?;

    let mut groups = Vec::with_capacity(n);
    for (i, &array) in instrument_arrays.iter().enumerate() {
        let style = SiteStyle {
            color: parse_color(&colors[i])?,
            marker: symbols[i].parse()?,
            size: sizes[i],
        };
        let sites = registry.resolve(array, uid_lists[i].as_deref())?;
        groups.push(InstrumentGroup {
            instrument_array: array.to_string(),
            sites,
            style,
        });
    }

    let map = SiteMap::new(projection, groups);
    log::info!("Created {map}");
    Ok(map)
}

// ---------------------------------------------------------------------------
// SiteMap
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct SiteMap {
    pub projection: Projection,
    pub groups: Vec<InstrumentGroup>,
    /// Set by [`SiteMap::add_availability`].
    pub availability: Option<Availability>,
    pub contours: Vec<Contour>,
    pub basemap: Basemap,
}

impl SiteMap {
    pub fn new(projection: Projection, groups: Vec<InstrumentGroup>) -> Self {
        SiteMap {
            projection,
            groups,
            availability: None,
            contours: Vec::new(),
            basemap: Basemap::default(),
        }
    }

    pub fn set_basemap(&mut self, basemap: Basemap) {
        self.basemap = basemap;
    }

    pub fn site_count(&self) -> usize {
        self.groups.iter().map(|g| g.sites.len()).sum()
    }

    pub fn site_uids(&self) -> Vec<Vec<String>> {
        self.groups
            .iter()
            .map(|g| g.sites.iter().map(|s| s.uid.clone()).collect())
            .collect()
    }

    pub fn instrument_arrays(&self) -> Vec<&str> {
        self.groups
            .iter()
            .map(|g| g.instrument_array.as_str())
            .collect()
    }

    /// Multi-line description.
    pub fn describe(&self) -> String {
        let mut out = String::from("SiteMap:\n");
        out += &format!("  {:<19}: Projection({})\n", "projection", self.projection);
        out += &format!("  {:<19}: {:?}\n", "instrument_array", self.instrument_arrays());
        out += &format!("  {:<19}: {:?}\n", "site_uid_list", self.site_uids());
        out += &format!("  {:<19}: {}\n", "site_locations", self.locations_summary());
        out += &format!("  {:<19}: {}\n", "contours", self.contours.len());
        out
    }

    pub fn pretty_print(&self) {
        print!("{}", self.describe());
    }

    fn locations_summary(&self) -> String {
        format!(
            "Dict[{} site(s) across {} instrument(s)]",
            self.site_count(),
            self.groups.len()
        )
    }

    // -----------------------------------------------------------------------
    // Availability
    // -----------------------------------------------------------------------

    /// Record, for every site, whether `listing` has any files of the
    /// matching dataset between `start` and `end`. Dataset names pair up
    /// with instrument arrays positionally, and each must contain its
    /// array's name (case-insensitive).
    pub fn add_availability<L, D>(
        &mut self,
        listing: &L,
        dataset_names: &[D],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<(), SiteMapError>
    where
        L: FileListing + ?Sized,
        D: AsRef<str>,
    {
        if dataset_names.len() > self.groups.len() {
            return Err(SiteMapError::TooManyDatasets {
                groups: self.groups.len(),
                got: dataset_names.len(),
            });
        }
        for (group, dataset) in self.groups.iter().zip(dataset_names) {
            let dataset = dataset.as_ref();
            let array = group.instrument_array.to_uppercase();
            if !dataset.to_uppercase().contains(&array) {
                return Err(SiteMapError::DatasetMismatch {
                    dataset: dataset.to_string(),
                    instrument_array: array,
                });
            }
        }

        let mut availability = Availability::new();
        for (group, dataset) in self.groups.iter().zip(dataset_names) {
            let dataset = dataset.as_ref();
            let mut sites = BTreeMap::new();
            for site in &group.sites {
                let result = listing
                    .get_urls(dataset, start, end, Some(&site.uid))
                    .map_err(SiteMapError::Collaborator)?;
                sites.insert(site.uid.clone(), result.count > 0);
            }
            log::debug!(
                "{dataset}: {} of {} sites have data",
                sites.values().filter(|&&v| v).count(),
                sites.len()
            );
            availability.insert(group.instrument_array.clone(), sites);
        }

        self.availability = if availability.is_empty() {
            None
        } else {
            Some(availability)
        };
        Ok(())
    }

    /// Sites of `group` to draw. With `enforce` set, sites recorded as
    /// having no data are dropped; groups or sites with no record are kept.
    pub fn visible_sites<'a>(&self, group: &'a InstrumentGroup, enforce: bool) -> Vec<&'a Site> {
        let record = match (&self.availability, enforce) {
            (Some(availability), true) => availability.get(&group.instrument_array),
            _ => None,
        };
        group
            .sites
            .iter()
            .filter(|site| record.and_then(|r| r.get(&site.uid)).copied().unwrap_or(true))
            .collect()
    }

    // -----------------------------------------------------------------------
    // Contours
    // -----------------------------------------------------------------------

    pub fn add_geo_contours(&mut self, options: &ContourOptions) -> Result<(), SiteMapError> {
        let contours = contour::geo_contours(&self.projection, options)?;
        self.contours.extend(contours);
        Ok(())
    }

    /// Geomagnetic contours using the centred-dipole model.
    pub fn add_mag_contours(
        &mut self,
        options: &ContourOptions,
        timestamp: DateTime<Utc>,
    ) -> Result<(), SiteMapError> {
        self.add_mag_contours_with(options, timestamp, &DipoleModel)
    }

    pub fn add_mag_contours_with(
        &mut self,
        options: &ContourOptions,
        timestamp: DateTime<Utc>,
        model: &dyn GeomagneticModel,
    ) -> Result<(), SiteMapError> {
        let contours = contour::mag_contours(&self.projection, options, timestamp, model)?;
        self.contours.extend(contours);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Plotting
    // -----------------------------------------------------------------------

    /// Draw the map over `extent` = `[min_lon, max_lon, min_lat, max_lat]`,
    /// then display, save or return it according to `options.output`.
    ///
    /// Land and borders come from the basemap given to [`SiteMap::set_basemap`]
    /// (see [`basemap::load_geojson`]). A map without one is drawn as ocean
    /// only, with sites and contours on top.
    pub fn plot(
        &self,
        extent: [f64; 4],
        options: &MapPlotOptions,
        viewer: &mut dyn Viewer,
    ) -> Result<Rendered, SiteMapError> {
        self.check_enforcement(options)?;
        let mut warnings = Vec::new();
        let mode = options.output.resolve(&mut warnings)?;
        let figure = render::compose_map(self, extent, options)?;
        Ok(deliver(figure, mode, viewer, warnings)?)
    }

    /// Build the map figure without delivering it.
    pub fn compose(&self, extent: [f64; 4], options: &MapPlotOptions) -> Result<Figure, SiteMapError> {
        self.check_enforcement(options)?;
        render::compose_map(self, extent, options)
    }

    fn check_enforcement(&self, options: &MapPlotOptions) -> Result<(), SiteMapError> {
        if options.enforce_data_availability && self.availability.is_none() {
            return Err(SiteMapError::AvailabilityMissing);
        }
        Ok(())
    }
}

impl fmt::Display for SiteMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SiteMap(projection=Projection({}), site_locations={}, site_uid_list={:?}, instrument_array(s)={:?})",
            self.projection,
            self.locations_summary(),
            self.site_uids(),
            self.instrument_arrays()
        )
    }
}

// ---------------------------------------------------------------------------
// Plot options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct MapPlotOptions {
    /// Label each site with its UID.
    pub label: bool,
    pub upper_label: bool,
    /// Only draw sites that had data (requires prior availability).
    pub enforce_data_availability: bool,
    /// Inches.
    pub figsize: (f64, f64),
    pub title: Option<String>,
    /// [`DEFAULT_OCEAN_COLOR`] when unset.
    pub ocean_color: Option<String>,
    pub land_color: String,
    pub land_edgecolor: String,
    pub borders_color: String,
    pub borders_disable: bool,
    #[serde(flatten)]
    pub output: OutputOptions,
}

impl Default for MapPlotOptions {
    fn default() -> Self {
        MapPlotOptions {
            label: true,
            upper_label: false,
            enforce_data_availability: false,
            figsize: (6.4, 4.8),
            title: None,
            ocean_color: None,
            land_color: "gray".to_string(),
            land_edgecolor: "#8A8A8A".to_string(),
            borders_color: "#AEAEAE".to_string(),
            borders_disable: false,
            output: OutputOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    use super::*;
    use crate::figure::AxesKind;

    fn observatories(array: &str, uid: Option<&str>) -> anyhow::Result<Vec<Observatory>> {
        let all: Vec<Observatory> = match array {
            "norstar_riometer" => vec![("gill", 56.38, -94.64), ("daws", 64.05, -139.11), ("rabb", 58.22, -103.68)],
            "swan_hsr" => vec![("fsmi", 60.03, -111.93)],
            other => anyhow::bail!("unknown array {other}"),
        }
        .into_iter()
        .map(|(uid, lat, lon)| Observatory {
            uid: uid.to_string(),
            geodetic_latitude: lat,
            geodetic_longitude: lon,
        })
        .collect();
        Ok(match uid {
            Some(uid) => all.into_iter().filter(|o| o.uid == uid).collect(),
            None => all,
        })
    }

    fn listing(
        _dataset: &str,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
        site: Option<&str>,
    ) -> anyhow::Result<FileListingResult> {
        let count = if site == Some("daws") { 0 } else { 24 };
        Ok(FileListingResult {
            count,
            urls: Vec::new(),
        })
    }

    fn day() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2023, 11, 5, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 11, 5, 23, 59, 59).unwrap(),
        )
    }

    fn two_arrays() -> SiteMap {
        let mut registry = SiteRegistry::new(observatories);
        let options = CreateMapOptions {
            color: OneOrMany::Many(vec!["red".into(), "#0000FF".into()]),
            ..Default::default()
        };
        create_map(
            &mut registry,
            Projection::plate_carree(),
            &["norstar_riometer", "swan_hsr"],
            &options,
        )
        .unwrap()
    }

    #[test]
    fn create_resolves_every_group() {
        let map = two_arrays();
        assert_eq!(map.site_count(), 4);
        assert_eq!(map.groups[1].style.color, Rgb::new(0, 0, 255));
        assert_eq!(map.groups[0].style.marker, Marker::Circle);
        assert_eq!(map.groups[1].style.size, 1.0);
        assert_eq!(
            map.to_string(),
            "SiteMap(projection=Projection(PlateCarree(central_longitude=0)), \
             site_locations=Dict[4 site(s) across 2 instrument(s)], \
             site_uid_list=[[\"gill\", \"daws\", \"rabb\"], [\"fsmi\"]], \
             instrument_array(s)=[\"norstar_riometer\", \"swan_hsr\"])"
        );
        assert!(map.describe().starts_with("SiteMap:\n  projection"));
    }

    #[test]
    fn create_validates_counts() {
        let mut registry = SiteRegistry::new(observatories);
        let pc = Projection::plate_carree();
        assert!(matches!(
            create_map(&mut registry, pc, &[], &CreateMapOptions::default()),
            Err(SiteMapError::NoInstrumentArrays)
        ));
        let options = CreateMapOptions {
            site_uids: Some(OneOrMany::Many(vec![vec!["gill".into()]; 3])),
            ..Default::default()
        };
        assert!(matches!(
            create_map(&mut registry, pc, &["norstar_riometer", "swan_hsr"], &options),
            Err(SiteMapError::SiteListCount { expected: 2, got: 3 })
        ));
        let options = CreateMapOptions {
            sym_size: OneOrMany::Many(vec![4.0]),
            ..Default::default()
        };
        assert!(matches!(
            create_map(&mut registry, pc, &["norstar_riometer", "swan_hsr"], &options),
            Err(SiteMapError::StyleCount { name: "sym_size", .. })
        ));
    }

    #[test]
    fn create_with_shared_uid_list() {
        let mut registry = SiteRegistry::new(observatories);
        let options = CreateMapOptions {
            site_uids: Some(OneOrMany::One(vec!["rabb".into(), "gill".into()])),
            ..Default::default()
        };
        let map = create_map(&mut registry, Projection::plate_carree(), &["norstar_riometer"], &options)
            .unwrap();
        assert_eq!(map.site_uids(), vec![vec!["rabb".to_string(), "gill".to_string()]]);
    }

    #[test]
    fn availability_filters_sites() {
        let mut map = two_arrays();
        let (start, end) = day();
        map.add_availability(&listing, &["NORSTAR_RIOMETER_K0_TXT"], start, end)
            .unwrap();

        let availability = map.availability.as_ref().unwrap();
        assert_eq!(availability["norstar_riometer"]["daws"], false);
        assert!(!availability.contains_key("swan_hsr"));

        let riometers = map.visible_sites(&map.groups[0], true);
        assert_eq!(riometers.iter().map(|s| s.uid.as_str()).collect::<Vec<_>>(), ["gill", "rabb"]);
        assert_eq!(map.visible_sites(&map.groups[0], false).len(), 3);
        // no record for the HSR group, so nothing is filtered
        assert_eq!(map.visible_sites(&map.groups[1], true).len(), 1);
    }

    #[test]
    fn availability_checks_dataset_names() {
        let mut map = two_arrays();
        let (start, end) = day();
        let err = map
            .add_availability(&listing, &["SWAN_HSR_K0_H5"], start, end)
            .unwrap_err();
        assert!(matches!(err, SiteMapError::DatasetMismatch { .. }));
        assert!(map.availability.is_none());

        let err = map
            .add_availability(&listing, &["a", "b", "c"], start, end)
            .unwrap_err();
        assert!(matches!(err, SiteMapError::TooManyDatasets { groups: 2, got: 3 }));
    }

    #[test]
    fn compose_layers() {
        let mut map = two_arrays();
        map.add_geo_contours(&ContourOptions {
            bring_to_front: true,
            ..ContourOptions::constant_lats([60.0])
        })
        .unwrap();
        let options = MapPlotOptions {
            upper_label: true,
            title: Some("Sites".into()),
            ..Default::default()
        };
        let fig = map.compose([-145.0, -65.0, 35.0, 80.0], &options).unwrap();
        let ax = &fig.axes[0];
        assert!(matches!(ax.kind, AxesKind::Map { .. }));
        assert_eq!(ax.title.as_deref(), Some("Sites"));
        assert_eq!(ax.x_range, Some((-145.0, -65.0)));
        assert_eq!(ax.background, parse_color(DEFAULT_OCEAN_COLOR).ok());
        // two marker groups and one contour
        assert_eq!(ax.lines.len(), 3);
        assert_eq!(ax.labels.len(), 4);
        assert_eq!(ax.labels[0].text, "GILL");
        assert_abs_diff_eq!(ax.labels[0].y, 57.38, epsilon = 1e-9);
        let drawn: Vec<i32> = ax.lines_by_z().iter().map(|l| l.z_order).collect();
        assert_eq!(drawn, vec![1, 1, 1]);
    }

    #[test]
    fn enforcing_without_availability_fails_first() {
        let map = two_arrays();
        let options = MapPlotOptions {
            enforce_data_availability: true,
            output: OutputOptions {
                returnfig: true,
                savefig: true,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            map.compose([-145.0, -65.0, 35.0, 80.0], &options),
            Err(SiteMapError::AvailabilityMissing)
        ));
    }

    #[test]
    fn options_from_json() {
        let opts: MapPlotOptions = serde_json::from_str(
            r#"{"label": false, "ocean_color": "navy", "returnfig": true, "figsize": [8, 6]}"#,
        )
        .unwrap();
        assert!(!opts.label);
        assert!(opts.output.returnfig);
        assert_eq!(opts.figsize, (8.0, 6.0));
        assert_eq!(opts.land_color, "gray");
    }
}
