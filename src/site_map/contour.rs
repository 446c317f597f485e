//! Reference lines (parallels, meridians, custom paths) projected onto a
//! site map.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::color::{is_named_color, parse_color, Rgb};
use crate::error::{PlotError, SiteMapError};
use crate::style::{LineStyle, Marker, OneOrMany};

use super::geomag::GeomagneticModel;
use super::projection::Projection;

/// Points in a swept parallel: -180..=180 in 0.2 degree steps.
pub const PARALLEL_POINTS: usize = 1801;
/// Points in a swept meridian: -90..=90 in 0.1 degree steps.
pub const MERIDIAN_POINTS: usize = 1801;

const CONTOUR_LINESTYLES: [&str; 8] = ["-", "--", "-.", ":", "solid", "dashed", "dashdot", "dotted"];

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ContourOptions {
    /// Custom path latitudes; must come with `lons` of equal length.
    pub lats: Option<Vec<f64>>,
    pub lons: Option<Vec<f64>>,
    /// Lines of constant latitude, swept across all longitudes.
    pub constant_lats: Option<OneOrMany<f64>>,
    /// Lines of constant longitude, swept pole to pole.
    pub constant_lons: Option<OneOrMany<f64>>,
    /// A CSS4 colour name.
    pub color: String,
    pub linewidth: f64,
    pub linestyle: String,
    pub marker: String,
    /// Draw above the site markers.
    pub bring_to_front: bool,
}

impl Default for ContourOptions {
    fn default() -> Self {
        ContourOptions {
            lats: None,
            lons: None,
            constant_lats: None,
            constant_lons: None,
            color: "black".to_string(),
            linewidth: 1.0,
            linestyle: "solid".to_string(),
            marker: String::new(),
            bring_to_front: false,
        }
    }
}

impl ContourOptions {
    pub fn constant_lats(lats: impl Into<Vec<f64>>) -> Self {
        ContourOptions {
            constant_lats: Some(OneOrMany::Many(lats.into())),
            ..Default::default()
        }
    }

    pub fn constant_lons(lons: impl Into<Vec<f64>>) -> Self {
        ContourOptions {
            constant_lons: Some(OneOrMany::Many(lons.into())),
            ..Default::default()
        }
    }

    pub fn path(lats: Vec<f64>, lons: Vec<f64>) -> Self {
        ContourOptions {
            lats: Some(lats),
            lons: Some(lons),
            ..Default::default()
        }
    }

    /// Check every input and resolve the shared style. Nothing is projected
    /// until this succeeds.
    fn validate(&self) -> Result<ContourStyle, SiteMapError> {
        if self.lats.is_none()
            && self.lons.is_none()
            && self.constant_lats.is_none()
            && self.constant_lons.is_none()
        {
            return Err(SiteMapError::NoCoordinates);
        }
        let path = match (&self.lats, &self.lons) {
            (Some(lats), Some(lons)) => Some((lats.len(), lons.len())),
            (None, None) => None,
            _ => return Err(SiteMapError::UnpairedCoordinates),
        };

        if !is_named_color(&self.color) {
            return Err(PlotError::UnknownColor(self.color.clone()).into());
        }
        if !CONTOUR_LINESTYLES.contains(&self.linestyle.as_str()) {
            return Err(PlotError::UnknownLinestyle(self.linestyle.clone()).into());
        }
        if self.linewidth.is_nan() || self.linewidth <= 0.0 {
            return Err(SiteMapError::Linewidth);
        }
        if !Marker::CONTOUR_MARKERS.contains(&self.marker.as_str()) {
            return Err(PlotError::UnknownMarker(self.marker.clone()).into());
        }
        if let Some((n_lats, n_lons)) = path {
            if n_lats != n_lons {
                return Err(SiteMapError::CoordinateLength);
            }
        }

        Ok(ContourStyle {
            color: parse_color(&self.color)?,
            linewidth: self.linewidth,
            linestyle: self.linestyle.parse()?,
            marker: self.marker.parse()?,
            z_order: i32::from(self.bring_to_front),
        })
    }
}

// ---------------------------------------------------------------------------
// Contour
// ---------------------------------------------------------------------------

/// One projected contour, ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Contour {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    pub color: Rgb,
    pub linewidth: f64,
    pub linestyle: LineStyle,
    pub marker: Marker,
    /// 1 when brought to the front, else 0.
    pub z_order: i32,
}

#[derive(Debug, Clone, Copy)]
struct ContourStyle {
    color: Rgb,
    linewidth: f64,
    linestyle: LineStyle,
    marker: Marker,
    z_order: i32,
}

impl ContourStyle {
    fn contour(&self, projection: &Projection, lons: &[f64], lats: &[f64]) -> Contour {
        let (x, y) = projection.project_all(lons, lats);
        Contour {
            x,
            y,
            color: self.color,
            linewidth: self.linewidth,
            linestyle: self.linestyle,
            marker: self.marker,
            z_order: self.z_order,
        }
    }
}

/// Which coordinate is held fixed while the other is swept.
#[derive(Debug, Clone, Copy)]
enum Sweep {
    ConstantLat(f64),
    ConstantLon(f64),
}

impl Sweep {
    /// `(lons, lats)` along the sweep.
    fn points(self) -> (Vec<f64>, Vec<f64>) {
        match self {
            Sweep::ConstantLat(lat) => {
                let lons = linspace(-180.0, 180.0, PARALLEL_POINTS);
                let lats = vec![lat; lons.len()];
                (lons, lats)
            }
            Sweep::ConstantLon(lon) => {
                let lats = linspace(-90.0, 90.0, MERIDIAN_POINTS);
                let lons = vec![lon; lats.len()];
                (lons, lats)
            }
        }
    }

    /// Reorder both coordinate lists by the swept one.
    fn sort(self, lons: &mut Vec<f64>, lats: &mut Vec<f64>) {
        let key: &[f64] = match self {
            Sweep::ConstantLat(_) => &lons[..],
            Sweep::ConstantLon(_) => &lats[..],
        };
        let mut order: Vec<usize> = (0..key.len()).collect();
        order.sort_by(|&a, &b| key[a].total_cmp(&key[b]));
        *lons = order.iter().map(|&i| lons[i]).collect();
        *lats = order.iter().map(|&i| lats[i]).collect();
    }
}

fn linspace(lo: f64, hi: f64, n: usize) -> Vec<f64> {
    let last = (n.max(2) - 1) as f64;
    (0..n).map(|i| lo + (hi - lo) * i as f64 / last).collect()
}

fn sweeps(options: &ContourOptions) -> Vec<Sweep> {
    let lats = options.constant_lats.iter().flat_map(|v| v.to_vec());
    let lons = options.constant_lons.iter().flat_map(|v| v.to_vec());
    lats.map(Sweep::ConstantLat)
        .chain(lons.map(Sweep::ConstantLon))
        .collect()
}

// ---------------------------------------------------------------------------
// Builders
// ---------------------------------------------------------------------------

/// Project geographic contours: the custom path first, then each constant
/// latitude, then each constant longitude.
pub fn geo_contours(
    projection: &Projection,
    options: &ContourOptions,
) -> Result<Vec<Contour>, SiteMapError> {
    let style = options.validate()?;
    let mut contours = Vec::new();

    if let (Some(lats), Some(lons)) = (&options.lats, &options.lons) {
        contours.push(style.contour(projection, lons, lats));
    }
    for sweep in sweeps(options) {
        let (mut lons, mut lats) = sweep.points();
        sweep.sort(&mut lons, &mut lats);
        contours.push(style.contour(projection, &lons, &lats));
    }
    Ok(contours)
}

/// Project geomagnetic contours: coordinates are converted to geographic
/// with `model` at `when` before projecting. Swept lines are sorted after
/// conversion.
pub fn mag_contours(
    projection: &Projection,
    options: &ContourOptions,
    when: DateTime<Utc>,
    model: &dyn GeomagneticModel,
) -> Result<Vec<Contour>, SiteMapError> {
    let style = options.validate()?;
    let to_geographic = |mlons: &[f64], mlats: &[f64]| -> (Vec<f64>, Vec<f64>) {
        let (lats, lons): (Vec<f64>, Vec<f64>) = mlats
            .iter()
            .zip(mlons.iter())
            .map(|(&mlat, &mlon)| model.to_geographic(mlat, mlon, when))
            .unzip();
        (lons, lats)
    };
    let mut contours = Vec::new();

    if let (Some(mlats), Some(mlons)) = (&options.lats, &options.lons) {
        let (lons, lats) = to_geographic(mlons, mlats);
        contours.push(style.contour(projection, &lons, &lats));
    }
    for sweep in sweeps(options) {
        let (mlons, mlats) = sweep.points();
        let (mut lons, mut lats) = to_geographic(&mlons, &mlats);
        sweep.sort(&mut lons, &mut lats);
        contours.push(style.contour(projection, &lons, &lats));
    }
    log::debug!("Projected {} geomagnetic contours for {when}", contours.len());
    Ok(contours)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::site_map::geomag::DipoleModel;

    fn pc() -> Projection {
        Projection::plate_carree()
    }

    #[test]
    fn parallel_is_dense_and_monotonic() {
        let contours = geo_contours(&pc(), &ContourOptions::constant_lats([55.0])).unwrap();
        assert_eq!(contours.len(), 1);
        let c = &contours[0];
        assert_eq!(c.x.len(), PARALLEL_POINTS);
        assert_eq!(c.x[0], -180.0);
        assert_eq!(c.x[PARALLEL_POINTS - 1], 180.0);
        assert!(c.x.windows(2).all(|w| w[0] < w[1]));
        assert!(c.y.iter().all(|&y| y == 55.0));
        assert_eq!(c.z_order, 0);
    }

    #[test]
    fn meridian_sweeps_latitude() {
        let opts = ContourOptions {
            constant_lons: Some(OneOrMany::One(-100.0)),
            bring_to_front: true,
            ..Default::default()
        };
        let c = &geo_contours(&pc(), &opts).unwrap()[0];
        assert_eq!(c.y.len(), MERIDIAN_POINTS);
        assert_eq!((c.y[0], c.y[MERIDIAN_POINTS - 1]), (-90.0, 90.0));
        assert_eq!(c.z_order, 1);
    }

    #[test]
    fn path_comes_first() {
        let mut opts = ContourOptions::path(vec![50.0, 60.0], vec![-110.0, -100.0]);
        opts.constant_lats = Some(OneOrMany::Many(vec![40.0, 70.0]));
        let contours = geo_contours(&pc(), &opts).unwrap();
        assert_eq!(contours.len(), 3);
        assert_eq!(contours[0].x, vec![-110.0, -100.0]);
        assert_eq!(contours[2].y[0], 70.0);
    }

    #[test]
    fn validation_errors() {
        let check = |opts: ContourOptions| geo_contours(&pc(), &opts).unwrap_err();

        assert!(matches!(check(ContourOptions::default()), SiteMapError::NoCoordinates));
        assert!(matches!(
            check(ContourOptions {
                lats: Some(vec![1.0]),
                ..Default::default()
            }),
            SiteMapError::UnpairedCoordinates
        ));
        assert!(matches!(
            check(ContourOptions::path(vec![1.0, 2.0], vec![1.0])),
            SiteMapError::CoordinateLength
        ));
        assert!(matches!(
            check(ContourOptions {
                color: "#FF0000".into(),
                ..ContourOptions::constant_lats([55.0])
            }),
            SiteMapError::Plot(PlotError::UnknownColor(_))
        ));
        assert!(matches!(
            check(ContourOptions {
                linestyle: "none".into(),
                ..ContourOptions::constant_lats([55.0])
            }),
            SiteMapError::Plot(PlotError::UnknownLinestyle(_))
        ));
        assert!(matches!(
            check(ContourOptions {
                linewidth: 0.0,
                ..ContourOptions::constant_lats([55.0])
            }),
            SiteMapError::Linewidth
        ));
        assert!(matches!(
            check(ContourOptions {
                marker: "s".into(),
                ..ContourOptions::constant_lats([55.0])
            }),
            SiteMapError::Plot(PlotError::UnknownMarker(_))
        ));
    }

    #[test]
    fn magnetic_parallel_is_sorted_after_conversion() {
        let when = Utc.with_ymd_and_hms(2023, 11, 5, 6, 0, 0).unwrap();
        let opts = ContourOptions::constant_lats([65.0]);
        let c = &mag_contours(&pc(), &opts, when, &DipoleModel).unwrap()[0];
        assert_eq!(c.x.len(), PARALLEL_POINTS);
        assert!(c.x.windows(2).all(|w| w[0] <= w[1]));
        // a geomagnetic parallel is tilted in geographic coordinates
        let (lo, hi) = c
            .y
            .iter()
            .fold((f64::MAX, f64::MIN), |(lo, hi), &y| (lo.min(y), hi.max(y)));
        assert!(hi - lo > 10.0);
    }
}
