//! Spherical forward map projections.
//!
//! Every projection maps geodetic `(lon, lat)` in degrees to planar map
//! coordinates. Points a projection cannot show (far side of the globe,
//! beyond the Mercator cut-off) come back as `NaN`, which breaks polylines
//! when drawn.

use std::f64::consts::FRAC_PI_4;
use std::fmt;

use serde::Deserialize;

use crate::error::SiteMapError;

/// Sphere radius in metres.
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// Mercator is cut off at this latitude.
const MERCATOR_MAX_LAT: f64 = 85.0;

/// Samples per side when turning a lon/lat box into projected bounds.
const EXTENT_SAMPLES: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "name")]
pub enum Projection {
    /// Equirectangular, in degrees.
    PlateCarree {
        #[serde(default)]
        central_longitude: f64,
    },
    Mercator {
        #[serde(default)]
        central_longitude: f64,
    },
    LambertConformal {
        central_longitude: f64,
        central_latitude: f64,
        standard_parallels: (f64, f64),
    },
    Orthographic {
        central_longitude: f64,
        central_latitude: f64,
    },
    NearsidePerspective {
        central_longitude: f64,
        central_latitude: f64,
        /// Metres above the surface.
        satellite_height: f64,
    },
    Stereographic {
        central_longitude: f64,
        central_latitude: f64,
    },
}

impl Default for Projection {
    fn default() -> Self {
        Projection::PlateCarree {
            central_longitude: 0.0,
        }
    }
}

impl Projection {
    pub fn plate_carree() -> Self {
        Projection::default()
    }

    /// Lambert conformal conic with the usual North America defaults.
    pub fn lambert_conformal(central_longitude: f64, central_latitude: f64) -> Self {
        Projection::LambertConformal {
            central_longitude,
            central_latitude,
            standard_parallels: (33.0, 45.0),
        }
    }

    /// Geostationary-height perspective view centred on a point.
    pub fn nearside_perspective(central_longitude: f64, central_latitude: f64) -> Self {
        Projection::NearsidePerspective {
            central_longitude,
            central_latitude,
            satellite_height: 35_785_831.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Projection::PlateCarree { .. } => "PlateCarree",
            Projection::Mercator { .. } => "Mercator",
            Projection::LambertConformal { .. } => "LambertConformal",
            Projection::Orthographic { .. } => "Orthographic",
            Projection::NearsidePerspective { .. } => "NearsidePerspective",
            Projection::Stereographic { .. } => "Stereographic",
        }
    }

    fn central_longitude(&self) -> f64 {
        match *self {
            Projection::PlateCarree { central_longitude }
            | Projection::Mercator { central_longitude }
            | Projection::LambertConformal {
                central_longitude, ..
            }
            | Projection::Orthographic {
                central_longitude, ..
            }
            | Projection::NearsidePerspective {
                central_longitude, ..
            }
            | Projection::Stereographic {
                central_longitude, ..
            } => central_longitude,
        }
    }

    /// Project one geodetic point. Invisible points are `(NaN, NaN)`.
    pub fn project(&self, lon: f64, lat: f64) -> (f64, f64) {
        const INVISIBLE: (f64, f64) = (f64::NAN, f64::NAN);
        if !(lon.is_finite() && lat.is_finite()) || lat.abs() > 90.0 {
            return INVISIBLE;
        }
        let dlon = relative_longitude(lon, self.central_longitude());
        let (lam, phi) = (dlon.to_radians(), lat.to_radians());

        match *self {
            Projection::PlateCarree { .. } => (dlon, lat),

            Projection::Mercator { .. } => {
                if lat.abs() > MERCATOR_MAX_LAT {
                    return INVISIBLE;
                }
                (EARTH_RADIUS * lam, EARTH_RADIUS * (FRAC_PI_4 + phi / 2.0).tan().ln())
            }

            Projection::LambertConformal {
                central_latitude,
                standard_parallels: (sp1, sp2),
                ..
            } => {
                let (phi1, phi2) = (sp1.to_radians(), sp2.to_radians());
                let t = |p: f64| (FRAC_PI_4 + p / 2.0).tan();
                let n = if (phi1 - phi2).abs() < 1e-10 {
                    phi1.sin()
                } else {
                    (phi1.cos() / phi2.cos()).ln() / (t(phi2) / t(phi1)).ln()
                };
                let f = phi1.cos() * t(phi1).powf(n) / n;
                let rho = EARTH_RADIUS * f / t(phi).powf(n);
                let rho0 = EARTH_RADIUS * f / t(central_latitude.to_radians()).powf(n);
                if !rho.is_finite() {
                    return INVISIBLE;
                }
                (rho * (n * lam).sin(), rho0 - rho * (n * lam).cos())
            }

            Projection::Orthographic {
                central_latitude, ..
            } => {
                let (cos_c, x, y) = azimuthal_terms(lam, phi, central_latitude.to_radians());
                if cos_c < 0.0 {
                    return INVISIBLE;
                }
                (EARTH_RADIUS * x, EARTH_RADIUS * y)
            }

            Projection::NearsidePerspective {
                central_latitude,
                satellite_height,
                ..
            } => {
                let p = 1.0 + satellite_height / EARTH_RADIUS;
                let (cos_c, x, y) = azimuthal_terms(lam, phi, central_latitude.to_radians());
                if cos_c < 1.0 / p {
                    return INVISIBLE;
                }
                let k = (p - 1.0) / (p - cos_c);
                (EARTH_RADIUS * k * x, EARTH_RADIUS * k * y)
            }

            Projection::Stereographic {
                central_latitude, ..
            } => {
                let (cos_c, x, y) = azimuthal_terms(lam, phi, central_latitude.to_radians());
                if 1.0 + cos_c < 1e-10 {
                    return INVISIBLE;
                }
                let k = 2.0 / (1.0 + cos_c);
                (EARTH_RADIUS * k * x, EARTH_RADIUS * k * y)
            }
        }
    }

    /// Project parallel coordinate lists.
    pub fn project_all(&self, lons: &[f64], lats: &[f64]) -> (Vec<f64>, Vec<f64>) {
        lons.iter()
            .zip(lats.iter())
            .map(|(&lon, &lat)| self.project(lon, lat))
            .unzip()
    }

    /// Projected `(x, y)` bounds of the geodetic box
    /// `[min_lon, max_lon, min_lat, max_lat]`.
    pub fn extent_bounds(&self, extent: [f64; 4]) -> Result<((f64, f64), (f64, f64)), SiteMapError> {
        let [lon0, lon1, lat0, lat1] = extent;
        let valid = extent.iter().all(|v| v.is_finite())
            && lon0 < lon1
            && lat0 < lat1
            && lat0 >= -90.0
            && lat1 <= 90.0;
        if !valid {
            return Err(SiteMapError::Extent(extent));
        }

        let step = |lo: f64, hi: f64, i: usize| lo + (hi - lo) * i as f64 / EXTENT_SAMPLES as f64;
        let mut bounds: Option<((f64, f64), (f64, f64))> = None;
        for i in 0..=EXTENT_SAMPLES {
            for j in 0..=EXTENT_SAMPLES {
                let (x, y) = self.project(step(lon0, lon1, i), step(lat0, lat1, j));
                if !(x.is_finite() && y.is_finite()) {
                    continue;
                }
                bounds = Some(match bounds {
                    None => ((x, x), (y, y)),
                    Some(((x0, x1), (y0, y1))) => ((x0.min(x), x1.max(x)), (y0.min(y), y1.max(y))),
                });
            }
        }

        match bounds {
            Some(((x0, x1), (y0, y1))) if x1 > x0 && y1 > y0 => Ok(((x0, x1), (y0, y1))),
            _ => Err(SiteMapError::ExtentNotVisible(self.name())),
        }
    }
}

impl fmt::Display for Projection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Projection::PlateCarree { central_longitude }
            | Projection::Mercator { central_longitude } => {
                write!(f, "{}(central_longitude={central_longitude})", self.name())
            }
            Projection::LambertConformal {
                central_longitude,
                central_latitude,
                standard_parallels,
            } => write!(
                f,
                "LambertConformal(central_longitude={central_longitude}, \
                 central_latitude={central_latitude}, standard_parallels={standard_parallels:?})"
            ),
            Projection::Orthographic {
                central_longitude,
                central_latitude,
            }
            | Projection::Stereographic {
                central_longitude,
                central_latitude,
            } => write!(
                f,
                "{}(central_longitude={central_longitude}, central_latitude={central_latitude})",
                self.name()
            ),
            Projection::NearsidePerspective {
                central_longitude,
                central_latitude,
                satellite_height,
            } => write!(
                f,
                "NearsidePerspective(central_longitude={central_longitude}, \
                 central_latitude={central_latitude}, satellite_height={satellite_height})"
            ),
        }
    }
}

/// Longitude relative to the centre, in degrees. Values already inside
/// [-180, 180] are kept so full-globe sweeps stay monotonic.
fn relative_longitude(lon: f64, center: f64) -> f64 {
    let d = lon - center;
    if (-180.0..=180.0).contains(&d) {
        d
    } else {
        (d + 180.0).rem_euclid(360.0) - 180.0
    }
}

/// `(cos c, x, y)` on the unit sphere for azimuthal projections centred on
/// latitude `phi0`, where `c` is the angular distance from the centre.
fn azimuthal_terms(lam: f64, phi: f64, phi0: f64) -> (f64, f64, f64) {
    let cos_c = phi0.sin() * phi.sin() + phi0.cos() * phi.cos() * lam.cos();
    let x = phi.cos() * lam.sin();
    let y = phi0.cos() * phi.sin() - phi0.sin() * phi.cos() * lam.cos();
    (cos_c, x, y)
}
