//! Geomagnetic <-> geographic coordinate conversion.

use chrono::{DateTime, Datelike, TimeZone, Utc};

/// Converts between geomagnetic and geographic latitude/longitude (degrees)
/// for a given instant.
pub trait GeomagneticModel {
    /// Geomagnetic `(lat, lon)` to geographic `(lat, lon)`.
    fn to_geographic(&self, mlat: f64, mlon: f64, when: DateTime<Utc>) -> (f64, f64);

    /// Geographic `(lat, lon)` to geomagnetic `(lat, lon)`.
    fn to_geomagnetic(&self, lat: f64, lon: f64, when: DateTime<Utc>) -> (f64, f64);
}

// ---------------------------------------------------------------------------
// Centred dipole
// ---------------------------------------------------------------------------

/// IGRF degree-1 coefficients (nT): epoch, g10, g11, h11.
const IGRF_DIPOLE: [(f64, f64, f64, f64); 5] = [
    (2000.0, -29619.4, -1728.2, 5186.1),
    (2005.0, -29554.63, -1669.05, 5077.99),
    (2010.0, -29496.57, -1586.42, 4944.26),
    (2015.0, -29441.46, -1501.77, 4795.99),
    (2020.0, -29404.8, -1450.9, 4652.5),
];

/// Secular variation (nT/yr) applied after the last epoch.
const IGRF_SV: (f64, f64, f64) = (5.7, 7.4, -25.9);

/// Centred-dipole model driven by the IGRF degree-1 terms. Epochs before
/// 2000 use the 2000 coefficients.
#[derive(Debug, Clone, Copy, Default)]
pub struct DipoleModel;

impl DipoleModel {
    /// `(g10, g11, h11)` at a decimal year.
    pub fn coefficients(year: f64) -> (f64, f64, f64) {
        let (first, last) = (IGRF_DIPOLE[0], IGRF_DIPOLE[IGRF_DIPOLE.len() - 1]);
        if year <= first.0 {
            return (first.1, first.2, first.3);
        }
        if year >= last.0 {
            let dt = year - last.0;
            return (
                last.1 + IGRF_SV.0 * dt,
                last.2 + IGRF_SV.1 * dt,
                last.3 + IGRF_SV.2 * dt,
            );
        }
        for w in IGRF_DIPOLE.windows(2) {
            let (a, b) = (w[0], w[1]);
            if year <= b.0 {
                let f = (year - a.0) / (b.0 - a.0);
                let lerp = |x: f64, y: f64| x + f * (y - x);
                return (lerp(a.1, b.1), lerp(a.2, b.2), lerp(a.3, b.3));
            }
        }
        (last.1, last.2, last.3)
    }

    /// Geographic `(lat, lon)` of the northern geomagnetic pole.
    pub fn north_pole(when: DateTime<Utc>) -> (f64, f64) {
        let (g10, g11, h11) = Self::coefficients(decimal_year(when));
        let b0 = (g10 * g10 + g11 * g11 + h11 * h11).sqrt();
        let colat = (-g10 / b0).acos();
        let lon = (-h11).atan2(-g11);
        (90.0 - colat.to_degrees(), lon.to_degrees())
    }

    /// Rotation taking geomagnetic unit vectors to geographic ones:
    /// `Rz(pole_lon) * Ry(pole_colat)`.
    fn rotation(when: DateTime<Utc>) -> [[f64; 3]; 3] {
        let (pole_lat, pole_lon) = Self::north_pole(when);
        let (st, ct) = (90.0 - pole_lat).to_radians().sin_cos();
        let (sp, cp) = pole_lon.to_radians().sin_cos();
        let ry = [[ct, 0.0, st], [0.0, 1.0, 0.0], [-st, 0.0, ct]];
        let rz = [[cp, -sp, 0.0], [sp, cp, 0.0], [0.0, 0.0, 1.0]];
        matmul(&rz, &ry)
    }
}

impl GeomagneticModel for DipoleModel {
    fn to_geographic(&self, mlat: f64, mlon: f64, when: DateTime<Utc>) -> (f64, f64) {
        let r = Self::rotation(when);
        from_unit(apply(&r, to_unit(mlat, mlon)))
    }

    fn to_geomagnetic(&self, lat: f64, lon: f64, when: DateTime<Utc>) -> (f64, f64) {
        let r = transpose(&Self::rotation(when));
        from_unit(apply(&r, to_unit(lat, lon)))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Year plus the elapsed fraction of that year.
pub fn decimal_year(when: DateTime<Utc>) -> f64 {
    let year = when.year();
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
    let end = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single();
    match (start, end) {
        (Some(start), Some(end)) => {
            let elapsed = (when - start).num_seconds() as f64;
            let total = (end - start).num_seconds() as f64;
            f64::from(year) + elapsed / total
        }
        _ => f64::from(year),
    }
}

fn to_unit(lat: f64, lon: f64) -> [f64; 3] {
    let (sl, cl) = lat.to_radians().sin_cos();
    let (so, co) = lon.to_radians().sin_cos();
    [cl * co, cl * so, sl]
}

fn from_unit(v: [f64; 3]) -> (f64, f64) {
    let lat = v[2].clamp(-1.0, 1.0).asin().to_degrees();
    let lon = v[1].atan2(v[0]).to_degrees();
    (lat, lon)
}

fn apply(m: &[[f64; 3]; 3], v: [f64; 3]) -> [f64; 3] {
    let mut out = [0.0; 3];
    for (i, row) in m.iter().enumerate() {
        out[i] = row[0] * v[0] + row[1] * v[1] + row[2] * v[2];
    }
    out
}

fn matmul(a: &[[f64; 3]; 3], b: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = (0..3).map(|k| a[i][k] * b[k][j]).sum();
        }
    }
    out
}

fn transpose(m: &[[f64; 3]; 3]) -> [[f64; 3]; 3] {
    let mut out = [[0.0; 3]; 3];
    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = m[j][i];
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn epoch_2020() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn pole_position_2020() {
        let (lat, lon) = DipoleModel::north_pole(epoch_2020());
        assert_abs_diff_eq!(lat, 80.59, epsilon = 0.05);
        assert_abs_diff_eq!(lon, -72.68, epsilon = 0.05);
    }

    #[test]
    fn magnetic_pole_maps_to_dipole_pole() {
        let (lat, lon) = DipoleModel.to_geographic(90.0, 0.0, epoch_2020());
        let (plat, plon) = DipoleModel::north_pole(epoch_2020());
        assert_abs_diff_eq!(lat, plat, epsilon = 1e-9);
        assert_abs_diff_eq!(lon, plon, epsilon = 1e-6);
    }

    #[test]
    fn conversion_round_trips() {
        let when = Utc.with_ymd_and_hms(2023, 11, 5, 6, 0, 0).unwrap();
        let (lat, lon) = DipoleModel.to_geographic(65.0, -30.0, when);
        let (mlat, mlon) = DipoleModel.to_geomagnetic(lat, lon, when);
        assert_abs_diff_eq!(mlat, 65.0, epsilon = 1e-9);
        assert_abs_diff_eq!(mlon, -30.0, epsilon = 1e-9);
    }

    #[test]
    fn coefficients_interpolate_and_extrapolate() {
        let (g10, _, _) = DipoleModel::coefficients(2012.5);
        assert_abs_diff_eq!(g10, (-29496.57 + -29441.46) / 2.0, epsilon = 1e-9);
        let (g10, _, h11) = DipoleModel::coefficients(2022.0);
        assert_abs_diff_eq!(g10, -29404.8 + 11.4, epsilon = 1e-9);
        assert_abs_diff_eq!(h11, 4652.5 - 51.8, epsilon = 1e-9);
        assert_eq!(DipoleModel::coefficients(1990.0).0, -29619.4);
    }

    #[test]
    fn decimal_years() {
        assert_abs_diff_eq!(decimal_year(epoch_2020()), 2020.0);
        let mid = Utc.with_ymd_and_hms(2021, 7, 2, 12, 0, 0).unwrap();
        assert_abs_diff_eq!(decimal_year(mid), 2021.5, epsilon = 1e-3);
    }
}
