//! Turns a [`SiteMap`] into a map figure: basemap, sites, labels, contours.

use geo_types::LineString;

use crate::color::parse_color;
use crate::error::SiteMapError;
use crate::figure::{Axes, AxesKind, Figure, Fill, Label, Line};
use crate::style::LineStyle;

use super::{MapPlotOptions, SiteMap};

/// Ocean fill when none is given.
pub const DEFAULT_OCEAN_COLOR: &str = "#98B7E2";

/// Labels sit this many degrees north of their site.
const LABEL_OFFSET_DEG: f64 = 1.0;

const BASEMAP_Z: i32 = 0;
const SITE_Z: i32 = 1;

/// Build the map figure for `extent` = `[min_lon, max_lon, min_lat, max_lat]`.
pub(crate) fn compose_map(
    map: &SiteMap,
    extent: [f64; 4],
    options: &MapPlotOptions,
) -> Result<Figure, SiteMapError> {
    let ocean = parse_color(options.ocean_color.as_deref().unwrap_or(DEFAULT_OCEAN_COLOR))?;
    let land = parse_color(&options.land_color)?;
    let land_edge = parse_color(&options.land_edgecolor)?;
    let borders = parse_color(&options.borders_color)?;
    let (x_range, y_range) = map.projection.extent_bounds(extent)?;

    let mut ax = Axes::new(AxesKind::Map {
        projection: map.projection.name().to_string(),
    });
    ax.title = options.title.clone();
    ax.x_range = Some(x_range);
    ax.y_range = Some(y_range);
    ax.background = Some(ocean);

    // ---- Basemap ----
    for polygon in &map.basemap.land.0 {
        let ring = project_ring(map, polygon.exterior());
        if ring.len() >= 3 {
            ax.fills.push(Fill {
                ring,
                face: land,
                edge: Some(land_edge),
            });
        }
    }
    if !options.borders_disable {
        for border in &map.basemap.borders.0 {
            let (lons, lats): (Vec<f64>, Vec<f64>) = border.coords().map(|c| (c.x, c.y)).unzip();
            let (x, y) = map.projection.project_all(&lons, &lats);
            let mut line = Line::new(x, y, borders);
            line.width = 0.8;
            line.z_order = BASEMAP_Z;
            ax.lines.push(line);
        }
    }

    // ---- Sites ----
    for group in &map.groups {
        let sites = map.visible_sites(group, options.enforce_data_availability);
        let style = &group.style;
        let (lons, lats): (Vec<f64>, Vec<f64>) =
            sites.iter().map(|s| (s.longitude, s.latitude)).unzip();
        let (x, y) = map.projection.project_all(&lons, &lats);

        let mut markers = Line::new(x, y, style.color);
        markers.style = LineStyle::None;
        markers.marker = style.marker;
        markers.marker_size = style.size;
        markers.z_order = SITE_Z;
        ax.lines.push(markers);

        if !options.label {
            continue;
        }
        for site in sites {
            let (x, y) = map
                .projection
                .project(site.longitude, site.latitude + LABEL_OFFSET_DEG);
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }
            let text = if options.upper_label {
                site.uid.to_uppercase()
            } else {
                site.uid.to_lowercase()
            };
            ax.labels.push(Label {
                text,
                x,
                y,
                color: style.color,
            });
        }
    }

    // ---- Contours ----
    for contour in &map.contours {
        let mut line = Line::new(contour.x.clone(), contour.y.clone(), contour.color);
        line.width = contour.linewidth;
        line.style = contour.linestyle;
        line.marker = contour.marker;
        line.z_order = contour.z_order;
        ax.lines.push(line);
    }

    log::debug!(
        "Composed map: {} land polygons, {} lines, {} labels",
        ax.fills.len(),
        ax.lines.len(),
        ax.labels.len()
    );
    let mut figure = Figure::new(options.figsize);
    figure.axes.push(ax);
    Ok(figure)
}

/// Project a polygon ring, dropping vertices the projection cannot show.
fn project_ring(map: &SiteMap, ring: &LineString<f64>) -> Vec<(f64, f64)> {
    ring.coords()
        .map(|c| map.projection.project(c.x, c.y))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .collect()
}
