//! Loads street geometry from GeoJSON, for use as the source routes when
//! composing a trip.

use crate::math::GeoPoint;
use crate::route::Route;
use anyhow::{bail, Context, Result};
use geojson::{Feature, GeoJson};
use serde::{Deserialize, Serialize};

/// The importance of a street.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoadClass {
    Primary,
    Secondary,
    Tertiary,
}

impl RoadClass {
    /// Classifies an OpenStreetMap `highway` tag.
    pub fn classify(highway: &str) -> Self {
        match highway {
            "motorway" | "trunk" | "primary" => RoadClass::Primary,
            "secondary" => RoadClass::Secondary,
            _ => RoadClass::Tertiary,
        }
    }
}

/// A street loaded from GeoJSON.
#[derive(Clone, Debug)]
pub struct Street {
    /// The street's name, if it has one.
    pub name: Option<String>,
    pub class: RoadClass,
    /// The street's geometry, with at least two points.
    pub route: Route,
}

/// Parses the streets in a GeoJSON document.
///
/// Only `LineString` features with a `highway` property and at least two
/// coordinates are kept; everything else is skipped.
pub fn load_streets(raw: &str) -> Result<Vec<Street>> {
    let geojson: GeoJson = raw.parse().context("invalid GeoJSON")?;
    let features = match geojson {
        GeoJson::FeatureCollection(collection) => collection.features,
        GeoJson::Feature(feature) => vec![feature],
        GeoJson::Geometry(_) => bail!("expected a feature collection, not a bare geometry"),
    };
    let total = features.len();
    let streets = features.iter().filter_map(street).collect::<Vec<_>>();
    log::debug!("Loaded {} streets from {} features", streets.len(), total);
    Ok(streets)
}

/// The routes of some streets, ready to hand to a [crate::RouteComposer].
pub fn source_routes(streets: &[Street]) -> Vec<Route> {
    streets.iter().map(|street| street.route.clone()).collect()
}

fn street(feature: &Feature) -> Option<Street> {
    let highway = feature.property("highway")?.as_str()?;
    let geojson::Value::LineString(coords) = &feature.geometry.as_ref()?.value else {
        return None;
    };
    if coords.len() < 2 {
        return None;
    }
    // GeoJSON positions are [lon, lat]
    let points = coords
        .iter()
        .map(|pos| match pos.as_slice() {
            [lon, lat, ..] => Some(GeoPoint::new(*lat, *lon)),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()?;
    Some(Street {
        name: feature
            .property("name")
            .and_then(|name| name.as_str())
            .map(str::to_string),
        class: RoadClass::classify(highway),
        route: Route::new(points)?,
    })
}
