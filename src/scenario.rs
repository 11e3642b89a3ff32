//! Traffic scenarios and the named places trips run between.

use crate::math::GeoPoint;
use crate::util::Interval;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// A traffic scenario: a speed multiplier and the incidents along the way.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// A short unique identifier.
    pub id: String,
    /// A human readable name.
    pub name: String,
    /// The multiplier applied to the base speed.
    pub speed_multiplier: f64,
    /// The incidents, in no particular order.
    #[serde(default)]
    pub incidents: Vec<Incident>,
}

/// A point-like event on a route that forces the vehicle to stop for a while.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Incident {
    /// The fraction of the route at which the incident occurs.
    pub position: f64,
    /// The kind of incident.
    pub kind: IncidentKind,
    /// How long the vehicle is held up, in scaled seconds.
    pub dwell_seconds: f64,
}

/// The kind of an [Incident].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentKind {
    Traffic,
    Accident,
    Construction,
}

impl Incident {
    pub const fn new(position: f64, kind: IncidentKind, dwell_seconds: f64) -> Self {
        Self {
            position,
            kind,
            dwell_seconds,
        }
    }

    /// The open window of progress values around the incident.
    pub fn window(&self, radius: f64) -> Interval<f64> {
        Interval::disc(self.position, radius)
    }
}

impl Scenario {
    /// Creates a scenario with no incidents.
    pub fn new(id: &str, name: &str, speed_multiplier: f64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            speed_multiplier,
            incidents: vec![],
        }
    }

    /// Adds an incident to the scenario.
    pub fn with_incident(mut self, incident: Incident) -> Self {
        self.incidents.push(incident);
        self
    }

    /// The incidents whose windows surround `progress`, with their indices.
    pub fn incidents_at(
        &self,
        progress: f64,
        radius: f64,
    ) -> impl Iterator<Item = (usize, &Incident)> + '_ {
        self.incidents
            .iter()
            .enumerate()
            .filter(move |(_, incident)| incident.window(radius).surrounds(progress))
    }

    /// Parses a list of scenarios from JSON.
    pub fn list_from_json(json: &str) -> anyhow::Result<Vec<Scenario>> {
        Ok(serde_json::from_str(json)?)
    }
}

/// The built-in scenarios.
pub static SCENARIOS: Lazy<Vec<Scenario>> = Lazy::new(|| {
    use IncidentKind::*;
    vec![
        Scenario::new("normal", "Normal traffic", 1.2),
        Scenario::new("traffic", "Rush hour", 0.6)
            .with_incident(Incident::new(0.25, Traffic, 15.0))
            .with_incident(Incident::new(0.65, Traffic, 20.0)),
        Scenario::new("accident", "Major accident", 0.4)
            .with_incident(Incident::new(0.45, Accident, 60.0)),
        Scenario::new("construction", "Road works", 0.7)
            .with_incident(Incident::new(0.35, Construction, 30.0)),
        Scenario::new("emergency", "Ambulance", 1.8),
        Scenario::new("police", "Police patrol", 1.6),
        Scenario::new("fire", "Fire engine", 1.7),
        Scenario::new("rain", "Heavy rain", 0.5)
            .with_incident(Incident::new(0.2, Traffic, 10.0))
            .with_incident(Incident::new(0.5, Traffic, 15.0))
            .with_incident(Incident::new(0.8, Traffic, 10.0)),
    ]
});

/// Looks up a built-in scenario, falling back to the first one
/// (normal traffic) for unknown ids.
pub fn preset(id: &str) -> &'static Scenario {
    SCENARIOS
        .iter()
        .find(|scenario| scenario.id == id)
        .unwrap_or(&SCENARIOS[0])
}

/// A named place a trip can start or end at.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Landmark {
    pub name: &'static str,
    pub pos: GeoPoint,
}

/// Points of interest around Hermosillo.
pub static LANDMARKS: Lazy<Vec<Landmark>> = Lazy::new(|| {
    [
        ("Plaza Bicentenario", 29.0729, -110.9559),
        ("UNISON", 29.0969, -110.9544),
        ("Centro Histórico", 29.0892, -110.9614),
        ("Hospital General", 29.0829, -110.9705),
        ("Estadio Sonora", 29.0656, -110.9834),
        ("Galerías Mall", 29.0989, -110.9877),
        ("Parque La Ruina", 29.0943, -110.9727),
        ("Aeropuerto", 29.0959, -111.0478),
    ]
    .into_iter()
    .map(|(name, lat, lon)| Landmark {
        name,
        pos: GeoPoint::new(lat, lon),
    })
    .collect()
});

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn presets() {
        assert_eq!(SCENARIOS.len(), 8);
        assert_eq!(preset("accident").speed_multiplier, 0.4);
        assert_eq!(preset("rain").incidents.len(), 3);
        assert_eq!(preset("no such scenario").id, "normal");
        assert_eq!(LANDMARKS.len(), 8);
    }

    #[test]
    fn incident_windows() {
        let scenario = preset("traffic");
        let at = |progress| {
            scenario
                .incidents_at(progress, 0.05)
                .map(|(idx, _)| idx)
                .collect::<Vec<_>>()
        };
        assert!(at(0.0).is_empty());
        assert_eq!(at(0.22), vec![0]);
        assert_eq!(at(0.69), vec![1]);
        assert!(at(0.71).is_empty());

        // Overlapping windows are all reported
        let scenario = Scenario::new("pileup", "Pileup", 1.0)
            .with_incident(Incident::new(0.5, IncidentKind::Accident, 10.0))
            .with_incident(Incident::new(0.52, IncidentKind::Traffic, 10.0));
        assert_eq!(scenario.incidents_at(0.51, 0.05).count(), 2);
    }

    #[test]
    fn from_json() {
        let json = r#"[{
            "id": "peak",
            "name": "Peak",
            "speedMultiplier": 0.6,
            "incidents": [{ "position": 0.45, "kind": "accident", "dwellSeconds": 20 }]
        }]"#;
        let scenarios = Scenario::list_from_json(json).unwrap();
        assert_eq!(
            scenarios[0].incidents[0],
            Incident::new(0.45, IncidentKind::Accident, 20.0)
        );
    }
}
