//! Measurement set interchange and the persistence collaborator contract
//!
//! A [`MeasurementSet`] is the plain-JSON shape exchanged with whatever
//! stores measurements for a file. The core only ever loads once when a file
//! becomes current and saves after committing actions.

use crate::error::{PersistenceError, PersistenceResult, ScaleError};
use crate::measurement::Measurement;
use crate::scale::ScaleSetting;
use crate::units::Unit;
use std::collections::HashMap;

/// Committed measurements plus the scale they were computed with
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeasurementSet {
    #[serde(deserialize_with = "crate::measurement::deserialize_measurements")]
    pub measurements: Vec<Measurement>,
    pub pixels_per_unit: f64,
    #[serde(alias = "currentUnit")]
    pub unit: Unit,
    #[serde(default)]
    pub scale: f64,
}

impl MeasurementSet {
    /// Build a set from measurements and a scale setting
    pub fn new(measurements: Vec<Measurement>, scale: ScaleSetting) -> Self {
        Self {
            measurements,
            pixels_per_unit: scale.pixels_per_unit(),
            unit: scale.unit(),
            scale: scale.scale(),
        }
    }

    /// Validated scale setting for this set
    ///
    /// `pixelsPerUnit` wins over the stored display scale, which is derived
    /// from it.
    pub fn scale_setting(&self) -> Result<ScaleSetting, ScaleError> {
        ScaleSetting::new(self.pixels_per_unit, self.unit)
    }

    pub fn from_json(json: &str) -> PersistenceResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> PersistenceResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Default for MeasurementSet {
    fn default() -> Self {
        Self::new(Vec::new(), ScaleSetting::default())
    }
}

/// Loads and saves measurement sets keyed by file ID
pub trait MeasurementRepository {
    /// Load the set for a file, or `None` when nothing has been stored yet
    fn load_measurement_set(&self, file_id: &str) -> PersistenceResult<Option<MeasurementSet>>;

    /// Store the set for a file, replacing any previous one
    fn save_measurement_set(&mut self, file_id: &str, set: &MeasurementSet) -> PersistenceResult<()>;
}

/// Repository that keeps sets in memory
///
/// Useful for tests and for sessions that run without any backing store.
/// Can be switched offline to simulate an unreachable collaborator.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRepository {
    sets: HashMap<String, MeasurementSet>,
    offline: bool,
    saves: usize,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a set for a file
    pub fn with_set(mut self, file_id: impl Into<String>, set: MeasurementSet) -> Self {
        self.sets.insert(file_id.into(), set);
        self
    }

    /// Make every call fail as if the collaborator were unreachable
    pub fn set_offline(&mut self, offline: bool) {
        self.offline = offline;
    }

    pub fn get(&self, file_id: &str) -> Option<&MeasurementSet> {
        self.sets.get(file_id)
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves
    }

    fn check_online(&self) -> PersistenceResult<()> {
        if self.offline {
            return Err(PersistenceError::Unavailable(
                "in-memory repository is offline".to_string(),
            ));
        }
        Ok(())
    }
}

impl MeasurementRepository for InMemoryRepository {
    fn load_measurement_set(&self, file_id: &str) -> PersistenceResult<Option<MeasurementSet>> {
        self.check_online()?;
        Ok(self.sets.get(file_id).cloned())
    }

    fn save_measurement_set(&mut self, file_id: &str, set: &MeasurementSet) -> PersistenceResult<()> {
        self.check_online()?;
        self.sets.insert(file_id.to_string(), set.clone());
        self.saves += 1;
        Ok(())
    }
}

impl<R: MeasurementRepository + ?Sized> MeasurementRepository for Box<R> {
    fn load_measurement_set(&self, file_id: &str) -> PersistenceResult<Option<MeasurementSet>> {
        (**self).load_measurement_set(file_id)
    }

    fn save_measurement_set(&mut self, file_id: &str, set: &MeasurementSet) -> PersistenceResult<()> {
        (**self).save_measurement_set(file_id, set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;
    use crate::measurement::ShapeKind;

    fn sample_set() -> MeasurementSet {
        let scale = ScaleSetting::new(100.0, Unit::M).unwrap();
        let line = Measurement::from_points(
            vec![Point::new(0.0, 0.0), Point::new(0.0, 100.0)],
            &scale,
        )
        .unwrap();
        MeasurementSet::new(vec![line], scale)
    }

    #[test]
    fn test_json_field_names() {
        let json = sample_set().to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["pixelsPerUnit"], 100.0);
        assert_eq!(value["unit"], "m");
        assert_eq!(value["scale"], 1.0);
        assert_eq!(value["measurements"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_roundtrip_json() {
        let set = sample_set();
        let back = MeasurementSet::from_json(&set.to_json_pretty().unwrap()).unwrap();
        assert_eq!(back, set);
    }

    #[test]
    fn test_invalid_records_are_dropped_on_load() {
        let json = r#"{
            "measurements": [
                {"points": [{"x":3,"y":3}], "distance": 0, "area": 0},
                {"points": [{"x":0,"y":0},{"x":0,"y":100}], "distance": 1.0, "area": 0},
                {"points": [], "distance": 0, "area": 0}
            ],
            "pixelsPerUnit": 100,
            "unit": "m",
            "scale": 1
        }"#;
        let set = MeasurementSet::from_json(json).unwrap();
        assert_eq!(set.measurements.len(), 1);
        assert_eq!(set.measurements[0].kind(), ShapeKind::Line);
        assert_eq!(set.measurements[0].distance(), 1.0);
    }

    #[test]
    fn test_legacy_set_with_current_unit() {
        let json = r#"{
            "measurements": [
                {"points": [{"x":0,"y":0},{"x":0,"y":10},{"x":10,"y":10},{"x":0,"y":0}], "distance": 0, "area": 0.5}
            ],
            "pixelsPerUnit": 10,
            "currentUnit": "ft",
            "scale": 10
        }"#;
        let set = MeasurementSet::from_json(json).unwrap();
        assert_eq!(set.unit, Unit::Ft);
        assert_eq!(set.measurements[0].kind(), ShapeKind::Polygon);
        assert_eq!(set.scale_setting().unwrap().pixels_per_unit(), 10.0);
    }

    #[test]
    fn test_invalid_scale_rejected() {
        let mut set = sample_set();
        set.pixels_per_unit = 0.0;
        assert!(set.scale_setting().is_err());
    }

    #[test]
    fn test_in_memory_repository() {
        let mut repo = InMemoryRepository::new();
        assert!(repo.load_measurement_set("plan-a").unwrap().is_none());

        let set = sample_set();
        repo.save_measurement_set("plan-a", &set).unwrap();
        assert_eq!(repo.save_count(), 1);
        assert_eq!(repo.load_measurement_set("plan-a").unwrap(), Some(set.clone()));

        repo.set_offline(true);
        assert!(matches!(
            repo.save_measurement_set("plan-a", &set),
            Err(PersistenceError::Unavailable(_))
        ));
        assert!(repo.load_measurement_set("plan-a").is_err());
        assert_eq!(repo.save_count(), 1);
    }
}
