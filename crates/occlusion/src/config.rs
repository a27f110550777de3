//! Settings files and the shared settings handle.

use std::path::Path;
use std::sync::{Arc, PoisonError, RwLock};

use occlusion_core::{OcclusionSettings, Result};

/// Loads settings from a JSON file.
///
/// Missing fields take their defaults and ranged values are clamped.
pub fn load_settings(path: impl AsRef<Path>) -> Result<OcclusionSettings> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let settings = parse_settings(&text)?;
    log::debug!("loaded occlusion settings from {}", path.as_ref().display());
    Ok(settings)
}

/// Parses settings from a JSON string, clamping ranged values.
pub fn parse_settings(json: &str) -> Result<OcclusionSettings> {
    let settings: OcclusionSettings = serde_json::from_str(json)?;
    Ok(settings.clamped())
}

/// Writes settings to a JSON file.
pub fn save_settings(path: impl AsRef<Path>, settings: &OcclusionSettings) -> Result<()> {
    let text = serde_json::to_string_pretty(settings)?;
    std::fs::write(path.as_ref(), text)?;
    Ok(())
}

/// Single-writer, many-reader handle to the live settings.
///
/// The configuration surface writes through [`update`](Self::update); the
/// pipeline reads one [`snapshot`](Self::snapshot) per camera frame.
#[derive(Debug, Clone, Default)]
pub struct SharedSettings {
    inner: Arc<RwLock<OcclusionSettings>>,
}

impl SharedSettings {
    pub fn new(settings: OcclusionSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Copies out the current settings.
    pub fn snapshot(&self) -> OcclusionSettings {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replaces the settings.
    pub fn set(&self, settings: OcclusionSettings) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = settings;
    }

    /// Mutates the settings in place.
    pub fn update(&self, f: impl FnOnce(&mut OcclusionSettings)) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }
}

impl From<OcclusionSettings> for SharedSettings {
    fn from(settings: OcclusionSettings) -> Self {
        Self::new(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use occlusion_core::{Algorithm, BlurWidth, Resolution};

    #[test]
    fn test_parse_partial_settings() {
        let settings =
            parse_settings(r#"{ "intensity": 1.5, "resolution": "Half", "blur": "None" }"#).unwrap();
        assert!((settings.intensity - 1.5).abs() < f32::EPSILON);
        assert_eq!(settings.resolution, Resolution::Half);
        assert_eq!(settings.blur, BlurWidth::None);
        assert_eq!(settings.algorithm, Algorithm::GroundTruthBased);
    }

    #[test]
    fn test_parse_clamps_out_of_range() {
        let settings = parse_settings(r#"{ "intensity": 9.0, "max_radius_pixels": 2.0 }"#).unwrap();
        assert!((settings.intensity - 4.0).abs() < f32::EPSILON);
        assert!((settings.max_radius_pixels - 16.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_parse_rejects_unknown_variant() {
        assert!(parse_settings(r#"{ "algorithm": "RayTraced" }"#).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join(format!(
            "occlusion-settings-{}.json",
            std::process::id()
        ));
        let settings = OcclusionSettings::new()
            .with_intensity(2.0)
            .with_algorithm(Algorithm::HorizonBased);
        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_shared_settings_snapshot_is_a_copy() {
        let shared = SharedSettings::new(OcclusionSettings::new().with_intensity(1.0));
        let before = shared.snapshot();
        shared.update(|s| s.intensity = 0.0);
        assert!(before.is_active());
        assert!(!shared.snapshot().is_active());

        let other = shared.clone();
        other.set(OcclusionSettings::new().with_intensity(3.0));
        assert!((shared.snapshot().intensity - 3.0).abs() < f32::EPSILON);
    }
}
