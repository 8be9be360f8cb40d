// CalibrationThresholds - threshold storage for posture classification
//
// This module stores the head-height thresholds used by the classifier to
// distinguish upright from slouched posture. Thresholds are either the
// uncalibrated defaults carried in settings or values validated from
// calibration samples.
//
// The y axis is normalized frame height: 0.0 is the top of the frame, so
// an upright head position is numerically smaller than a slouched one.

use crate::error::CalibrationError;
use crate::settings::Settings;

/// CalibrationThresholds stores validated posture thresholds
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct CalibrationThresholds {
    /// Head height captured while upright
    pub good_y: f64,
    /// Head height captured while slouched
    pub bad_y: f64,
    /// Whether these values came from a completed calibration
    pub is_calibrated: bool,
}

impl CalibrationThresholds {
    /// Minimum distance required between the good and bad thresholds
    ///
    /// Closer captures give a band too narrow to classify meaningfully;
    /// the two poses were probably not held distinctly.
    pub const MIN_SEPARATION: f64 = 0.02;

    /// Create default thresholds, marked uncalibrated
    pub fn new_default() -> Self {
        Self {
            good_y: 0.4,
            bad_y: 0.6,
            is_calibrated: false,
        }
    }

    /// Snapshot thresholds out of the current settings
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            good_y: settings.good_posture_y,
            bad_y: settings.bad_posture_y,
            is_calibrated: settings.is_calibrated,
        }
    }

    /// Create calibrated thresholds from averaged posture samples
    ///
    /// # Arguments
    /// * `good_sample` - Averaged head height captured while upright
    /// * `bad_sample` - Averaged head height captured while slouched
    /// * `min_separation` - Required distance between the two values
    ///
    /// # Returns
    /// * `Ok(CalibrationThresholds)` - Validated, calibrated thresholds
    /// * `Err(CalibrationError)` - Inverted ordering or insufficient range
    ///
    /// # Validation
    /// - `good_sample` must be strictly less than `bad_sample` (upright is
    ///   higher in the frame)
    /// - The separation must be at least `min_separation`
    pub fn from_samples(
        good_sample: f64,
        bad_sample: f64,
        min_separation: f64,
    ) -> Result<Self, CalibrationError> {
        if good_sample >= bad_sample {
            return Err(CalibrationError::InvalidOrdering {
                good: good_sample,
                bad: bad_sample,
            });
        }

        let separation = bad_sample - good_sample;
        if separation < min_separation {
            return Err(CalibrationError::InsufficientRange {
                separation,
                required: min_separation,
            });
        }

        Ok(Self {
            good_y: good_sample,
            bad_y: bad_sample,
            is_calibrated: true,
        })
    }

    /// Write these thresholds into a settings value
    pub fn apply_to_settings(&self, settings: &mut Settings) {
        settings.good_posture_y = self.good_y;
        settings.bad_posture_y = self.bad_y;
        settings.is_calibrated = self.is_calibrated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_default() {
        let thresholds = CalibrationThresholds::new_default();
        assert_eq!(thresholds.good_y, 0.4);
        assert_eq!(thresholds.bad_y, 0.6);
        assert!(!thresholds.is_calibrated);
    }

    #[test]
    fn test_from_settings() {
        let mut settings = Settings::default();
        settings.good_posture_y = 0.35;
        settings.bad_posture_y = 0.65;
        settings.is_calibrated = true;

        let thresholds = CalibrationThresholds::from_settings(&settings);
        assert_eq!(thresholds.good_y, 0.35);
        assert_eq!(thresholds.bad_y, 0.65);
        assert!(thresholds.is_calibrated);
    }

    #[test]
    fn test_from_samples_valid() {
        let result =
            CalibrationThresholds::from_samples(0.3, 0.7, CalibrationThresholds::MIN_SEPARATION);

        assert!(result.is_ok());
        let thresholds = result.unwrap();
        assert_eq!(thresholds.good_y, 0.3);
        assert_eq!(thresholds.bad_y, 0.7);
        assert!(thresholds.is_calibrated);
    }

    #[test]
    fn test_from_samples_inverted_ordering() {
        let result =
            CalibrationThresholds::from_samples(0.7, 0.3, CalibrationThresholds::MIN_SEPARATION);

        assert!(result.is_err());
        match result.unwrap_err() {
            CalibrationError::InvalidOrdering { good, bad } => {
                assert_eq!(good, 0.7);
                assert_eq!(bad, 0.3);
            }
            e => panic!("Expected InvalidOrdering error, got: {:?}", e),
        }
    }

    #[test]
    fn test_from_samples_equal_values() {
        let result =
            CalibrationThresholds::from_samples(0.5, 0.5, CalibrationThresholds::MIN_SEPARATION);

        assert!(matches!(
            result.unwrap_err(),
            CalibrationError::InvalidOrdering { .. }
        ));
    }

    #[test]
    fn test_from_samples_insufficient_range() {
        let result =
            CalibrationThresholds::from_samples(0.5, 0.51, CalibrationThresholds::MIN_SEPARATION);

        assert!(result.is_err());
        match result.unwrap_err() {
            CalibrationError::InsufficientRange {
                separation,
                required,
            } => {
                assert!((separation - 0.01).abs() < 1e-9);
                assert_eq!(required, CalibrationThresholds::MIN_SEPARATION);
            }
            e => panic!("Expected InsufficientRange error, got: {:?}", e),
        }
    }

    #[test]
    fn test_from_samples_separation_at_minimum_is_valid() {
        let result =
            CalibrationThresholds::from_samples(0.5, 0.52, CalibrationThresholds::MIN_SEPARATION);
        assert!(result.is_ok());
    }

    #[test]
    fn test_apply_to_settings() {
        let thresholds =
            CalibrationThresholds::from_samples(0.3, 0.7, CalibrationThresholds::MIN_SEPARATION)
                .unwrap();

        let mut settings = Settings::default();
        thresholds.apply_to_settings(&mut settings);

        assert_eq!(settings.good_posture_y, 0.3);
        assert_eq!(settings.bad_posture_y, 0.7);
        assert!(settings.is_calibrated);
    }

    #[test]
    fn test_serde_roundtrip() {
        let thresholds =
            CalibrationThresholds::from_samples(0.3, 0.7, CalibrationThresholds::MIN_SEPARATION)
                .unwrap();

        let json = serde_json::to_string(&thresholds).unwrap();
        let parsed: CalibrationThresholds = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, thresholds);
    }
}
