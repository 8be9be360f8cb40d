use super::*;

/// Helper to create calibrated thresholds for testing
fn calibrated(good_y: f64, bad_y: f64) -> CalibrationThresholds {
    CalibrationThresholds {
        good_y,
        bad_y,
        is_calibrated: true,
    }
}

/// Helper to create classifier params without settings plumbing
fn params(sensitivity: f64, dead_zone: f64) -> ClassifierParams {
    ClassifierParams {
        sensitivity,
        dead_zone,
    }
}

/// Default test setup: thresholds 0.4/0.6, sensitivity 1.0, dead zone 0.03
fn default_setup() -> (CalibrationThresholds, ClassifierParams) {
    (calibrated(0.4, 0.6), params(1.0, 0.03))
}

#[test]
fn test_good_from_unknown_at_band_edge() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    let outcome = classifier.observe(0.40, &thresholds, &p);
    assert_eq!(
        outcome.state,
        PostureState::Good,
        "y at the good edge should classify Good from Unknown"
    );
    assert!(outcome.changed);
    assert!(!outcome.calibration_required);
}

#[test]
fn test_bad_from_unknown_at_band_edge() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    let outcome = classifier.observe(0.60, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Bad);
    assert!(outcome.changed);
}

#[test]
fn test_neutral_reading_keeps_unknown() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    let outcome = classifier.observe(0.50, &thresholds, &p);
    assert_eq!(
        outcome.state,
        PostureState::Unknown,
        "neutral band must not default to Good or Bad"
    );
    assert!(!outcome.changed);
}

#[test]
fn test_good_holds_through_neutral_band() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    classifier.observe(0.38, &thresholds, &p);
    let outcome = classifier.observe(0.55, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Good);
    assert!(!outcome.changed);
}

#[test]
fn test_good_to_bad_requires_clearing_dead_zone() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);
    classifier.observe(0.38, &thresholds, &p);

    // bad_edge is 0.6, dead zone 0.03: 0.63 is not enough to flip
    let outcome = classifier.observe(0.63, &thresholds, &p);
    assert_eq!(
        outcome.state,
        PostureState::Good,
        "y must exceed bad_edge + dead_zone before a Good -> Bad flip"
    );

    let outcome = classifier.observe(0.64, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Bad);
    assert!(outcome.changed);
}

#[test]
fn test_bad_to_good_requires_clearing_dead_zone() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);
    classifier.observe(0.70, &thresholds, &p);
    assert_eq!(classifier.state(), PostureState::Bad);

    // good_edge is 0.4, dead zone 0.03: 0.37 is not enough to flip
    let outcome = classifier.observe(0.37, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Bad);

    let outcome = classifier.observe(0.36, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Good);
}

#[test]
fn test_three_misses_force_away() {
    let (_, _) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    assert_eq!(classifier.miss().state, PostureState::Unknown);
    assert_eq!(classifier.miss().state, PostureState::Unknown);

    let outcome = classifier.miss();
    assert_eq!(outcome.state, PostureState::Away);
    assert!(outcome.changed);
}

#[test]
fn test_detection_resets_miss_streak() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    classifier.miss();
    classifier.miss();
    classifier.observe(0.38, &thresholds, &p);
    classifier.miss();
    let outcome = classifier.miss();
    assert_eq!(
        outcome.state,
        PostureState::Good,
        "a detected tick must reset the miss streak"
    );

    let outcome = classifier.miss();
    assert_eq!(outcome.state, PostureState::Away);
}

#[test]
fn test_away_overrides_current_state() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);
    classifier.observe(0.70, &thresholds, &p);
    assert_eq!(classifier.state(), PostureState::Bad);

    classifier.miss();
    classifier.miss();
    assert_eq!(classifier.state(), PostureState::Bad);
    assert_eq!(classifier.miss().state, PostureState::Away);
}

#[test]
fn test_away_remembers_last_active_state() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);
    classifier.observe(0.38, &thresholds, &p);

    for _ in 0..3 {
        classifier.miss();
    }
    assert_eq!(classifier.state(), PostureState::Away);

    // Neutral reading on return restores the remembered Good
    let outcome = classifier.observe(0.50, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Good);
    assert!(outcome.changed);
}

#[test]
fn test_away_resume_without_history_is_unknown() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    for _ in 0..3 {
        classifier.miss();
    }
    let outcome = classifier.observe(0.50, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Unknown);
}

#[test]
fn test_away_resume_uses_plain_edges() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);
    classifier.observe(0.38, &thresholds, &p);

    for _ in 0..3 {
        classifier.miss();
    }

    // 0.61 is inside the Good -> Bad dead zone but entry from Away is not
    // a flip, so the plain bad edge applies
    let outcome = classifier.observe(0.61, &thresholds, &p);
    assert_eq!(outcome.state, PostureState::Bad);
}

#[test]
fn test_uncalibrated_reports_calibration_required() {
    let p = params(1.0, 0.03);
    let thresholds = CalibrationThresholds {
        good_y: 0.4,
        bad_y: 0.6,
        is_calibrated: false,
    };
    let mut classifier = PostureClassifier::new(3);

    let outcome = classifier.observe(0.30, &thresholds, &p);
    assert_eq!(
        outcome.state,
        PostureState::Unknown,
        "uncalibrated thresholds must never classify Good or Bad"
    );
    assert!(outcome.calibration_required);
}

#[test]
fn test_losing_calibration_reverts_to_unknown() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);
    classifier.observe(0.38, &thresholds, &p);

    let uncalibrated = CalibrationThresholds {
        is_calibrated: false,
        ..thresholds
    };
    let outcome = classifier.observe(0.38, &uncalibrated, &p);
    assert_eq!(outcome.state, PostureState::Unknown);
    assert!(outcome.changed);
    assert!(outcome.calibration_required);
}

#[test]
fn test_lower_sensitivity_widens_band() {
    let thresholds = calibrated(0.4, 0.6);
    let p = params(0.5, 0.0);
    // Effective half-band doubles: edges move to 0.3 and 0.7
    let mut classifier = PostureClassifier::new(3);

    assert_eq!(
        classifier.observe(0.65, &thresholds, &p).state,
        PostureState::Unknown
    );
    assert_eq!(
        classifier.observe(0.72, &thresholds, &p).state,
        PostureState::Bad
    );

    let mut classifier = PostureClassifier::new(3);
    assert_eq!(
        classifier.observe(0.29, &thresholds, &p).state,
        PostureState::Good
    );
}

#[test]
fn test_params_from_settings_are_sanitized() {
    let mut settings = Settings::default();
    settings.sensitivity = 5.0;
    settings.dead_zone = -1.0;
    let p = ClassifierParams::from_settings(&settings);
    assert_eq!(p.sensitivity, 1.0);
    assert_eq!(p.dead_zone, 0.0);

    settings.sensitivity = 0.0;
    let p = ClassifierParams::from_settings(&settings);
    assert_eq!(p.sensitivity, 0.01);
}

#[test]
fn test_changed_flag_only_on_transitions() {
    let (thresholds, p) = default_setup();
    let mut classifier = PostureClassifier::new(3);

    assert!(classifier.observe(0.38, &thresholds, &p).changed);
    assert!(!classifier.observe(0.39, &thresholds, &p).changed);
    assert!(!classifier.miss().changed);
}
