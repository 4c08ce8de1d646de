//! PM2.5 guideline thresholds
//!
//! Published air-quality guidelines used to classify raw readings that
//! arrive without a severity.

use crate::model::alert::Severity;

/// A published guideline level for PM2.5 concentration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GuidelineThreshold {
    /// Concentration limit in µg/m³
    pub value: f64,
    /// Severity assigned when a reading meets or exceeds the limit
    pub severity: Severity,
    /// Guideline name for display
    pub description: &'static str,
}

/// WHO 24-hour guideline
pub const WHO_24H: GuidelineThreshold = GuidelineThreshold {
    value: 15.0,
    severity: Severity::Alert,
    description: "WHO 24-hour guideline",
};

/// WHO annual guideline
pub const WHO_ANNUAL: GuidelineThreshold = GuidelineThreshold {
    value: 5.0,
    severity: Severity::Warning,
    description: "WHO annual guideline",
};

/// EPA 24-hour standard
pub const EPA_24H: GuidelineThreshold = GuidelineThreshold {
    value: 35.0,
    severity: Severity::Critical,
    description: "EPA 24-hour standard",
};

/// EPA annual standard
pub const EPA_ANNUAL: GuidelineThreshold = GuidelineThreshold {
    value: 12.0,
    severity: Severity::Alert,
    description: "EPA annual standard",
};

/// EU 24-hour standard
pub const EU_24H: GuidelineThreshold = GuidelineThreshold {
    value: 25.0,
    severity: Severity::Alert,
    description: "EU 24-hour standard",
};

/// EU annual standard
pub const EU_ANNUAL: GuidelineThreshold = GuidelineThreshold {
    value: 20.0,
    severity: Severity::Warning,
    description: "EU annual standard",
};

/// All known guidelines
pub const ALL: [GuidelineThreshold; 6] =
    [WHO_24H, WHO_ANNUAL, EPA_24H, EPA_ANNUAL, EU_24H, EU_ANNUAL];

/// The strictest guideline a reading meets or exceeds, by limit value.
///
/// Returns `None` when the reading is below every guideline. Selection is by
/// greatest limit value among those exceeded, not by severity, so a reading
/// between two limits reports the tighter limit's severity even when a
/// lower limit carries a more urgent one.
pub fn classify(pm25: f64) -> Option<&'static GuidelineThreshold> {
    ALL.iter()
        .filter(|t| pm25 >= t.value)
        .max_by(|a, b| a.value.total_cmp(&b.value))
}

/// Severity for a raw reading: the classified guideline's severity, or
/// `info` when the reading is below every guideline.
pub fn severity_for(pm25: f64) -> Severity {
    classify(pm25).map(|t| t.severity).unwrap_or(Severity::Info)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_above_all_guidelines() {
        let threshold = classify(42.0).expect("should classify");
        assert_eq!(threshold.value, EPA_24H.value);
        assert_eq!(threshold.severity, Severity::Critical);
    }

    #[test]
    fn test_classify_picks_greatest_exceeded_value() {
        // 22 exceeds WHO 24h (15, alert) and EU annual (20, warning); the
        // greater limit wins even though its severity is lower.
        let threshold = classify(22.0).expect("should classify");
        assert_eq!(threshold.value, EU_ANNUAL.value);
        assert_eq!(threshold.severity, Severity::Warning);
    }

    #[test]
    fn test_classify_meets_limit_exactly() {
        let threshold = classify(15.0).expect("should classify");
        assert_eq!(threshold.value, WHO_24H.value);
        assert_eq!(threshold.severity, Severity::Alert);
    }

    #[test]
    fn test_classify_below_everything() {
        assert!(classify(3.0).is_none());
        assert_eq!(severity_for(3.0), Severity::Info);
    }

    #[test]
    fn test_severity_for_midrange() {
        assert_eq!(severity_for(7.0), Severity::Warning); // WHO annual
        assert_eq!(severity_for(13.0), Severity::Alert); // EPA annual
        assert_eq!(severity_for(30.0), Severity::Alert); // EU 24h
        assert_eq!(severity_for(50.0), Severity::Critical); // EPA 24h
    }
}
