//! Grade derivation.
//!
//! The one deterministic rule set in the system: raw marks map to a total,
//! an exact average, and a letter grade looked up in an ordered threshold
//! table. Derivation is pure, with no state and no I/O, and is safe to call
//! from any number of threads.
//!
//! The observed deployments disagreed on the threshold table (a four-letter
//! and a five-letter variant), so the table is explicit configuration:
//! both ship as constructors and any custom table can be injected.

use crate::error::ValidationError;
use crate::record::ScoreSheet;

/// Lowest mark accepted for any subject.
pub const MIN_SCORE: i32 = 0;

/// Highest mark accepted for any subject.
pub const MAX_SCORE: i32 = 100;

/// Reject marks outside the accepted range, naming the failing subject.
///
/// Range checks happen here, at the boundary, never inside [`derive`]:
/// derivation assumes its input already passed.
///
/// # Errors
/// `ValidationError::ScoreOutOfRange` for the first out-of-range subject.
pub fn validate_scores(scores: &ScoreSheet) -> Result<(), ValidationError> {
    for (subject, value) in scores.subjects() {
        if !(MIN_SCORE..=MAX_SCORE).contains(&value) {
            return Err(ValidationError::ScoreOutOfRange {
                subject,
                value,
                min: MIN_SCORE,
                max: MAX_SCORE,
            });
        }
    }
    Ok(())
}

/// One row of a grade scale.
///
/// Averages at or above `min_average` earn `label`, unless a higher tier
/// matched first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradeTier {
    /// Inclusive lower bound on the average.
    pub min_average: f64,
    /// Letter awarded at or above the bound.
    pub label: char,
}

impl GradeTier {
    /// Create a tier from its bound and label.
    #[must_use]
    pub const fn new(min_average: f64, label: char) -> Self {
        Self { min_average, label }
    }
}

/// Ordered grade threshold table.
///
/// Tiers are evaluated highest-first, first match wins, and boundaries are
/// closed above: an average exactly equal to a tier's bound earns that
/// tier's label. Averages below every tier earn the fallback label.
#[derive(Debug, Clone, PartialEq)]
pub struct GradeScale {
    tiers: Vec<GradeTier>,
    fallback: char,
}

impl GradeScale {
    /// Build a scale from tiers (highest bound first) and a fallback label.
    ///
    /// # Errors
    /// `ValidationError::InvalidGradeScale` if a bound is non-finite, the
    /// bounds are not strictly descending, or two tiers (or a tier and the
    /// fallback) share a label.
    pub fn new(tiers: Vec<GradeTier>, fallback: char) -> Result<Self, ValidationError> {
        for tier in &tiers {
            if !tier.min_average.is_finite() {
                return Err(ValidationError::InvalidGradeScale {
                    reason: format!("tier '{}' has a non-finite bound", tier.label),
                });
            }
        }

        for pair in tiers.windows(2) {
            if pair[1].min_average >= pair[0].min_average {
                return Err(ValidationError::InvalidGradeScale {
                    reason: format!(
                        "bounds must be strictly descending: {} is not below {}",
                        pair[1].min_average, pair[0].min_average
                    ),
                });
            }
        }

        let mut labels: Vec<char> = tiers.iter().map(|t| t.label).collect();
        labels.push(fallback);
        for (i, label) in labels.iter().enumerate() {
            if labels[..i].contains(label) {
                return Err(ValidationError::InvalidGradeScale {
                    reason: format!("label '{label}' appears more than once"),
                });
            }
        }

        Ok(Self { tiers, fallback })
    }

    /// The observed four-letter table: A >= 90, B >= 75, C >= 60, else D.
    #[must_use]
    pub fn four_tier() -> Self {
        Self {
            tiers: vec![
                GradeTier::new(90.0, 'A'),
                GradeTier::new(75.0, 'B'),
                GradeTier::new(60.0, 'C'),
            ],
            fallback: 'D',
        }
    }

    /// The observed five-letter table: A >= 90, B >= 80, C >= 70, D >= 60,
    /// else F.
    #[must_use]
    pub fn five_tier() -> Self {
        Self {
            tiers: vec![
                GradeTier::new(90.0, 'A'),
                GradeTier::new(80.0, 'B'),
                GradeTier::new(70.0, 'C'),
                GradeTier::new(60.0, 'D'),
            ],
            fallback: 'F',
        }
    }

    /// Look up the letter for an average.
    #[must_use]
    pub fn grade_for(&self, average: f64) -> char {
        self.tiers
            .iter()
            .find(|tier| average >= tier.min_average)
            .map_or(self.fallback, |tier| tier.label)
    }

    /// The configured tiers, highest bound first.
    #[must_use]
    pub fn tiers(&self) -> &[GradeTier] {
        &self.tiers
    }

    /// Label awarded below the lowest tier.
    #[must_use]
    pub const fn fallback(&self) -> char {
        self.fallback
    }
}

impl Default for GradeScale {
    fn default() -> Self {
        Self::five_tier()
    }
}

/// Summary statistics derived from one score sheet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derived {
    /// Sum of the three marks.
    pub total: i32,
    /// `total / 3.0`, unrounded.
    pub average: f64,
    /// Letter classification of the average.
    pub grade: char,
}

/// Derive total, average, and grade from raw marks.
///
/// Marks are expected to have passed [`validate_scores`] at the boundary.
/// The average is exact floating-point division; any rounding is a
/// presentation concern and happens in the transport layers.
#[must_use]
pub fn derive(scores: ScoreSheet, scale: &GradeScale) -> Derived {
    let total = scores.english + scores.maths + scores.science;
    let average = f64::from(total) / 3.0;
    Derived {
        total,
        average,
        grade: scale.grade_for(average),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f64 = 1e-9;

    #[test]
    fn derive_sums_and_divides_exactly() {
        let derived = derive(ScoreSheet::new(95, 88, 92), &GradeScale::five_tier());
        assert_eq!(derived.total, 275);
        assert!((derived.average - 275.0 / 3.0).abs() < EPSILON);
        assert_eq!(derived.grade, 'A');
    }

    #[test]
    fn derive_agrees_across_shipped_scales_at_the_top() {
        // 275 / 3 = 91.67, above 90 in both tables.
        let scores = ScoreSheet::new(95, 88, 92);
        assert_eq!(derive(scores, &GradeScale::four_tier()).grade, 'A');
        assert_eq!(derive(scores, &GradeScale::five_tier()).grade, 'A');
    }

    #[test]
    fn shipped_scales_disagree_at_average_74() {
        let scores = ScoreSheet::new(74, 74, 74);
        assert_eq!(derive(scores, &GradeScale::four_tier()).grade, 'C');
        assert_eq!(derive(scores, &GradeScale::five_tier()).grade, 'D');
    }

    #[test]
    fn boundaries_are_closed_above() {
        let scale = GradeScale::five_tier();
        assert_eq!(scale.grade_for(90.0), 'A');
        assert_eq!(scale.grade_for(89.999), 'B');
        assert_eq!(scale.grade_for(60.0), 'D');
        assert_eq!(scale.grade_for(59.999_999), 'F');
    }

    #[test]
    fn fallback_covers_everything_below_the_lowest_tier() {
        assert_eq!(GradeScale::four_tier().grade_for(0.0), 'D');
        assert_eq!(GradeScale::five_tier().grade_for(0.0), 'F');
    }

    #[test]
    fn custom_scale_is_honored() {
        let scale = GradeScale::new(
            vec![GradeTier::new(50.0, 'P')],
            'F',
        )
        .unwrap();
        assert_eq!(scale.grade_for(50.0), 'P');
        assert_eq!(scale.grade_for(49.9), 'F');
    }

    #[test]
    fn scale_rejects_unsorted_bounds() {
        let err = GradeScale::new(
            vec![GradeTier::new(60.0, 'B'), GradeTier::new(90.0, 'A')],
            'F',
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGradeScale { .. }));
    }

    #[test]
    fn scale_rejects_duplicate_labels() {
        let err = GradeScale::new(
            vec![GradeTier::new(90.0, 'A'), GradeTier::new(60.0, 'A')],
            'F',
        )
        .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGradeScale { .. }));

        let err = GradeScale::new(vec![GradeTier::new(90.0, 'F')], 'F').unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGradeScale { .. }));
    }

    #[test]
    fn scale_rejects_non_finite_bounds() {
        let err = GradeScale::new(vec![GradeTier::new(f64::NAN, 'A')], 'F').unwrap_err();
        assert!(matches!(err, ValidationError::InvalidGradeScale { .. }));
    }

    #[test]
    fn validate_scores_accepts_the_full_range() {
        assert!(validate_scores(&ScoreSheet::new(0, 100, 50)).is_ok());
    }

    #[test]
    fn validate_scores_names_the_first_failing_subject() {
        let err = validate_scores(&ScoreSheet::new(101, -5, 50)).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::ScoreOutOfRange {
                subject: "english",
                value: 101,
                ..
            }
        ));
    }
}
