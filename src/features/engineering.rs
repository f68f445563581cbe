//! Derived applicant features
//!
//! Every derivation is skipped when one of its source columns is absent, so
//! tables with a narrower schema still train. Derived columns are appended in
//! a fixed order; the resulting column order is the feature contract that is
//! persisted next to the model.

use crate::data::Frame;
use crate::error::Result;
use tracing::debug;

pub const AGE: &str = "age";
pub const MONTHLY_INCOME: &str = "MonthlyIncome";
pub const NUMBER_OF_DEPENDENTS: &str = "NumberOfDependents";
pub const DEBT_RATIO: &str = "DebtRatio";
pub const INCOME_PER_PERSON: &str = "Income_per_person";
pub const DEBT_TO_INCOME: &str = "Debt_to_income_ratio";

/// Bounds applied to the `age` column
const AGE_BOUNDS: (f64, f64) = (18.0, 100.0);

/// Columns that get a `<name>_missing` indicator
const MISSINGNESS_SOURCES: [&str; 2] = [MONTHLY_INCOME, NUMBER_OF_DEPENDENTS];

/// Feature engineer for the credit applicant table
#[derive(Debug, Clone, Default)]
pub struct FeatureEngineer;

impl FeatureEngineer {
    pub fn new() -> Self {
        Self
    }

    /// Derive all features in place
    pub fn apply(&self, frame: &mut Frame) -> Result<()> {
        self.clip_age(frame);
        self.add_missing_indicators(frame)?;
        self.add_income_per_person(frame)?;
        self.add_debt_to_income(frame)?;
        debug!("Engineered {} feature columns", frame.n_cols());
        Ok(())
    }

    /// Derive features on a copy, leaving the input untouched
    pub fn transform(&self, frame: &Frame) -> Result<Frame> {
        let mut out = frame.clone();
        self.apply(&mut out)?;
        Ok(out)
    }

    fn clip_age(&self, frame: &mut Frame) {
        if let Some(age) = frame.column_mut(AGE) {
            let (lo, hi) = AGE_BOUNDS;
            for v in age.iter_mut().filter(|v| !v.is_nan()) {
                *v = v.clamp(lo, hi);
            }
        }
    }

    fn add_missing_indicators(&self, frame: &mut Frame) -> Result<()> {
        for source in MISSINGNESS_SOURCES {
            let indicator: Option<Vec<f64>> = frame
                .column(source)
                .map(|values| values.iter().map(|v| if v.is_nan() { 1.0 } else { 0.0 }).collect());

            if let Some(indicator) = indicator {
                frame.set_column(format!("{}_missing", source), indicator)?;
            }
        }
        Ok(())
    }

    fn add_income_per_person(&self, frame: &mut Frame) -> Result<()> {
        let derived = match (frame.column(MONTHLY_INCOME), frame.column(NUMBER_OF_DEPENDENTS)) {
            (Some(income), Some(dependents)) => income
                .iter()
                .zip(dependents)
                .map(|(&inc, &dep)| inc / (fill_nan(dep, 0.0) + 1.0))
                .collect(),
            _ => return Ok(()),
        };
        frame.set_column(INCOME_PER_PERSON, derived)
    }

    fn add_debt_to_income(&self, frame: &mut Frame) -> Result<()> {
        let derived = match (frame.column(DEBT_RATIO), frame.column(MONTHLY_INCOME)) {
            (Some(debt), Some(income)) => debt
                .iter()
                .zip(income)
                .map(|(&d, &inc)| d * fill_nan(inc, 0.0))
                .collect(),
            _ => return Ok(()),
        };
        frame.set_column(DEBT_TO_INCOME, derived)
    }
}

fn fill_nan(value: f64, fill: f64) -> f64 {
    if value.is_nan() {
        fill
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn applicant_frame() -> Frame {
        Frame::from_columns(vec![
            (AGE, vec![45.0, -5.0, 150.0]),
            (MONTHLY_INCOME, vec![5000.0, f64::NAN, 1200.0]),
            (NUMBER_OF_DEPENDENTS, vec![2.0, 1.0, f64::NAN]),
            (DEBT_RATIO, vec![0.3, 0.5, 2.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_age_is_clipped() {
        let out = FeatureEngineer::new().transform(&applicant_frame()).unwrap();
        assert_eq!(out.column(AGE).unwrap(), &[45.0, 18.0, 100.0]);
    }

    #[test]
    fn test_missing_indicators() {
        let out = FeatureEngineer::new().transform(&applicant_frame()).unwrap();
        assert_eq!(out.column("MonthlyIncome_missing").unwrap(), &[0.0, 1.0, 0.0]);
        assert_eq!(out.column("NumberOfDependents_missing").unwrap(), &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_ratios() {
        let out = FeatureEngineer::new().transform(&applicant_frame()).unwrap();

        let per_person = out.column(INCOME_PER_PERSON).unwrap();
        assert_relative_eq!(per_person[0], 5000.0 / 3.0, epsilon = 1e-9);
        assert!(per_person[1].is_nan());
        assert_relative_eq!(per_person[2], 1200.0, epsilon = 1e-9);

        let debt = out.column(DEBT_TO_INCOME).unwrap();
        assert_relative_eq!(debt[0], 1500.0, epsilon = 1e-9);
        assert_eq!(debt[1], 0.0);
        assert_relative_eq!(debt[2], 2400.0, epsilon = 1e-9);
    }

    #[test]
    fn test_column_order() {
        let out = FeatureEngineer::new().transform(&applicant_frame()).unwrap();
        assert_eq!(
            out.column_names(),
            &[
                AGE,
                MONTHLY_INCOME,
                NUMBER_OF_DEPENDENTS,
                DEBT_RATIO,
                "MonthlyIncome_missing",
                "NumberOfDependents_missing",
                INCOME_PER_PERSON,
                DEBT_TO_INCOME,
            ]
        );
    }

    #[test]
    fn test_absent_sources_are_skipped() {
        let frame = Frame::from_columns(vec![(DEBT_RATIO, vec![0.1, 0.2])]).unwrap();
        let out = FeatureEngineer::new().transform(&frame).unwrap();
        assert_eq!(out.column_names(), &[DEBT_RATIO]);
    }

    #[test]
    fn test_deterministic() {
        let engineer = FeatureEngineer::new();
        let a = engineer.transform(&applicant_frame()).unwrap();
        let b = engineer.transform(&applicant_frame()).unwrap();
        // NaN != NaN, so compare bit patterns
        for name in a.column_names() {
            let lhs: Vec<u64> = a.column(name).unwrap().iter().map(|v| v.to_bits()).collect();
            let rhs: Vec<u64> = b.column(name).unwrap().iter().map(|v| v.to_bits()).collect();
            assert_eq!(lhs, rhs);
        }
    }
}
