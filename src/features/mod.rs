//! Feature engineering module
//!
//! Derives the applicant features the model is trained on.

mod engineering;

pub use engineering::{
    FeatureEngineer, AGE, DEBT_RATIO, DEBT_TO_INCOME, INCOME_PER_PERSON, MONTHLY_INCOME,
    NUMBER_OF_DEPENDENTS,
};
