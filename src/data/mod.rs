//! Data structures and CSV loading
//!
//! Provides the column-oriented [`Frame`] used by feature engineering and
//! preprocessing, plus the labeled training table loader.

mod frame;
mod loader;

pub use frame::{Frame, LabeledFrame, Split};
pub use loader::{load_training_csv, read_training_csv, INDEX_COLUMN, RAW_LABEL_COLUMN, TARGET_COLUMN};
