//! Shared data structures for the motor analysis pipeline
//!
//! - `table`: raw input (`RawTable`, `CellValue`) and the numeric `FeatureMatrix`
//! - `report`: the result record handed to reporting layers

mod table;
mod report;

pub use table::*;
pub use report::*;
