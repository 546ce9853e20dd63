//! Types and traits for recording training metrics.
//!
//! * [`Record`] - a string-keyed container of values
//! * [`RecordValue`] - the types of values a record can hold
//! * [`Recorder`] - a destination of records
//! * [`BufferedRecorder`] - keeps records in memory
//! * [`NullRecorder`] - discards records
//!
//! ```rust
//! use strata_core::record::{Record, RecordValue};
//!
//! let mut record = Record::from_scalar("actor_loss", 0.1);
//! record.insert("iteration", RecordValue::Scalar(3.0));
//! assert_eq!(record.get_scalar("iteration").unwrap(), 3.0);
//! ```
mod base;
mod buffered_recorder;
mod null_recorder;
mod recorder;

pub use base::{Record, RecordValue};
pub use buffered_recorder::BufferedRecorder;
pub use null_recorder::NullRecorder;
pub use recorder::Recorder;
