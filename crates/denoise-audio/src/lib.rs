//! Sample source/sink abstractions for offline audio processing.
//!
//! Effects in this workspace consume audio through the block-wise
//! [`SampleSource`] reader and produce audio through the [`SampleSink`]
//! writer; [`Splice`] commits a finished sink back onto a timeline.
//! [`MemoryTrack`] and [`MemorySink`] are the in-memory implementations
//! used for batch processing and tests.

pub mod sink;
pub mod source;
pub mod track;

pub use sink::{MemorySink, SampleSink};
pub use source::{SampleFormat, SampleSource, ShortRead};
pub use track::{MemoryTrack, Splice};
