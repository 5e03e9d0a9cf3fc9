//! Sample rendering: the multiplexing queue and the sink pump.
//!
//! A [`RenderQueue`] splices the sample producers of successive segment
//! files into one stream with a continuous timeline; a [`RenderDriver`]
//! pumps that stream into a [`SampleSink`] while tracking playback health.

mod driver;
mod queue;

pub use driver::*;
pub use queue::*;
