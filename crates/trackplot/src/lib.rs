/*!
This crate renders "track plots": a signal trace drawn column by column
above stacked horizontal tracks of colored segments. Each trace column and
each segment carries its own color, so a categorical labelling of the signal
can be read both on the trace and on the tracks underneath it. Plots can
carry a time axis and a legend, and are rendered as SVG, PNG, or PDF images.
*/

mod common;
mod image;
mod pdf;
mod png;
mod svg;
mod trackplot;

pub use image::generate as generate_image;
pub use trackplot::{Axis, Color, Legend, Seg, Trace, TracePoint, Track, TrackPlot};
