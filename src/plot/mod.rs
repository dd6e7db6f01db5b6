mod color;
mod view;

pub use color::{label_color, Color};
pub use view::{plot_chunks, plot_recording, AnnotationLayer, PlotParams, DEFAULT_PLOT_COLUMNS};
