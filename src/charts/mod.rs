//! Charts module - chart model plus interactive and static rendering

mod model;
mod plotter;
mod renderer;

pub use model::{
    padded_range, palette_color, pastel_color, pie_angles, Category, Chart, CrossTab, Orientation,
    Series, PALETTE, PASTEL,
};
pub use plotter::ChartPlotter;
pub use renderer::{bar_value_range, category_label, encode_png, ChartRenderer, RenderError};
