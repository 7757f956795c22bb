//! Charts module - Figure building and rendering

mod figure;
pub mod palette;
mod plotter;
mod renderer;
mod spline;
mod text_safe;

pub use figure::Figure;
pub use renderer::{RenderError, StaticChartRenderer};
