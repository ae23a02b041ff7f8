pub mod chart;
pub mod format;
pub mod page;

pub use chart::{render_chart_svg, ChartType};
pub use page::render_page;
