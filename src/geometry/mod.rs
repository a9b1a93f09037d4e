mod arc;
mod border;

pub use arc::{ArcRasterizer, ArcSpec, Direction};
pub use border::{BorderError, BorderPolyline, BorderSplicer, SpliceOrder};
