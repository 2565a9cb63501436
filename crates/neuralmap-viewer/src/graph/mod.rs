pub mod demo;
pub mod model;
pub mod store;
pub mod visibility;

pub use store::{FeedStatus, GraphStore, LayoutParams, SelectionState};
pub use visibility::VisibleGraph;
