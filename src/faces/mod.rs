//! Animated button faces driven by live update tasks

mod collection;

pub use collection::CollectionFace;
