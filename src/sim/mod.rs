//! Simulator stand-in

mod feed;

pub use feed::SimulatedFeed;
