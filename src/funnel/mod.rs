//! The lead funnel: a fixed, ordered sequence of steps and the controller
//! that moves a visitor through them.

pub use controller::*;
pub use step::*;

mod controller;
mod step;
