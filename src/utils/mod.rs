pub mod rng;

pub use rng::{random_point, RngManager};
