pub mod inverted;
pub mod points;
pub mod posting;
pub mod store;
