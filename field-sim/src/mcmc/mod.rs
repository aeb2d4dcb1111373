pub mod sweep;

pub use sweep::{metropolis_sweep, wolff_step};
