pub mod helical;

pub use helical::{HelicalLattice, Neighbors};
