pub mod membership;
mod wolff;

pub use membership::{ClusterSet, DEFAULT_BUCKETS};
pub(crate) use wolff::{flip_cluster, grow_cluster};
