use crate::error::Result;
use crate::models::FieldModel;

/// One Metropolis sweep: `N` updates at uniformly drawn sites.
///
/// Returns the number of accepted moves. Site selection and acceptance draw
/// from the model's stream in that order, update by update.
#[cfg_attr(feature = "profile", inline(never))]
pub fn metropolis_sweep<M: FieldModel + ?Sized>(model: &mut M) -> Result<usize> {
    let n_sites = model.n_sites();
    let mut accepted = 0;
    for _ in 0..n_sites {
        let site = model.random_site();
        if model.metropolis(site)? {
            accepted += 1;
        }
    }
    Ok(accepted)
}

/// One Wolff update seeded at a uniformly drawn site. Returns the cluster size.
#[cfg_attr(feature = "profile", inline(never))]
pub fn wolff_step<M: FieldModel + ?Sized>(model: &mut M) -> Result<usize> {
    let site = model.random_site();
    model.wolff(site)
}
