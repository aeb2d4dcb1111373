pub mod ising;
pub mod phi4;

pub use ising::IsingLattice;
pub use phi4::{Phi4Lattice, Phi4Params};

use rand::Rng;

use crate::error::Result;

/// A lattice model the simulation driver can update and measure.
///
/// Each model owns a single random stream; every draw the driver needs
/// (site selection included) comes from it so a seed fixes the trajectory.
pub trait FieldModel {
    fn n_sites(&self) -> usize;

    /// Uniform site index, `floor(N * u)`.
    fn random_site(&mut self) -> usize;

    /// Returns whether the site changed.
    fn metropolis(&mut self, site: usize) -> Result<bool>;

    /// Returns the cluster size.
    fn wolff(&mut self, site: usize) -> Result<usize>;

    /// Energy per site.
    fn total_energy(&self) -> f64;

    /// Magnetization per site, or average field.
    fn order_parameter(&self) -> f64;

    fn specific_heat(&self, avg_energy: f64, avg_energy_sq: f64) -> f64;

    fn susceptibility(&self, avg_order: f64, avg_order_sq: f64) -> f64;

    /// Newline-per-row text rendering for snapshots.
    fn render_grid(&self) -> String;

    /// Whether the order-parameter distribution (histogram, bimodality,
    /// Binder cumulant) is meaningful for this model.
    fn has_distribution(&self) -> bool {
        false
    }
}

#[inline]
fn uniform_site(rng: &mut impl Rng, n_sites: usize) -> usize {
    ((n_sites as f64 * rng.gen::<f64>()).floor() as usize).min(n_sites - 1)
}

impl FieldModel for IsingLattice {
    fn n_sites(&self) -> usize {
        self.lattice().n_sites
    }

    fn random_site(&mut self) -> usize {
        let n = self.n_sites();
        uniform_site(self.rng_mut(), n)
    }

    fn metropolis(&mut self, site: usize) -> Result<bool> {
        IsingLattice::metropolis(self, site)
    }

    fn wolff(&mut self, site: usize) -> Result<usize> {
        IsingLattice::wolff(self, site)
    }

    fn total_energy(&self) -> f64 {
        IsingLattice::total_energy(self)
    }

    fn order_parameter(&self) -> f64 {
        self.magnetization()
    }

    fn specific_heat(&self, avg_energy: f64, avg_energy_sq: f64) -> f64 {
        IsingLattice::specific_heat(self, avg_energy, avg_energy_sq)
    }

    fn susceptibility(&self, avg_order: f64, avg_order_sq: f64) -> f64 {
        IsingLattice::susceptibility(self, avg_order, avg_order_sq)
    }

    fn render_grid(&self) -> String {
        IsingLattice::render_grid(self)
    }
}

impl FieldModel for Phi4Lattice {
    fn n_sites(&self) -> usize {
        self.lattice().n_sites
    }

    fn random_site(&mut self) -> usize {
        let n = self.n_sites();
        uniform_site(self.rng_mut(), n)
    }

    fn metropolis(&mut self, site: usize) -> Result<bool> {
        Ok(Phi4Lattice::metropolis(self, site))
    }

    fn wolff(&mut self, site: usize) -> Result<usize> {
        Ok(Phi4Lattice::wolff(self, site))
    }

    fn total_energy(&self) -> f64 {
        Phi4Lattice::total_energy(self)
    }

    fn order_parameter(&self) -> f64 {
        self.average_field()
    }

    fn specific_heat(&self, avg_energy: f64, avg_energy_sq: f64) -> f64 {
        Phi4Lattice::specific_heat(self, avg_energy, avg_energy_sq)
    }

    fn susceptibility(&self, avg_order: f64, avg_order_sq: f64) -> f64 {
        Phi4Lattice::susceptibility(self, avg_order, avg_order_sq)
    }

    fn render_grid(&self) -> String {
        Phi4Lattice::render_grid(self)
    }

    fn has_distribution(&self) -> bool {
        true
    }
}
