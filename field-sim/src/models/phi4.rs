use std::convert::Infallible;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::clusters::{flip_cluster, grow_cluster, ClusterSet};
use crate::error::{Result, SimError};
use crate::geometry::HelicalLattice;

/// Trial values and initial values are drawn from `[-PHI_RANGE, PHI_RANGE)`.
pub const PHI_RANGE: f64 = 1.5;

/// Couplings of the phi^4 action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phi4Params {
    pub mu: f64,
    pub lambda: f64,
    /// Stream seed. Defaults to `100 * mu * lambda`, with negative products
    /// wrapping into the upper half of the `u64` range.
    pub seed: Option<u64>,
}

impl Phi4Params {
    pub fn new(mu: f64, lambda: f64) -> Self {
        Self {
            mu,
            lambda,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn resolved_seed(&self) -> u64 {
        self.seed
            .unwrap_or_else(|| (100.0 * self.mu * self.lambda) as i64 as u64)
    }
}

/// Real scalar field with quartic self-interaction on a helical lattice.
///
/// Local action at site `x`:
/// `-phi_x * sum(neighbours) + mu_sq * phi_x^2 + lambda_q * phi_x^4`
/// with `mu_sq = 2 + mu / 2` and `lambda_q = lambda / 4`.
#[derive(Debug)]
pub struct Phi4Lattice {
    lattice: HelicalLattice,
    field: Vec<f64>,
    params: Phi4Params,
    mu_sq: f64,
    lambda_q: f64,
    rng: Xoshiro256StarStar,
    cluster: ClusterSet,
    stack: Vec<(usize, u8)>,
}

impl Phi4Lattice {
    pub fn new(x_dim: usize, y_dim: usize, params: Phi4Params) -> Result<Self> {
        let lattice = HelicalLattice::new(x_dim, y_dim)?;
        let mut rng = Xoshiro256StarStar::seed_from_u64(params.resolved_seed());
        let field = (0..lattice.n_sites).map(|_| gen_phi(&mut rng)).collect();
        Ok(Self::assemble(lattice, field, params, rng))
    }

    /// Lattice with an explicit starting field.
    pub fn from_field(
        x_dim: usize,
        y_dim: usize,
        params: Phi4Params,
        field: Vec<f64>,
    ) -> Result<Self> {
        let lattice = HelicalLattice::new(x_dim, y_dim)?;
        if field.len() != lattice.n_sites {
            return Err(SimError::InvalidConfig(format!(
                "expected {} field values for a {x_dim}x{y_dim} lattice, got {}",
                lattice.n_sites,
                field.len()
            )));
        }
        let rng = Xoshiro256StarStar::seed_from_u64(params.resolved_seed());
        Ok(Self::assemble(lattice, field, params, rng))
    }

    fn assemble(
        lattice: HelicalLattice,
        field: Vec<f64>,
        params: Phi4Params,
        rng: Xoshiro256StarStar,
    ) -> Self {
        let cluster = ClusterSet::for_lattice(lattice.n_sites);
        Self {
            mu_sq: 2.0 + params.mu / 2.0,
            lambda_q: params.lambda / 4.0,
            stack: Vec::with_capacity(lattice.n_sites),
            lattice,
            field,
            params,
            rng,
            cluster,
        }
    }

    pub fn lattice(&self) -> &HelicalLattice {
        &self.lattice
    }

    pub fn field(&self) -> &[f64] {
        &self.field
    }

    pub fn params(&self) -> Phi4Params {
        self.params
    }

    pub fn mu_sq(&self) -> f64 {
        self.mu_sq
    }

    pub fn lambda_q(&self) -> f64 {
        self.lambda_q
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Xoshiro256StarStar {
        &mut self.rng
    }

    #[inline]
    fn neighbor_sum(&self, site: usize) -> f64 {
        let n = self.lattice.neighbors(site);
        self.field[n.next_x] + self.field[n.next_y] + self.field[n.prev_x] + self.field[n.prev_y]
    }

    #[inline]
    fn potential(&self, phi: f64) -> f64 {
        let phi2 = phi * phi;
        self.mu_sq * phi2 + self.lambda_q * phi2 * phi2
    }

    /// Action terms involving `site`: all four bonds plus its potential.
    pub fn local_action(&self, site: usize) -> f64 {
        let phi = self.field[site];
        -phi * self.neighbor_sum(site) + self.potential(phi)
    }

    /// Action per site, counting each bond once through the forward
    /// neighbours.
    pub fn total_energy(&self) -> f64 {
        let mut total = 0.0;
        for i in 0..self.lattice.n_sites {
            let n = self.lattice.neighbors(i);
            let phi = self.field[i];
            total -= phi * (self.field[n.next_x] + self.field[n.next_y]);
            total += self.potential(phi);
        }
        total / self.lattice.n_sites as f64
    }

    pub fn average_field(&self) -> f64 {
        self.field.iter().sum::<f64>() / self.lattice.n_sites as f64
    }

    /// `(<E^2> - <E>^2) N`; the temperature is absorbed into the couplings.
    pub fn specific_heat(&self, avg_energy: f64, avg_energy_sq: f64) -> f64 {
        (avg_energy_sq - avg_energy * avg_energy) * self.lattice.n_sites as f64
    }

    /// `(<|phi|^2> - <|phi|>^2) N`.
    pub fn susceptibility(&self, avg_phi: f64, avg_phi_sq: f64) -> f64 {
        (avg_phi_sq - avg_phi * avg_phi) * self.lattice.n_sites as f64
    }

    /// Metropolis update with a fresh trial value drawn from the full range.
    /// Returns whether the trial value was accepted.
    #[cfg_attr(feature = "profile", inline(never))]
    pub fn metropolis(&mut self, site: usize) -> bool {
        let current = self.field[site];
        let proposed = gen_phi(&mut self.rng);

        let difference = (current - proposed) * self.neighbor_sum(site) + self.potential(proposed)
            - self.potential(current);

        if difference <= 0.0 || self.rng.gen::<f64>() < (-difference).exp() {
            self.field[site] = proposed;
            true
        } else {
            false
        }
    }

    /// Wolff update seeded at `site`. Returns the cluster size.
    ///
    /// A positive seed grows through sites with `phi > 0`, any other seed
    /// through sites with `phi <= 0`. A neighbour `j` of member `i` joins
    /// with probability `1 - exp(-2 phi_i phi_j)`.
    pub fn wolff(&mut self, site: usize) -> usize {
        let Self {
            lattice,
            field,
            rng,
            cluster,
            stack,
            ..
        } = self;
        let positive = field[site] > 0.0;

        let grown = grow_cluster(lattice, site, cluster, stack, |i, j| {
            let phi_j = field[j];
            let same_side = if positive { phi_j > 0.0 } else { phi_j <= 0.0 };
            if !same_side {
                return Ok::<_, Infallible>(false);
            }
            let p = 1.0 - (-2.0 * field[i] * phi_j).exp();
            Ok(rng.gen::<f64>() < p)
        });
        if let Err(never) = grown {
            match never {}
        }

        let size = cluster.len();
        flip_cluster(cluster, |i| field[i] = -field[i]);
        size
    }

    /// One line per row, tab-separated values.
    pub fn render_grid(&self) -> String {
        let mut out = String::new();
        for row in self.lattice.rows() {
            let line: Vec<String> = self.field[row].iter().map(|v| format!("{v:.6}")).collect();
            out.push_str(&line.join("\t"));
            out.push('\n');
        }
        out
    }
}

#[inline]
fn gen_phi(rng: &mut Xoshiro256StarStar) -> f64 {
    2.0 * PHI_RANGE * rng.gen::<f64>() - PHI_RANGE
}
