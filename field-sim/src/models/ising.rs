use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256StarStar;

use crate::clusters::{flip_cluster, grow_cluster, ClusterSet};
use crate::error::{Result, SimError};
use crate::geometry::HelicalLattice;

/// 2D nearest-neighbour Ising model (J = 1, k = 1) on a helical lattice.
///
/// Owns the spin configuration, the run's single random stream, and the
/// temperature-dependent constants. A single flip changes the energy by one
/// of {-8, -4, 0, 4, 8}; only the two increases need a Boltzmann factor, so
/// both are precomputed.
#[derive(Debug)]
pub struct IsingLattice {
    lattice: HelicalLattice,
    /// +1/-1 per site.
    spins: Vec<i8>,
    temperature: f64,
    beta: f64,
    /// `[exp(-4 beta), exp(-8 beta)]`.
    exponentials: [f64; 2],
    /// Wolff bond probability `1 - exp(-2 beta)`, fixed for the run.
    bond_probability: f64,
    rng: Xoshiro256StarStar,
    cluster: ClusterSet,
    stack: Vec<(usize, u8)>,
}

impl IsingLattice {
    /// Random lattice at temperature `seed / 100`.
    ///
    /// Each site starts at +1 and is flipped when its draw falls below 0.5.
    /// `seed` must be at least 1.
    pub fn new(x_dim: usize, y_dim: usize, seed: u64) -> Result<Self> {
        check_seed(seed)?;
        let lattice = HelicalLattice::new(x_dim, y_dim)?;
        let mut rng = Xoshiro256StarStar::seed_from_u64(seed);
        let spins = (0..lattice.n_sites)
            .map(|_| if rng.gen::<f64>() < 0.5 { -1 } else { 1 })
            .collect();
        Ok(Self::assemble(lattice, spins, seed, rng))
    }

    /// Lattice with an explicit starting configuration. No draws are
    /// consumed, so the stream starts fresh for the first update.
    pub fn from_spins(x_dim: usize, y_dim: usize, seed: u64, spins: Vec<i8>) -> Result<Self> {
        check_seed(seed)?;
        let lattice = HelicalLattice::new(x_dim, y_dim)?;
        if spins.len() != lattice.n_sites {
            return Err(SimError::InvalidConfig(format!(
                "expected {} spins for a {x_dim}x{y_dim} lattice, got {}",
                lattice.n_sites,
                spins.len()
            )));
        }
        let rng = Xoshiro256StarStar::seed_from_u64(seed);
        let out = Self::assemble(lattice, spins, seed, rng);
        out.validate()?;
        Ok(out)
    }

    fn assemble(
        lattice: HelicalLattice,
        spins: Vec<i8>,
        seed: u64,
        rng: Xoshiro256StarStar,
    ) -> Self {
        let temperature = seed as f64 / 100.0;
        let beta = 1.0 / temperature;
        let cluster = ClusterSet::for_lattice(lattice.n_sites);
        Self {
            exponentials: [(-4.0 * beta).exp(), (-8.0 * beta).exp()],
            bond_probability: 1.0 - (-2.0 * beta).exp(),
            stack: Vec::with_capacity(lattice.n_sites),
            lattice,
            spins,
            temperature,
            beta,
            rng,
            cluster,
        }
    }

    /// Override the Wolff bond probability.
    pub fn with_bond_probability(mut self, p: f64) -> Self {
        self.bond_probability = p;
        self
    }

    pub fn lattice(&self) -> &HelicalLattice {
        &self.lattice
    }

    pub fn spins(&self) -> &[i8] {
        &self.spins
    }

    /// Raw write, not validated. A bad value is reported by the next update
    /// that touches the site.
    pub fn set_spin(&mut self, site: usize, value: i8) {
        self.spins[site] = value;
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn beta(&self) -> f64 {
        self.beta
    }

    pub fn bond_probability(&self) -> f64 {
        self.bond_probability
    }

    pub(crate) fn rng_mut(&mut self) -> &mut Xoshiro256StarStar {
        &mut self.rng
    }

    /// Spin at `site`, or an integrity error if it is not +1 or -1.
    #[inline]
    pub fn check_site(&self, site: usize) -> Result<i8> {
        check_spin(site, self.spins[site])
    }

    /// Check every site.
    pub fn validate(&self) -> Result<()> {
        for (site, &value) in self.spins.iter().enumerate() {
            check_spin(site, value)?;
        }
        Ok(())
    }

    /// Bond energy with the two forward neighbours only, so that summing
    /// over all sites counts every bond once.
    pub fn half_energy(&self, site: usize) -> i32 {
        let n = self.lattice.neighbors(site);
        let s = self.spins[site] as i32;
        -s * (self.spins[n.next_x] as i32 + self.spins[n.next_y] as i32)
    }

    /// Bond energy with all four neighbours: every bond a flip would change.
    pub fn full_energy(&self, site: usize) -> i32 {
        let n = self.lattice.neighbors(site);
        let sum: i32 = n.as_array().iter().map(|&j| self.spins[j] as i32).sum();
        -(self.spins[site] as i32) * sum
    }

    /// Energy per site.
    pub fn total_energy(&self) -> f64 {
        let total: i64 = (0..self.lattice.n_sites)
            .map(|i| self.half_energy(i) as i64)
            .sum();
        total as f64 / self.lattice.n_sites as f64
    }

    /// Magnetization per site.
    pub fn magnetization(&self) -> f64 {
        let sum: i64 = self.spins.iter().map(|&s| s as i64).sum();
        sum as f64 / self.lattice.n_sites as f64
    }

    /// `beta^2 (<E^2> - <E>^2) N`.
    pub fn specific_heat(&self, avg_energy: f64, avg_energy_sq: f64) -> f64 {
        self.beta * self.beta * (avg_energy_sq - avg_energy * avg_energy)
            * self.lattice.n_sites as f64
    }

    /// `beta (<|M|^2> - <|M|>^2) N`.
    pub fn susceptibility(&self, avg_magnet: f64, avg_magnet_sq: f64) -> f64 {
        self.beta * (avg_magnet_sq - avg_magnet * avg_magnet) * self.lattice.n_sites as f64
    }

    /// Single-spin Metropolis update. Returns whether the spin flipped.
    ///
    /// `final_e = s * sum(neighbours)` is half the energy a flip would add.
    /// Flips that do not raise the energy are always taken and consume no
    /// random number.
    #[cfg_attr(feature = "profile", inline(never))]
    pub fn metropolis(&mut self, site: usize) -> Result<bool> {
        let s = self.check_site(site)?;
        let mut sum = 0i32;
        for j in self.lattice.neighbors(site).as_array() {
            sum += self.check_site(j)? as i32;
        }

        let final_e = s as i32 * sum;
        if final_e > 0 {
            let u: f64 = self.rng.gen();
            if u >= self.exponentials[(final_e / 2 - 1) as usize] {
                return Ok(false);
            }
        }
        self.spins[site] = -s;
        Ok(true)
    }

    /// Wolff cluster update seeded at `site`. Returns the cluster size.
    pub fn wolff(&mut self, site: usize) -> Result<usize> {
        let seed_spin = self.check_site(site)?;
        let Self {
            lattice,
            spins,
            rng,
            cluster,
            stack,
            bond_probability,
            ..
        } = self;
        let p = *bond_probability;

        let grown = grow_cluster(lattice, site, cluster, stack, |_, nb| {
            let s = check_spin(nb, spins[nb])?;
            Ok::<_, SimError>(s == seed_spin && rng.gen::<f64>() < p)
        });
        if let Err(e) = grown {
            cluster.clear();
            stack.clear();
            return Err(e);
        }

        let size = cluster.len();
        flip_cluster(cluster, |i| spins[i] = -spins[i]);
        Ok(size)
    }

    /// One line per row, `+` for up and `-` for down.
    pub fn render_grid(&self) -> String {
        let mut out = String::with_capacity(self.lattice.n_sites + self.lattice.y_dim);
        for row in self.lattice.rows() {
            out.extend(self.spins[row].iter().map(|&s| if s > 0 { '+' } else { '-' }));
            out.push('\n');
        }
        out
    }
}

fn check_seed(seed: u64) -> Result<()> {
    if seed == 0 {
        return Err(SimError::InvalidConfig(
            "temperature seed must be >= 1 (T = seed / 100)".into(),
        ));
    }
    Ok(())
}

#[inline]
fn check_spin(site: usize, value: i8) -> Result<i8> {
    if value == 1 || value == -1 {
        Ok(value)
    } else {
        Err(SimError::Integrity { site, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_constants_from_seed() {
        let lat = IsingLattice::new(4, 4, 250).unwrap();
        assert_relative_eq!(lat.temperature(), 2.5);
        assert_relative_eq!(lat.beta(), 0.4);
        assert_relative_eq!(lat.exponentials[0], (-1.6f64).exp());
        assert_relative_eq!(lat.exponentials[1], (-3.2f64).exp());
        assert_relative_eq!(lat.bond_probability(), 1.0 - (-0.8f64).exp());
    }

    #[test]
    fn test_random_init_is_valid_and_reproducible() {
        let a = IsingLattice::new(8, 8, 227).unwrap();
        let b = IsingLattice::new(8, 8, 227).unwrap();
        a.validate().unwrap();
        assert_eq!(a.spins(), b.spins());
        let ups = a.spins().iter().filter(|&&s| s == 1).count();
        assert!(ups > 0 && ups < 64);
    }

    #[test]
    fn test_half_energy_sum_matches_total() {
        let lat = IsingLattice::new(6, 5, 180).unwrap();
        let n = lat.lattice().n_sites;
        let sum: i32 = (0..n).map(|i| lat.half_energy(i)).sum();
        assert_relative_eq!(sum as f64 / n as f64, lat.total_energy());
    }

    #[test]
    fn test_full_energy_counts_four_bonds() {
        let mut spins = vec![1i8; 9];
        spins[4] = -1;
        let lat = IsingLattice::from_spins(3, 3, 100, spins).unwrap();
        assert_eq!(lat.full_energy(4), 4);
        // site 1 touches the flipped site through next_y
        assert_eq!(lat.full_energy(1), -2);
        assert_eq!(lat.full_energy(0), -4);
    }

    #[test]
    fn test_ground_state_observables() {
        let lat = IsingLattice::from_spins(4, 4, 100, vec![-1; 16]).unwrap();
        assert_relative_eq!(lat.total_energy(), -2.0);
        assert_relative_eq!(lat.magnetization(), -1.0);
    }

    // 4x4 at T = 1, starting from an upper +1 domain and a lower -1 domain
    // with a single +1 island at site 9:
    //
    //   + + + +        + + + +
    //   + + + +   ->   + + + -
    //   - + - -        - - - -
    //   - - - -        - - - +
    //
    // Every chosen move lowers or keeps the energy, so the outcome is exact.
    #[test]
    fn test_metropolis_deterministic_sequence() {
        let mut spins = vec![1i8; 8];
        spins.extend([-1i8; 8]);
        spins[9] = 1;
        let mut lat = IsingLattice::from_spins(4, 4, 100, spins).unwrap();

        // island: three -1 neighbours, one +1
        assert!(lat.metropolis(9).unwrap());
        // end of row 1: helical next_x is site 8 (-1), balanced neighbourhood
        assert!(lat.metropolis(7).unwrap());
        // last site: next_x wraps to 0, next_y to 4, balanced neighbourhood
        assert!(lat.metropolis(15).unwrap());

        let expected: Vec<i8> = vec![1, 1, 1, 1, 1, 1, 1, -1, -1, -1, -1, -1, -1, -1, -1, 1];
        assert_eq!(lat.spins(), expected.as_slice());
        assert_relative_eq!(lat.total_energy(), -0.75);
        assert_relative_eq!(lat.magnetization(), 0.0);
    }

    // Site 4 of a 3x3 lattice has neighbours 3, 5, 1 and 7. With all spins
    // up, final_e = 4; turning site 5 down gives final_e = 2. Across a range
    // of temperatures the flip must follow `u < exp(-2 beta final_e)` for the
    // next draw `u`, and both outcomes must show up for both factors.
    #[test]
    fn test_metropolis_uphill_moves_use_boltzmann_factor() {
        let mut seen = [[false; 2]; 2];
        for seed in 100..=400u64 {
            for (slot, down) in [(0usize, Some(5usize)), (1, None)] {
                let mut spins = vec![1i8; 9];
                if let Some(j) = down {
                    spins[j] = -1;
                }
                let mut lat = IsingLattice::from_spins(3, 3, seed, spins).unwrap();
                let final_e = 2.0 * (slot as f64 + 1.0);
                assert_eq!(lat.temperature(), seed as f64 / 100.0);
                let factor = (-2.0 * final_e * lat.beta()).exp();
                let u: f64 = lat.rng.clone().gen();

                let flipped = lat.metropolis(4).unwrap();
                assert_eq!(flipped, u < factor, "seed {seed}, final_e {final_e}");
                assert_eq!(lat.spins()[4], if flipped { -1 } else { 1 });
                seen[slot][flipped as usize] = true;
            }
        }
        assert_eq!(seen, [[true; 2]; 2]);
    }

    #[test]
    fn test_downhill_moves_consume_no_draw() {
        let mut spins = vec![1i8; 9];
        spins[4] = -1;
        let mut lat = IsingLattice::from_spins(3, 3, 150, spins).unwrap();
        let before: f64 = lat.rng.clone().gen();
        assert!(lat.metropolis(4).unwrap());
        let after: f64 = lat.rng.clone().gen();
        assert_eq!(before, after);
    }

    #[test]
    fn test_zero_seed_is_rejected() {
        assert!(matches!(
            IsingLattice::new(4, 4, 0),
            Err(SimError::InvalidConfig(_))
        ));
        assert!(matches!(
            IsingLattice::from_spins(3, 3, 0, vec![1; 9]),
            Err(SimError::InvalidConfig(_))
        ));
        let lat = IsingLattice::new(4, 4, 1).unwrap();
        assert!(lat.beta().is_finite());
    }

    #[test]
    fn test_spins_stay_valid() {
        let mut lat = IsingLattice::new(8, 8, 230).unwrap();
        for step in 0..2000 {
            lat.metropolis(step * 37 % 64).unwrap();
            if step % 100 == 0 {
                lat.wolff(step % 64).unwrap();
            }
        }
        lat.validate().unwrap();
    }

    #[test]
    fn test_wolff_full_percolation() {
        let mut lat = IsingLattice::from_spins(3, 3, 100, vec![1; 9])
            .unwrap()
            .with_bond_probability(1.0);
        assert_eq!(lat.wolff(4).unwrap(), 9);
        assert!(lat.spins().iter().all(|&s| s == -1));
        assert_eq!(lat.wolff(0).unwrap(), 9);
        assert!(lat.spins().iter().all(|&s| s == 1));
    }

    #[test]
    fn test_wolff_stops_at_domain_wall() {
        let mut spins = vec![1i8; 8];
        spins.extend([-1i8; 8]);
        let mut lat = IsingLattice::from_spins(4, 4, 100, spins)
            .unwrap()
            .with_bond_probability(1.0);
        assert_eq!(lat.wolff(12).unwrap(), 8);
        assert!(lat.spins().iter().all(|&s| s == 1));
    }

    #[test]
    fn test_wolff_zero_probability_flips_seed_only() {
        let mut lat = IsingLattice::from_spins(3, 3, 100, vec![1; 9])
            .unwrap()
            .with_bond_probability(0.0);
        assert_eq!(lat.wolff(2).unwrap(), 1);
        assert_eq!(lat.spins()[2], -1);
        assert_eq!(lat.spins().iter().filter(|&&s| s == -1).count(), 1);
    }

    #[test]
    fn test_integrity_violation_is_reported() {
        let mut lat = IsingLattice::new(4, 4, 200).unwrap();
        lat.set_spin(5, 0);
        assert!(matches!(
            lat.metropolis(5),
            Err(SimError::Integrity { site: 5, value: 0 })
        ));
        // a neighbour's bad value is caught too
        assert!(matches!(
            lat.metropolis(6),
            Err(SimError::Integrity { site: 5, value: 0 })
        ));
        assert!(lat.validate().is_err());
    }

    #[test]
    fn test_from_spins_rejects_bad_input() {
        assert!(matches!(
            IsingLattice::from_spins(2, 3, 100, vec![1, -1, 2, 1, 1, 1]),
            Err(SimError::Integrity { site: 2, value: 2 })
        ));
        assert!(matches!(
            IsingLattice::from_spins(2, 3, 100, vec![1; 5]),
            Err(SimError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_render_grid() {
        let lat =
            IsingLattice::from_spins(3, 3, 100, vec![1, -1, 1, -1, -1, 1, 1, 1, -1]).unwrap();
        assert_eq!(lat.render_grid(), "+-+\n--+\n++-\n");
    }
}
