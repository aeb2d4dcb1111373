use crate::error::{Result, SimError};

/// The four nearest neighbours of one site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Neighbors {
    pub next_x: usize,
    pub prev_x: usize,
    pub next_y: usize,
    pub prev_y: usize,
}

impl Neighbors {
    /// Neighbours in Wolff visiting order: prev_x, next_x, prev_y, next_y.
    #[inline]
    pub fn as_array(&self) -> [usize; 4] {
        [self.prev_x, self.next_x, self.prev_y, self.next_y]
    }
}

/// 2D lattice with helical boundary conditions and a precomputed neighbour
/// table.
///
/// Sites are indexed in row-major order, `site = row * x_dim + col`. Instead
/// of wrapping each axis independently, the flattened index is treated as a
/// single ring: stepping right off the end of a row lands on the first site
/// of the next row, and the last site of the lattice wraps to site 0.
///
/// The last site's forward-y neighbour is `x_dim` rather than the `x_dim - 1`
/// that the generic last-row rule would give. This asymmetry is part of the
/// sampled topology and is kept as is.
#[derive(Debug, Clone)]
pub struct HelicalLattice {
    pub x_dim: usize,
    pub y_dim: usize,
    /// Total number of sites (`x_dim * y_dim`).
    pub n_sites: usize,
    neighbors: Vec<Neighbors>,
}

impl HelicalLattice {
    /// Needs `x_dim >= 2` and `y_dim >= 3`: with two rows the forward and
    /// backward y neighbours coincide.
    pub fn new(x_dim: usize, y_dim: usize) -> Result<Self> {
        if x_dim < 2 || y_dim < 3 {
            return Err(SimError::InvalidDimensions { x_dim, y_dim });
        }
        let n_sites = x_dim * y_dim;
        let neighbors = (0..n_sites)
            .map(|site| helical_neighbors(site, x_dim, n_sites))
            .collect();

        Ok(Self {
            x_dim,
            y_dim,
            n_sites,
            neighbors,
        })
    }

    #[inline]
    pub fn neighbors(&self, site: usize) -> Neighbors {
        self.neighbors[site]
    }

    /// Site ranges of each row, top to bottom.
    pub fn rows(&self) -> impl Iterator<Item = std::ops::Range<usize>> + '_ {
        (0..self.y_dim).map(move |r| r * self.x_dim..(r + 1) * self.x_dim)
    }
}

fn helical_neighbors(site: usize, x_dim: usize, n_sites: usize) -> Neighbors {
    let (next_x, next_y) = if site < n_sites - x_dim {
        (site + 1, site + x_dim)
    } else if site < n_sites - 1 {
        // last row: y wraps back to the first row
        (site + 1, site + x_dim - n_sites)
    } else {
        (0, x_dim)
    };

    // `>=` so that site `x_dim` (first site of the second row) has a row above it.
    let (prev_x, prev_y) = if site >= x_dim {
        (site - 1, site - x_dim)
    } else if site > 0 {
        (site - 1, site + n_sites - x_dim)
    } else {
        (n_sites - 1, n_sites - x_dim)
    };

    Neighbors {
        next_x,
        prev_x,
        next_y,
        prev_y,
    }
}
