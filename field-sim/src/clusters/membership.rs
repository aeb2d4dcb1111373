/// Bucket count used when no lattice size is known. Prime, so the plain
/// modulo hash spreads consecutive sites evenly.
pub const DEFAULT_BUCKETS: usize = 4093;

const NIL: u32 = u32::MAX;

#[derive(Debug, Clone, Copy)]
struct Node {
    site: u32,
    next: u32,
}

/// Chained hash set of lattice sites, used to track Wolff cluster members.
///
/// Chain nodes live in an arena owned by the set and are linked by index.
/// `heads[b]` is the most recently inserted node of bucket `b`, or `NIL`.
///
/// `insert` does not look for an existing entry: a duplicate would be
/// counted twice and flipped twice, so callers test `contains` first.
#[derive(Debug, Clone)]
pub struct ClusterSet {
    heads: Vec<u32>,
    nodes: Vec<Node>,
    mask: Option<usize>,
}

impl ClusterSet {
    pub fn with_buckets(n_buckets: usize) -> Self {
        let n_buckets = n_buckets.max(1);
        let mask = n_buckets.is_power_of_two().then(|| n_buckets - 1);
        Self {
            heads: vec![NIL; n_buckets],
            nodes: Vec::new(),
            mask,
        }
    }

    /// One bucket per four sites keeps average chains a few nodes long.
    pub fn for_lattice(n_sites: usize) -> Self {
        Self::with_buckets(n_sites / 4)
    }

    pub fn n_buckets(&self) -> usize {
        self.heads.len()
    }

    #[inline]
    fn bucket(&self, site: usize) -> usize {
        match self.mask {
            Some(mask) => site.wrapping_mul(17).wrapping_sub(97) & mask,
            None => site % self.heads.len(),
        }
    }

    #[inline]
    pub fn insert(&mut self, site: usize) {
        let b = self.bucket(site);
        let idx = self.nodes.len() as u32;
        self.nodes.push(Node {
            site: site as u32,
            next: self.heads[b],
        });
        self.heads[b] = idx;
    }

    #[inline]
    pub fn contains(&self, site: usize) -> bool {
        let mut cur = self.heads[self.bucket(site)];
        while cur != NIL {
            let node = self.nodes[cur as usize];
            if node.site as usize == site {
                return true;
            }
            cur = node.next;
        }
        false
    }

    /// Empty every chain and release all nodes. The arena keeps its capacity
    /// for the next cluster.
    pub fn clear(&mut self) {
        self.heads.fill(NIL);
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Members in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.nodes.iter().map(|n| n.site as usize)
    }

    /// Length of the longest chain.
    pub fn max_chain_len(&self) -> usize {
        self.heads
            .iter()
            .map(|&head| {
                let mut len = 0;
                let mut cur = head;
                while cur != NIL {
                    len += 1;
                    cur = self.nodes[cur as usize].next;
                }
                len
            })
            .max()
            .unwrap_or(0)
    }
}

impl Default for ClusterSet {
    fn default() -> Self {
        Self::with_buckets(DEFAULT_BUCKETS)
    }
}
