use super::membership::ClusterSet;
use crate::geometry::HelicalLattice;

/// Grow a Wolff cluster depth-first from `seed`.
///
/// `should_add(site, neighbor)` decides whether a not-yet-member neighbour
/// of `site` joins; it may consume random numbers. Each stack frame holds a
/// site and the next neighbour slot to visit, so neighbours are offered in
/// exactly the order a recursive implementation would offer them
/// (prev_x, next_x, prev_y, next_y, descending into each admitted site
/// before moving on). Depth is bounded by the heap, not the call stack.
///
/// Caller owns buffers: `cluster` and `stack` must be empty. On error both
/// are left as they were when growth stopped.
pub(crate) fn grow_cluster<E>(
    lattice: &HelicalLattice,
    seed: usize,
    cluster: &mut ClusterSet,
    stack: &mut Vec<(usize, u8)>,
    mut should_add: impl FnMut(usize, usize) -> Result<bool, E>,
) -> Result<(), E> {
    cluster.insert(seed);
    stack.push((seed, 0));

    while let Some(frame) = stack.last_mut() {
        let (site, slot) = *frame;
        if slot == 4 {
            stack.pop();
            continue;
        }
        frame.1 += 1;

        let nb = lattice.neighbors(site).as_array()[slot as usize];
        if !cluster.contains(nb) && should_add(site, nb)? {
            cluster.insert(nb);
            stack.push((nb, 0));
        }
    }
    Ok(())
}

/// Apply `flip` to every cluster member, then clear the set.
pub(crate) fn flip_cluster(cluster: &mut ClusterSet, mut flip: impl FnMut(usize)) {
    for site in cluster.iter() {
        flip(site);
    }
    cluster.clear();
}
