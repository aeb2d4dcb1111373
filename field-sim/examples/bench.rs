use std::time::Instant;

use field_sim::{run, IsingLattice, NullSink, Phi4Lattice, Phi4Params, SimConfig};

const L: usize = 128;
const N_EQUIL: usize = 200;
const N_SAMPLES: usize = 100;

fn main() -> field_sim::Result<()> {
    let mut config = SimConfig::new(L, L, N_EQUIL, N_SAMPLES);
    config.wolff_interval = Some(1);
    let n_sweeps = config.total_sweeps();

    println!(
        "Lattice: {}x{}  |  Equilibration: {}  |  Samples: {}  |  Sweeps: {}",
        L, L, N_EQUIL, N_SAMPLES, n_sweeps
    );
    println!("Config: metropolis + wolff every sweep, near T_c");
    println!("{}", "-".repeat(70));

    let mut ising = IsingLattice::new(L, L, 227)?;
    let t0 = Instant::now();
    let summary = run(&mut ising, &config, &mut NullSink, &|| {})?;
    let elapsed = t0.elapsed().as_secs_f64();
    println!(
        "ising: {:.3} s  |  {:.3} ms/sweep  |  <|m|> = {:.4}  |  mean cluster = {:.1}",
        elapsed,
        elapsed / n_sweeps as f64 * 1000.0,
        summary.abs_order,
        summary.counters.mean_cluster_size()
    );

    let mut phi4 = Phi4Lattice::new(L, L, Phi4Params::new(-1.25, 1.0))?;
    let t0 = Instant::now();
    let summary = run(&mut phi4, &config, &mut NullSink, &|| {})?;
    let elapsed = t0.elapsed().as_secs_f64();
    println!(
        "phi4:  {:.3} s  |  {:.3} ms/sweep  |  <|phi|> = {:.4}  |  mean cluster = {:.1}",
        elapsed,
        elapsed / n_sweeps as f64 * 1000.0,
        summary.abs_order,
        summary.counters.mean_cluster_size()
    );
    Ok(())
}
