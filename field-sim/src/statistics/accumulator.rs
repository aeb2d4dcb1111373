use super::Statistics;

/// Per-run measurement state: the ordered sample series plus running
/// power sums of every observable the summary reports.
#[derive(Debug, Clone)]
pub struct SampleAccumulator {
    pub energies: Vec<f64>,
    pub orders: Vec<f64>,
    pub abs_orders: Vec<f64>,
    pub energy: Statistics,
    pub energy2: Statistics,
    pub order: Statistics,
    pub order2: Statistics,
    pub order4: Statistics,
    pub abs_order: Statistics,
    pub abs_order2: Statistics,
}

impl SampleAccumulator {
    pub fn with_capacity(n_samples: usize) -> Self {
        Self {
            energies: Vec::with_capacity(n_samples),
            orders: Vec::with_capacity(n_samples),
            abs_orders: Vec::with_capacity(n_samples),
            energy: Statistics::new(1),
            energy2: Statistics::new(2),
            order: Statistics::new(1),
            order2: Statistics::new(2),
            order4: Statistics::new(4),
            abs_order: Statistics::new(1),
            abs_order2: Statistics::new(2),
        }
    }

    pub fn record(&mut self, energy: f64, order: f64) {
        let abs = order.abs();
        self.energies.push(energy);
        self.orders.push(order);
        self.abs_orders.push(abs);

        self.energy.update(energy);
        self.energy2.update(energy);
        self.order.update(order);
        self.order2.update(order);
        self.order4.update(order);
        self.abs_order.update(abs);
        self.abs_order2.update(abs);
    }

    pub fn len(&self) -> usize {
        self.energies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.energies.is_empty()
    }
}

impl Default for SampleAccumulator {
    fn default() -> Self {
        Self::with_capacity(0)
    }
}
