//! Generation technology stack with a fixed merit order.

/// One generation technology in the dispatch stack.
#[derive(Debug, Clone, PartialEq)]
pub struct Technology {
    /// Technology name (for reports and per-technology production output).
    pub name: &'static str,
    /// Installed capacity (kW).
    pub capacity_kw: f64,
    /// Emission intensity (gCO2/kWh).
    pub intensity_g_per_kwh: f64,
}

impl Technology {
    /// Creates a new technology entry.
    ///
    /// # Panics
    ///
    /// Panics if the capacity is not positive or the intensity is negative.
    pub fn new(name: &'static str, capacity_kw: f64, intensity_g_per_kwh: f64) -> Self {
        assert!(capacity_kw > 0.0);
        assert!(intensity_g_per_kwh >= 0.0);
        Self {
            name,
            capacity_kw,
            intensity_g_per_kwh,
        }
    }
}

/// Ordered generation stack.
///
/// The ordering is the merit order: dispatch fills each technology's capacity
/// completely before moving to the next. The order is fixed at construction
/// and never changes at runtime; cumulative-capacity prefix sums are computed
/// once and reused by every dispatch and marginal-rate query.
#[derive(Debug, Clone)]
pub struct GenerationStack {
    technologies: Vec<Technology>,
    cumulative_kw: Vec<f64>,
}

impl GenerationStack {
    /// Builds a stack from technologies already in merit order.
    ///
    /// # Panics
    ///
    /// Panics if `technologies` is empty.
    pub fn new(technologies: Vec<Technology>) -> Self {
        assert!(!technologies.is_empty());

        let mut cumulative_kw = Vec::with_capacity(technologies.len());
        let mut running = 0.0;
        for tech in &technologies {
            running += tech.capacity_kw;
            cumulative_kw.push(running);
        }

        Self {
            technologies,
            cumulative_kw,
        }
    }

    /// The French 2019 generation mix used by the original study.
    ///
    /// Capacities converted to kW; intensities in gCO2/kWh. The order mixes
    /// cost and cleanliness (bioenergy dispatches before nuclear) and is part
    /// of the model, not an artifact.
    pub fn french_2019() -> Self {
        Self::new(vec![
            Technology::new("solar", 2_600_000.0, 0.0),
            Technology::new("wind", 6_000_000.0, 0.0),
            Technology::new("hydro", 25_504_000.0, 0.0),
            Technology::new("bioenergy", 2_234_000.0, 494.0),
            Technology::new("nuclear", 61_370_000.0, 0.0),
            Technology::new("gas", 12_752_000.0, 429.0),
            Technology::new("coal", 1_818_000.0, 986.0),
            Technology::new("fuel-oil", 3_000_000.0, 777.0),
        ])
    }

    /// Technologies in merit order.
    pub fn technologies(&self) -> &[Technology] {
        &self.technologies
    }

    /// Number of technologies in the stack.
    pub fn len(&self) -> usize {
        self.technologies.len()
    }

    /// Returns `true` when the stack has no technologies (never, by
    /// construction).
    pub fn is_empty(&self) -> bool {
        self.technologies.is_empty()
    }

    /// Cumulative capacity after each technology (kW).
    pub fn cumulative_kw(&self) -> &[f64] {
        &self.cumulative_kw
    }

    /// Total installed capacity (kW).
    pub fn total_capacity_kw(&self) -> f64 {
        *self.cumulative_kw.last().unwrap_or(&0.0)
    }

    /// Index of the technology whose cumulative-capacity interval contains
    /// `load_kw`.
    ///
    /// Intervals are half-open: a load sitting exactly on a breakpoint
    /// belongs to the next block, since that block absorbs the next load
    /// increment. Loads at or above total capacity map to the last block.
    pub fn block_index(&self, load_kw: f64) -> usize {
        self.cumulative_kw
            .iter()
            .position(|&cum| load_kw < cum)
            .unwrap_or(self.technologies.len() - 1)
    }
}
