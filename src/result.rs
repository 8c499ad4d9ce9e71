use crate::Real;

/// Everything a finished auction reports.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AuctionResult<R> {
    /// Sum of powered ground distances under the final matching.
    pub cost: R,
    /// `cost` raised to `1 / q`.
    pub distance: R,
    /// Bids placed over the whole run.
    pub num_rounds: usize,
    pub num_phases: usize,
    pub start_epsilon: R,
    /// Epsilon of the last completed phase.
    pub final_epsilon: R,
    /// Certified bound on `(distance - optimum) / optimum` after the last phase.
    pub final_relative_error: R,
    /// Epsilon used by each phase, in order.
    pub epsilons: Vec<R>,
    /// Item prices when the auction stopped.
    pub prices: Vec<R>,
    /// `(bidder id, item id)` pairs, filled only when the matching was requested.
    pub matching: Vec<(usize, usize)>,
}

impl<R: Real> Default for AuctionResult<R> {
    fn default() -> Self {
        Self {
            cost: R::zero(),
            distance: R::zero(),
            num_rounds: 0,
            num_phases: 0,
            start_epsilon: R::zero(),
            final_epsilon: R::zero(),
            final_relative_error: R::max_value(),
            epsilons: Vec::new(),
            prices: Vec::new(),
            matching: Vec::new(),
        }
    }
}

impl<R: Real> AuctionResult<R> {
    pub(crate) fn compute_distance(&mut self, wasserstein_power: R) {
        self.distance = self.cost.powf(wasserstein_power.recip());
    }

    pub(crate) fn record_phase(&mut self, epsilon: R) {
        self.num_phases += 1;
        self.final_epsilon = epsilon;
        self.epsilons.push(epsilon);
    }

    /// Whether the certified error bound is within `delta`.
    pub fn converged(&self, delta: R) -> bool {
        self.final_relative_error <= delta
    }
}
