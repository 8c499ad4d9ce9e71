use crate::{AuctionError, Real};

/// Configuration of a single auction run.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AuctionParams<R: Real> {
    /// Exponent `q` of the transport cost; the reported distance is the `q`-th root of the cost.
    pub wasserstein_power: R,
    /// Exponent of the Minkowski ground metric, `+inf` for the max norm.
    pub internal_p: R,
    /// Number of leading coordinates the ground metric looks at.
    pub dim: usize,
    /// Target relative error.
    pub delta: R,
    /// Bid increment of the first phase. Zero or negative derives it from the largest
    /// pairwise cost.
    pub initial_epsilon: R,
    /// Divisor applied to epsilon between phases, `0` for the default of 5.
    pub epsilon_common_ratio: R,
    pub max_num_phases: usize,
    /// Return the last completed phase instead of failing when `max_num_phases` runs out.
    pub tolerate_max_iter_exceeded: bool,
    pub return_matching: bool,
    /// Check ledger invariants after every assignment and every phase.
    pub verify: bool,
}

impl<R: Real> Default for AuctionParams<R> {
    fn default() -> Self {
        Self {
            wasserstein_power: R::one(),
            internal_p: R::infinity(),
            dim: 2,
            delta: R::from_f64(0.01).unwrap_or_else(R::epsilon),
            initial_epsilon: R::zero(),
            epsilon_common_ratio: Self::default_common_ratio(),
            max_num_phases: usize::MAX,
            tolerate_max_iter_exceeded: false,
            return_matching: false,
            verify: cfg!(debug_assertions),
        }
    }
}

impl<R: Real> AuctionParams<R> {
    fn default_common_ratio() -> R {
        crate::point::real(5)
    }

    /// Rejects configurations under which the epsilon-scaling loop is meaningless.
    pub fn validate(&self) -> Result<(), AuctionError> {
        if !(self.wasserstein_power >= R::one()) {
            return Err(AuctionError::InvalidParams(
                "wasserstein_power must be at least 1",
            ));
        }
        if !(self.internal_p >= R::one()) {
            return Err(AuctionError::InvalidParams("internal_p must be at least 1"));
        }
        if !(self.delta > R::zero()) {
            return Err(AuctionError::InvalidParams("delta must be positive"));
        }
        if self.dim == 0 {
            return Err(AuctionError::InvalidParams("dim must be positive"));
        }
        if self.max_num_phases == 0 {
            return Err(AuctionError::InvalidParams("max_num_phases must be positive"));
        }
        if !self.initial_epsilon.is_finite() {
            return Err(AuctionError::InvalidParams("initial_epsilon must be finite"));
        }
        if !(self.epsilon_common_ratio == R::zero() || self.epsilon_common_ratio > R::one())
            || self.epsilon_common_ratio.is_infinite()
        {
            return Err(AuctionError::InvalidParams(
                "epsilon_common_ratio must be 0 or greater than 1",
            ));
        }
        Ok(())
    }

    /// Decay divisor with the `0 => 5` default applied.
    pub fn common_ratio(&self) -> R {
        if self.epsilon_common_ratio == R::zero() {
            Self::default_common_ratio()
        } else {
            self.epsilon_common_ratio
        }
    }
}
