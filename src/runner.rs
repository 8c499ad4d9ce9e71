use tracing::{debug, debug_span, trace, warn};

use crate::phase::run_phase;
use crate::point::real;
use crate::verify::Verifier;
use crate::{
    lp_distance, AuctionError, AuctionParams, AuctionResult, DenseOracle, Ledger, Oracle, Point,
    Real,
};

/// Epsilon-scaling Gauss-Seidel auction between two point sets of equal size.
///
/// Points of the first set bid for points of the second. Every phase clears the
/// assignment, rescales prices and bids until all bidders hold an item; the bid
/// increment shrinks by `epsilon_common_ratio` between phases until the certified relative
/// error drops to `delta`.
///
/// A runner is single use: once [`run`](Self::run) has finished, further calls return the
/// same result.
pub struct AuctionRunner<'a, R: Real, P, O = DenseOracle<R>> {
    bidders: &'a [P],
    items: &'a [P],
    params: AuctionParams<R>,
    oracle: O,
    ledger: Ledger,
    verifier: Verifier,
    result: AuctionResult<R>,
    is_distance_computed: bool,
}

impl<'a, R, P> AuctionRunner<'a, R, P>
where
    R: Real,
    P: Point<R>,
{
    pub fn new(
        bidders: &'a [P],
        items: &'a [P],
        params: AuctionParams<R>,
    ) -> Result<Self, AuctionError> {
        Self::build(bidders, items, params, &[])
    }

    /// Like [`new`](Self::new), seeding the item prices, e.g. from an earlier run on
    /// similar input.
    pub fn with_prices(
        bidders: &'a [P],
        items: &'a [P],
        params: AuctionParams<R>,
        prices: &[R],
    ) -> Result<Self, AuctionError> {
        Self::build(bidders, items, params, prices)
    }
}

impl<'a, R, P, O> AuctionRunner<'a, R, P, O>
where
    R: Real,
    P: Point<R>,
    O: Oracle<R>,
{
    /// Builds a runner around any oracle. An empty `prices` slice keeps the oracle's own
    /// starting prices.
    pub fn build(
        bidders: &'a [P],
        items: &'a [P],
        mut params: AuctionParams<R>,
        prices: &[R],
    ) -> Result<Self, AuctionError> {
        params.validate()?;
        if bidders.len() != items.len() {
            return Err(AuctionError::SizeMismatch {
                bidders: bidders.len(),
                items: items.len(),
            });
        }
        check_points::<R, P>("bidder", bidders, params.dim)?;
        check_points::<R, P>("item", items, params.dim)?;

        let mut oracle = O::new(bidders, items, &params);
        if !prices.is_empty() {
            if prices.len() != items.len() {
                return Err(AuctionError::PriceLengthMismatch {
                    expected: items.len(),
                    found: prices.len(),
                });
            }
            oracle.set_prices(prices);
        }

        params.epsilon_common_ratio = params.common_ratio();
        if params.initial_epsilon <= R::zero() {
            params.initial_epsilon = oracle.max_val() / real(4);
        }
        // every pairwise cost is zero, any positive increment will do
        if params.initial_epsilon <= R::zero() {
            params.initial_epsilon = R::one();
        }

        Ok(Self {
            bidders,
            items,
            ledger: Ledger::new(bidders.len()),
            verifier: Verifier::new(params.verify),
            result: AuctionResult::default(),
            is_distance_computed: false,
            oracle,
            params,
        })
    }

    /// Parameters in effect, with the automatic epsilon and ratio filled in.
    pub fn params(&self) -> &AuctionParams<R> {
        &self.params
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Result of the completed run.
    pub fn result(&self) -> Result<&AuctionResult<R>, AuctionError> {
        if !self.is_distance_computed {
            return Err(AuctionError::NotComputed);
        }
        Ok(&self.result)
    }

    pub fn run(&mut self) -> Result<&AuctionResult<R>, AuctionError> {
        if self.is_distance_computed {
            return Ok(&self.result);
        }

        let span = debug_span!("auction", bidders = self.bidders.len());
        let _enter = span.enter();

        match self.bidders.len() {
            0 => {
                trace!("empty point sets");
                self.result.final_relative_error = R::zero();
            }
            1 => {
                trace!("single bidder, assignment is trivial");
                self.ledger.assign(0, 0);
                self.result.cost = self.item_bidder_cost(Some(0), Some(0), false)?;
                self.result.final_relative_error = R::zero();
                self.result.num_rounds = self.ledger.rounds();
            }
            _ => self.run_auction_phases()?,
        }

        self.result.compute_distance(self.params.wasserstein_power);
        self.is_distance_computed = true;

        if self.params.return_matching {
            let matching = self
                .ledger
                .pairs()
                .map(|(bidder, item)| (self.bidder_id(bidder), self.item_id(item)))
                .collect();
            self.result.matching = matching;
        }
        if self.params.verify {
            self.trace_matching();
        }

        Ok(&self.result)
    }

    fn run_auction_phases(&mut self) -> Result<(), AuctionError> {
        let q_root = self.params.wasserstein_power.recip();
        let n = real::<R>(self.ledger.len());

        self.result.final_relative_error = R::max_value();
        self.oracle.set_epsilon(self.params.initial_epsilon);
        self.result.start_epsilon = self.oracle.epsilon();
        self.result.final_epsilon = self.oracle.epsilon();

        for phase in 1..=self.params.max_num_phases {
            self.ledger.reset();
            self.oracle.adjust_prices();
            let bids = run_phase(&mut self.ledger, &mut self.oracle, self.verifier);

            let epsilon = self.oracle.epsilon();
            self.result.record_phase(epsilon);
            let cost = self.distance_to_qth_power()?;

            // costs are non-negative, so a free matching is optimal
            if cost == R::zero() {
                self.result.final_relative_error = R::zero();
                debug!(phase, bids, "zero-cost matching");
                break;
            }

            // the bound is only defined once the cost dominates N * epsilon
            let denominator = cost - n * epsilon;
            let mut converged = false;
            if denominator > R::zero() {
                let denominator = denominator.powf(q_root);
                self.result.final_relative_error = (cost.powf(q_root) - denominator) / denominator;
                converged = self.result.final_relative_error <= self.params.delta;
            }

            debug!(
                phase,
                bids,
                epsilon = ?epsilon,
                cost = ?cost,
                relative_error = ?self.result.final_relative_error,
                "auction phase complete"
            );

            if converged {
                break;
            }
            if phase < self.params.max_num_phases {
                self.oracle
                    .set_epsilon(epsilon / self.params.epsilon_common_ratio);
            }
        }

        self.result.num_rounds = self.ledger.rounds();
        self.result.prices = self.oracle.prices().to_vec();

        if !self.result.converged(self.params.delta) {
            let relative_error = self.result.final_relative_error.to_f64().unwrap_or(f64::NAN);
            let distance = self.result.cost.powf(q_root).to_f64().unwrap_or(f64::NAN);
            if !self.params.tolerate_max_iter_exceeded {
                return Err(AuctionError::MaxPhasesExceeded {
                    phases: self.result.num_phases,
                    relative_error,
                    distance,
                });
            }
            warn!(
                phases = self.result.num_phases,
                relative_error, distance, "maximum number of phases exceeded, keeping last matching"
            );
        } else {
            debug!(
                phases = self.result.num_phases,
                rounds = self.result.num_rounds,
                "auction converged"
            );
        }
        Ok(())
    }

    /// Cost of giving `item` to `bidder`. An absent or out-of-range index is an error
    /// unless `tolerate_invalid_idx` is set, in which case the pair costs nothing.
    pub fn item_bidder_cost(
        &self,
        item: Option<usize>,
        bidder: Option<usize>,
        tolerate_invalid_idx: bool,
    ) -> Result<R, AuctionError> {
        let n = self.bidders.len();
        match (item, bidder) {
            (Some(i), Some(b)) if i < n && b < n => Ok(lp_distance(
                &self.bidders[b],
                &self.items[i],
                self.params.internal_p,
                self.params.dim,
            )
            .powf(self.params.wasserstein_power)),
            _ if tolerate_invalid_idx => Ok(R::zero()),
            _ => Err(AuctionError::InvalidIndex { item, bidder }),
        }
    }

    /// Recomputes the cost of the current assignment and stores it in the result.
    fn distance_to_qth_power(&mut self) -> Result<R, AuctionError> {
        self.verifier.ledger(&self.ledger);
        let cost = (0..self.ledger.len())
            .map(|b| self.item_bidder_cost(self.ledger.item_of(b), Some(b), false))
            .sum::<Result<R, _>>()?;
        self.result.cost = cost;
        Ok(cost)
    }

    pub fn wasserstein_cost(&self) -> Result<R, AuctionError> {
        if !self.is_distance_computed {
            return Err(AuctionError::NotComputed);
        }
        Ok(self.result.cost)
    }

    pub fn wasserstein_distance(&self) -> Result<R, AuctionError> {
        if !self.is_distance_computed {
            return Err(AuctionError::NotComputed);
        }
        Ok(self.result.distance)
    }

    fn bidder_id(&self, bidder: usize) -> usize {
        self.bidders[bidder].id().unwrap_or(bidder)
    }

    fn item_id(&self, item: usize) -> usize {
        self.items[item].id().unwrap_or(item)
    }

    fn trace_matching(&self) {
        for (bidder, item) in self.ledger.pairs() {
            let cost = self.item_bidder_cost(Some(item), Some(bidder), true);
            trace!(bidder, item, cost = ?cost, "matched");
        }
    }
}

/// Every point needs `dim` finite leading coordinates; an infinite one would make every
/// bid value infinite and the bidding never settles.
fn check_points<R: Real, P: Point<R>>(
    side: &'static str,
    points: &[P],
    dim: usize,
) -> Result<(), AuctionError> {
    for (index, p) in points.iter().enumerate() {
        if p.dim() < dim {
            return Err(AuctionError::DimensionMismatch {
                side,
                index,
                expected: dim,
                found: p.dim(),
            });
        }
        if !(0..dim).all(|i| p.coord(i).is_finite()) {
            return Err(AuctionError::NonFiniteCoordinate { side, index });
        }
    }
    Ok(())
}

/// Runs a fresh auction and returns the Wasserstein cost, i.e. the distance to the power `q`.
pub fn wasserstein_cost<R, P>(
    bidders: &[P],
    items: &[P],
    params: &AuctionParams<R>,
) -> Result<R, AuctionError>
where
    R: Real,
    P: Point<R>,
{
    let mut runner = AuctionRunner::new(bidders, items, params.clone())?;
    runner.run()?;
    runner.wasserstein_cost()
}

/// Runs a fresh auction and returns the Wasserstein distance.
pub fn wasserstein_distance<R, P>(
    bidders: &[P],
    items: &[P],
    params: &AuctionParams<R>,
) -> Result<R, AuctionError>
where
    R: Real,
    P: Point<R>,
{
    let mut runner = AuctionRunner::new(bidders, items, params.clone())?;
    runner.run()?;
    runner.wasserstein_distance()
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn params() -> AuctionParams<f64> {
        AuctionParams {
            wasserstein_power: 2.0,
            internal_p: 2.0,
            delta: 0.01,
            verify: true,
            ..Default::default()
        }
    }

    #[test]
    fn size_mismatch_fails_fast() {
        let a = [[0.0, 0.0]];
        let b = [[0.0, 0.0], [1.0, 1.0]];
        assert_eq!(
            AuctionRunner::new(&a, &b, params()).err(),
            Some(AuctionError::SizeMismatch {
                bidders: 1,
                items: 2
            })
        );
    }

    #[test]
    fn short_points_are_rejected() {
        let a = vec![vec![0.0, 0.0], vec![1.0]];
        let b = vec![vec![0.0, 0.0], vec![1.0, 1.0]];
        assert!(matches!(
            AuctionRunner::new(&a, &b, params()).err(),
            Some(AuctionError::DimensionMismatch {
                side: "bidder",
                index: 1,
                ..
            })
        ));
    }

    #[test]
    fn price_length_is_checked() {
        let a = [[0.0, 0.0], [1.0, 0.0]];
        assert!(matches!(
            AuctionRunner::with_prices(&a, &a, params(), &[1.0]).err(),
            Some(AuctionError::PriceLengthMismatch {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn infinite_coordinates_are_rejected() {
        let a = [[0.0, 0.0], [1.0, f64::INFINITY]];
        let b = [[0.0, 1.0], [1.0, f64::INFINITY]];
        let params = AuctionParams {
            max_num_phases: 5,
            tolerate_max_iter_exceeded: true,
            ..params()
        };
        assert_eq!(
            AuctionRunner::new(&a, &b, params.clone()).err(),
            Some(AuctionError::NonFiniteCoordinate {
                side: "bidder",
                index: 1
            })
        );
        assert_eq!(
            AuctionRunner::new(&b[..1], &a[1..], params).err(),
            Some(AuctionError::NonFiniteCoordinate {
                side: "item",
                index: 0
            })
        );
    }

    #[test]
    fn coordinates_past_dim_may_be_infinite() {
        let a = [[0.0, 0.0, f64::INFINITY], [1.0, 0.0, f64::NAN]];
        let b = [[0.0, 1.0, 0.0], [1.0, 1.0, 0.0]];
        let mut runner = AuctionRunner::new(&a, &b, params()).expect("valid input");
        assert_abs_diff_eq!(runner.run().expect("converges").cost, 2.0);
    }

    #[test]
    fn accessors_require_a_run() {
        let a = [[0.0, 0.0], [1.0, 0.0]];
        let mut runner = AuctionRunner::new(&a, &a, params()).expect("valid input");
        assert_eq!(runner.wasserstein_cost(), Err(AuctionError::NotComputed));
        assert_eq!(runner.wasserstein_distance(), Err(AuctionError::NotComputed));
        assert_eq!(runner.result().err(), Some(AuctionError::NotComputed));

        let cost = runner.run().expect("converges").cost;
        assert_eq!(runner.result().map(|r| r.cost), Ok(cost));
    }

    #[test]
    fn initial_epsilon_defaults_to_quarter_of_max_cost() {
        let a = [[0.0, 0.0], [2.0, 0.0]];
        let b = [[0.0, 0.0], [0.0, 4.0]];
        let runner = AuctionRunner::new(&a, &b, params()).expect("valid input");
        // largest squared distance is 4^2 + 2^2
        assert_abs_diff_eq!(runner.params().initial_epsilon, 5.0);
        assert_eq!(runner.params().epsilon_common_ratio, 5.0);
    }

    #[test]
    fn negative_initial_epsilon_is_derived() {
        let a = [[0.0, 0.0], [2.0, 0.0]];
        let b = [[0.0, 0.0], [0.0, 4.0]];
        let params = AuctionParams {
            initial_epsilon: -1.0,
            ..params()
        };
        let runner = AuctionRunner::new(&a, &b, params).expect("valid input");
        assert_abs_diff_eq!(
            runner.params().initial_epsilon,
            runner.oracle().max_val() / 4.0
        );
        assert_abs_diff_eq!(runner.params().initial_epsilon, 5.0);
    }

    #[test]
    fn invalid_indices() {
        let a = [[0.0, 0.0], [3.0, 4.0]];
        let runner = AuctionRunner::new(&a, &a, params()).expect("valid input");

        assert_abs_diff_eq!(
            runner.item_bidder_cost(Some(1), Some(0), false).expect("valid"),
            25.0
        );
        assert_eq!(
            runner.item_bidder_cost(None, Some(0), false),
            Err(AuctionError::InvalidIndex {
                item: None,
                bidder: Some(0)
            })
        );
        assert!(runner.item_bidder_cost(Some(5), Some(0), false).is_err());
        assert_eq!(runner.item_bidder_cost(Some(0), None, true), Ok(0.0));
    }

    #[test]
    fn single_point_skips_phases() {
        let a = [[1.0, 1.0]];
        let b = [[4.0, 5.0]];
        let mut runner = AuctionRunner::new(&a, &b, params()).expect("valid input");
        let result = runner.run().expect("trivial run").clone();

        assert_abs_diff_eq!(result.cost, 25.0);
        assert_abs_diff_eq!(result.distance, 5.0);
        assert_eq!(result.num_phases, 0);
        assert_eq!(result.num_rounds, 1);
        assert_eq!(runner.ledger().item_of(0), Some(0));
    }

    #[test]
    fn empty_sets_have_zero_distance() {
        let a: [[f64; 2]; 0] = [];
        let mut runner = AuctionRunner::new(&a, &a, params()).expect("valid input");
        let result = runner.run().expect("empty run");
        assert_eq!(result.cost, 0.0);
        assert_eq!(result.num_phases, 0);
    }

    #[test]
    fn coincident_points_stop_after_one_phase() {
        let a = [[1.0, 1.0]; 4];
        let mut runner = AuctionRunner::new(&a, &a, params()).expect("valid input");
        let result = runner.run().expect("zero-cost run");

        assert_eq!(result.cost, 0.0);
        assert_eq!(result.num_phases, 1);
        assert_eq!(result.final_relative_error, 0.0);
    }

    #[test]
    fn second_run_returns_same_result() {
        let a = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let b = [[0.1, 0.9], [1.1, 0.2], [0.3, 0.0]];
        let mut runner = AuctionRunner::new(&a, &b, params()).expect("valid input");
        let first = runner.run().expect("converges").clone();
        let second = runner.run().expect("cached").clone();

        assert_eq!(first, second);
        assert_eq!(runner.wasserstein_cost(), Ok(first.cost));
        assert_eq!(runner.wasserstein_cost(), runner.wasserstein_cost());
    }

    #[test]
    fn free_functions_agree_with_runner() {
        let a = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let b = [[0.1, 0.9], [1.1, 0.2], [0.3, 0.0]];
        let cost = wasserstein_cost(&a, &b, &params()).expect("converges");
        let distance = wasserstein_distance(&a, &b, &params()).expect("converges");
        assert_abs_diff_eq!(distance, cost.sqrt(), epsilon = 1e-12);
    }
}
