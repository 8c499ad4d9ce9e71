use nalgebra::{DMatrix, DVector};

use crate::{lp_distance, AuctionParams, Point, Real};

/// The item a bidder wants and the price it offers for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bid<R> {
    pub item: usize,
    pub value: R,
}

/// Bid and price engine driven by [`AuctionRunner`](crate::AuctionRunner).
///
/// The oracle owns the item prices and the current bid increment. The runner never
/// inspects prices except to report them at the end of a run.
pub trait Oracle<R: Real>: Sized {
    fn new<P: Point<R>>(bidders: &[P], items: &[P], params: &AuctionParams<R>) -> Self;

    /// Cheapest item for `bidder` at the current prices, and the price that keeps it
    /// cheapest for that bidder by at least epsilon.
    fn optimal_bid(&mut self, bidder: usize) -> Bid<R>;

    fn set_price(&mut self, item: usize, price: R);

    /// Called before every phase, after the assignment has been cleared.
    fn adjust_prices(&mut self);

    fn epsilon(&self) -> R;

    fn set_epsilon(&mut self, epsilon: R);

    fn prices(&self) -> &[R];

    fn set_prices(&mut self, prices: &[R]);

    /// Largest pairwise cost between a bidder and an item.
    fn max_val(&self) -> R;
}

/// Gauss-Seidel oracle over a precomputed cost matrix.
///
/// Entry `(b, i)` of the matrix is the ground distance between bidder `b` and item `i`
/// raised to the Wasserstein power. Every bid scans one row, so a bid costs `O(N)`.
#[derive(Debug, Clone)]
pub struct DenseOracle<R: Real> {
    weights: DMatrix<R>,
    prices: DVector<R>,
    epsilon: R,
    max_val: R,
}

impl<R: Real> DenseOracle<R> {
    pub fn weight(&self, bidder: usize, item: usize) -> R {
        self.weights[(bidder, item)]
    }
}

impl<R: Real> Oracle<R> for DenseOracle<R> {
    fn new<P: Point<R>>(bidders: &[P], items: &[P], params: &AuctionParams<R>) -> Self {
        let weights = DMatrix::from_fn(bidders.len(), items.len(), |b, i| {
            lp_distance(&bidders[b], &items[i], params.internal_p, params.dim)
                .powf(params.wasserstein_power)
        });
        let max_val = weights.iter().fold(R::zero(), |m, &w| m.max(w));

        Self {
            prices: DVector::zeros(items.len()),
            epsilon: R::one(),
            weights,
            max_val,
        }
    }

    fn optimal_bid(&mut self, bidder: usize) -> Bid<R> {
        let mut best_item = 0;
        let mut best = R::infinity();
        let mut second = R::infinity();

        for (item, (&w, &p)) in self
            .weights
            .row(bidder)
            .iter()
            .zip(self.prices.iter())
            .enumerate()
        {
            let value = w + p;
            if value < best {
                second = best;
                best = value;
                best_item = item;
            } else if value < second {
                second = value;
            }
        }

        // a lone item has no competitor, so the bidder only pays the increment
        let margin = if second.is_finite() {
            second - best
        } else {
            R::zero()
        };

        Bid {
            item: best_item,
            value: self.prices[best_item] + margin + self.epsilon,
        }
    }

    fn set_price(&mut self, item: usize, price: R) {
        self.prices[item] = price;
    }

    /// Shifts all prices so the cheapest item costs nothing. Differences between prices,
    /// and hence every bidder's preference order, are unchanged.
    fn adjust_prices(&mut self) {
        if self.prices.is_empty() {
            return;
        }
        let min = self.prices.min();
        self.prices.add_scalar_mut(-min);
    }

    fn epsilon(&self) -> R {
        self.epsilon
    }

    fn set_epsilon(&mut self, epsilon: R) {
        debug_assert!(epsilon > R::zero(), "epsilon must stay positive");
        self.epsilon = epsilon;
    }

    fn prices(&self) -> &[R] {
        self.prices.as_slice()
    }

    fn set_prices(&mut self, prices: &[R]) {
        self.prices.copy_from_slice(prices);
    }

    fn max_val(&self) -> R {
        self.max_val
    }
}

#[cfg(test)]
mod test {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn oracle() -> DenseOracle<f64> {
        let bidders = [[0.0, 0.0], [10.0, 0.0]];
        let items = [[1.0, 0.0], [10.0, 2.0]];
        let params = AuctionParams {
            wasserstein_power: 2.0,
            internal_p: 2.0,
            ..Default::default()
        };
        DenseOracle::new(&bidders, &items, &params)
    }

    #[test]
    fn weights_are_powered_distances() {
        let oracle = oracle();
        assert_abs_diff_eq!(oracle.weight(0, 0), 1.0);
        assert_abs_diff_eq!(oracle.weight(1, 1), 4.0);
        assert_abs_diff_eq!(oracle.weight(0, 1), 104.0, epsilon = 1e-9);
        assert_abs_diff_eq!(oracle.max_val(), 104.0, epsilon = 1e-9);
    }

    #[test]
    fn bid_covers_gap_to_second_best() {
        let mut oracle = oracle();
        oracle.set_epsilon(0.5);

        let bid = oracle.optimal_bid(0);
        assert_eq!(bid.item, 0);
        assert_abs_diff_eq!(bid.value, 103.5, epsilon = 1e-9);

        oracle.set_price(0, bid.value);
        assert_eq!(oracle.optimal_bid(0).item, 1);
    }

    #[test]
    fn adjust_prices_keeps_differences() {
        let mut oracle = oracle();
        oracle.set_prices(&[3.0, 5.5]);
        oracle.adjust_prices();
        assert_eq!(oracle.prices(), &[0.0, 2.5]);
    }
}
