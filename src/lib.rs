//! Approximate q-Wasserstein distance between two point sets of equal size, e.g.
//! persistence diagrams, computed with the epsilon-scaling auction algorithm.
//!
//! ```
//! use wasserstein_auction::{wasserstein_distance, AuctionParams};
//!
//! let a = [[0.0, 0.0], [1.0, 1.0]];
//! let b = [[1.0, 1.0], [0.0, 0.5]];
//! let params = AuctionParams { wasserstein_power: 2.0, ..Default::default() };
//! let d: f64 = wasserstein_distance(&a, &b, &params).unwrap();
//! assert!((d - 0.5).abs() < 1e-2);
//! ```

mod error;
mod ledger;
mod oracle;
mod params;
mod phase;
mod point;
mod result;
mod runner;
mod verify;

pub use error::AuctionError;
pub use ledger::{Ledger, LedgerFault};
pub use oracle::{Bid, DenseOracle, Oracle};
pub use params::AuctionParams;
pub use point::{lp_distance, Labeled, Point, Real};
pub use result::AuctionResult;
pub use runner::{wasserstein_cost, wasserstein_distance, AuctionRunner};
