use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AuctionError {
    #[error("point sets differ in size: {bidders} bidders, {items} items")]
    SizeMismatch { bidders: usize, items: usize },

    #[error("{side} point {index} has {found} coordinates, expected at least {expected}")]
    DimensionMismatch {
        side: &'static str,
        index: usize,
        expected: usize,
        found: usize,
    },

    #[error("{side} point {index} has a non-finite coordinate")]
    NonFiniteCoordinate { side: &'static str, index: usize },

    #[error("initial prices have length {found}, expected {expected}")]
    PriceLengthMismatch { expected: usize, found: usize },

    #[error("invalid auction parameters: {0}")]
    InvalidParams(&'static str),

    #[error("invalid index in cost lookup: item = {item:?}, bidder = {bidder:?}")]
    InvalidIndex {
        item: Option<usize>,
        bidder: Option<usize>,
    },

    #[error("distance requested before the auction was run")]
    NotComputed,

    #[error(
        "maximum number of phases ({phases}) exceeded; relative error {relative_error}, current distance {distance}"
    )]
    MaxPhasesExceeded {
        phases: usize,
        relative_error: f64,
        distance: f64,
    },
}
