use crate::verify::Verifier;
use crate::{Bid, Ledger, Oracle, Real};

/// Runs one auction phase at the oracle's current epsilon.
///
/// Starts from a freshly reset ledger and lets the lowest-indexed unassigned bidder bid
/// until every bidder holds an item. Returns the number of bids placed.
pub(crate) fn run_phase<R, O>(ledger: &mut Ledger, oracle: &mut O, verifier: Verifier) -> usize
where
    R: Real,
    O: Oracle<R>,
{
    let start = ledger.rounds();

    while let Some(bidder) = ledger.next_unassigned() {
        let Bid { item, value } = oracle.optimal_bid(bidder);
        ledger.assign(item, bidder);
        oracle.set_price(item, value);
        verifier.ledger(ledger);
    }

    verifier.perfect_matching(ledger);
    ledger.rounds() - start
}
