use tracing::trace;

use crate::Ledger;

/// Invariant checks that run alongside the auction when enabled.
///
/// Any failure means the ledger or the phase loop is broken, so every check panics.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Verifier {
    enabled: bool,
}

impl Verifier {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub(crate) fn ledger(&self, ledger: &Ledger) {
        if !self.enabled {
            return;
        }
        if let Err(fault) = ledger.consistency_check() {
            panic!("assignment ledger corrupted: {fault}\n{ledger}");
        }
    }

    /// After a phase every bidder must hold exactly one item.
    pub(crate) fn perfect_matching(&self, ledger: &Ledger) {
        if !self.enabled {
            return;
        }
        self.ledger(ledger);
        if let Some(bidder) = (0..ledger.len()).find(|&b| ledger.item_of(b).is_none()) {
            panic!("auction phase ended with bidder {bidder} unassigned\n{ledger}");
        }
        trace!(assignment = %ledger, "phase matching");
    }
}
