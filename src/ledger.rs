use std::collections::BTreeSet;
use std::fmt;

use thiserror::Error;

/// Ways in which the two index maps can disagree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LedgerFault {
    #[error("{side} map has {found} entries, expected {expected}")]
    WrongSize {
        side: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("{side} map entry {index} points out of range to {target}")]
    OutOfRange {
        side: &'static str,
        index: usize,
        target: usize,
    },
    #[error("item {0} appears in the bidder map more than once")]
    DuplicateItem(usize),
    #[error("bidder {0} appears in the item map more than once")]
    DuplicateBidder(usize),
    #[error("bidder {bidder} holds item {item}, but the item map disagrees")]
    Inconsistent { bidder: usize, item: usize },
    #[error("bidder {0} holds an item but is still queued as unassigned")]
    AssignedButQueued(usize),
}

/// Bidder/item bookkeeping of the auction.
///
/// `bidder_to_item` and `item_to_bidder` are kept as mutually inverse partial
/// injections; the bidders without an item are queued in `unassigned`, lowest index
/// first.
#[derive(Debug, Clone)]
pub struct Ledger {
    bidder_to_item: Vec<Option<usize>>,
    item_to_bidder: Vec<Option<usize>>,
    unassigned: BTreeSet<usize>,
    rounds: usize,
}

impl Ledger {
    /// Ledger for `n` bidders and `n` items with nothing assigned and nobody queued.
    pub fn new(n: usize) -> Self {
        Self {
            bidder_to_item: vec![None; n],
            item_to_bidder: vec![None; n],
            unassigned: BTreeSet::new(),
            rounds: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.bidder_to_item.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bidder_to_item.is_empty()
    }

    /// Number of assignments made over the lifetime of the ledger.
    pub fn rounds(&self) -> usize {
        self.rounds
    }

    pub fn item_of(&self, bidder: usize) -> Option<usize> {
        self.bidder_to_item[bidder]
    }

    pub fn bidder_of(&self, item: usize) -> Option<usize> {
        self.item_to_bidder[item]
    }

    /// The bidder that bids next, if any is waiting.
    pub fn next_unassigned(&self) -> Option<usize> {
        self.unassigned.first().copied()
    }

    pub fn num_unassigned(&self) -> usize {
        self.unassigned.len()
    }

    /// True when every bidder holds an item.
    pub fn is_perfect(&self) -> bool {
        self.unassigned.is_empty() && self.bidder_to_item.iter().all(Option::is_some)
    }

    /// `(bidder, item)` for every bidder currently holding an item.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.bidder_to_item
            .iter()
            .enumerate()
            .filter_map(|(bidder, item)| item.map(|item| (bidder, item)))
    }

    /// Hands `item` to `bidder`, evicting its previous holder back into the queue.
    ///
    /// Returns the evicted bidder. Panics if `bidder` already holds an item.
    pub fn assign(&mut self, item: usize, bidder: usize) -> Option<usize> {
        self.rounds += 1;
        assert!(
            self.bidder_to_item[bidder].is_none(),
            "bidder {bidder} bid while holding item {:?}",
            self.bidder_to_item[bidder]
        );

        let evicted = self.item_to_bidder[item].replace(bidder);
        self.bidder_to_item[bidder] = Some(item);
        self.unassigned.remove(&bidder);

        if let Some(old) = evicted {
            self.bidder_to_item[old] = None;
            self.unassigned.insert(old);
        }
        evicted
    }

    /// Clears the assignment and queues every bidder.
    ///
    /// Only legal once the previous phase ended in a perfect matching.
    pub fn reset(&mut self) {
        assert!(
            self.unassigned.is_empty(),
            "assignment reset with {} bidders still unassigned",
            self.unassigned.len()
        );
        self.bidder_to_item.fill(None);
        self.item_to_bidder.fill(None);
        self.unassigned.extend(0..self.len());
    }

    /// Verifies that both maps are inverse partial injections and that the queue holds
    /// only bidders without an item.
    pub fn consistency_check(&self) -> Result<(), LedgerFault> {
        let n = self.len();
        if self.item_to_bidder.len() != n {
            return Err(LedgerFault::WrongSize {
                side: "item",
                expected: n,
                found: self.item_to_bidder.len(),
            });
        }

        let mut seen = vec![false; n];
        for (bidder, item) in self.pairs() {
            if item >= n {
                return Err(LedgerFault::OutOfRange {
                    side: "bidder",
                    index: bidder,
                    target: item,
                });
            }
            if std::mem::replace(&mut seen[item], true) {
                return Err(LedgerFault::DuplicateItem(item));
            }
            if self.item_to_bidder[item] != Some(bidder) {
                return Err(LedgerFault::Inconsistent { bidder, item });
            }
            if self.unassigned.contains(&bidder) {
                return Err(LedgerFault::AssignedButQueued(bidder));
            }
        }

        seen.fill(false);
        for (item, bidder) in self.item_to_bidder.iter().enumerate() {
            let Some(bidder) = *bidder else { continue };
            if bidder >= n {
                return Err(LedgerFault::OutOfRange {
                    side: "item",
                    index: item,
                    target: bidder,
                });
            }
            if std::mem::replace(&mut seen[bidder], true) {
                return Err(LedgerFault::DuplicateBidder(bidder));
            }
            if self.bidder_to_item[bidder] != Some(item) {
                return Err(LedgerFault::Inconsistent { bidder, item });
            }
        }

        Ok(())
    }
}

impl fmt::Display for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (bidder, item) in self.bidder_to_item.iter().enumerate() {
            match item {
                Some(item) => writeln!(f, "{bidder} <--> {item}")?,
                None => writeln!(f, "{bidder} <--> -")?,
            }
        }
        Ok(())
    }
}
