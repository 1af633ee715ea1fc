//! Per-bucket record of confirmed common-prefix lengths.
//!
//! The ledger remembers, for every pair of files the resolver actually
//! compared, how many leading bytes the two files share. Before comparing a
//! new pair `(i, j)` the resolver asks the ledger what earlier rows already
//! prove about it:
//!
//! - If some earlier file `pr` shares a different prefix length with `i`
//!   than with `j`, then `i` and `j` disagree somewhere inside the longer of
//!   those prefixes and cannot be identical. No I/O is needed.
//! - Otherwise every earlier file that was compared against both shares the
//!   same prefix with `i` and `j`, so `i` and `j` share it too and the
//!   comparison can start at the longest such prefix.
//!
//! A pair that was never compared is not the same as a pair that was compared
//! and matched zero bytes. Only the latter constrains anything.

/// Sentinel for a pair that has not been compared.
const NOT_COMPARED: u64 = u64::MAX;

/// What the ledger can tell about a pair before reading it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inference {
    /// Earlier comparisons prove the two files differ.
    Differ,
    /// The first `n` bytes are known to be identical; compare from there.
    Skip(u64),
}

/// Upper-triangular matrix of exact common-prefix lengths, indexed by the
/// files' positions in bucket order.
#[derive(Debug, Clone)]
pub struct ComparisonLedger {
    cnt: usize,
    entries: Vec<u64>,
}

impl ComparisonLedger {
    /// Create a ledger for a bucket of `cnt` files with every pair unknown.
    #[must_use]
    pub fn new(cnt: usize) -> Self {
        let pairs = cnt * cnt.saturating_sub(1) / 2;
        Self {
            cnt,
            entries: vec![NOT_COMPARED; pairs],
        }
    }

    fn slot(&self, i: usize, j: usize) -> usize {
        debug_assert!(i < j && j < self.cnt, "pair ({i}, {j}) out of range");
        i * (2 * self.cnt - i - 1) / 2 + (j - i - 1)
    }

    /// Record that files `i` and `j` (`i < j`) share exactly `len` leading bytes.
    pub fn record(&mut self, i: usize, j: usize, len: u64) {
        let slot = self.slot(i, j);
        self.entries[slot] = len;
    }

    /// Confirmed prefix length for `(i, j)`, or `None` if never compared.
    #[must_use]
    pub fn get(&self, i: usize, j: usize) -> Option<u64> {
        match self.entries[self.slot(i, j)] {
            NOT_COMPARED => None,
            len => Some(len),
        }
    }

    /// Derive what rows `0..i` prove about the pair `(i, j)`.
    #[must_use]
    pub fn infer(&self, i: usize, j: usize) -> Inference {
        let mut max_to_skip = 0;
        for pr in 0..i {
            let (Some(with_i), Some(with_j)) = (self.get(pr, i), self.get(pr, j)) else {
                continue;
            };
            if with_i != with_j {
                return Inference::Differ;
            }
            max_to_skip = max_to_skip.max(with_i);
        }
        Inference::Skip(max_to_skip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_ledger_is_unknown() {
        let ledger = ComparisonLedger::new(4);
        for i in 0..4 {
            for j in i + 1..4 {
                assert_eq!(ledger.get(i, j), None);
            }
        }
    }

    #[test]
    fn test_record_and_get_every_pair() {
        let n = 5;
        let mut ledger = ComparisonLedger::new(n);
        for i in 0..n {
            for j in i + 1..n {
                ledger.record(i, j, (i * 10 + j) as u64);
            }
        }
        for i in 0..n {
            for j in i + 1..n {
                assert_eq!(ledger.get(i, j), Some((i * 10 + j) as u64));
            }
        }
    }

    #[test]
    fn test_degenerate_sizes() {
        let _ = ComparisonLedger::new(0);
        let ledger = ComparisonLedger::new(1);
        assert_eq!(ledger.infer(0, 0), Inference::Skip(0));
    }

    #[test]
    fn test_first_row_has_no_constraints() {
        let mut ledger = ComparisonLedger::new(3);
        ledger.record(0, 1, 100);
        assert_eq!(ledger.infer(0, 2), Inference::Skip(0));
    }

    #[test]
    fn test_differing_prefixes_imply_difference() {
        let mut ledger = ComparisonLedger::new(4);
        ledger.record(0, 1, 10);
        ledger.record(0, 2, 20);
        assert_eq!(ledger.infer(1, 2), Inference::Differ);
    }

    #[test]
    fn test_equal_prefixes_allow_skip() {
        let mut ledger = ComparisonLedger::new(4);
        ledger.record(0, 2, 64);
        ledger.record(0, 3, 64);
        ledger.record(1, 2, 128);
        ledger.record(1, 3, 128);
        assert_eq!(ledger.infer(2, 3), Inference::Skip(128));
    }

    #[test]
    fn test_never_compared_is_not_zero() {
        let mut ledger = ComparisonLedger::new(3);
        // Row 0 compared file 2 (matched 0 bytes) but never compared file 1
        ledger.record(0, 2, 0);
        assert_eq!(ledger.get(0, 1), None);
        assert_eq!(ledger.infer(1, 2), Inference::Skip(0));

        // Once file 1 is compared and also matched 0 bytes, the rows agree
        ledger.record(0, 1, 0);
        assert_eq!(ledger.infer(1, 2), Inference::Skip(0));

        // A compared zero against a compared non-zero is a real difference
        ledger.record(0, 1, 7);
        assert_eq!(ledger.infer(1, 2), Inference::Differ);
    }

    #[test]
    fn test_unknown_row_entry_does_not_block_skip() {
        let mut ledger = ComparisonLedger::new(4);
        // Row 0 knows only about file 3, row 1 about both 2 and 3
        ledger.record(0, 3, 500);
        ledger.record(1, 2, 300);
        ledger.record(1, 3, 300);
        assert_eq!(ledger.infer(2, 3), Inference::Skip(300));
    }
}
