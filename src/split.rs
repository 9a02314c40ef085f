//! Train/validation split of the OpenWebText subset.

/// Share of the subset assigned to training, in tenths.
const TRAIN_TENTHS: u64 = 9;

/// `(train, val)` with `train = floor(total * 0.9)` and `val = total - train`.
///
/// Integer arithmetic avoids the float rounding of `total * 0.9`.
pub fn split_counts(total: u64) -> (u64, u64) {
    let train = total / 10 * TRAIN_TENTHS + total % 10 * TRAIN_TENTHS / 10;
    (train, total - train)
}

/// Reference cases the verifier checks: `(total, train, val)`.
pub const SPLIT_CASES: [(u64, u64, u64); 4] = [
    (1000, 900, 100),
    (11000, 9900, 1100),
    (50000, 45000, 5000),
    (100000, 90000, 10000),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitCase {
    pub total: u64,
    pub expected: (u64, u64),
    pub actual: (u64, u64),
}

impl SplitCase {
    pub fn passed(&self) -> bool {
        self.expected == self.actual
    }
}

pub fn check_split_cases(cases: &[(u64, u64, u64)]) -> Vec<SplitCase> {
    cases
        .iter()
        .map(|&(total, train, val)| SplitCase {
            total,
            expected: (train, val),
            actual: split_counts(total),
        })
        .collect()
}
