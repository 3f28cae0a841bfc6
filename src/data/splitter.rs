// ============================================================
// Layer 4 — Train/Validation/Test Splitter
// ============================================================
// Splits the ordered file list by POSITION, never randomly:
//   - first 80%  → training
//   - next 10%   → validation
//   - last 10%   → testing
//
// Boundaries are floor(0.8 * n) and floor(0.9 * n), so with
// few files the validation or test role may end up empty.
//
// Example (n = 10):
//   train = files[0..8], valid = files[8..9], test = files[9..10]

/// The three disjoint file subsets of one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Split<T> {
    pub train: Vec<T>,
    pub valid: Vec<T>,
    pub test:  Vec<T>,
}

/// Split `items` into (80%, 10%, 10%) by position.
pub fn split_train_valid_test<T>(mut items: Vec<T>) -> Split<T> {
    let total     = items.len();
    let train_end = (total * 8) / 10;
    let valid_end = (total * 9) / 10;

    // split_off(n) leaves [0..n) behind and returns [n..)
    let test  = items.split_off(valid_end);
    let valid = items.split_off(train_end);
    let train = items;

    tracing::debug!(
        "File split: {} training, {} validation, {} testing",
        train.len(),
        valid.len(),
        test.len(),
    );

    Split { train, valid, test }
}
