//! Fixed-size partitioning for APIs that cap how many items one call may carry.

use crate::error::{Error, Result};

/// Split `items` into consecutive groups of `size`, preserving order.
///
/// Every group holds exactly `size` items except the last, which holds the
/// remainder. An empty input yields no groups.
///
/// # Example
///
/// ```rust
/// use sfbatch_client::chunk;
///
/// let groups = chunk((1..=18).collect::<Vec<_>>(), 5).unwrap();
/// let sizes: Vec<usize> = groups.iter().map(Vec::len).collect();
/// assert_eq!(sizes, vec![5, 5, 5, 3]);
/// ```
pub fn chunk<T>(items: impl IntoIterator<Item = T>, size: usize) -> Result<Vec<Vec<T>>> {
    if size == 0 {
        return Err(Error::invalid_argument("chunk size must be greater than zero"));
    }

    let mut groups = Vec::new();
    let mut current = Vec::with_capacity(size);
    for item in items {
        current.push(item);
        if current.len() == size {
            groups.push(std::mem::replace(&mut current, Vec::with_capacity(size)));
        }
    }
    if !current.is_empty() {
        groups.push(current);
    }

    Ok(groups)
}
