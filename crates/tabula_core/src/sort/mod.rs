//! Multi-key ordering.
//!
//! [`OrderBy`] parses SQL-style specifications such as `"age, id desc"`.
//! [`bucket_sort`] orders snapshots by them, and [`ViewCache`] keeps sorted
//! results until the store's revision moves on.

mod bucket;
mod order;
mod views;

pub use bucket::bucket_sort;
pub use order::{Direction, OrderBy, SortKey};
pub use views::ViewCache;
