mod loader;
mod split;

pub use loader::DataLoader;
pub use split::{split_by_recency, test_user_to_items, GROUND_TRUTH_RATING};
