/// Leave-last-k split
///
/// Partitions interactions per user by recency: the `num_test_items` most
/// recent interactions of each user form the test set, everything else the
/// train set. Ties on timestamp are broken by original input order (the
/// first-encountered interaction wins the more-recent rank), which keeps the
/// split stable for identical inputs.
use std::cmp::Reverse;
use std::collections::HashMap;

use crate::models::{Interaction, MovieId, UserId};

/// Minimum rating for a test interaction to count as ground truth.
pub const GROUND_TRUTH_RATING: f64 = 4.0;

/// Split interactions into (train, test).
///
/// A user with fewer than `num_test_items` interactions contributes all of
/// them to test and an empty train partition; that is expected, not an
/// error. Relative input order is preserved inside each partition.
pub fn split_by_recency(
    interactions: Vec<Interaction>,
    num_test_items: usize,
) -> (Vec<Interaction>, Vec<Interaction>) {
    let mut per_user: HashMap<UserId, Vec<usize>> = HashMap::new();
    for (idx, interaction) in interactions.iter().enumerate() {
        per_user.entry(interaction.user_id).or_default().push(idx);
    }

    let mut is_test = vec![false; interactions.len()];
    for indices in per_user.values_mut() {
        // Stable sort: equal timestamps keep input order, so the earliest
        // encountered interaction gets the smaller (more recent) rank.
        indices.sort_by_key(|&idx| Reverse(interactions[idx].timestamp));
        for &idx in indices.iter().take(num_test_items) {
            is_test[idx] = true;
        }
    }

    let mut train = Vec::with_capacity(interactions.len());
    let mut test = Vec::new();
    for (idx, interaction) in interactions.into_iter().enumerate() {
        if is_test[idx] {
            test.push(interaction);
        } else {
            train.push(interaction);
        }
    }

    (train, test)
}

/// Ground-truth mapping: movies each user rated >= [`GROUND_TRUTH_RATING`]
/// in test, in post-filter encounter order. Users with no qualifying
/// interaction are absent from the map.
pub fn test_user_to_items(test: &[Interaction]) -> HashMap<UserId, Vec<MovieId>> {
    let mut user_to_items: HashMap<UserId, Vec<MovieId>> = HashMap::new();
    for interaction in test {
        if interaction.rating >= GROUND_TRUTH_RATING {
            user_to_items
                .entry(interaction.user_id)
                .or_default()
                .push(interaction.movie_id);
        }
    }
    user_to_items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn interaction(user_id: UserId, movie_id: MovieId, rating: f64, timestamp: i64) -> Interaction {
        Interaction {
            user_id,
            movie_id,
            rating,
            timestamp,
        }
    }

    #[test]
    fn test_split_partitions_by_recency() {
        let interactions = vec![
            interaction(1, 10, 3.0, 100),
            interaction(1, 11, 4.0, 200),
            interaction(1, 12, 5.0, 300),
            interaction(2, 10, 2.0, 150),
        ];

        let (train, test) = split_by_recency(interactions, 2);

        // User 1: the two most recent (11, 12) go to test, 10 stays in train.
        let train_movies: Vec<MovieId> = train
            .iter()
            .filter(|it| it.user_id == 1)
            .map(|it| it.movie_id)
            .collect();
        let test_movies: Vec<MovieId> = test
            .iter()
            .filter(|it| it.user_id == 1)
            .map(|it| it.movie_id)
            .collect();
        assert_eq!(train_movies, vec![10]);
        assert_eq!(test_movies, vec![11, 12]);

        // User 2 has fewer interactions than num_test_items: everything in
        // test, empty train.
        assert!(!train.iter().any(|it| it.user_id == 2));
        assert_eq!(test.iter().filter(|it| it.user_id == 2).count(), 1);
    }

    #[test]
    fn test_split_counts_partition_each_user() {
        let interactions = vec![
            interaction(1, 10, 3.0, 100),
            interaction(1, 11, 4.0, 200),
            interaction(1, 12, 5.0, 300),
            interaction(1, 13, 1.0, 400),
            interaction(2, 10, 2.0, 150),
            interaction(2, 11, 3.5, 250),
        ];
        let total_user1 = 4;
        let total_user2 = 2;

        let (train, test) = split_by_recency(interactions, 3);

        let count = |part: &[Interaction], user: UserId| {
            part.iter().filter(|it| it.user_id == user).count()
        };
        assert_eq!(count(&train, 1) + count(&test, 1), total_user1);
        assert_eq!(count(&train, 2) + count(&test, 2), total_user2);
        assert_eq!(count(&test, 1), 3);
        assert_eq!(count(&test, 2), 2);
    }

    #[test]
    fn test_split_user_with_fewer_interactions_than_k() {
        let interactions = vec![
            interaction(7, 1, 4.0, 10),
            interaction(7, 2, 3.0, 20),
            interaction(7, 3, 5.0, 30),
        ];

        let (train, test) = split_by_recency(interactions, 5);

        assert!(train.is_empty());
        assert_eq!(test.len(), 3);
    }

    #[test]
    fn test_split_tie_break_is_first_encountered() {
        // Both interactions share a timestamp; the first one in input order
        // must take the more recent rank and land in test.
        let interactions = vec![
            interaction(1, 10, 3.0, 100),
            interaction(1, 11, 3.0, 100),
        ];

        let (train, test) = split_by_recency(interactions, 1);

        assert_eq!(test.len(), 1);
        assert_eq!(test[0].movie_id, 10);
        assert_eq!(train.len(), 1);
        assert_eq!(train[0].movie_id, 11);
    }

    #[test]
    fn test_test_timestamps_dominate_train_without_ties() {
        let interactions = vec![
            interaction(1, 10, 3.0, 400),
            interaction(1, 11, 4.0, 100),
            interaction(1, 12, 5.0, 300),
            interaction(1, 13, 1.0, 200),
        ];

        let (train, test) = split_by_recency(interactions, 2);

        let min_test = test.iter().map(|it| it.timestamp).min().unwrap();
        let max_train = train.iter().map(|it| it.timestamp).max().unwrap();
        assert!(min_test >= max_train);
    }

    #[test]
    fn test_ground_truth_filters_and_keeps_order() {
        let test = vec![
            interaction(1, 10, 4.0, 100),
            interaction(1, 11, 2.0, 200),
            interaction(1, 12, 5.0, 300),
            interaction(2, 10, 3.5, 100),
        ];

        let user_to_items = test_user_to_items(&test);

        assert_eq!(user_to_items.get(&1), Some(&vec![10, 12]));
        // User 2 never rated >= 4.0, so the key is absent entirely.
        assert!(!user_to_items.contains_key(&2));
    }
}
