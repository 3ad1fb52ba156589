/// User-item interaction matrix
///
/// Dense train matrix with stable, ascending user/item index order. Shared
/// by the score-matrix variants (random shape, association baskets, matrix
/// factorization input). Missing cells take a configurable fill value.
use std::collections::{BTreeSet, HashMap};

use ndarray::Array2;

use crate::error::{AppError, Result};
use crate::models::{Interaction, MovieId, UserId};
use crate::utils::mean;

#[derive(Debug, Clone)]
pub struct InteractionMatrix {
    user_ids: Vec<UserId>,
    item_ids: Vec<MovieId>,
    user_index: HashMap<UserId, usize>,
    item_index: HashMap<MovieId, usize>,
    matrix: Array2<f64>,
}

impl InteractionMatrix {
    /// Build from train interactions. Duplicate (user, movie) pairs keep the
    /// last rating seen. Fails with [`AppError::EmptyDataset`] on empty
    /// input.
    pub fn from_train(train: &[Interaction], fill: f64) -> Result<Self> {
        if train.is_empty() {
            return Err(AppError::EmptyDataset(
                "cannot build an interaction matrix without train interactions".to_string(),
            ));
        }

        let user_ids: Vec<UserId> = train
            .iter()
            .map(|it| it.user_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let item_ids: Vec<MovieId> = train
            .iter()
            .map(|it| it.movie_id)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let user_index: HashMap<UserId, usize> = user_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();
        let item_index: HashMap<MovieId, usize> = item_ids
            .iter()
            .enumerate()
            .map(|(idx, id)| (*id, idx))
            .collect();

        let mut matrix = Array2::from_elem((user_ids.len(), item_ids.len()), fill);
        for interaction in train {
            let row = user_index[&interaction.user_id];
            let col = item_index[&interaction.movie_id];
            matrix[[row, col]] = interaction.rating;
        }

        Ok(Self {
            user_ids,
            item_ids,
            user_index,
            item_index,
            matrix,
        })
    }

    pub fn n_users(&self) -> usize {
        self.user_ids.len()
    }

    pub fn n_items(&self) -> usize {
        self.item_ids.len()
    }

    /// Train users in ascending id order.
    pub fn user_ids(&self) -> &[UserId] {
        &self.user_ids
    }

    /// Train items in ascending id order; this is the stable item-index
    /// order embeddings are emitted in.
    pub fn item_ids(&self) -> &[MovieId] {
        &self.item_ids
    }

    pub fn user_index(&self, user_id: UserId) -> Option<usize> {
        self.user_index.get(&user_id).copied()
    }

    pub fn item_index(&self, movie_id: MovieId) -> Option<usize> {
        self.item_index.get(&movie_id).copied()
    }

    pub fn values(&self) -> &Array2<f64> {
        &self.matrix
    }
}

/// Mean rating over all train interactions, the fill value for the
/// "fill with global mean" matrix mode.
pub(crate) fn global_mean_rating(train: &[Interaction]) -> f64 {
    let ratings: Vec<f64> = train.iter().map(|it| it.rating).collect();
    mean(&ratings)
}
