/// Dataset loading
///
/// Reads the MovieLens CSV layout (`ratings.csv`, `movies.csv`, `tags.csv`)
/// into an immutable [`Dataset`]: ratings joined against known movies,
/// capped to the first `num_users` users, split per user by recency.
///
/// The loader assumes schema-checked input from upstream but still validates
/// defensively on ingestion; anything malformed fails the whole load with
/// [`AppError::SchemaViolation`] — no partial datasets.
use std::collections::{BTreeSet, HashMap};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use serde::Deserialize;
use tracing::info;

use crate::config::DataConfig;
use crate::data::split::{split_by_recency, test_user_to_items};
use crate::error::{AppError, Result};
use crate::models::{Dataset, Interaction, ItemMetadata, MovieId, UserId};

/// Genre placeholder MovieLens uses for movies without genre labels.
const NO_GENRES: &str = "(no genres listed)";

#[derive(Debug, Deserialize)]
struct RatingRow {
    #[serde(rename = "userId")]
    user_id: UserId,
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    rating: f64,
    timestamp: i64,
}

#[derive(Debug, Deserialize)]
struct MovieRow {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    title: String,
    genres: String,
}

#[derive(Debug, Deserialize)]
struct TagRow {
    #[serde(rename = "movieId")]
    movie_id: MovieId,
    tag: String,
}

pub struct DataLoader {
    data_path: PathBuf,
    num_users: usize,
    num_test_items: usize,
}

impl DataLoader {
    pub fn new(config: &DataConfig) -> Self {
        Self {
            data_path: config.data_path.clone(),
            num_users: config.num_users,
            num_test_items: config.num_test_items,
        }
    }

    /// Load, join, cap and split into a [`Dataset`].
    pub fn load(&self) -> Result<Dataset> {
        info!(path = %self.data_path.display(), "loading dataset");

        let item_content = self.load_movies()?;
        let ratings = self.load_ratings(&item_content)?;
        if ratings.is_empty() {
            return Err(AppError::EmptyDataset(
                "no usable interactions after filtering".to_string(),
            ));
        }

        let (train, test) = split_by_recency(ratings, self.num_test_items);
        let test_user_to_items = test_user_to_items(&test);

        info!(
            train = train.len(),
            test = test.len(),
            movies = item_content.len(),
            "dataset ready"
        );

        Ok(Dataset {
            train,
            test,
            test_user_to_items,
            item_content,
        })
    }

    fn load_movies(&self) -> Result<HashMap<MovieId, ItemMetadata>> {
        let movies_file = File::open(self.data_path.join("movies.csv"))?;
        let mut movies = parse_movies(movies_file)?;

        let tags_file = File::open(self.data_path.join("tags.csv"))?;
        attach_tags(&mut movies, tags_file)?;

        Ok(movies)
    }

    fn load_ratings(
        &self,
        movies: &HashMap<MovieId, ItemMetadata>,
    ) -> Result<Vec<Interaction>> {
        let ratings_file = File::open(self.data_path.join("ratings.csv"))?;
        let interactions = parse_ratings(ratings_file)?;

        // Inner join against the movie catalogue, then the user cap.
        let joined: Vec<Interaction> = interactions
            .into_iter()
            .filter(|it| movies.contains_key(&it.movie_id))
            .collect();
        Ok(cap_users(joined, self.num_users))
    }
}

fn parse_movies<R: Read>(reader: R) -> Result<HashMap<MovieId, ItemMetadata>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut movies = HashMap::new();

    for row in csv_reader.deserialize() {
        let row: MovieRow = row?;
        let genres = if row.genres == NO_GENRES {
            Vec::new()
        } else {
            row.genres.split('|').map(str::to_string).collect()
        };
        movies.insert(
            row.movie_id,
            ItemMetadata {
                movie_id: row.movie_id,
                title: row.title,
                genres,
                tags: Vec::new(),
            },
        );
    }

    Ok(movies)
}

/// Attach lowercased user tags to their movies, in file order. Tags for
/// movies outside the catalogue are dropped, matching a left join onto the
/// movie table.
fn attach_tags<R: Read>(movies: &mut HashMap<MovieId, ItemMetadata>, reader: R) -> Result<()> {
    let mut csv_reader = csv::Reader::from_reader(reader);

    for row in csv_reader.deserialize() {
        let row: TagRow = row?;
        let tag = row.tag.trim().to_lowercase();
        if tag.is_empty() {
            continue;
        }
        if let Some(movie) = movies.get_mut(&row.movie_id) {
            movie.tags.push(tag);
        }
    }

    Ok(())
}

fn parse_ratings<R: Read>(reader: R) -> Result<Vec<Interaction>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut interactions = Vec::new();

    for row in csv_reader.deserialize() {
        let row: RatingRow = row?;
        if !row.rating.is_finite() || !(0.0..=5.0).contains(&row.rating) {
            return Err(AppError::SchemaViolation(format!(
                "rating out of range for user {} movie {}: {}",
                row.user_id, row.movie_id, row.rating
            )));
        }
        interactions.push(Interaction {
            user_id: row.user_id,
            movie_id: row.movie_id,
            rating: row.rating,
            timestamp: row.timestamp,
        });
    }

    Ok(interactions)
}

/// Keep interactions of the first `num_users` user ids in ascending order;
/// 0 disables the cap.
fn cap_users(interactions: Vec<Interaction>, num_users: usize) -> Vec<Interaction> {
    if num_users == 0 {
        return interactions;
    }

    let valid_users: BTreeSet<UserId> = interactions
        .iter()
        .map(|it| it.user_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .take(num_users)
        .collect();

    interactions
        .into_iter()
        .filter(|it| valid_users.contains(&it.user_id))
        .collect()
}
