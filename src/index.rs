/// Vector-index boundary
///
/// Item embeddings leave the harness as a dense float32 matrix, one row per
/// item in stable item-index order. The sink trait is the narrow interface
/// to whatever index store sits downstream; the flat-file implementation is
/// the only one shipped here. One-shot write, no concurrent writers.
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::info;

use crate::error::Result;
use crate::models::ItemEmbeddings;

pub trait VectorIndexSink {
    fn persist(&self, embeddings: &ItemEmbeddings) -> Result<()>;
}

/// Flat binary layout: `[n_items: u32 LE][dim: u32 LE]` followed by
/// row-major float32 values.
pub struct FlatIndexFile {
    path: PathBuf,
}

impl FlatIndexFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl VectorIndexSink for FlatIndexFile {
    fn persist(&self, embeddings: &ItemEmbeddings) -> Result<()> {
        let (n_items, dim) = embeddings.vectors.dim();

        let file = File::create(&self.path)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(&(n_items as u32).to_le_bytes())?;
        writer.write_all(&(dim as u32).to_le_bytes())?;
        for value in embeddings.vectors.iter() {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;

        info!(
            path = %self.path.display(),
            n_items,
            dim,
            "item embeddings persisted"
        );
        Ok(())
    }
}
