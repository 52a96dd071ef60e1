use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use super::corpus::check_samples;
use super::{CharacterClassifier, Sample, TrainingCorpus};
use crate::error::{PlateError, Result};

/// k-nearest-neighbour classifier over binary glyph features.
///
/// Distance is squared Euclidean. The label with most votes among the `k`
/// nearest samples wins; a tie goes to the tied label whose member is
/// nearest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnClassifier {
    k: usize,
    glyph_size: u32,
    samples: Vec<Sample>,
}

/// Outcome of a cross-validated search over `k`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KSearch {
    pub k: usize,
    pub accuracy: f32,
}

impl KnnClassifier {
    pub fn fit(corpus: &TrainingCorpus, k: usize) -> Result<Self> {
        if corpus.is_empty() {
            return Err(PlateError::model("training corpus is empty"));
        }
        check_samples(corpus.glyph_size, &corpus.samples)?;
        if k == 0 {
            return Err(PlateError::model("k must be at least 1"));
        }
        Ok(Self {
            k,
            glyph_size: corpus.glyph_size,
            samples: corpus.samples.clone(),
        })
    }

    /// Choose `k` by `folds`-fold cross-validation, then fit on the full corpus.
    pub fn fit_with_search(
        corpus: &TrainingCorpus,
        candidates: &[usize],
        folds: usize,
    ) -> Result<(Self, KSearch)> {
        let search = select_k(corpus, candidates, folds)?;
        Ok((Self::fit(corpus, search.k)?, search))
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn glyph_size(&self) -> u32 {
        self.glyph_size
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| PlateError::io(path, e))?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        Ok(())
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| PlateError::io(path, e))?;
        let model: Self = serde_json::from_reader(BufReader::new(file))?;
        if model.samples.is_empty() || model.k == 0 {
            return Err(PlateError::model(format!(
                "model file {} holds no usable classifier",
                path.display()
            )));
        }
        check_samples(model.glyph_size, &model.samples)?;
        Ok(model)
    }
}

impl CharacterClassifier for KnnClassifier {
    fn predict(&self, features: &[f32]) -> Result<char> {
        let expected = (self.glyph_size * self.glyph_size) as usize;
        if features.len() != expected {
            return Err(PlateError::model(format!(
                "expected {} features, got {}",
                expected,
                features.len()
            )));
        }
        vote(&self.samples, features, self.k)
            .ok_or_else(|| PlateError::model("classifier has no samples"))
    }
}

/// Cross-validated accuracy for each candidate `k`; the best one wins, ties
/// going to the earlier candidate.
///
/// Sample `i` belongs to fold `i % folds`.
pub fn select_k(corpus: &TrainingCorpus, candidates: &[usize], folds: usize) -> Result<KSearch> {
    if candidates.is_empty() || candidates.contains(&0) {
        return Err(PlateError::model("k candidates must be non-empty and positive"));
    }
    let folds = folds.min(corpus.len());
    if folds < 2 {
        return Err(PlateError::model(
            "cross-validation needs at least two samples and two folds",
        ));
    }

    let mut best: Option<KSearch> = None;
    for &k in candidates {
        let mut correct = 0usize;
        for fold in 0..folds {
            let train: Vec<Sample> = corpus
                .samples
                .iter()
                .enumerate()
                .filter(|(i, _)| i % folds != fold)
                .map(|(_, s)| s.clone())
                .collect();
            for (_, held_out) in corpus
                .samples
                .iter()
                .enumerate()
                .filter(|(i, _)| i % folds == fold)
            {
                if vote(&train, &held_out.features, k) == Some(held_out.label) {
                    correct += 1;
                }
            }
        }
        let accuracy = correct as f32 / corpus.len() as f32;
        tracing::info!(k, accuracy, "cross-validation");
        if best.is_none_or(|b| accuracy > b.accuracy) {
            best = Some(KSearch { k, accuracy });
        }
    }

    best.ok_or_else(|| PlateError::model("no k candidate evaluated"))
}

fn vote(samples: &[Sample], features: &[f32], k: usize) -> Option<char> {
    let mut distances: Vec<(f32, char)> = samples
        .iter()
        .map(|s| (squared_distance(&s.features, features), s.label))
        .collect();
    distances.sort_by(|a, b| a.0.total_cmp(&b.0));
    distances.truncate(k.max(1));

    // (label, votes), in order of first appearance among the nearest
    let mut tally: Vec<(char, usize)> = Vec::new();
    for (_, label) in &distances {
        match tally.iter_mut().find(|(l, _)| l == label) {
            Some((_, votes)) => *votes += 1,
            None => tally.push((*label, 1)),
        }
    }

    let mut winner: Option<(char, usize)> = None;
    for (label, votes) in tally {
        if winner.is_none_or(|(_, best)| votes > best) {
            winner = Some((label, votes));
        }
    }
    winner.map(|(label, _)| label)
}

fn squared_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
