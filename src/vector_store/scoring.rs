//! Ranking shared by the index backends.
//!
//! Every ranking is a stable sort by descending score, so ties keep the order
//! in which candidates were first seen (storage order, or prefetch order for
//! fused queries).

use super::{cosine_similarity, Point, Query, ScoredPoint, RRF_K};
use crate::embedding::SparseVector;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Rank `points` for `query` and return the best `limit`.
pub fn execute_query(points: &[Point], query: &Query, limit: usize) -> Vec<ScoredPoint> {
    let ranked = match query {
        Query::Dense { dense } => dense_ranking(points, dense, limit),
        Query::Fusion {
            dense,
            sparse,
            prefetch_limit,
        } => {
            let lists = prefetch(points, dense, sparse, *prefetch_limit);
            let mut fused = reciprocal_rank_fusion(&lists);
            fused.truncate(limit);
            fused
        }
        Query::FusionRerank {
            dense,
            sparse,
            colbert,
            prefetch_limit,
        } => {
            let lists = prefetch(points, dense, sparse, *prefetch_limit);
            let mut candidates: Vec<usize> = Vec::new();
            for index in lists.iter().flatten() {
                if !candidates.contains(index) {
                    candidates.push(*index);
                }
            }

            let mut rescored: Vec<(usize, f32)> = candidates
                .into_iter()
                .map(|i| {
                    let score = points[i]
                        .colbert
                        .as_deref()
                        .map(|doc| max_sim(colbert, doc))
                        .unwrap_or(0.0);
                    (i, score)
                })
                .collect();
            sort_by_score(&mut rescored);
            rescored.truncate(limit);
            rescored
        }
    };

    ranked
        .into_iter()
        .map(|(i, score)| ScoredPoint {
            id: points[i].id,
            score,
            payload: points[i].payload.clone(),
        })
        .collect()
}

fn prefetch(
    points: &[Point],
    dense: &[f32],
    sparse: &SparseVector,
    prefetch_limit: usize,
) -> Vec<Vec<usize>> {
    [
        dense_ranking(points, dense, prefetch_limit),
        sparse_ranking(points, sparse, prefetch_limit),
    ]
    .into_iter()
    .map(|list| list.into_iter().map(|(i, _)| i).collect())
    .collect()
}

/// Cosine ranking over the dense field.
pub fn dense_ranking(points: &[Point], dense: &[f32], limit: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = points
        .iter()
        .enumerate()
        .map(|(i, p)| (i, cosine_similarity(dense, &p.dense)))
        .collect();
    sort_by_score(&mut scored);
    scored.truncate(limit);
    scored
}

/// Dot-product ranking over the sparse field.
///
/// Points without a shared token id (or without a sparse vector) are not
/// candidates at all.
pub fn sparse_ranking(points: &[Point], sparse: &SparseVector, limit: usize) -> Vec<(usize, f32)> {
    let mut scored: Vec<(usize, f32)> = points
        .iter()
        .enumerate()
        .filter_map(|(i, p)| {
            let score = p.sparse.as_ref()?.dot(sparse);
            (score > 0.0).then_some((i, score))
        })
        .collect();
    sort_by_score(&mut scored);
    scored.truncate(limit);
    scored
}

/// Fuse ranked lists: each appearance at 0-based rank `r` adds `1 / (k + r + 1)`.
pub fn reciprocal_rank_fusion<T: Copy + Eq + std::hash::Hash>(lists: &[Vec<T>]) -> Vec<(T, f32)> {
    let mut order: Vec<T> = Vec::new();
    let mut scores: HashMap<T, f32> = HashMap::new();

    for list in lists {
        for (rank, item) in list.iter().enumerate() {
            let contribution = 1.0 / (RRF_K + rank as f32 + 1.0);
            match scores.get_mut(item) {
                Some(score) => *score += contribution,
                None => {
                    order.push(*item);
                    scores.insert(*item, contribution);
                }
            }
        }
    }

    let mut fused: Vec<(T, f32)> = order
        .into_iter()
        .map(|item| (item, scores.get(&item).copied().unwrap_or(0.0)))
        .collect();
    sort_by_score(&mut fused);
    fused
}

/// Sum over query tokens of the best cosine against any document token.
pub fn max_sim(query: &[Vec<f32>], document: &[Vec<f32>]) -> f32 {
    query
        .iter()
        .map(|q| {
            document
                .iter()
                .map(|d| cosine_similarity(q, d))
                .fold(None, |best: Option<f32>, s| Some(best.map_or(s, |b| b.max(s))))
                .unwrap_or(0.0)
        })
        .sum()
}

fn sort_by_score<T>(scored: &mut [(T, f32)]) {
    scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
}
