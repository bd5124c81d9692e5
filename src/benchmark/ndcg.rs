//! Normalized discounted cumulative gain.

use super::dataset::RelevanceJudgments;
use crate::config::IdealOrder;
use crate::retrieval::RetrievalItem;

/// DCG of a ranked list of relevance grades: `Σ (2^rel - 1) / log2(r + 2)`.
pub fn dcg(relevances: impl IntoIterator<Item = f64>) -> f64 {
    relevances
        .into_iter()
        .enumerate()
        .map(|(rank, rel)| (2f64.powf(rel) - 1.0) / ((rank + 2) as f64).log2())
        .sum()
}

/// DCG of the judgments themselves, in the requested order.
pub fn ideal_dcg(judgments: &RelevanceJudgments, order: IdealOrder) -> f64 {
    match order {
        IdealOrder::AsGiven => dcg(judgments.values()),
        IdealOrder::Sorted => {
            let mut values: Vec<f64> = judgments.values().collect();
            values.sort_by(|a, b| b.total_cmp(a));
            dcg(values)
        }
    }
}

/// NDCG of a ranking of document ids. Unjudged ids count as relevance 0.
///
/// Returns 0 when the ideal DCG is not positive.
pub fn ndcg(judgments: &RelevanceJudgments, ranking: &[Option<u32>], order: IdealOrder) -> f64 {
    let ideal = ideal_dcg(judgments, order);
    if ideal <= 0.0 {
        return 0.0;
    }
    let actual = dcg(ranking.iter().map(|doc| doc.map_or(0.0, |d| judgments.get(d))));
    actual / ideal
}

/// Reduce retrieved items to their distinct positions, first occurrence wins.
pub fn ranked_positions(items: &[RetrievalItem]) -> Vec<(Option<u32>, f32)> {
    let mut seen: Vec<(Option<u32>, f32)> = Vec::with_capacity(items.len());
    for item in items {
        if !seen.iter().any(|(p, _)| *p == item.position) {
            seen.push((item.position, item.score));
        }
    }
    seen
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judged(pairs: &[(u32, f64)]) -> RelevanceJudgments {
        RelevanceJudgments::new(pairs.iter().copied())
    }

    #[test]
    fn test_perfect_ranking_scores_one() {
        let judgments = judged(&[(5, 1.0), (7, 0.5)]);
        let score = ndcg(&judgments, &[Some(5), Some(7)], IdealOrder::AsGiven);
        assert!((score - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_judgments_score_zero() {
        let judgments = RelevanceJudgments::default();
        assert_eq!(ndcg(&judgments, &[Some(1)], IdealOrder::AsGiven), 0.0);
        assert_eq!(ndcg(&judgments, &[], IdealOrder::Sorted), 0.0);
    }

    #[test]
    fn test_all_zero_relevance_scores_zero() {
        let judgments = judged(&[(1, 0.0), (2, 0.0)]);
        assert_eq!(ndcg(&judgments, &[Some(1), Some(2)], IdealOrder::AsGiven), 0.0);
    }

    #[test]
    fn test_swapped_ranking_scores_below_one() {
        let judgments = judged(&[(5, 1.0), (7, 0.5)]);
        let score = ndcg(&judgments, &[Some(7), Some(5)], IdealOrder::AsGiven);

        let expected = ((2f64.powf(0.5) - 1.0) + 1.0 / 3f64.log2())
            / (1.0 + (2f64.powf(0.5) - 1.0) / 3f64.log2());
        assert!((score - expected).abs() < 1e-12);
        assert!(score < 1.0);
    }

    #[test]
    fn test_unjudged_and_missing_positions_count_zero() {
        let judgments = judged(&[(5, 1.0)]);
        assert_eq!(ndcg(&judgments, &[Some(9)], IdealOrder::AsGiven), 0.0);
        assert_eq!(ndcg(&judgments, &[None], IdealOrder::AsGiven), 0.0);
    }

    #[test]
    fn test_ideal_order_as_given_can_exceed_one() {
        // Judgments listed worst-first make the literal ideal smaller than the true one.
        let judgments = judged(&[(7, 0.5), (5, 1.0)]);
        let as_given = ndcg(&judgments, &[Some(5), Some(7)], IdealOrder::AsGiven);
        let sorted = ndcg(&judgments, &[Some(5), Some(7)], IdealOrder::Sorted);

        assert!(as_given > 1.0);
        assert!((sorted - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_ranked_positions_dedupes() {
        use crate::chunking::Location;
        let item = |position, score| RetrievalItem {
            score,
            text: String::new(),
            location: Location::File {
                course_id: "c".to_string(),
                file_id: "f".to_string(),
            },
            position,
        };
        let items = vec![item(Some(3), 0.9), item(Some(3), 0.8), item(None, 0.7), item(Some(1), 0.6)];

        assert_eq!(
            ranked_positions(&items),
            vec![(Some(3), 0.9), (None, 0.7), (Some(1), 0.6)]
        );
    }
}
