use std::cmp::Ordering;

use crate::dao::models::ScoreEntryEntity;

/// Entries kept per game after a pruning pass.
pub const TOP_K: usize = 3;

/// Apply the shared ordering law: score descending, ties broken by
/// timestamp ascending (first to achieve the score ranks higher).
///
/// Entries without a finite score are dropped before sorting.
pub fn sort_entries(mut entries: Vec<ScoreEntryEntity>) -> Vec<ScoreEntryEntity> {
    entries.retain(|entry| entry.score.is_finite());
    entries.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then(a.ts.cmp(&b.ts))
    });
    entries
}

/// Split an already-sorted list into the `k` entries to keep and the rest,
/// which are deletion candidates for whichever store is being pruned.
pub fn select_top_k(
    sorted: Vec<ScoreEntryEntity>,
    k: usize,
) -> (Vec<ScoreEntryEntity>, Vec<ScoreEntryEntity>) {
    let mut kept = sorted;
    let dropped = kept.split_off(k.min(kept.len()));
    (kept, dropped)
}

/// Resolve a caller-provided limit: absent or zero falls back to [`TOP_K`].
pub fn clamp_limit(limit: Option<usize>) -> usize {
    match limit {
        Some(n) if n >= 1 => n,
        _ => TOP_K,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, score: f64, ts: u64) -> ScoreEntryEntity {
        ScoreEntryEntity {
            id: id.into(),
            game_id: "snake".into(),
            name: "Player".into(),
            score,
            ts,
            uid: None,
            extra: Default::default(),
        }
    }

    #[test]
    fn sorts_by_score_descending() {
        let sorted = sort_entries(vec![entry("a", 10.0, 1), entry("b", 30.0, 2), entry("c", 20.0, 3)]);
        let ids: Vec<_> = sorted.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[test]
    fn ties_break_on_earlier_timestamp() {
        let sorted = sort_entries(vec![entry("late", 50.0, 200), entry("early", 50.0, 100)]);
        let ids: Vec<_> = sorted.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, ["early", "late"]);
    }

    #[test]
    fn drops_non_finite_scores() {
        let sorted = sort_entries(vec![entry("ok", 1.0, 1), entry("nan", f64::NAN, 2)]);
        assert_eq!(sorted.len(), 1);
        assert_eq!(sorted[0].id, "ok");
    }

    #[test]
    fn ordering_is_non_increasing_and_ties_non_decreasing() {
        let sorted = sort_entries(vec![
            entry("a", 5.0, 9),
            entry("b", 5.0, 3),
            entry("c", 9.0, 7),
            entry("d", 1.0, 1),
            entry("e", 9.0, 2),
        ]);
        for pair in sorted.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            if pair[0].score == pair[1].score {
                assert!(pair[0].ts <= pair[1].ts);
            }
        }
    }

    #[test]
    fn top_k_split_keeps_prefix() {
        let sorted = sort_entries(vec![
            entry("a", 4.0, 1),
            entry("b", 3.0, 1),
            entry("c", 2.0, 1),
            entry("d", 1.0, 1),
        ]);
        let (kept, dropped) = select_top_k(sorted, 3);
        assert_eq!(kept.len(), 3);
        assert_eq!(dropped.len(), 1);
        assert_eq!(dropped[0].id, "d");
    }

    #[test]
    fn top_k_tolerates_short_lists() {
        let (kept, dropped) = select_top_k(vec![entry("a", 4.0, 1)], 3);
        assert_eq!(kept.len(), 1);
        assert!(dropped.is_empty());
    }

    #[test]
    fn limit_defaults_and_floors() {
        assert_eq!(clamp_limit(None), TOP_K);
        assert_eq!(clamp_limit(Some(0)), TOP_K);
        assert_eq!(clamp_limit(Some(10)), 10);
    }
}
