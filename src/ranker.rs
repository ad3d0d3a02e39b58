//! Orders catalog records for a query.
//!
//! A blank query lists the most-used prompts. Anything else is scored against
//! every record; records under [`RELEVANCE_FLOOR`] are dropped and the rest are
//! ordered by score plus a capped usage bonus. Every sort is stable, so catalog
//! order breaks the remaining ties.

use crate::catalog::Catalog;
use crate::record::PromptRecord;
use crate::scorer::{score, searchable_text};

/// Minimum similarity a record needs to appear in query results.
pub const RELEVANCE_FLOOR: u8 = 50;
/// Points added per recorded use.
pub const USAGE_BONUS_PER_USE: u64 = 2;
/// Upper bound on the usage bonus, so usage alone cannot beat a strong match.
pub const USAGE_BONUS_CAP: u32 = 20;

/// Scores attached to a query result; not persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ranking {
    pub score: u8,
    pub final_score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedPrompt<'a> {
    pub record: &'a PromptRecord,
    /// `None` when the query was blank and nothing was scored.
    pub ranking: Option<Ranking>,
}

pub fn usage_bonus(usage_count: u64) -> u32 {
    let bonus = usage_count.saturating_mul(USAGE_BONUS_PER_USE);
    bonus.min(u64::from(USAGE_BONUS_CAP)) as u32
}

/// Rank `catalog` against `query`, returning at most `limit` records.
pub fn rank<'a>(query: &str, catalog: &'a Catalog, limit: usize) -> Vec<RankedPrompt<'a>> {
    if limit == 0 || catalog.is_empty() {
        return Vec::new();
    }
    if query.trim().is_empty() {
        return most_used(catalog, limit);
    }

    let mut scored: Vec<(&'a PromptRecord, Ranking)> = catalog
        .records()
        .filter_map(|record| {
            let score = score(query, &searchable_text(record));
            if score < RELEVANCE_FLOOR {
                return None;
            }
            let final_score = u32::from(score) + usage_bonus(record.usage_count);
            Some((record, Ranking { score, final_score }))
        })
        .collect();

    scored.sort_by(|(_, a), (_, b)| {
        b.final_score
            .cmp(&a.final_score)
            .then_with(|| b.score.cmp(&a.score))
    });
    scored
        .into_iter()
        .take(limit)
        .map(|(record, ranking)| RankedPrompt {
            record,
            ranking: Some(ranking),
        })
        .collect()
}

fn most_used(catalog: &Catalog, limit: usize) -> Vec<RankedPrompt<'_>> {
    let mut records: Vec<&PromptRecord> = catalog.records().collect();
    records.sort_by(|a, b| b.usage_count.cmp(&a.usage_count));
    records
        .into_iter()
        .take(limit)
        .map(|record| RankedPrompt {
            record,
            ranking: None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::PromptId;

    fn prompt(id: &str, name: &str, tags: &[&str], usage_count: u64) -> PromptRecord {
        let mut record = PromptRecord::new(
            PromptId::from(id),
            name,
            "text",
            tags.iter().map(|t| t.to_string()).collect(),
        );
        record.usage_count = usage_count;
        record
    }

    fn ids(ranked: &[RankedPrompt<'_>]) -> Vec<String> {
        ranked.iter().map(|r| r.record.id.0.clone()).collect()
    }

    #[test]
    fn usage_bonus_is_capped() {
        assert_eq!(usage_bonus(0), 0);
        assert_eq!(usage_bonus(3), 6);
        assert_eq!(usage_bonus(10), 20);
        assert_eq!(usage_bonus(15), 20);
        assert_eq!(usage_bonus(u64::MAX), 20);
    }

    #[test]
    fn irrelevant_popular_record_is_filtered() {
        let catalog = Catalog::from_records([
            prompt("a", "Summarize Text", &["writing"], 0),
            prompt("b", "Translate", &[], 10),
        ]);
        let ranked = rank("summar", &catalog, 5);
        assert_eq!(ids(&ranked), ["a"]);
        let ranking = ranked[0].ranking.unwrap();
        assert!(ranking.score >= RELEVANCE_FLOOR);
        assert_eq!(ranking.final_score, u32::from(ranking.score));
    }

    #[test]
    fn blank_query_lists_most_used_with_stable_ties() {
        let catalog = Catalog::from_records([
            prompt("a", "A", &[], 1),
            prompt("b", "B", &[], 5),
            prompt("c", "C", &[], 1),
            prompt("d", "D", &[], 5),
        ]);
        let ranked = rank("   ", &catalog, 3);
        assert_eq!(ids(&ranked), ["b", "d", "a"]);
        assert!(ranked.iter().all(|r| r.ranking.is_none()));
    }

    #[test]
    fn zero_limit_and_empty_catalog_yield_nothing() {
        let catalog = Catalog::from_records([prompt("a", "Email", &[], 0)]);
        assert!(rank("email", &catalog, 0).is_empty());
        assert!(rank("", &catalog, 0).is_empty());
        assert!(rank("email", &Catalog::default(), 5).is_empty());
    }

    #[test]
    fn usage_breaks_score_ties_then_catalog_order() {
        let catalog = Catalog::from_records([
            prompt("first", "Email", &[], 0),
            prompt("second", "Email", &[], 0),
            prompt("used", "Email", &[], 2),
        ]);
        let ranked = rank("email", &catalog, 10);
        assert_eq!(ids(&ranked), ["used", "first", "second"]);
        assert_eq!(ranked[0].ranking.unwrap().final_score, 104);
    }

    #[test]
    fn results_are_sorted_and_truncated() {
        let catalog = Catalog::from_records([
            prompt("a", "Email Reply", &["work"], 0),
            prompt("b", "Email", &[], 0),
            prompt("c", "Email Follow Up", &[], 9),
            prompt("d", "Mail Merge", &[], 0),
        ]);
        let ranked = rank("email", &catalog, 2);
        assert_eq!(ranked.len(), 2);
        let finals: Vec<u32> = ranked
            .iter()
            .map(|r| r.ranking.unwrap().final_score)
            .collect();
        assert!(finals.windows(2).all(|w| w[0] >= w[1]));
    }
}
