//! "Related articles" for the detail view.
//!
//! Category matches come first, then tag matches that are not already
//! included. Both passes keep store order, so the result is deterministic
//! for a given article set.

use std::collections::HashSet;

use crate::content::{Article, ArticleId};

/// Default cap on the number of related articles.
pub const DEFAULT_RELATED_LIMIT: usize = 5;

/// Articles related to `target`, at most `limit` of them.
///
/// An article is related when it shares the target's category or at least
/// one tag (exact, case-sensitive match). The target itself is never
/// included, and each id appears at most once.
pub fn related(target: &Article, articles: &[Article], limit: usize) -> Vec<Article> {
    let mut seen: HashSet<ArticleId> = HashSet::from([target.id]);
    let mut result = Vec::with_capacity(limit.min(articles.len()));

    let same_category = articles.iter().filter(|a| a.category == target.category);
    let shared_tag = articles.iter().filter(|a| a.shares_tag_with(target));

    for article in same_category.chain(shared_tag) {
        if result.len() >= limit {
            break;
        }
        if seen.insert(article.id) {
            result.push(article.clone());
        }
    }

    tracing::trace!(target_id = target.id, count = result.len(), "Resolved related articles");
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{sample_articles, Category};
    use chrono::{DateTime, Utc};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use std::sync::Arc;

    fn article(id: ArticleId, category: Category, tags: &[&str]) -> Article {
        Article {
            id,
            title: Arc::from(format!("Article {id}")),
            summary: Arc::from(""),
            content: Arc::from(""),
            category,
            image_url: None,
            published_at: DateTime::<Utc>::default(),
            source: Arc::from("Test"),
            author: Arc::from("Tester"),
            reading_time: 3,
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn ids(articles: &[Article]) -> Vec<ArticleId> {
        articles.iter().map(|a| a.id).collect()
    }

    #[test]
    fn test_category_before_tag() {
        let a = article(1, Category::Science, &["mars"]);
        let b = article(2, Category::Science, &["rover"]);
        let c = article(3, Category::Health, &["mars"]);
        let all = vec![a.clone(), b, c];

        assert_eq!(ids(&related(&a, &all, DEFAULT_RELATED_LIMIT)), vec![2, 3]);
    }

    #[test]
    fn test_tag_match_is_case_sensitive() {
        let a = article(1, Category::Science, &["Mars"]);
        let b = article(2, Category::Health, &["mars"]);
        let all = vec![a.clone(), b];

        assert!(related(&a, &all, DEFAULT_RELATED_LIMIT).is_empty());
    }

    #[test]
    fn test_article_matching_both_ways_appears_once() {
        let a = article(1, Category::Sports, &["football"]);
        let b = article(2, Category::Sports, &["football"]);
        let all = vec![b, a.clone()];

        assert_eq!(ids(&related(&a, &all, DEFAULT_RELATED_LIMIT)), vec![2]);
    }

    #[test]
    fn test_limit_truncates_category_matches_first() {
        let target = article(0, Category::Travel, &["beach"]);
        let mut all = vec![target.clone()];
        all.extend((1..=6).map(|id| article(id, Category::Travel, &[])));
        all.push(article(7, Category::Culture, &["beach"]));

        let result = related(&target, &all, DEFAULT_RELATED_LIMIT);
        assert_eq!(ids(&result), vec![1, 2, 3, 4, 5]);

        let wider = related(&target, &all, 10);
        assert_eq!(ids(&wider), vec![1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_zero_limit() {
        let a = article(1, Category::Science, &[]);
        let b = article(2, Category::Science, &[]);
        assert!(related(&a, &[a.clone(), b], 0).is_empty());
    }

    #[test]
    fn test_sample_quantum_article_relations() {
        let all = sample_articles();
        let quantum = all.iter().find(|a| a.id == 1).cloned().unwrap();

        // No other technology article; Mars shares the "Science" tag.
        assert_eq!(ids(&related(&quantum, &all, DEFAULT_RELATED_LIMIT)), vec![5]);
    }

    /// Article sets with unique ids, so relations are decided per article.
    fn arb_articles(len: std::ops::Range<usize>) -> impl Strategy<Value = Vec<Article>> {
        let entry = (
            prop::sample::select(Category::ALL.to_vec()),
            prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]), 0..3),
        );
        prop::collection::vec(entry, len).prop_map(|entries| {
            entries
                .into_iter()
                .enumerate()
                .map(|(i, (category, tags))| article(i as ArticleId, category, &tags))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_related_excludes_target_and_is_bounded(
            articles in arb_articles(1..30),
            index in any::<prop::sample::Index>(),
        ) {
            let target = index.get(&articles).clone();
            let result = related(&target, &articles, DEFAULT_RELATED_LIMIT);

            prop_assert!(result.len() <= DEFAULT_RELATED_LIMIT);
            prop_assert!(result.iter().all(|a| a.id != target.id));

            let unique: HashSet<_> = result.iter().map(|a| a.id).collect();
            prop_assert_eq!(unique.len(), result.len());

            for a in &result {
                prop_assert!(a.category == target.category || a.shares_tag_with(&target));
            }
        }

        #[test]
        fn prop_unrelated_pairs_exclude_each_other(
            articles in arb_articles(2..30),
        ) {
            for x in &articles {
                for y in &articles {
                    let unrelated = x.category != y.category && !x.shares_tag_with(y);
                    if unrelated {
                        let rx = related(x, &articles, usize::MAX);
                        prop_assert!(rx.iter().all(|a| a.id != y.id));
                    }
                }
            }
        }
    }
}
