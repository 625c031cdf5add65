//! Built-in article set served by [`SampleSource`](super::SampleSource).

use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::types::{Article, Category};

/// 2025-01-15T12:00:00Z, the reference point the sample dates hang off.
const SAMPLE_EPOCH: i64 = 1_736_942_400;
const HOUR: i64 = 3_600;

fn published(hours_before_epoch: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(SAMPLE_EPOCH - hours_before_epoch * HOUR, 0).unwrap_or_default()
}

fn tags(values: &[&str]) -> Arc<[String]> {
    values.iter().map(|t| t.to_string()).collect()
}

/// The fixed sample collection, in store (insertion) order.
///
/// Publication dates are not in insertion order, so the feed's date
/// ordering is observable.
pub fn sample_articles() -> Vec<Article> {
    vec![
        Article {
            id: 1,
            title: Arc::from("The Future of Quantum Computing"),
            summary: Arc::from(
                "Researchers make breakthrough in quantum error correction, bringing practical \
                 quantum computers closer to reality.",
            ),
            content: Arc::from(
                "Research groups have demonstrated an error correction scheme that keeps logical \
                 qubits stable for far longer than before.\n\n\
                 Lower error rates are the main obstacle between laboratory prototypes and \
                 machines that can run useful workloads such as molecular simulation and \
                 optimization.\n\n\
                 Cryogenic cooling and isolation remain expensive, so commercial systems are \
                 still some years away.",
            ),
            category: Category::Technology,
            image_url: Some(Arc::from("quantum.computing.image")),
            published_at: published(3),
            source: Arc::from("Tech Innovations Weekly"),
            author: Arc::from("Michael Rivers"),
            reading_time: 5,
            tags: tags(&["Quantum", "Computing", "Innovation", "Science"]),
        },
        Article {
            id: 2,
            title: Arc::from("Global Markets React to New Economic Policies"),
            summary: Arc::from(
                "Stock markets worldwide show mixed responses to coordinated central bank \
                 policy changes.",
            ),
            content: Arc::from(
                "Several central banks published coordinated guidance for the coming quarter, \
                 and equity markets moved unevenly in response.\n\n\
                 Asian indices opened higher while European markets were mostly flat. \
                 Semiconductor stocks led the gains on strong earnings.\n\n\
                 Analysts expect volatility to continue until further economic data arrives.",
            ),
            category: Category::Business,
            image_url: None,
            published_at: published(22),
            source: Arc::from("Financial Times International"),
            author: Arc::from("Robert Chen"),
            reading_time: 4,
            tags: tags(&["Finance", "Markets", "Economy", "Policy"]),
        },
        Article {
            id: 3,
            title: Arc::from("Revolutionary Cancer Treatment Shows Promise"),
            summary: Arc::from(
                "New immunotherapy approach demonstrates remarkable success in clinical trials \
                 for previously untreatable cancers.",
            ),
            content: Arc::from(
                "An engineered T-cell therapy produced complete remission in a majority of \
                 trial participants whose lymphomas had resisted every other treatment.\n\n\
                 The approach reprograms a patient's own immune cells to recognize tumor \
                 markers, which keeps side effects lower than chemotherapy.\n\n\
                 Manufacturing cost is the open problem; regulators are reviewing the results \
                 on an accelerated schedule.",
            ),
            category: Category::Health,
            image_url: None,
            published_at: published(5),
            source: Arc::from("Medical Science Today"),
            author: Arc::from("Dr. James Wilson"),
            reading_time: 6,
            tags: tags(&["Health", "Cancer", "Medicine", "Research"]),
        },
        Article {
            id: 4,
            title: Arc::from("Sustainable Cities: Copenhagen's Green Revolution"),
            summary: Arc::from(
                "Denmark's capital achieves carbon neutrality milestone through innovative urban \
                 planning and green technology.",
            ),
            content: Arc::from(
                "Copenhagen reports that its electricity now comes entirely from renewable \
                 sources, capping a decade of planning.\n\n\
                 Cycling infrastructure, district heating and strict building standards carried \
                 most of the reduction. The harbor is clean enough for swimming.\n\n\
                 Rising housing costs are the next challenge for city planners.",
            ),
            category: Category::Lifestyle,
            image_url: None,
            published_at: published(72),
            source: Arc::from("Global Cities Magazine"),
            author: Arc::from("Emma Larsen"),
            reading_time: 5,
            tags: tags(&[
                "Sustainability",
                "Environment",
                "Urban Planning",
                "Green Technology",
            ]),
        },
        Article {
            id: 5,
            title: Arc::from("Mars Mission: New Discoveries Reshape Understanding"),
            summary: Arc::from(
                "NASA's Perseverance rover uncovers geological formations suggesting ancient \
                 water systems far more extensive than previously believed.",
            ),
            content: Arc::from(
                "Layered sediments and clay minerals found by the rover point to long-lived, \
                 interconnected bodies of water on ancient Mars.\n\n\
                 Cached rock samples will be returned to Earth by a later mission for \
                 laboratory analysis.\n\n\
                 The findings widen the range of places where life could once have emerged.",
            ),
            category: Category::Science,
            image_url: None,
            published_at: published(1),
            source: Arc::from("Space Exploration Quarterly"),
            author: Arc::from("David Thompson"),
            reading_time: 6,
            tags: tags(&["Space", "Mars", "NASA", "Science", "Exploration"]),
        },
        Article {
            id: 6,
            title: Arc::from("The Rise of Independent Cinema"),
            summary: Arc::from(
                "Film festivals report record attendance as audiences embrace innovative \
                 storytelling outside Hollywood mainstream.",
            ),
            content: Arc::from(
                "Festival submissions and attendance reached record levels this season, and \
                 streaming services keep buying independent productions.\n\n\
                 Lower production costs and direct audience contact through social media have \
                 opened the field to new filmmakers.\n\n\
                 Funding remains difficult, and most independent creators still struggle to \
                 earn a stable income.",
            ),
            category: Category::Entertainment,
            image_url: None,
            published_at: published(48),
            source: Arc::from("Cinema Arts Review"),
            author: Arc::from("Alexandra Kim"),
            reading_time: 4,
            tags: tags(&["Film", "Cinema", "Entertainment", "Arts", "Culture"]),
        },
    ]
}
