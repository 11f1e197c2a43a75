//! Keyword-scoring category suggester.
//!
//! Used when a citizen submits without picking a category. The suggestion
//! is a heuristic, never authoritative: officials can re-route, and a text
//! with no keyword hits falls back to `Category::Other` at the call site.

use crate::complaint::Category;

/// Keyword table, checked case-insensitively against title + description.
/// Order matters only for ties: the earlier category wins.
const KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Roads,
        &["pothole", "road", "asphalt", "pavement", "speed bump", "traffic"],
    ),
    (
        Category::WaterSupply,
        &["water", "pipe", "leak", "tap", "supply", "burst"],
    ),
    (
        Category::Electricity,
        &["power", "electric", "outage", "transformer", "voltage", "wire"],
    ),
    (
        Category::Sanitation,
        &["garbage", "trash", "waste", "sewage", "drain", "smell"],
    ),
    (
        Category::StreetLighting,
        &["streetlight", "street light", "lamp", "dark street", "light pole"],
    ),
    (
        Category::PublicSafety,
        &["unsafe", "danger", "crime", "vandal", "stray", "accident"],
    ),
];

/// Count keyword hits per category and return the best-scoring one.
/// Returns None when nothing matches at all.
pub fn suggest(text: &str) -> Option<Category> {
    let haystack = text.to_lowercase();
    let mut best: Option<(Category, usize)> = None;

    for (category, keywords) in KEYWORDS {
        let score = keywords
            .iter()
            .filter(|kw| haystack.contains(*kw))
            .count();
        if score == 0 {
            continue;
        }
        match best {
            Some((_, best_score)) if best_score >= score => {}
            _ => best = Some((*category, score)),
        }
    }

    best.map(|(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pothole_text_suggests_roads() {
        let got = suggest("Huge pothole on the main road near the school");
        assert_eq!(got, Some(Category::Roads));
    }

    #[test]
    fn unrelated_text_suggests_nothing() {
        assert_eq!(suggest("please help with my situation"), None);
    }

    #[test]
    fn higher_score_beats_earlier_category() {
        // One "road" hit vs. two sanitation hits.
        let got = suggest("garbage piling up on the road, terrible smell");
        assert_eq!(got, Some(Category::Sanitation));
    }
}
