//! Query tokenization shared by the search backends.
//!
//! Search is type-ahead driven, so every term is treated as a word prefix and all terms
//! must match somewhere in the store's name or description.

use crate::domain::Store;

/// Lowercased alphanumeric terms of a raw query string.
pub fn terms(query: &str) -> Vec<String> {
    query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Postgres `tsquery` source for `terms`: every term as a prefix, all required.
pub fn prefix_tsquery(terms: &[String]) -> String {
    terms
        .iter()
        .map(|t| format!("{}:*", t))
        .collect::<Vec<_>>()
        .join(" & ")
}

fn words(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Scores a store against `terms`; `None` when some term matches nothing.
///
/// Name hits weigh more than description hits.
pub fn score(store: &Store, terms: &[String]) -> Option<u32> {
    if terms.is_empty() {
        return None;
    }
    let name: Vec<String> = words(&store.name).collect();
    let description: Vec<String> = store
        .description
        .as_deref()
        .map(|d| words(d).collect())
        .unwrap_or_default();

    let mut total = 0;
    for term in terms {
        let in_name = name.iter().any(|w| w.starts_with(term.as_str()));
        let in_description = description.iter().any(|w| w.starts_with(term.as_str()));
        total += match (in_name, in_description) {
            (true, true) => 3,
            (true, false) => 2,
            (false, true) => 1,
            (false, false) => return None,
        };
    }
    Some(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Location, StoreId, UserId};
    use chrono::Utc;

    fn store(name: &str, description: Option<&str>) -> Store {
        Store {
            id: StoreId(1),
            name: name.to_string(),
            slug: String::new(),
            description: description.map(str::to_string),
            tags: Vec::new(),
            created: Utc::now(),
            location: Location {
                kind: "Point".to_string(),
                coordinates: [0.0, 0.0],
                address: String::new(),
            },
            photo: None,
            author: UserId(1),
        }
    }

    #[test]
    fn terms_strip_punctuation() {
        assert_eq!(terms("  Caf'e  BLUE! "), vec!["caf", "e", "blue"]);
        assert!(terms(" ... ").is_empty());
    }

    #[test]
    fn tsquery_uses_prefixes() {
        let t = terms("cafe bl");
        assert_eq!(prefix_tsquery(&t), "cafe:* & bl:*");
    }

    #[test]
    fn score_requires_every_term() {
        let s = store("Cafe Blue", Some("Fresh coffee daily"));
        assert_eq!(score(&s, &terms("caf")), Some(2));
        assert_eq!(score(&s, &terms("coff")), Some(1));
        assert_eq!(score(&s, &terms("cafe coffee")), Some(3));
        assert_eq!(score(&s, &terms("cafe tea")), None);
        assert_eq!(score(&s, &[]), None);
    }
}
