//! Default quote set shipped with the app.

use crate::models::Quote;

const DEFAULT_QUOTES: &[(&str, &str, &str)] = &[
    (
        "The only way to do great work is to love what you do.",
        "motivation",
        "Steve Jobs",
    ),
    (
        "Innovation distinguishes between a leader and a follower.",
        "innovation",
        "Steve Jobs",
    ),
    (
        "Life is what happens to you while you're busy making other plans.",
        "life",
        "John Lennon",
    ),
    (
        "The future belongs to those who believe in the beauty of their dreams.",
        "dreams",
        "Eleanor Roosevelt",
    ),
    (
        "Success is not final, failure is not fatal: it is the courage to continue that counts.",
        "success",
        "Winston Churchill",
    ),
    (
        "The only impossible journey is the one you never begin.",
        "motivation",
        "Tony Robbins",
    ),
    (
        "In the middle of difficulty lies opportunity.",
        "opportunity",
        "Albert Einstein",
    ),
    (
        "Believe you can and you're halfway there.",
        "motivation",
        "Theodore Roosevelt",
    ),
];

/// Build the shipped quote set. Each call assigns fresh local ids.
#[must_use]
pub fn default_quotes() -> Vec<Quote> {
    DEFAULT_QUOTES
        .iter()
        .map(|&(text, category, author)| {
            let mut quote = Quote::new(text, category, author);
            quote.is_custom = false;
            quote
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_quotes_are_well_formed() {
        let quotes = default_quotes();
        assert_eq!(quotes.len(), 8);
        assert!(quotes.iter().all(|q| !q.is_custom));
        assert!(quotes.iter().all(|q| !q.text.trim().is_empty()));
        assert!(quotes.iter().all(|q| q.category == q.category.to_lowercase()));
    }
}
