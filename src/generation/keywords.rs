// src/generation/keywords.rs
//! Local keyword analysis over job-description text.
//!
//! Runs entirely in-process: tokenize, drop stop words, score by
//! frequency weighted by first-occurrence position. Early mentions in a
//! posting tend to be the requirements that matter. Known multi-word
//! technology terms are kept together as single keywords.

use serde::Serialize;
use std::collections::HashMap;

const DEFAULT_TOP_N: usize = 20;
const MIN_TOKEN_LEN: usize = 2;

/// Words too generic to rank, in job-posting prose specifically.
const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "you", "are", "our", "with", "will", "that", "this",
    "have", "has", "your", "who", "what", "from", "they", "their", "them",
    "would", "should", "could", "about", "into", "over", "under", "more",
    "than", "also", "all", "any", "can", "may", "must", "not", "but", "was",
    "were", "been", "being", "its", "it's", "we're", "you'll", "we'll",
    "job", "work", "working", "role", "team", "company", "candidate",
    "position", "opportunity", "experience", "years", "ability", "skills",
    "strong", "required", "preferred", "plus", "looking", "join", "help",
    "well", "good", "great", "new", "across", "within", "including",
];

/// Multi-word technology terms counted as single keywords. Longer
/// phrases precede any shorter phrase sharing their opening words.
const TECH_PHRASES: &[&str] = &[
    "natural language processing",
    "infrastructure as code",
    "machine learning",
    "deep learning",
    "computer vision",
    "data science",
    "data engineering",
    "continuous integration",
    "continuous delivery",
    "continuous deployment",
    "version control",
    "unit testing",
    "integration testing",
    "distributed systems",
    "event sourcing",
    "message queue",
    "functional programming",
    "cloud computing",
    "site reliability",
];

#[derive(Debug, Clone, Serialize)]
pub struct KeywordEntry {
    pub keyword: String,
    pub count: usize,
    /// Frequency weighted by how early the keyword first appears.
    pub weight: f64,
}

/// Split of ranked keywords against a skill inventory.
#[derive(Debug, Clone, Serialize)]
pub struct KeywordMatch {
    pub present: Vec<KeywordEntry>,
    pub missing: Vec<KeywordEntry>,
}

pub struct KeywordAnalyzer {
    top_n: usize,
}

impl Default for KeywordAnalyzer {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
        }
    }
}

impl KeywordAnalyzer {
    pub fn new(top_n: usize) -> Self {
        Self { top_n }
    }

    /// Rank the description's keywords by weighted frequency.
    pub fn analyze(&self, description: &str) -> Vec<KeywordEntry> {
        let tokens = tokenize(description);
        if tokens.is_empty() {
            return Vec::new();
        }

        let total = tokens.len() as f64;
        let mut counts: HashMap<String, usize> = HashMap::new();
        let mut first_position: HashMap<String, usize> = HashMap::new();

        for (position, token) in tokens.iter().enumerate() {
            *counts.entry(token.clone()).or_insert(0) += 1;
            first_position.entry(token.clone()).or_insert(position);
        }

        let mut entries: Vec<KeywordEntry> = counts
            .into_iter()
            .map(|(keyword, count)| {
                // Position factor decays linearly from 1.0 (opening line)
                // toward 0.5 (final word).
                let position = first_position[&keyword] as f64;
                let position_factor = 1.0 - (position / total) * 0.5;
                KeywordEntry {
                    weight: count as f64 * position_factor,
                    keyword,
                    count,
                }
            })
            .collect();

        entries.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.keyword.cmp(&b.keyword))
        });
        entries.truncate(self.top_n);
        entries
    }

    /// Split ranked keywords into those covered by the user's skill
    /// inventory and those missing from it. Matching is case-insensitive
    /// and tolerates the skill naming the keyword as a substring
    /// ("PostgreSQL administration" covers "postgresql").
    pub fn diff_against_skills(
        &self,
        description: &str,
        skills: &[String],
    ) -> KeywordMatch {
        let normalized: Vec<String> = skills.iter().map(|s| s.to_lowercase()).collect();

        let (present, missing) = self
            .analyze(description)
            .into_iter()
            .partition(|entry| {
                normalized
                    .iter()
                    .any(|skill| skill.contains(&entry.keyword) || entry.keyword.contains(skill))
            });

        KeywordMatch { present, missing }
    }
}

fn tokenize(text: &str) -> Vec<String> {
    let words: Vec<String> = text
        .split(|c: char| !c.is_alphanumeric() && c != '+' && c != '#' && c != '\'')
        .map(|word| word.trim_matches('\'').to_lowercase())
        .filter(|word| !word.is_empty())
        .collect();

    let mut tokens = Vec::with_capacity(words.len());
    let mut i = 0;
    while i < words.len() {
        // A phrase match consumes its component words; "machine" and
        // "learning" never rank separately out of "machine learning".
        if let Some(len) = match_phrase(&words, i) {
            tokens.push(words[i..i + len].join(" "));
            i += len;
            continue;
        }

        let word = &words[i];
        if word.len() >= MIN_TOKEN_LEN
            && !word.chars().all(|c| c.is_ascii_digit())
            && !STOP_WORDS.contains(&word.as_str())
        {
            tokens.push(word.clone());
        }
        i += 1;
    }
    tokens
}

fn match_phrase(words: &[String], start: usize) -> Option<usize> {
    TECH_PHRASES.iter().find_map(|phrase| {
        let parts: Vec<&str> = phrase.split(' ').collect();
        let end = start + parts.len();
        if end <= words.len()
            && words[start..end]
                .iter()
                .map(String::as_str)
                .eq(parts.iter().copied())
        {
            Some(parts.len())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTION: &str = "We need deep Rust experience. Rust services \
        run on Kubernetes, with PostgreSQL for storage. Rust, Kafka and \
        PostgreSQL are used daily. Familiarity with Terraform is a plus.";

    #[test]
    fn test_most_frequent_keyword_ranks_first() {
        let analyzer = KeywordAnalyzer::default();
        let entries = analyzer.analyze(DESCRIPTION);

        assert_eq!(entries[0].keyword, "rust");
        assert_eq!(entries[0].count, 3);
    }

    #[test]
    fn test_early_mention_outweighs_equal_frequency() {
        let analyzer = KeywordAnalyzer::default();
        let entries = analyzer.analyze("kubernetes before. later words then docker appears");

        let kubernetes = entries.iter().find(|e| e.keyword == "kubernetes").unwrap();
        let docker = entries.iter().find(|e| e.keyword == "docker").unwrap();
        assert_eq!(kubernetes.count, docker.count);
        assert!(kubernetes.weight > docker.weight);
    }

    #[test]
    fn test_stop_words_and_numbers_are_dropped() {
        let analyzer = KeywordAnalyzer::default();
        let entries = analyzer.analyze("The candidate will have 5 years experience with Go");

        assert!(entries.iter().all(|e| e.keyword != "the"));
        assert!(entries.iter().all(|e| e.keyword != "5"));
        assert!(entries.iter().all(|e| e.keyword != "experience"));
        assert!(entries.iter().any(|e| e.keyword == "go"));
    }

    #[test]
    fn test_plus_and_sharp_survive_tokenization() {
        let analyzer = KeywordAnalyzer::default();
        let entries = analyzer.analyze("Production C++ and C# development daily; C++ above all");

        assert!(entries.iter().any(|e| e.keyword == "c++" && e.count == 2));
        assert!(entries.iter().any(|e| e.keyword == "c#"));
    }

    #[test]
    fn test_multi_word_tech_terms_rank_as_one_keyword() {
        let analyzer = KeywordAnalyzer::default();
        let entries = analyzer.analyze(
            "Machine learning pipelines in production. Machine learning models \
             are retrained nightly; continuous integration keeps them shippable.",
        );

        let ml = entries
            .iter()
            .find(|e| e.keyword == "machine learning")
            .unwrap();
        assert_eq!(ml.count, 2);
        assert!(entries.iter().any(|e| e.keyword == "continuous integration"));
        assert!(entries.iter().all(|e| e.keyword != "machine"));
        assert!(entries.iter().all(|e| e.keyword != "learning"));
        assert!(entries.iter().all(|e| e.keyword != "integration"));
    }

    #[test]
    fn test_phrase_keywords_diff_against_skills() {
        let analyzer = KeywordAnalyzer::default();
        let skills = vec!["Machine Learning".to_string()];
        let split = analyzer.diff_against_skills(
            "Machine learning experience required, plus natural language processing",
            &skills,
        );

        assert!(split.present.iter().any(|e| e.keyword == "machine learning"));
        assert!(split
            .missing
            .iter()
            .any(|e| e.keyword == "natural language processing"));
    }

    #[test]
    fn test_diff_splits_present_and_missing() {
        let analyzer = KeywordAnalyzer::default();
        let skills = vec!["Rust".to_string(), "PostgreSQL administration".to_string()];
        let split = analyzer.diff_against_skills(DESCRIPTION, &skills);

        assert!(split.present.iter().any(|e| e.keyword == "rust"));
        assert!(split.present.iter().any(|e| e.keyword == "postgresql"));
        assert!(split.missing.iter().any(|e| e.keyword == "kafka"));
        assert!(split.missing.iter().any(|e| e.keyword == "terraform"));
    }

    #[test]
    fn test_empty_description_yields_nothing() {
        let analyzer = KeywordAnalyzer::default();
        assert!(analyzer.analyze("").is_empty());
        let split = analyzer.diff_against_skills("", &["Rust".to_string()]);
        assert!(split.present.is_empty());
        assert!(split.missing.is_empty());
    }
}
