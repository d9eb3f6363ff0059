//! Rule-based entity tagger.
//!
//! Patterns run in priority order; a later pattern never claims text already
//! claimed by an earlier one. Multi-word names never cross a line break.
//! Offsets are character offsets into the input.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use madforge_shared::{EntityTagger, Result, TaggedSpan};

use crate::labels;

const MONTHS: &str = "January|February|March|April|May|June|July|August|September|October|November|December";

/// Words that often start a sentence and are not part of a name.
const LEADING_STOPWORDS: &[&str] = &[
    "The", "A", "An", "In", "On", "At", "This", "That", "These", "Those", "For", "And", "But",
    "Of", "To", "By", "With", "From", "As", "It", "We", "Our", "If", "When", "While",
];

struct Rule {
    label: &'static str,
    confidence: f64,
    pattern: &'static LazyLock<Regex>,
}

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\w.+-]+@[\w-]+(?:\.[\w-]+)+").expect("valid regex")
});
static URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s)\]>"']+"#).expect("valid regex"));
static MONEY_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:million|billion|thousand))?")
        .expect("valid regex")
});
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d+(?:\.\d+)?\s?%").expect("valid regex"));
static DATE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"\b\d{{4}}-\d{{2}}-\d{{2}}\b|\b(?:{MONTHS})\s+\d{{1,2}}(?:st|nd|rd|th)?,?\s+\d{{4}}\b|\b\d{{1,2}}\s+(?:{MONTHS})\s+\d{{4}}\b|\b(?:{MONTHS})\s+\d{{4}}\b"
    ))
    .expect("valid regex")
});
static ORG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:[A-Z][\w&-]*[ \t]+)+(?:Inc|Corp|Corporation|Ltd|LLC|GmbH|Company|University|Institute|Foundation|Association|Agency|Group|Bank)\b\.?|\b(?:University|Institute|Bank) of(?:[ \t]+[A-Z][\w-]*)+",
    )
    .expect("valid regex")
});
static NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Z][a-z]+(?:[ \t]+[A-Z][a-z]+)+\b").expect("valid regex")
});

static RULES: &[Rule] = &[
    Rule { label: "EMAIL", confidence: 0.99, pattern: &EMAIL_RE },
    Rule { label: "URL", confidence: 0.99, pattern: &URL_RE },
    Rule { label: "MONEY", confidence: 0.95, pattern: &MONEY_RE },
    Rule { label: "PERCENT", confidence: 0.95, pattern: &PERCENT_RE },
    Rule { label: "DATE", confidence: 0.9, pattern: &DATE_RE },
    Rule { label: "ORG", confidence: 0.85, pattern: &ORG_RE },
    Rule { label: "NAME", confidence: 0.6, pattern: &NAME_RE },
];

/// Tags emails, URLs, money, percentages, dates, organizations and names.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternTagger;

impl EntityTagger for PatternTagger {
    fn name(&self) -> &str {
        "patterns"
    }

    fn tag(&self, text: &str) -> Result<Vec<TaggedSpan>> {
        // (byte_start, byte_end, rule index)
        let mut accepted: Vec<(usize, usize, usize)> = Vec::new();

        for (idx, rule) in RULES.iter().enumerate() {
            for m in rule.pattern.find_iter(text) {
                let (start, end) = if rule.label == "NAME" {
                    match trim_leading_stopword(text, m.start(), m.end()) {
                        Some(range) => range,
                        None => continue,
                    }
                } else {
                    (m.start(), m.end())
                };

                let overlaps = accepted.iter().any(|&(s, e, _)| start < e && s < end);
                if !overlaps {
                    accepted.push((start, end, idx));
                }
            }
        }

        accepted.sort_by_key(|&(start, _, _)| start);

        let byte_ranges: Vec<(usize, usize)> = accepted.iter().map(|&(s, e, _)| (s, e)).collect();
        let char_ranges = to_char_offsets(text, &byte_ranges);

        let spans: Vec<TaggedSpan> = accepted
            .iter()
            .zip(char_ranges)
            .map(|(&(bs, be, idx), (cs, ce))| TaggedSpan {
                text: text[bs..be].to_string(),
                label: RULES[idx].label.to_string(),
                start: cs,
                end: ce,
                confidence: Some(RULES[idx].confidence),
            })
            .collect();

        debug!(spans = spans.len(), "pattern tagging complete");
        Ok(spans)
    }

    fn describe_label(&self, label: &str) -> Option<String> {
        labels::explain(label).map(str::to_string)
    }
}

/// Drop a leading stopword from a capitalized run; `None` if fewer than two words remain.
fn trim_leading_stopword(text: &str, start: usize, end: usize) -> Option<(usize, usize)> {
    let span = &text[start..end];
    let first = span.split_whitespace().next().unwrap_or_default();

    if !LEADING_STOPWORDS.contains(&first) {
        return Some((start, end));
    }

    let rest = span[first.len()..].trim_start();
    if rest.split_whitespace().count() < 2 {
        return None;
    }
    Some((end - rest.len(), end))
}

/// Convert sorted, non-overlapping byte ranges into character ranges.
fn to_char_offsets(text: &str, ranges: &[(usize, usize)]) -> Vec<(usize, usize)> {
    let mut out = Vec::with_capacity(ranges.len());
    let mut byte_pos = 0;
    let mut char_pos = 0;

    let mut advance = |target: usize| -> usize {
        char_pos += text[byte_pos..target].chars().count();
        byte_pos = target;
        char_pos
    };

    for &(start, end) in ranges {
        let cs = advance(start);
        let ce = advance(end);
        out.push((cs, ce));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(text: &str) -> Vec<(String, String, usize, usize)> {
        PatternTagger
            .tag(text)
            .unwrap()
            .into_iter()
            .map(|s| (s.label, s.text, s.start, s.end))
            .collect()
    }

    #[test]
    fn finds_typed_entities_in_order() {
        let got = tag("Acme Widgets Inc. raised $4.5 million on March 3, 2024, up 12% from 2023.");
        let labels: Vec<&str> = got.iter().map(|g| g.0.as_str()).collect();
        assert_eq!(labels, vec!["ORG", "MONEY", "DATE", "PERCENT"]);
        assert_eq!(got[0].1, "Acme Widgets Inc.");
        assert_eq!(got[1].1, "$4.5 million");
        assert_eq!(got[2].1, "March 3, 2024");
    }

    #[test]
    fn offsets_are_character_based() {
        let text = "Café Noir met Ada Lovelace";
        let got = tag(text);
        let name = got.iter().find(|g| g.1 == "Ada Lovelace").expect("name span");
        let chars: Vec<char> = text.chars().collect();
        let slice: String = chars[name.2..name.3].iter().collect();
        assert_eq!(slice, "Ada Lovelace");
    }

    #[test]
    fn earlier_rules_win_overlaps() {
        let got = tag("Contact jane.doe@example.com or visit https://example.com/Docs Page");
        assert_eq!(got[0].0, "EMAIL");
        assert_eq!(got[1].0, "URL");
        assert_eq!(got.len(), 2);
    }

    #[test]
    fn leading_stopword_is_trimmed_from_names() {
        let got = tag("The Grand Canyon is large. The Sun rises.");
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].1, "Grand Canyon");
        assert_eq!(got[0].2, 4);
    }

    #[test]
    fn describes_labels() {
        assert!(PatternTagger.describe_label("DATE").is_some());
        assert!(PatternTagger.describe_label("NOPE").is_none());
    }
}
