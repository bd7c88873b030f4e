//! # Accumulator
//!
//! Folds decoded events into the text shown for the assistant reply.
//!
//! ```text
//! rendered = body + footer
//! ```
//!
//! `body` only ever grows. `footer` is rebuilt from scratch on every
//! non-empty sources update and always stays a suffix of the rendered text.

use super::event::{SourceRef, StreamEvent};

/// Only this many references are displayed; the rest are dropped.
pub const MAX_SOURCES: usize = 3;

const FOOTER_HEADING: &str = "📄 **المراجع القانونية:**";
const SOURCE_MARKER: &str = "📌";

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Accumulator {
    body: String,
    footer: String,
}

impl Accumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn footer(&self) -> &str {
        &self.footer
    }

    /// The full text of the reply as it should be displayed right now.
    pub fn rendered(&self) -> String {
        format!("{}{}", self.body, self.footer)
    }

    pub fn apply_content(&mut self, text: &str) -> String {
        self.body.push_str(text);
        self.rendered()
    }

    /// Replaces the footer with the first [`MAX_SOURCES`] references.
    /// An empty list keeps whatever footer is already there.
    pub fn apply_sources(&mut self, refs: &[SourceRef]) -> String {
        if !refs.is_empty() {
            self.footer = format_footer(&refs[..refs.len().min(MAX_SOURCES)]);
        }
        self.rendered()
    }

    pub fn apply(&mut self, event: &StreamEvent) -> String {
        match event {
            StreamEvent::ContentChunk(text) => self.apply_content(text),
            StreamEvent::SourcesUpdate(refs) => self.apply_sources(refs),
        }
    }
}

fn format_footer(refs: &[SourceRef]) -> String {
    let lines: Vec<String> = refs
        .iter()
        .map(|r| format!("{SOURCE_MARKER} {} — {}", r.domain, r.reference))
        .collect();
    format!("\n\n{FOOTER_HEADING}\n{}", lines.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(domain: &str, reference: &str) -> SourceRef {
        SourceRef {
            domain: domain.to_string(),
            reference: reference.to_string(),
        }
    }

    #[test]
    fn test_content_concatenates() {
        let mut acc = Accumulator::new();
        acc.apply_content("Hello ");
        assert_eq!(acc.apply_content("world"), "Hello world");
    }

    #[test]
    fn test_footer_format() {
        let mut acc = Accumulator::new();
        acc.apply_content("Réponse.");
        let rendered = acc.apply_sources(&[source("Famille", "Art. 49"), source("Travail", "Art. 6")]);
        assert_eq!(
            rendered,
            "Réponse.\n\n📄 **المراجع القانونية:**\n📌 Famille — Art. 49\n📌 Travail — Art. 6"
        );
    }

    #[test]
    fn test_sources_capped_at_three() {
        let mut acc = Accumulator::new();
        let refs: Vec<SourceRef> = (1..=5).map(|i| source("D", &format!("R{i}"))).collect();
        acc.apply_sources(&refs);
        assert!(acc.footer().contains("R1"));
        assert!(acc.footer().contains("R3"));
        assert!(!acc.footer().contains("R4"));
        assert_eq!(acc.footer().matches(SOURCE_MARKER).count(), MAX_SOURCES);
    }

    #[test]
    fn test_footer_stays_a_suffix() {
        let mut acc = Accumulator::new();
        acc.apply_content("A");
        acc.apply_sources(&[source("X", "Y")]);
        let rendered = acc.apply_content("B");
        assert_eq!(acc.body(), "AB");
        assert!(rendered.starts_with("AB\n\n"));
        assert!(rendered.ends_with("📌 X — Y"));
        assert_eq!(rendered.matches(FOOTER_HEADING).count(), 1);
    }

    #[test]
    fn test_later_sources_replace_footer() {
        let mut acc = Accumulator::new();
        acc.apply_sources(&[source("Old", "1")]);
        acc.apply_sources(&[source("New", "2")]);
        assert!(!acc.footer().contains("Old"));
        assert!(acc.footer().contains("New — 2"));
    }

    #[test]
    fn test_empty_sources_never_clear_footer() {
        let mut acc = Accumulator::new();
        acc.apply_content("body");
        let with_footer = acc.apply_sources(&[source("X", "Y")]);
        for _ in 0..3 {
            assert_eq!(acc.apply_sources(&[]), with_footer);
        }
    }

    #[test]
    fn test_footer_before_any_content() {
        let mut acc = Accumulator::new();
        let rendered = acc.apply(&StreamEvent::SourcesUpdate(vec![source("X", "Y")]));
        assert!(rendered.starts_with("\n\n📄"));
        let rendered = acc.apply(&StreamEvent::ContentChunk("Answer".to_string()));
        assert!(rendered.starts_with("Answer\n\n📄"));
    }
}
