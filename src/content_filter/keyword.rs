//! Keyword blocklist matched against pin text

/// Terms that reject a pin when found anywhere in its title or description.
pub const DEFAULT_BLOCKED_KEYWORDS: &[&str] = &[
    "nude",
    "naked",
    "sexy",
    "hot",
    "adult",
    "porn",
    "xxx",
    "erotic",
    "18+",
    "onlyfans",
    "bikini",
    "lingerie",
    "booty",
    "ass",
    "tits",
    "boobs",
    "cleavage",
    "thong",
    "nsfw",
    "sex",
    "topless",
    "underwear",
    "braless",
    "see-through",
    "explicit",
    "fetish",
];

/// Case-insensitive substring matcher over `title + " " + description`.
///
/// Matching is plain substring search, so "hot" also rejects "hotel" and
/// "ass" rejects "class". The list errs on the side of dropping pins.
#[derive(Debug, Clone)]
pub struct KeywordFilter {
    keywords: Vec<String>,
}

impl Default for KeywordFilter {
    fn default() -> Self {
        Self::new(std::iter::empty::<String>())
    }
}

impl KeywordFilter {
    /// Default blocklist plus `extra` terms.
    pub fn new<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut keywords: Vec<String> = DEFAULT_BLOCKED_KEYWORDS
            .iter()
            .map(|k| (*k).to_string())
            .collect();
        for term in extra {
            let term = term.as_ref().trim().to_lowercase();
            if !term.is_empty() && !keywords.contains(&term) {
                keywords.push(term);
            }
        }
        Self { keywords }
    }

    /// First blocked term found in the pin text, if any.
    #[must_use]
    pub fn matched_keyword(&self, title: &str, description: &str) -> Option<&str> {
        let text = format!("{title} {description}").to_lowercase();
        self.keywords
            .iter()
            .find(|k| text.contains(k.as_str()))
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_blocked(&self, title: &str, description: &str) -> bool {
        self.matched_keyword(title, description).is_some()
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }
}
