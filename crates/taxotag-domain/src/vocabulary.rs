//! Vocabulary module - the closed set of tags a document may receive

use crate::marker::eq_ignore_case;

/// The closed, user-defined set of permissible tags
///
/// Order is preserved as configured. Duplicates are tolerated; membership
/// checks are case-insensitive and set-like.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    tags: Vec<String>,
}

impl Vocabulary {
    /// Create a vocabulary from a list of tags
    ///
    /// Entries are trimmed and blank entries dropped.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let tags = tags
            .into_iter()
            .map(|t| t.as_ref().trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self { tags }
    }

    /// Parse a vocabulary from newline-delimited text, one tag per line
    ///
    /// # Examples
    ///
    /// ```
    /// use taxotag_domain::Vocabulary;
    ///
    /// let vocabulary = Vocabulary::from_lines("#books\n\n  #music \n#wiki");
    /// assert_eq!(vocabulary.len(), 3);
    /// assert!(vocabulary.contains("#MUSIC"));
    /// ```
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines())
    }

    /// Whether the vocabulary has no tags
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// Number of configured tags (duplicates included)
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Iterate over the tags in configured order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(String::as_str)
    }

    /// Case-insensitive membership check
    pub fn contains(&self, tag: &str) -> bool {
        self.canonical(tag).is_some()
    }

    /// Look up the vocabulary's own spelling of a tag, ignoring case
    pub fn canonical(&self, tag: &str) -> Option<&str> {
        self.tags
            .iter()
            .find(|allowed| eq_ignore_case(allowed, tag))
            .map(String::as_str)
    }

    /// Render the vocabulary as a newline-delimited list
    pub fn render(&self) -> String {
        self.tags.join("\n")
    }
}

impl<S: AsRef<str>> FromIterator<S> for Vocabulary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}
