use std::sync::RwLock;

use regex::{Regex, RegexBuilder};

/// Bundled default word list. Stands in for a maintained external list;
/// callers can extend or shrink it at runtime via `add_words`/`remove_words`.
const DEFAULT_WORDS: &[&str] = &[
    "arse",
    "arsehole",
    "ass",
    "asshole",
    "bastard",
    "bitch",
    "bollocks",
    "bugger",
    "bullshit",
    "cock",
    "crap",
    "cunt",
    "damn",
    "dick",
    "dickhead",
    "dipshit",
    "douche",
    "douchebag",
    "dumbass",
    "fuck",
    "fucked",
    "fucker",
    "fucking",
    "goddamn",
    "horseshit",
    "jackass",
    "motherfucker",
    "piss",
    "pissed",
    "prick",
    "pussy",
    "shit",
    "shite",
    "shithead",
    "shitty",
    "slut",
    "twat",
    "wanker",
    "whore",
];

/// Options controlling matching and censoring behavior.
///
/// `custom_replacements` are (word, literal replacement) pairs applied before
/// the shared list, in the order given.
#[derive(Debug, Clone)]
pub struct CensorOptions {
    pub censor_character: char,
    pub censor_length: bool,
    pub ignore_case: bool,
    pub whole_words_only: bool,
    pub custom_replacements: Vec<(String, String)>,
}

impl Default for CensorOptions {
    fn default() -> Self {
        Self {
            censor_character: '*',
            censor_length: true,
            ignore_case: true,
            whole_words_only: true,
            custom_replacements: Vec::new(),
        }
    }
}

struct WordList {
    words: Vec<String>,
    // Combined matcher for the default options (case-insensitive, whole
    // words). Rebuilt only when the list changes; None when the list is empty.
    pattern: Option<Regex>,
}

impl WordList {
    fn rebuild(&mut self) {
        self.pattern = build_pattern(&self.words, true, true);
    }
}

/// Shared profanity filter. Constructed once at startup and handed to
/// consumers; the word list is guarded so concurrent requests can read while
/// rare add/remove calls mutate.
pub struct ProfanityFilter {
    inner: RwLock<WordList>,
}

impl Default for ProfanityFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ProfanityFilter {
    /// Filter seeded with the bundled default list.
    pub fn new() -> Self {
        Self::with_words(DEFAULT_WORDS.iter().map(|w| (*w).to_string()))
    }

    /// Filter over an arbitrary word list.
    pub fn with_words(words: impl IntoIterator<Item = String>) -> Self {
        let mut list = WordList {
            words: words.into_iter().collect(),
            pattern: None,
        };
        list.rebuild();
        Self {
            inner: RwLock::new(list),
        }
    }

    /// True if any listed word (or any custom-replacement key) matches `text`.
    pub fn is_profane(&self, text: &str, options: &CensorOptions) -> bool {
        for (word, _) in &options.custom_replacements {
            if word_pattern(word, options).is_match(text) {
                return true;
            }
        }
        match self.list_matcher(options) {
            Some(re) => re.is_match(text),
            None => false,
        }
    }

    /// Replaces matches with the mask character (custom replacements are
    /// substituted literally, before the list is applied).
    pub fn censor_text(&self, text: &str, options: &CensorOptions) -> String {
        let mut out = text.to_string();
        for (word, replacement) in &options.custom_replacements {
            let re = word_pattern(word, options);
            out = re
                .replace_all(&out, regex::NoExpand(replacement))
                .into_owned();
        }
        if let Some(re) = self.list_matcher(options) {
            out = re
                .replace_all(&out, |caps: &regex::Captures<'_>| {
                    let matched = &caps[0];
                    if options.censor_length {
                        options
                            .censor_character
                            .to_string()
                            .repeat(matched.chars().count())
                    } else {
                        options.censor_character.to_string()
                    }
                })
                .into_owned();
        }
        out
    }

    /// All matches found in `text`, deduplicated. Order is not guaranteed.
    pub fn get_profane_words(&self, text: &str, options: &CensorOptions) -> Vec<String> {
        let mut found: Vec<String> = Vec::new();
        for (word, _) in &options.custom_replacements {
            for m in word_pattern(word, options).find_iter(text) {
                if !found.iter().any(|f| f == m.as_str()) {
                    found.push(m.as_str().to_string());
                }
            }
        }
        if let Some(re) = self.list_matcher(options) {
            for m in re.find_iter(text) {
                if !found.iter().any(|f| f == m.as_str()) {
                    found.push(m.as_str().to_string());
                }
            }
        }
        found
    }

    /// Adds words to the shared list; words already present are skipped.
    pub fn add_words<I, S>(&self, words: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let mut changed = false;
        for word in words {
            let word = word.into();
            if !inner.words.contains(&word) {
                inner.words.push(word);
                changed = true;
            }
        }
        if changed {
            inner.rebuild();
        }
    }

    /// Removes words from the shared list; absent words are a no-op.
    pub fn remove_words<'a, I>(&self, words: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());
        let before = inner.words.len();
        for word in words {
            inner.words.retain(|w| w != word);
        }
        if inner.words.len() != before {
            inner.rebuild();
        }
    }

    /// Snapshot of the current word list (defensive copy).
    pub fn word_list(&self) -> Vec<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .words
            .clone()
    }

    // Returns the precompiled matcher for default options, or compiles one
    // for non-default case/boundary settings. Regex clones share the
    // compiled program, so handing out the cached one is cheap.
    fn list_matcher(&self, options: &CensorOptions) -> Option<Regex> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        if options.ignore_case && options.whole_words_only {
            inner.pattern.clone()
        } else {
            build_pattern(&inner.words, options.ignore_case, options.whole_words_only)
        }
    }
}

fn build_pattern(words: &[String], ignore_case: bool, whole_words: bool) -> Option<Regex> {
    if words.is_empty() {
        return None;
    }
    let alternation = words
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    let source = if whole_words {
        format!(r"\b(?:{alternation})\b")
    } else {
        format!("(?:{alternation})")
    };
    // Every branch is escaped, so compilation cannot fail.
    Some(
        RegexBuilder::new(&source)
            .case_insensitive(ignore_case)
            .build()
            .expect("escaped alternation compiles"),
    )
}

fn word_pattern(word: &str, options: &CensorOptions) -> Regex {
    let escaped = regex::escape(word);
    let source = if options.whole_words_only {
        format!(r"\b{escaped}\b")
    } else {
        escaped
    };
    RegexBuilder::new(&source)
        .case_insensitive(options.ignore_case)
        .build()
        .expect("escaped word compiles")
}
