// src/resolve/pattern.rs

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobMatcher};

use crate::errors::{AssetpipeError, Result};
use crate::paths::{common_ancestor, normalize_path, to_slash};

/// Prefix that turns an include pattern into an exclusion.
pub const NEGATION_MARKER: char = '!';

const GLOB_META: &[char] = &['*', '?', '[', ']', '{', '}'];

/// One compiled include or exclude pattern.
///
/// The pattern is anchored at an absolute, normalised *base*: the longest
/// leading run of segments without glob syntax. `lib/**/*.js` under
/// `/proj` has base `/proj/lib`; the walker never needs to look outside it.
#[derive(Clone)]
pub struct Pattern {
    raw: String,
    negated: bool,
    base: PathBuf,
    literal: bool,
    matcher: GlobMatcher,
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pattern")
            .field("raw", &self.raw)
            .field("base", &self.base)
            .finish_non_exhaustive()
    }
}

impl Pattern {
    /// Compile `raw` relative to `root`.
    ///
    /// `*` and `?` never cross a `/`; `**` spans any number of directories,
    /// including none.
    pub fn parse(raw: &str, root: &Path) -> Result<Self> {
        let (negated, body) = match raw.strip_prefix(NEGATION_MARKER) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        if body.trim().is_empty() {
            return Err(AssetpipeError::pattern(raw, "empty pattern"));
        }

        let mut literal_segments: Vec<&str> = Vec::new();
        let mut glob_segments: Vec<&str> = Vec::new();
        for segment in body.split('/') {
            if glob_segments.is_empty() && !segment.contains(GLOB_META) {
                literal_segments.push(segment);
            } else {
                glob_segments.push(segment);
            }
        }

        let literal = literal_segments.join("/");
        let anchored = if literal.is_empty() && body.starts_with('/') {
            PathBuf::from("/")
        } else {
            root.join(&literal)
        };
        let base = normalize_path(&anchored);

        let escaped_base = globset::escape(&to_slash(&base));
        let glob = if glob_segments.is_empty() {
            escaped_base
        } else {
            format!(
                "{}/{}",
                escaped_base.trim_end_matches('/'),
                glob_segments.join("/")
            )
        };

        let matcher = GlobBuilder::new(&glob)
            .literal_separator(true)
            .build()
            .map_err(|e| AssetpipeError::pattern(raw, e.kind().to_string()))?
            .compile_matcher();

        Ok(Self {
            raw: raw.to_string(),
            negated,
            base,
            literal: glob_segments.is_empty(),
            matcher,
        })
    }

    /// The pattern exactly as configured, marker included.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    /// Absolute directory (or file, for literal patterns) the pattern is
    /// anchored at.
    pub fn base(&self) -> &Path {
        &self.base
    }

    /// True if the pattern contains no glob syntax at all.
    pub fn is_literal(&self) -> bool {
        self.literal
    }

    /// Whether `path` (absolute, normalised) is selected by this pattern.
    ///
    /// A pattern that matches a directory selects everything beneath it, so
    /// the path itself and each of its ancestors down to the base are tried.
    pub fn matches_path(&self, path: &Path) -> bool {
        path.ancestors()
            .take_while(|ancestor| ancestor.starts_with(&self.base))
            .any(|ancestor| self.matcher.is_match(to_slash(ancestor)))
    }
}

/// An ordered list of compiled patterns sharing one working root.
#[derive(Debug, Clone)]
pub struct PatternList {
    root: PathBuf,
    patterns: Vec<Pattern>,
}

impl PatternList {
    /// Compile every pattern up front so that a malformed entry fails the
    /// whole list before any directory is walked.
    pub fn compile(root: &Path, patterns: &[String]) -> Result<Self> {
        let root = normalize_path(root);
        let patterns = patterns
            .iter()
            .map(|raw| Pattern::parse(raw, &root))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { root, patterns })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pattern> {
        self.patterns.iter()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Apply the ordered include/exclude rule to a single path.
    ///
    /// The path starts out excluded; each matching include selects it and
    /// each matching negation deselects it, the last match winning. This is
    /// the per-path view of [`resolve`](super::resolve) and needs no
    /// filesystem access, so it also works for deleted files.
    pub fn matches(&self, path: &Path) -> bool {
        let path = normalize_path(path);
        let mut selected = false;
        for pattern in &self.patterns {
            if pattern.is_negated() == selected && pattern.matches_path(&path) {
                selected = !pattern.is_negated();
            }
        }
        selected
    }

    /// Common source root of the include patterns.
    ///
    /// Fully literal patterns name a file (or a directory to expand), so
    /// they contribute their parent. With no include patterns the working
    /// root is returned.
    pub fn source_root(&self) -> PathBuf {
        let mut bases = self
            .patterns
            .iter()
            .filter(|p| !p.is_negated())
            .map(|p| match (p.is_literal(), p.base().parent()) {
                (true, Some(parent)) => parent.to_path_buf(),
                _ => p.base().to_path_buf(),
            });

        let Some(first) = bases.next() else {
            return self.root.clone();
        };
        bases.fold(first, |acc, base| common_ancestor(&acc, &base))
    }
}
