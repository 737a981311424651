// ABOUTME: Recursive character splitter for knowledge documents.
// ABOUTME: Prefers paragraph and line boundaries, packs chunks with a fixed overlap.

/// Maximum characters per chunk (prevents overly large chunks)
pub const CHUNK_SIZE: usize = 1000;

/// Characters shared between adjacent chunks
pub const CHUNK_OVERLAP: usize = 200;

/// Boundary cascade, coarsest first. The empty string means a hard cut.
const SEPARATORS: &[&str] = &["\n\n", "\n", " ", ""];

/// Splits document text into overlapping chunks on natural boundaries.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for TextSplitter {
    fn default() -> Self {
        Self::new(CHUNK_SIZE, CHUNK_OVERLAP)
    }
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Split `text` into chunks of at most `chunk_size` characters.
    ///
    /// Boundaries come from the separator cascade, coarsest first, and
    /// adjacent chunks share up to `chunk_overlap` trailing characters.
    /// Whitespace-only fragments are dropped.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.split_with(text, SEPARATORS)
    }

    fn split_with(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let (separator, remaining) = pick_separator(text, separators);

        let parts: Vec<String> = if separator.is_empty() {
            text.chars().map(|c| c.to_string()).collect()
        } else {
            text.split(separator).map(|s| s.to_string()).collect()
        };

        let mut chunks = Vec::new();
        let mut good: Vec<String> = Vec::new();

        for part in parts {
            if char_len(&part) <= self.chunk_size {
                good.push(part);
            } else {
                // Flush what fits at this level, then descend for the
                // oversized part.
                if !good.is_empty() {
                    chunks.extend(self.merge(&good, separator));
                    good.clear();
                }
                if remaining.is_empty() {
                    chunks.push(part);
                } else {
                    chunks.extend(self.split_with(&part, remaining));
                }
            }
        }
        if !good.is_empty() {
            chunks.extend(self.merge(&good, separator));
        }

        chunks
    }

    /// Greedily pack parts into chunks up to `chunk_size`, re-joining them
    /// with the separator they were split on. When a chunk closes, its tail
    /// parts stay in the window until at most `chunk_overlap` characters
    /// remain, and the next chunk starts from them.
    fn merge(&self, parts: &[String], separator: &str) -> Vec<String> {
        let sep_len = char_len(separator);
        let mut chunks: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for part in parts {
            let part_len = char_len(part);
            let extra = if current.is_empty() { 0 } else { sep_len };

            if total + part_len + extra > self.chunk_size && !current.is_empty() {
                if let Some(chunk) = join_trimmed(&current, separator) {
                    chunks.push(chunk);
                }
                while !current.is_empty()
                    && (total > self.chunk_overlap
                        || total + part_len + sep_len > self.chunk_size)
                {
                    total -= char_len(current[0]) + if current.len() > 1 { sep_len } else { 0 };
                    current.remove(0);
                }
            }

            current.push(part);
            total += part_len + if current.len() > 1 { sep_len } else { 0 };
        }

        if let Some(chunk) = join_trimmed(&current, separator) {
            chunks.push(chunk);
        }

        chunks
    }
}

/// Pick the coarsest separator that occurs in the text. The final empty
/// separator always matches, so the cascade never runs dry.
fn pick_separator<'a>(text: &str, separators: &'a [&'a str]) -> (&'a str, &'a [&'a str]) {
    for (i, sep) in separators.iter().enumerate() {
        if sep.is_empty() || text.contains(sep) {
            return (sep, &separators[i + 1..]);
        }
    }
    ("", &[])
}

fn join_trimmed(parts: &[&str], separator: &str) -> Option<String> {
    let joined = parts.join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
