//! Lexical code metrics for C sources.
//!
//! Everything here is line and brace scanning; there is no parser. The
//! block tracker treats every top-level brace block as a function body,
//! which also catches initializer blocks such as `struct file_operations`.
//! Braces inside string literals or comments are counted like any other
//! brace. That is a known limitation of the heuristic, not a bug to fix here.

use crate::models::StyleMetrics;
use crate::source::SourceText;
use regex::Regex;
use std::sync::OnceLock;

/// Lines longer than this many characters count as long.
pub const MAX_LINE_LENGTH: usize = 80;

static FUNCTION_SIGNATURE: OnceLock<Regex> = OnceLock::new();

/// `type [*]name(args) {` on a single line.
fn function_signature() -> &'static Regex {
    FUNCTION_SIGNATURE.get_or_init(|| {
        Regex::new(r"^\s*\w[\w\s\*]+\([^)]*\)\s*\{").expect("valid regex")
    })
}

/// Brace tracker state. Depth is zero whenever the tracker is outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockState {
    Outside,
    InsideFunction { depth: usize, length: usize },
}

/// Small state machine behind function lengths and nesting depth.
#[derive(Debug, Clone)]
pub struct BlockTracker {
    state: BlockState,
    max_depth: usize,
    lengths: Vec<usize>,
}

impl Default for BlockTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl BlockTracker {
    pub fn new() -> Self {
        BlockTracker {
            state: BlockState::Outside,
            max_depth: 0,
            lengths: Vec::new(),
        }
    }

    pub fn state(&self) -> BlockState {
        self.state
    }

    pub fn depth(&self) -> usize {
        match self.state {
            BlockState::Outside => 0,
            BlockState::InsideFunction { depth, .. } => depth,
        }
    }

    /// Feed one line.
    ///
    /// A line holding both `{` and `}` opens first and closes second, so it
    /// can both start and flush a one-line function.
    pub fn feed(&mut self, line: &str) {
        let opens = line.contains('{');
        let closes = line.contains('}');

        if opens {
            self.state = match self.state {
                BlockState::Outside => BlockState::InsideFunction {
                    depth: 1,
                    length: 1,
                },
                BlockState::InsideFunction { depth, length } => BlockState::InsideFunction {
                    depth: depth + 1,
                    length: length + 1,
                },
            };
            self.max_depth = self.max_depth.max(self.depth());
        }

        if closes {
            // a stray `}` at top level is ignored
            if let BlockState::InsideFunction { depth, length } = self.state {
                let length = if opens { length } else { length + 1 };
                self.state = if depth == 1 {
                    self.lengths.push(length);
                    BlockState::Outside
                } else {
                    BlockState::InsideFunction {
                        depth: depth - 1,
                        length,
                    }
                };
            }
        }

        if !opens && !closes {
            if let BlockState::InsideFunction { depth, length } = self.state {
                self.state = BlockState::InsideFunction {
                    depth,
                    length: length + 1,
                };
            }
        }
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Lengths of completed functions. An unclosed trailing block is dropped.
    pub fn into_lengths(self) -> Vec<usize> {
        self.lengths
    }
}

fn is_comment_line(line: &str) -> bool {
    let t = line.trim();
    t.starts_with("//") || t.starts_with("/*")
}

/// Arithmetic mean, or 0 for an empty list.
pub fn mean_length(lengths: &[usize]) -> f64 {
    if lengths.is_empty() {
        return 0.0;
    }
    lengths.iter().sum::<usize>() as f64 / lengths.len() as f64
}

/// Derive structural metrics from source text. Never fails.
pub fn extract_metrics(source: &SourceText) -> StyleMetrics {
    let text = source.as_str();
    let has_comments = text.contains("//") || text.contains("/*");

    let mut long_line_count = 0usize;
    let mut doc_comment_count = 0usize;
    let mut tracker = BlockTracker::new();
    let mut prev: Option<&str> = None;

    for line in source.lines() {
        if line.chars().count() > MAX_LINE_LENGTH {
            long_line_count += 1;
        }
        if function_signature().is_match(line) && prev.map(is_comment_line).unwrap_or(false) {
            doc_comment_count += 1;
        }
        tracker.feed(line);
        prev = Some(line);
    }

    let max_nesting_depth = tracker.max_depth();
    let function_lengths = tracker.into_lengths();
    StyleMetrics {
        long_line_count,
        has_comments,
        doc_comment_count,
        avg_function_length: mean_length(&function_lengths),
        max_nesting_depth,
        function_lengths,
    }
}
