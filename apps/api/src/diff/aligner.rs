//! Sequence Aligner: longest-matching-block decomposition of two sequences into opcodes.
//!
//! Algorithm:
//! 1. Find the longest contiguous run of elements common to both (sub)sequences.
//!    Ties go to the earliest start in the original, then the earliest start in the revised.
//! 2. Queue the unmatched prefix pair and suffix pair and repeat until no range yields a match.
//! 3. Sort the collected matching blocks, merge adjacent ones, and walk the gaps between them
//!    to emit `replace` / `delete` / `insert` opcodes around each `equal` block.
//!
//! The decomposition uses an explicit work stack, so adversarially large inputs cannot
//! exhaust the call stack. `align` searches through a position index of the revised side,
//! costing time proportional to the equal pairs in a range; `align_by` falls back to a
//! full dynamic-programming scan per range.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Kind of edit described by an [`Opcode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpTag {
    Equal,
    Replace,
    Delete,
    Insert,
}

/// One contiguous region of agreement or difference.
/// Ranges are half-open indices into the original and revised sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Opcode {
    pub tag: OpTag,
    pub original_start: usize,
    pub original_end: usize,
    pub revised_start: usize,
    pub revised_end: usize,
}

impl Opcode {
    fn new(tag: OpTag, original: Range<usize>, revised: Range<usize>) -> Self {
        Self {
            tag,
            original_start: original.start,
            original_end: original.end,
            revised_start: revised.start,
            revised_end: revised.end,
        }
    }

    pub fn original_range(&self) -> Range<usize> {
        self.original_start..self.original_end
    }

    pub fn revised_range(&self) -> Range<usize> {
        self.revised_start..self.revised_end
    }
}

/// Result of aligning two sequences. Computed per request, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiffSummary {
    /// `2 * matched / (len(original) + len(revised))`, or 1.0 when both are empty.
    pub similarity_ratio: f64,
    pub opcodes: Vec<Opcode>,
}

impl DiffSummary {
    pub fn has_differences(&self) -> bool {
        self.opcodes.iter().any(|op| op.tag != OpTag::Equal)
    }
}

/// A matched run: `original[a..a + len] == revised[b..b + len]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Block {
    a: usize,
    b: usize,
    len: usize,
}

/// Aligns two sequences using element equality.
///
/// Revised positions are indexed by element once per call, so each match search only
/// visits pairs of equal elements instead of the whole range rectangle.
pub fn align<T: Eq + Hash>(original: &[T], revised: &[T]) -> DiffSummary {
    let index = PositionIndex::new(revised);
    summarize(original.len(), revised.len(), |a_range, b_range| {
        index.longest_match(original, a_range, b_range)
    })
}

/// Aligns two sequences using a caller-supplied equality predicate.
///
/// An arbitrary predicate cannot be indexed, so match search scans the full range.
pub fn align_by<T, F>(original: &[T], revised: &[T], eq: F) -> DiffSummary
where
    F: Fn(&T, &T) -> bool,
{
    summarize(original.len(), revised.len(), |a_range, b_range| {
        longest_match_by(original, revised, a_range, b_range, &eq)
    })
}

fn summarize<F>(original_len: usize, revised_len: usize, find: F) -> DiffSummary
where
    F: FnMut(Range<usize>, Range<usize>) -> Block,
{
    let blocks = matching_blocks(original_len, revised_len, find);
    let matched: usize = blocks.iter().map(|b| b.len).sum();
    let total = original_len + revised_len;

    let similarity_ratio = if total == 0 {
        1.0
    } else {
        (2 * matched) as f64 / total as f64
    };

    DiffSummary {
        similarity_ratio,
        opcodes: opcodes_from_blocks(&blocks, original_len, revised_len),
    }
}

/// Collects every matching block, sorted by position, with adjacent blocks merged.
fn matching_blocks<F>(original_len: usize, revised_len: usize, mut find: F) -> Vec<Block>
where
    F: FnMut(Range<usize>, Range<usize>) -> Block,
{
    let mut stack = vec![(0, original_len, 0, revised_len)];
    let mut found = Vec::new();

    while let Some((alo, ahi, blo, bhi)) = stack.pop() {
        let block = find(alo..ahi, blo..bhi);
        if block.len == 0 {
            continue;
        }
        found.push(block);
        if alo < block.a && blo < block.b {
            stack.push((alo, block.a, blo, block.b));
        }
        let (a_end, b_end) = (block.a + block.len, block.b + block.len);
        if a_end < ahi && b_end < bhi {
            stack.push((a_end, ahi, b_end, bhi));
        }
    }

    found.sort_by_key(|b| (b.a, b.b));

    let mut merged: Vec<Block> = Vec::with_capacity(found.len());
    for block in found {
        match merged.last_mut() {
            Some(last) if last.a + last.len == block.a && last.b + last.len == block.b => {
                last.len += block.len;
            }
            _ => merged.push(block),
        }
    }
    merged
}

/// Ascending positions of every distinct element of the revised sequence.
struct PositionIndex<'a, T> {
    positions: HashMap<&'a T, Vec<usize>>,
}

impl<'a, T: Eq + Hash> PositionIndex<'a, T> {
    fn new(revised: &'a [T]) -> Self {
        let mut positions: HashMap<&'a T, Vec<usize>> = HashMap::new();
        for (j, item) in revised.iter().enumerate() {
            positions.entry(item).or_default().push(j);
        }
        Self { positions }
    }

    /// Longest common contiguous run inside `original[a_range]` x `revised[b_range]`.
    ///
    /// Only runs ending at equal pairs are tracked: `runs[j]` is the length of the run
    /// ending at `(i - 1, j)`. Rows and columns are visited in ascending order and only a
    /// strictly longer run replaces the best, giving the same tie-break as `longest_match_by`.
    fn longest_match(&self, original: &[T], a_range: Range<usize>, b_range: Range<usize>) -> Block {
        let mut best = Block {
            a: a_range.start,
            b: b_range.start,
            len: 0,
        };
        let mut runs: HashMap<usize, usize> = HashMap::new();
        let mut next_runs: HashMap<usize, usize> = HashMap::new();

        for i in a_range {
            next_runs.clear();
            if let Some(positions) = self.positions.get(&original[i]) {
                let first = positions.partition_point(|&j| j < b_range.start);
                for &j in positions[first..].iter().take_while(|&&j| j < b_range.end) {
                    let previous = j
                        .checked_sub(1)
                        .and_then(|k| runs.get(&k))
                        .copied()
                        .unwrap_or(0);
                    let run = previous + 1;
                    next_runs.insert(j, run);
                    if run > best.len {
                        best = Block {
                            a: i + 1 - run,
                            b: j + 1 - run,
                            len: run,
                        };
                    }
                }
            }
            std::mem::swap(&mut runs, &mut next_runs);
        }

        best
    }
}

/// Longest common contiguous run inside `original[a_range]` x `revised[b_range]`.
///
/// Rows are scanned in original order and columns in revised order, and only a strictly
/// longer run replaces the current best, so among equal-length runs the one starting
/// earliest in the original (then earliest in the revised) wins.
fn longest_match_by<T, F>(
    original: &[T],
    revised: &[T],
    a_range: Range<usize>,
    b_range: Range<usize>,
    eq: &F,
) -> Block
where
    F: Fn(&T, &T) -> bool,
{
    let width = b_range.len();
    // run lengths ending at (i - 1, j - 1) and (i, j); column 0 is a permanent zero sentinel
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];
    let mut best = Block {
        a: a_range.start,
        b: b_range.start,
        len: 0,
    };

    for i in a_range {
        for (col, j) in b_range.clone().enumerate() {
            let run = if eq(&original[i], &revised[j]) {
                prev[col] + 1
            } else {
                0
            };
            curr[col + 1] = run;
            if run > best.len {
                best = Block {
                    a: i + 1 - run,
                    b: j + 1 - run,
                    len: run,
                };
            }
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    best
}

fn opcodes_from_blocks(blocks: &[Block], original_len: usize, revised_len: usize) -> Vec<Opcode> {
    let sentinel = Block {
        a: original_len,
        b: revised_len,
        len: 0,
    };

    let mut opcodes = Vec::with_capacity(blocks.len() * 2 + 1);
    let (mut i, mut j) = (0, 0);

    for block in blocks.iter().chain(std::iter::once(&sentinel)) {
        let tag = match (i < block.a, j < block.b) {
            (true, true) => Some(OpTag::Replace),
            (true, false) => Some(OpTag::Delete),
            (false, true) => Some(OpTag::Insert),
            (false, false) => None,
        };
        if let Some(tag) = tag {
            opcodes.push(Opcode::new(tag, i..block.a, j..block.b));
        }

        i = block.a + block.len;
        j = block.b + block.len;
        if block.len > 0 {
            opcodes.push(Opcode::new(OpTag::Equal, block.a..i, block.b..j));
        }
    }

    opcodes
}
