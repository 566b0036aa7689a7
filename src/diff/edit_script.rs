//! Line-level edit script between two text snapshots.
//!
//! Classic LCS line diff, with consecutive single-line edits collapsed into
//! maximal contiguous ranges. Each range is tagged with the side it belongs
//! to and numbered in that version's own 1-based line numbering.

/// Which version a changed range belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditTag {
    /// Lines present only in version B
    Added,
    /// Lines present only in version A
    Removed,
}

/// A maximal run of consecutive changed lines, inclusive on both ends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedRange {
    pub tag: EditTag,
    pub start_line: usize,
    pub end_line: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineOp {
    Keep,
    Remove,
    Insert,
}

/// Compute the collapsed edit script between two sources
pub fn edit_script(source_a: &str, source_b: &str) -> Vec<ChangedRange> {
    let lines_a: Vec<&str> = source_a.split('\n').collect();
    let lines_b: Vec<&str> = source_b.split('\n').collect();
    collapse(&line_ops(&lines_a, &lines_b))
}

/// Per-line operations turning A into B, via an LCS alignment
fn line_ops(a: &[&str], b: &[&str]) -> Vec<LineOp> {
    // Trim the common prefix and suffix before the quadratic table
    let mut prefix = 0;
    while prefix < a.len() && prefix < b.len() && a[prefix] == b[prefix] {
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < a.len() - prefix && suffix < b.len() - prefix
        && a[a.len() - 1 - suffix] == b[b.len() - 1 - suffix]
    {
        suffix += 1;
    }
    let mid_a = &a[prefix..a.len() - suffix];
    let mid_b = &b[prefix..b.len() - suffix];

    // lcs[i][j] = LCS length of mid_a[i..] and mid_b[j..]
    let n = mid_a.len();
    let m = mid_b.len();
    let mut lcs = vec![vec![0u32; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if mid_a[i] == mid_b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut ops = vec![LineOp::Keep; prefix];
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if mid_a[i] == mid_b[j] {
            ops.push(LineOp::Keep);
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            ops.push(LineOp::Remove);
            i += 1;
        } else {
            ops.push(LineOp::Insert);
            j += 1;
        }
    }
    ops.extend(std::iter::repeat(LineOp::Remove).take(n - i));
    ops.extend(std::iter::repeat(LineOp::Insert).take(m - j));
    ops.extend(std::iter::repeat(LineOp::Keep).take(suffix));
    ops
}

/// Fold per-line operations into maximal contiguous changed ranges
fn collapse(ops: &[LineOp]) -> Vec<ChangedRange> {
    let mut ranges = Vec::new();
    let mut line_a = 0usize;
    let mut line_b = 0usize;
    let mut open: Option<(EditTag, usize)> = None;

    let mut flush = |open: &mut Option<(EditTag, usize)>, line_a: usize, line_b: usize| {
        if let Some((tag, start_line)) = open.take() {
            let end_line = match tag {
                EditTag::Removed => line_a,
                EditTag::Added => line_b,
            };
            ranges.push(ChangedRange {
                tag,
                start_line,
                end_line,
            });
        }
    };

    for op in ops {
        match op {
            LineOp::Keep => {
                flush(&mut open, line_a, line_b);
                line_a += 1;
                line_b += 1;
            }
            LineOp::Remove => {
                if matches!(open, Some((EditTag::Added, _))) {
                    flush(&mut open, line_a, line_b);
                }
                line_a += 1;
                if open.is_none() {
                    open = Some((EditTag::Removed, line_a));
                }
            }
            LineOp::Insert => {
                if matches!(open, Some((EditTag::Removed, _))) {
                    flush(&mut open, line_a, line_b);
                }
                line_b += 1;
                if open.is_none() {
                    open = Some((EditTag::Added, line_b));
                }
            }
        }
    }
    flush(&mut open, line_a, line_b);
    ranges
}

#[cfg(test)]
mod tests {
    use super::*;

    fn added(start: usize, end: usize) -> ChangedRange {
        ChangedRange {
            tag: EditTag::Added,
            start_line: start,
            end_line: end,
        }
    }

    fn removed(start: usize, end: usize) -> ChangedRange {
        ChangedRange {
            tag: EditTag::Removed,
            start_line: start,
            end_line: end,
        }
    }

    #[test]
    fn identical_sources_yield_no_ranges() {
        assert!(edit_script("a\nb\nc", "a\nb\nc").is_empty());
        assert!(edit_script("", "").is_empty());
    }

    #[test]
    fn pure_insertion_is_one_added_range() {
        assert_eq!(edit_script("a\nd", "a\nb\nc\nd"), vec![added(2, 3)]);
    }

    #[test]
    fn pure_deletion_is_one_removed_range() {
        assert_eq!(edit_script("a\nb\nc\nd", "a\nd"), vec![removed(2, 3)]);
    }

    #[test]
    fn replacement_yields_removed_then_added() {
        assert_eq!(
            edit_script("a\nx\nc", "a\ny\nc"),
            vec![removed(2, 2), added(2, 2)]
        );
    }

    #[test]
    fn disjoint_edits_yield_separate_ranges() {
        // Change line 2 and append after line 4
        assert_eq!(
            edit_script("a\nx\nc\nd", "a\ny\nc\nd\ne"),
            vec![removed(2, 2), added(2, 2), added(5, 5)]
        );
    }

    #[test]
    fn leading_and_trailing_edits_are_numbered_in_their_own_version() {
        assert_eq!(edit_script("x\na\nb", "a\nb"), vec![removed(1, 1)]);
        assert_eq!(edit_script("a\nb", "a\nb\nz"), vec![added(3, 3)]);
    }
}
