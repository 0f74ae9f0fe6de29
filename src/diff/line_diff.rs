//! Line-level diffing.
//!
//! Classic LCS over lines: the DP table is computed once and walked to
//! emit an edit script. Quadratic in line count, which is fine for page
//! sized documents (the converter caps input size well before this
//! becomes a problem).

/// How one line of the edit script relates the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditKind {
    Equal,
    Added,
    Removed,
}

/// One line of the edit script. `old_line`/`new_line` are 1-based; for an
/// added line `old_line` is the position it would occupy on the old side,
/// and vice versa.
#[derive(Debug, Clone)]
pub struct Edit<'a> {
    pub kind: EditKind,
    pub old_line: usize,
    pub new_line: usize,
    pub text: &'a str,
}

/// Full edit script between two texts, split on lines.
#[must_use]
pub fn diff_lines<'a>(old: &'a str, new: &'a str) -> Vec<Edit<'a>> {
    let old_lines: Vec<&str> = old.lines().collect();
    let new_lines: Vec<&str> = new.lines().collect();
    let n = old_lines.len();
    let m = new_lines.len();

    // table[i][j] = LCS length of old[i..] and new[j..]
    let width = m + 1;
    let mut table = vec![0u32; (n + 1) * width];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i * width + j] = if old_lines[i] == new_lines[j] {
                table[(i + 1) * width + (j + 1)] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + (j + 1)])
            };
        }
    }

    let mut edits = Vec::new();
    let (mut i, mut j) = (0usize, 0usize);
    while i < n && j < m {
        if old_lines[i] == new_lines[j] {
            edits.push(Edit {
                kind: EditKind::Equal,
                old_line: i + 1,
                new_line: j + 1,
                text: old_lines[i],
            });
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + (j + 1)] {
            edits.push(Edit {
                kind: EditKind::Removed,
                old_line: i + 1,
                new_line: j + 1,
                text: old_lines[i],
            });
            i += 1;
        } else {
            edits.push(Edit {
                kind: EditKind::Added,
                old_line: i + 1,
                new_line: j + 1,
                text: new_lines[j],
            });
            j += 1;
        }
    }
    while i < n {
        edits.push(Edit {
            kind: EditKind::Removed,
            old_line: i + 1,
            new_line: m + 1,
            text: old_lines[i],
        });
        i += 1;
    }
    while j < m {
        edits.push(Edit {
            kind: EditKind::Added,
            old_line: n + 1,
            new_line: j + 1,
            text: new_lines[j],
        });
        j += 1;
    }

    edits
}
