//! Character-level shortest edit script (Myers' greedy diagonal search)
//! and the similarity scores derived from it.
//!
//! The edit script drives both candidate acceptance (via `MatchScore`) and
//! match highlighting in the host's panel (via the `EditOp` runs). Cost is
//! quadratic in the worst case, so callers bound input length before
//! invoking `diff` — the engine rejects query bodies and corpus keys longer
//! than `EngineConfig::max_token_len`.

use serde::Serialize;

/// One kind of edit-script run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EditKind {
    /// Present in the source string only.
    Delete,
    /// Present in both strings.
    Match,
    /// Present in the target string only.
    Insert,
}

/// A maximal run of same-kind edits. Concatenating the Delete+Match runs of
/// a script reproduces the source string; Match+Insert reproduces the target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EditOp {
    pub kind: EditKind,
    pub text: String,
}

/// Counts summed from an edit script, plus the derived similarity.
/// `similarity = matched / max(len(a), len(b))`, defined as 1 when both
/// strings are empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MatchScore {
    pub matched: usize,
    pub inserted: usize,
    pub deleted: usize,
    pub similarity: f64,
}

/// Compute the minimal edit script from `a` to `b`.
///
/// Ties follow the algorithm's standard deterministic rule: diagonal (match)
/// moves are taken greedily, and insertion is preferred over deletion when
/// two paths have equal cost.
pub fn diff(a: &str, b: &str) -> Vec<EditOp> {
    let a_chars: Vec<char> = a.chars().collect();
    let b_chars: Vec<char> = b.chars().collect();
    let n = a_chars.len();
    let m = b_chars.len();
    let max = n + m;
    if max == 0 {
        return Vec::new();
    }

    let off = max as isize;
    let mut v = vec![0usize; 2 * max + 1];
    let mut trace: Vec<Vec<usize>> = Vec::with_capacity(max + 1);

    for d in 0..=max {
        trace.push(v.clone());

        let d = d as isize;
        let mut k = -d;
        while k <= d {
            let down = k == -d || (k != d && v[(k - 1 + off) as usize] < v[(k + 1 + off) as usize]);
            let mut x = if down {
                v[(k + 1 + off) as usize]
            } else {
                v[(k - 1 + off) as usize] + 1
            };
            let mut y = (x as isize - k) as usize;

            while x < n && y < m && a_chars[x] == b_chars[y] {
                x += 1;
                y += 1;
            }

            v[(k + off) as usize] = x;

            if x >= n && y >= m {
                return backtrack(&a_chars, &b_chars, &trace, d as usize);
            }

            k += 2;
        }
    }

    // Unreachable: the search always terminates within n + m steps.
    Vec::new()
}

/// Walk the trace backwards from the end point, emitting single-char steps,
/// then coalesce adjacent same-kind steps into runs.
fn backtrack(a: &[char], b: &[char], trace: &[Vec<usize>], d: usize) -> Vec<EditOp> {
    let off = (a.len() + b.len()) as isize;
    let mut x = a.len();
    let mut y = b.len();
    let mut steps: Vec<(EditKind, char)> = Vec::new();

    for depth in (0..=d).rev() {
        let v = &trace[depth];
        let depth = depth as isize;
        let k = x as isize - y as isize;

        let prev_k = if k == -depth || (k != depth && v[(k - 1 + off) as usize] < v[(k + 1 + off) as usize]) {
            k + 1
        } else {
            k - 1
        };
        let prev_x = v[(prev_k + off) as usize] as isize;
        let prev_y = prev_x - prev_k;

        // diagonal moves (matches)
        while x as isize > prev_x && y as isize > prev_y {
            x -= 1;
            y -= 1;
            steps.push((EditKind::Match, a[x]));
        }

        if depth == 0 {
            break;
        }

        if x as isize == prev_x {
            // vertical move (insertion)
            y -= 1;
            steps.push((EditKind::Insert, b[y]));
        } else {
            // horizontal move (deletion)
            x -= 1;
            steps.push((EditKind::Delete, a[x]));
        }
    }

    let mut ops: Vec<EditOp> = Vec::new();
    for (kind, ch) in steps.into_iter().rev() {
        match ops.last_mut() {
            Some(op) if op.kind == kind => op.text.push(ch),
            _ => ops.push(EditOp { kind, text: ch.to_string() }),
        }
    }
    ops
}

/// Sum run lengths by kind from an edit script. `longest` is
/// `max(len(a), len(b))` in chars, the similarity denominator.
pub fn score_from_ops(ops: &[EditOp], longest: usize) -> MatchScore {
    let mut matched = 0;
    let mut inserted = 0;
    let mut deleted = 0;

    for op in ops {
        let len = op.text.chars().count();
        match op.kind {
            EditKind::Match => matched += len,
            EditKind::Insert => inserted += len,
            EditKind::Delete => deleted += len,
        }
    }

    let similarity = if longest == 0 { 1.0 } else { matched as f64 / longest as f64 };
    MatchScore { matched, inserted, deleted, similarity }
}

/// Diff two strings and derive the score in one call.
pub fn score(a: &str, b: &str) -> MatchScore {
    let longest = a.chars().count().max(b.chars().count());
    score_from_ops(&diff(a, b), longest)
}
