//! Character-level diffs between expected and actual text.
//!
//! This is Myers' O(ND) algorithm over `char`s.  Fixture outputs are small and almost always identical or nearly so,
//! which is the case the algorithm is fast in.  Only the diagonals touched by each step are kept for the backtrack, so
//! memory is O(D^2) rather than O(D * (N + M)), and D is capped so that a golden file which has nothing to do with
//! the actual output can't exhaust it.
use crate::style::{paint, Color};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, derive_more::IsVariant)]
pub enum SegmentKind {
    Unchanged,
    /// Present in the actual text only.
    Added,
    /// Present in the expected text only.
    Removed,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DiffSegment {
    pub text: String,
    pub kind: SegmentKind,
}

/// An ordered list of segments.  Adjacent segments never share a kind.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DiffReport {
    pub segments: Vec<DiffSegment>,
}

impl DiffReport {
    /// True iff there is nothing added and nothing removed.
    pub fn is_identical(&self) -> bool {
        self.segments.iter().all(|s| s.kind.is_unchanged())
    }

    #[cfg(test)]
    fn collect_excluding(&self, excluded: SegmentKind) -> String {
        self.segments
            .iter()
            .filter(|s| s.kind != excluded)
            .map(|s| s.text.as_str())
            .collect()
    }

    /// Rebuild the expected text from the unchanged and removed segments.
    #[cfg(test)]
    pub fn expected(&self) -> String {
        self.collect_excluding(SegmentKind::Added)
    }

    /// Rebuild the actual text from the unchanged and added segments.
    #[cfg(test)]
    pub fn actual(&self) -> String {
        self.collect_excluding(SegmentKind::Removed)
    }

    pub fn changed_segments(&self) -> usize {
        self.segments.iter().filter(|s| !s.kind.is_unchanged()).count()
    }

    /// Render for a terminal: additions green, removals red, everything else as is.
    pub fn render(&self, color: bool) -> String {
        let mut out = String::new();
        for seg in self.segments.iter() {
            match seg.kind {
                SegmentKind::Unchanged => out.push_str(&seg.text),
                SegmentKind::Added => out.push_str(&paint(color, Color::Green, &seg.text)),
                SegmentKind::Removed => out.push_str(&paint(color, Color::Red, &seg.text)),
            }
        }
        out
    }

    fn extend(&mut self, kind: SegmentKind, chars: &[char]) {
        for &ch in chars {
            self.push(kind, ch);
        }
    }

    fn push(&mut self, kind: SegmentKind, ch: char) {
        if let Some(last) = self.segments.last_mut() {
            if last.kind == kind {
                last.text.push(ch);
                return;
            }
        }

        self.segments.push(DiffSegment {
            text: ch.to_string(),
            kind,
        });
    }
}

/// The most edits the search looks for before giving up on a fine-grained diff.
///
/// The backtrack keeps every step's diagonals, so this bounds memory to roughly its square.
const MAX_EDIT_DISTANCE: isize = 1000;

/// Diff `expected` against `actual`.
///
/// The common prefix and suffix are stripped first.  If what is left needs more than [MAX_EDIT_DISTANCE] edits, it is
/// reported as one removal followed by one addition.
pub fn diff_chars(expected: &str, actual: &str) -> DiffReport {
    let a = expected.chars().collect::<Vec<_>>();
    let b = actual.chars().collect::<Vec<_>>();

    let prefix = a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (mid_a, mid_b) = (&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);

    let mut report = DiffReport::default();
    report.extend(SegmentKind::Unchanged, &a[..prefix]);
    match myers(mid_a, mid_b) {
        Some(edits) => {
            for (kind, ch) in edits {
                report.push(kind, ch);
            }
        }
        None => {
            log::debug!(
                "Texts differ by more than {MAX_EDIT_DISTANCE} edits; diffing them coarsely"
            );
            report.extend(SegmentKind::Removed, mid_a);
            report.extend(SegmentKind::Added, mid_b);
        }
    }
    report.extend(SegmentKind::Unchanged, &a[a.len() - suffix..]);
    report
}

/// The shortest edit script from `a` to `b`, in order, or `None` if it is longer than [MAX_EDIT_DISTANCE].
fn myers(a: &[char], b: &[char]) -> Option<Vec<(SegmentKind, char)>> {
    let n = a.len() as isize;
    let m = b.len() as isize;
    let max = n + m;

    // v[k + max] is the furthest x reached on diagonal k.  One extra slot on the right covers k + 1 at k = max.
    let mut v = vec![0isize; (2 * max + 2) as usize];
    let idx = |k: isize| (k + max) as usize;

    // history[d] holds v over -d..=d as it stood at the end of step d.
    let mut history: Vec<Vec<isize>> = vec![];
    let mut final_d = None;

    'search: for d in 0..=max.min(MAX_EDIT_DISTANCE) {
        for k in (-d..=d).step_by(2) {
            let down = k == -d || (k != d && v[idx(k - 1)] < v[idx(k + 1)]);
            let mut x = if down {
                v[idx(k + 1)]
            } else {
                v[idx(k - 1)] + 1
            };
            let mut y = x - k;
            while x < n && y < m && a[x as usize] == b[y as usize] {
                x += 1;
                y += 1;
            }
            v[idx(k)] = x;

            if x >= n && y >= m {
                final_d = Some(d);
                break 'search;
            }
        }
        history.push(v[idx(-d)..=idx(d)].to_vec());
    }
    let final_d = final_d?;

    let mut edits = Vec::with_capacity((n.max(m)) as usize);
    let (mut x, mut y) = (n, m);

    for d in (1..=final_d).rev() {
        let prev = &history[(d - 1) as usize];
        let get = |k: isize| prev[(k + d - 1) as usize];

        let k = x - y;
        let down = k == -d || (k != d && get(k - 1) < get(k + 1));
        let prev_k = if down { k + 1 } else { k - 1 };
        let prev_x = get(prev_k);
        let prev_y = prev_x - prev_k;

        let (mid_x, mid_y) = if down {
            (prev_x, prev_y + 1)
        } else {
            (prev_x + 1, prev_y)
        };

        while x > mid_x && y > mid_y {
            edits.push((SegmentKind::Unchanged, a[(x - 1) as usize]));
            x -= 1;
            y -= 1;
        }

        if down {
            edits.push((SegmentKind::Added, b[(mid_y - 1) as usize]));
        } else {
            edits.push((SegmentKind::Removed, a[(mid_x - 1) as usize]));
        }

        x = prev_x;
        y = prev_y;
    }

    while x > 0 && y > 0 {
        edits.push((SegmentKind::Unchanged, a[(x - 1) as usize]));
        x -= 1;
        y -= 1;
    }

    edits.reverse();
    Some(edits)
}
