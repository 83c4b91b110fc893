//! Suffix array over the case-folded corpus.
//!
//! The index stores every suffix start of the corpus bytes, sorted
//! lexicographically after ASCII lowercasing. All occurrences of a literal
//! pattern then form one contiguous range of the array, found with two
//! binary searches.
//!
//! Non-ASCII bytes are left as-is by the fold, so byte offsets in the index
//! are byte offsets in the original corpus.
//!
//! # Construction
//!
//! Prefix doubling with counting sorts: suffixes are ordered by the rank
//! pair of their first `k` and next `k` bytes, doubling `k` until every rank
//! is distinct. Each round is two stable `O(n)` bucket passes (second key,
//! then first key), so the build is `O(n log L)` where `L` is the longest
//! repeated substring.

/// Immutable suffix array over ASCII-lowercased corpus bytes.
#[derive(Debug)]
pub struct SuffixIndex {
    folded: Vec<u8>,
    suffixes: Vec<usize>,
}

impl SuffixIndex {
    /// Builds the index for `text`. Runs once per corpus.
    pub fn new(text: &[u8]) -> Self {
        let folded = text.to_ascii_lowercase();
        let suffixes = build_suffix_array(&folded);
        Self { folded, suffixes }
    }

    /// Number of indexed bytes.
    pub fn len(&self) -> usize {
        self.folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }

    /// Returns the unordered start offsets of every (possibly overlapping)
    /// occurrence of `pattern`, compared ASCII case-insensitively.
    pub fn lookup(&self, pattern: &[u8]) -> &[usize] {
        if pattern.is_empty() {
            return &[];
        }
        let pattern = pattern.to_ascii_lowercase();
        let m = pattern.len();
        let prefix = |i: usize| &self.folded[i..(i + m).min(self.folded.len())];

        let lo = self
            .suffixes
            .partition_point(|&i| prefix(i) < pattern.as_slice());
        let hi = lo
            + self.suffixes[lo..].partition_point(|&i| prefix(i) == pattern.as_slice());
        &self.suffixes[lo..hi]
    }

    /// Returns the leftmost non-overlapping occurrences of `pattern` in
    /// position order, the same set a left-to-right scan would report.
    pub fn find_non_overlapping(&self, pattern: &[u8]) -> Vec<usize> {
        let mut starts = self.lookup(pattern).to_vec();
        starts.sort_unstable();

        let mut next_free = 0;
        starts.retain(|&start| {
            if start < next_free {
                return false;
            }
            next_free = start + pattern.len();
            true
        });
        starts
    }
}

fn build_suffix_array(text: &[u8]) -> Vec<usize> {
    let n = text.len();
    if n < 2 {
        return (0..n).collect();
    }

    let mut rank: Vec<usize> = text.iter().map(|&b| usize::from(b)).collect();
    let mut sa = vec![0usize; n];
    let mut by_second = vec![0usize; n];
    let mut next = vec![0usize; n];
    let mut buckets = 256;

    let identity: Vec<usize> = (0..n).collect();
    counting_sort(&identity, &rank, buckets, &mut sa);
    drop(identity);

    let mut k = 1;
    loop {
        // Suffixes with no second half sort first; the rest follow in the
        // current order of their second half.
        let mut filled = 0;
        for i in n.saturating_sub(k)..n {
            by_second[filled] = i;
            filled += 1;
        }
        for &i in &sa {
            if i >= k {
                by_second[filled] = i - k;
                filled += 1;
            }
        }
        counting_sort(&by_second, &rank, buckets, &mut sa);

        let second = |i: usize| if i + k < n { rank[i + k] + 1 } else { 0 };
        let mut classes = 1;
        next[sa[0]] = 0;
        for w in 1..n {
            let (prev, cur) = (sa[w - 1], sa[w]);
            if rank[prev] != rank[cur] || second(prev) != second(cur) {
                classes += 1;
            }
            next[cur] = classes - 1;
        }

        std::mem::swap(&mut rank, &mut next);
        if classes == n {
            break;
        }
        buckets = classes;
        k *= 2;
    }

    sa
}

/// Stable bucket sort of `order` by `keys[i]`, where every key is below
/// `buckets`.
fn counting_sort(order: &[usize], keys: &[usize], buckets: usize, out: &mut [usize]) {
    let mut starts = vec![0usize; buckets + 1];
    for &i in order {
        starts[keys[i] + 1] += 1;
    }
    for b in 1..=buckets {
        starts[b] += starts[b - 1];
    }
    for &i in order {
        let slot = &mut starts[keys[i]];
        out[*slot] = i;
        *slot += 1;
    }
}
