//! Ratcliff/Obershelp sequence similarity.
//!
//! The ratio is `2 * M / T`, where `T` is the combined length of both inputs and `M` is the
//! number of characters covered by the recursively found longest common blocks. Two empty inputs
//! are identical.
//!
//! When the second input has at least [`AUTOJUNK_MIN_LEN`] characters, characters that make up
//! more than 1% of it are popular: a block cannot start on them, though it may extend across
//! them. Long texts sharing only common letters therefore score low.

use std::collections::HashMap;

pub const AUTOJUNK_MIN_LEN: usize = 200;

pub fn ratio(a: &str, b: &str) -> f32 {
	let a: Vec<char> = a.chars().collect();
	let b: Vec<char> = b.chars().collect();
	let total = a.len() + b.len();

	if total == 0 {
		return 1.0;
	}

	let matched = matching_chars(&a, &b);

	(2.0 * matched as f64 / total as f64) as f32
}

/// Lower-cases and trims both sides before comparing.
pub fn normalized_ratio(a: &str, b: &str) -> f32 {
	ratio(&a.trim().to_lowercase(), &b.trim().to_lowercase())
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
	let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();

	for (j, ch) in b.iter().enumerate() {
		b2j.entry(*ch).or_default().push(j);
	}

	if b.len() >= AUTOJUNK_MIN_LEN {
		let limit = b.len() / 100 + 1;

		b2j.retain(|_, positions| positions.len() <= limit);
	}

	let mut matched = 0;
	let mut pending = vec![(0, a.len(), 0, b.len())];

	while let Some((alo, ahi, blo, bhi)) = pending.pop() {
		let (i, j, size) = longest_match(a, b, &b2j, (alo, ahi), (blo, bhi));

		if size == 0 {
			continue;
		}

		matched += size;

		if alo < i && blo < j {
			pending.push((alo, i, blo, j));
		}
		if i + size < ahi && j + size < bhi {
			pending.push((i + size, ahi, j + size, bhi));
		}
	}

	matched
}

// Earliest block in `a` wins among equally long ones, then earliest in `b`. The block found
// through `b2j` is then widened over equal neighbours, popular or not.
fn longest_match(
	a: &[char],
	b: &[char],
	b2j: &HashMap<char, Vec<usize>>,
	(alo, ahi): (usize, usize),
	(blo, bhi): (usize, usize),
) -> (usize, usize, usize) {
	let (mut best_i, mut best_j, mut best_size) = (alo, blo, 0);
	let mut j2len: HashMap<usize, usize> = HashMap::new();

	for (i, ch) in a.iter().enumerate().take(ahi).skip(alo) {
		let mut next: HashMap<usize, usize> = HashMap::new();

		if let Some(positions) = b2j.get(ch) {
			for &j in positions {
				if j < blo {
					continue;
				}
				if j >= bhi {
					break;
				}

				let run = j.checked_sub(1).and_then(|prev| j2len.get(&prev)).copied();
				let k = run.unwrap_or(0) + 1;

				next.insert(j, k);

				if k > best_size {
					best_i = i + 1 - k;
					best_j = j + 1 - k;
					best_size = k;
				}
			}
		}

		j2len = next;
	}

	while best_i > alo && best_j > blo && a[best_i - 1] == b[best_j - 1] {
		best_i -= 1;
		best_j -= 1;
		best_size += 1;
	}
	while best_i + best_size < ahi
		&& best_j + best_size < bhi
		&& a[best_i + best_size] == b[best_j + best_size]
	{
		best_size += 1;
	}

	(best_i, best_j, best_size)
}
