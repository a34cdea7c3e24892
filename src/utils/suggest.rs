//! "Did you mean" candidates for mistyped tool names.

fn normalize(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let stripped = lowered.strip_prefix("get_").unwrap_or(&lowered);
    stripped
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect()
}

fn edit_distance(a: &[char], b: &[char]) -> usize {
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for (i, ca) in a.iter().enumerate() {
        let mut diagonal = row[0];
        row[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let above = row[j + 1];
            let substitution = diagonal + usize::from(ca != cb);
            row[j + 1] = substitution.min(above + 1).min(row[j] + 1);
            diagonal = above;
        }
    }
    row[b.len()]
}

/// Up to `limit` candidates close to `input`, best first. Containment counts
/// as a near match so `nse_active` finds `get_nse_most_active`.
pub fn suggest<'a>(input: &str, candidates: &[&'a str], limit: usize) -> Vec<&'a str> {
    let needle = normalize(input);
    if needle.is_empty() {
        return Vec::new();
    }
    let needle_chars: Vec<char> = needle.chars().collect();
    let allowed = (needle_chars.len() / 3).max(2);

    let mut scored: Vec<(usize, &'a str)> = candidates
        .iter()
        .filter_map(|candidate| {
            let hay = normalize(candidate);
            if hay.is_empty() {
                return None;
            }
            let score = if hay == needle {
                0
            } else if hay.contains(&needle) || needle.contains(&hay) {
                1
            } else {
                let hay_chars: Vec<char> = hay.chars().collect();
                edit_distance(&needle_chars, &hay_chars)
            };
            (score <= allowed).then_some((score, *candidate))
        })
        .collect();
    scored.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(limit.max(1)).map(|(_, c)| c).collect()
}
