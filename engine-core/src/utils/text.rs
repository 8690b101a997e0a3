//! Text normalization and fuzzy comparison for vendor/description matching.

/// Uppercase, fold common diacritics to ASCII, and collapse runs of
/// whitespace to single spaces.
pub fn normalize(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut last_was_space = true;

    for ch in input.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                out.push(' ');
                last_was_space = true;
            }
            continue;
        }
        match fold_diacritic(ch) {
            Some(folded) => out.push(folded),
            None => {
                for upper in ch.to_uppercase() {
                    out.push(upper);
                }
            }
        }
        last_was_space = false;
    }

    while out.ends_with(' ') {
        out.pop();
    }
    out
}

fn fold_diacritic(ch: char) -> Option<char> {
    let folded = match ch {
        'á' | 'à' | 'â' | 'ä' | 'ã' | 'å' | 'Á' | 'À' | 'Â' | 'Ä' | 'Ã' | 'Å' => 'A',
        'é' | 'è' | 'ê' | 'ë' | 'É' | 'È' | 'Ê' | 'Ë' => 'E',
        'í' | 'ì' | 'î' | 'ï' | 'Í' | 'Ì' | 'Î' | 'Ï' => 'I',
        'ó' | 'ò' | 'ô' | 'ö' | 'õ' | 'Ó' | 'Ò' | 'Ô' | 'Ö' | 'Õ' => 'O',
        'ú' | 'ù' | 'û' | 'ü' | 'Ú' | 'Ù' | 'Û' | 'Ü' => 'U',
        'ç' | 'Ç' => 'C',
        'ñ' | 'Ñ' => 'N',
        _ => return None,
    };
    Some(folded)
}

/// Length of the longest common subsequence between two char sequences.
pub fn lcs_len(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0;
    }

    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for &ca in &a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// How much of `needle` is present (as a subsequence) in `haystack`, 0.0-1.0.
///
/// Both sides are normalized first. A needle fully contained in the haystack
/// scores 1.0, which is the behavior wanted for "vendor name appears inside a
/// longer transaction description".
pub fn containment_ratio(needle: &str, haystack: &str) -> f64 {
    let needle = normalize(needle);
    let haystack = normalize(haystack);
    if needle.is_empty() {
        return 0.0;
    }
    lcs_len(&needle, &haystack) as f64 / needle.chars().count() as f64
}
