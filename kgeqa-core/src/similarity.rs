//! # Similaridade de Strings (Ratcliff/Obershelp)
//!
//! Métrica de "gestalt pattern matching": encontra o maior bloco comum entre
//! as duas strings, depois repete recursivamente à esquerda e à direita do
//! bloco. Com `M` = total de caracteres casados:
//!
//! $$ \text{ratio} = \frac{2M}{|a| + |b|} $$
//!
//! O classificador usa esta métrica para resgatar variações lexicais
//! (ex: "director" vs "directed_by") que o cosseno dos embeddings não coloca
//! em primeiro lugar.

/// Razão de similaridade em `[0, 1]`, insensível a maiúsculas.
///
/// Duas strings vazias são consideradas idênticas (1.0).
///
/// ```rust
/// use kgeqa_core::similarity::sequence_ratio;
///
/// assert_eq!(sequence_ratio("abcd", "bcde"), 0.75);
/// assert_eq!(sequence_ratio("Titanic", "titanic"), 1.0);
/// ```
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    let matched = matching_characters(&a, &b);
    2.0 * matched as f64 / total as f64
}

/// Soma os tamanhos de todos os blocos casados.
fn matching_characters(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    // Pilha de sub-intervalos pendentes (alo, ahi, blo, bhi)
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let (i, j, k) = longest_match(a, b, alo, ahi, blo, bhi);
        if k == 0 {
            continue;
        }
        matched += k;
        if alo < i && blo < j {
            queue.push((alo, i, blo, j));
        }
        if i + k < ahi && j + k < bhi {
            queue.push((i + k, ahi, j + k, bhi));
        }
    }

    matched
}

/// Maior bloco comum em `a[alo..ahi]` x `b[blo..bhi]`.
///
/// Em caso de empate vence o bloco que começa mais cedo em `a`, e depois em `b`.
fn longest_match(
    a: &[char],
    b: &[char],
    alo: usize,
    ahi: usize,
    blo: usize,
    bhi: usize,
) -> (usize, usize, usize) {
    let (mut best_i, mut best_j, mut best_k) = (alo, blo, 0);
    // prev[j] = tamanho do sufixo comum terminando em a[i-1], b[j-1]
    let width = bhi - blo;
    let mut prev = vec![0usize; width + 1];

    for i in alo..ahi {
        let mut curr = vec![0usize; width + 1];
        for j in blo..bhi {
            if a[i] == b[j] {
                let k = prev[j - blo] + 1;
                curr[j - blo + 1] = k;
                if k > best_k {
                    best_i = i + 1 - k;
                    best_j = j + 1 - k;
                    best_k = k;
                }
            }
        }
        prev = curr;
    }

    (best_i, best_j, best_k)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_empty() {
        assert_eq!(sequence_ratio("", ""), 1.0);
        assert_eq!(sequence_ratio("titanic", "titanic"), 1.0);
        assert_eq!(sequence_ratio("abc", ""), 0.0);
    }

    #[test]
    fn test_disjoint() {
        assert_eq!(sequence_ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_reference_values() {
        // Mesmos valores que o SequenceMatcher de referência produz
        assert_eq!(sequence_ratio("abcd", "bcde"), 0.75);
        // "directed" x "directed_by": M = 8, total = 19
        let r = sequence_ratio("directed", "directed_by");
        assert!((r - 16.0 / 19.0).abs() < 1e-6);
    }

    #[test]
    fn test_recurses_on_both_sides() {
        // maior bloco "xyzcd", depois "ab" à esquerda → M = 7
        let r = sequence_ratio("abxyzcd", "abqxyzcd");
        assert!((r - 14.0 / 15.0).abs() < 1e-6);
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(sequence_ratio("James_Cameron", "james_cameron"), 1.0);
    }
}
