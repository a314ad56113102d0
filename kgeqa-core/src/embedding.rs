//! # Vocabulários de Embeddings
//!
//! O sistema trabalha com três vocabulários independentes:
//!
//! | Vocabulário | Arquivo     | Uso                                          |
//! |-------------|-------------|----------------------------------------------|
//! | Palavras    | `WORDS.vec` | Vetor genérico de qualquer token da pergunta |
//! | Entidades   | `ENT.vec`   | Vizinhos do tipo ENTITY + atalho exato       |
//! | Relações    | `REL.vec`   | Vizinhos do tipo RELATION + atalho exato     |
//!
//! Todos são lidos do formato texto do word2vec:
//!
//! ```text
//! 3 4                      <- cabeçalho opcional: quantidade e dimensão
//! titanic 0.1 0.9 0.0 0.2
//! avatar 0.2 0.8 0.1 0.0
//! james_cameron 0.7 0.1 0.3 0.1
//! ```
//!
//! ## Tokens fora do vocabulário (OOV)
//!
//! `vector_of` nunca falha. Um token desconhecido recebe:
//! 1. a média dos vetores das suas partes conhecidas (`new_york` → `new` + `york`);
//! 2. senão, um vetor determinístico derivado de trigramas de caracteres,
//!    de forma que grafias parecidas caiam em regiões parecidas do espaço.

use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Um vizinho retornado por uma busca k-NN.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub name: String,
    /// Similaridade de cosseno com a consulta.
    pub similarity: f32,
}

/// Interface do serviço de embeddings consumida pelo tokenizador e pelo classificador.
pub trait EmbeddingIndex: Send + Sync {
    /// Dimensão dos vetores.
    fn dim(&self) -> usize;

    /// Teste de pertinência (atalho de match exato e junção de compostos).
    fn contains(&self, token: &str) -> bool;

    /// Vetor do token; tokens OOV recebem um vetor sintetizado.
    fn vector_of(&self, token: &str) -> Vec<f32>;

    /// Os `k` itens do vocabulário mais próximos de `vector`, em ordem decrescente.
    fn nearest_to(&self, vector: &[f32], k: usize) -> Vec<Neighbor>;

    /// Chaves do vocabulário, na ordem de carga.
    fn keys(&self) -> Vec<&str>;

    /// Os `k` vizinhos de `token`, excluindo o próprio token.
    fn k_nearest(&self, token: &str, k: usize) -> Vec<Neighbor> {
        let query = token.to_lowercase();
        self.nearest_to(&self.vector_of(&query), k + 1)
            .into_iter()
            .filter(|n| n.name != query)
            .take(k)
            .collect()
    }
}

/// Vocabulário em memória com busca exaustiva por cosseno.
#[derive(Debug, Clone, Default)]
pub struct VectorStore {
    dim: usize,
    keys: Vec<String>,
    vectors: Vec<Vec<f32>>,
    index: HashMap<String, usize>,
}

impl VectorStore {
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            ..Default::default()
        }
    }

    /// Carrega um arquivo `.vec` do disco.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Carregando vetores de {}", path.display());
        let file = std::fs::File::open(path)?;
        let store = Self::from_reader(std::io::BufReader::new(file))?;
        tracing::info!("{} vetores de dimensão {} carregados", store.len(), store.dim);
        Ok(store)
    }

    /// Lê vetores no formato texto do word2vec.
    ///
    /// O cabeçalho `quantidade dimensão` é opcional; sem ele, a dimensão é
    /// inferida da primeira linha de dados. Linhas vazias são ignoradas.
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut store = VectorStore::new(0);
        let mut dim_known = false;

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let line_no = i + 1;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else { continue };
            let rest: Vec<&str> = fields.collect();

            // Cabeçalho: exatamente dois inteiros na primeira linha
            if i == 0 && rest.len() == 1 {
                if let (Ok(_count), Ok(dim)) = (word.parse::<usize>(), rest[0].parse::<usize>()) {
                    store.dim = dim;
                    dim_known = true;
                    continue;
                }
            }

            if rest.is_empty() {
                return Err(QaError::MalformedVectors {
                    line: line_no,
                    reason: format!("token '{}' has no vector components", word),
                });
            }

            let vector = rest
                .iter()
                .map(|v| v.parse::<f32>())
                .collect::<std::result::Result<Vec<f32>, _>>()
                .map_err(|e| QaError::MalformedVectors {
                    line: line_no,
                    reason: e.to_string(),
                })?;

            if !dim_known {
                store.dim = vector.len();
                dim_known = true;
            }
            store.insert(word, vector)?;
        }

        Ok(store)
    }

    /// Adiciona (ou substitui) um vetor. A chave é normalizada para minúsculas.
    pub fn insert(&mut self, token: &str, vector: Vec<f32>) -> Result<()> {
        if vector.len() != self.dim {
            return Err(QaError::DimensionMismatch {
                token: token.to_string(),
                expected: self.dim,
                found: vector.len(),
            });
        }
        let key = token.to_lowercase();
        match self.index.get(&key) {
            Some(&i) => self.vectors[i] = vector,
            None => {
                self.index.insert(key.clone(), self.keys.len());
                self.keys.push(key);
                self.vectors.push(vector);
            }
        }
        Ok(())
    }

    pub fn get(&self, token: &str) -> Option<&[f32]> {
        self.index
            .get(&token.to_lowercase())
            .map(|&i| self.vectors[i].as_slice())
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Média dos vetores das partes conhecidas de um token composto.
    fn compose_from_parts(&self, token: &str) -> Option<Vec<f32>> {
        let parts: Vec<&[f32]> = token
            .split(|c: char| c == '_' || c.is_whitespace())
            .filter_map(|p| self.get(p))
            .collect();
        if parts.is_empty() {
            return None;
        }
        let mut sum = vec![0.0f32; self.dim];
        for part in &parts {
            for (s, v) in sum.iter_mut().zip(part.iter()) {
                *s += v;
            }
        }
        let n = parts.len() as f32;
        Some(sum.into_iter().map(|s| s / n).collect())
    }
}

impl EmbeddingIndex for VectorStore {
    fn dim(&self) -> usize {
        self.dim
    }

    fn contains(&self, token: &str) -> bool {
        self.index.contains_key(&token.to_lowercase())
    }

    fn vector_of(&self, token: &str) -> Vec<f32> {
        if let Some(v) = self.get(token) {
            return v.to_vec();
        }
        self.compose_from_parts(token)
            .unwrap_or_else(|| subword_vector(token, self.dim))
    }

    fn nearest_to(&self, vector: &[f32], k: usize) -> Vec<Neighbor> {
        if k == 0 {
            return Vec::new();
        }
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .par_iter()
            .enumerate()
            .map(|(i, v)| (i, cosine_similarity(vector, v)))
            .collect();

        // Empates resolvidos pela ordem de carga do vocabulário
        scored.sort_by(|a, b| {
            b.1.partial_cmp(&a.1)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.0.cmp(&b.0))
        });
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(i, similarity)| Neighbor {
                name: self.keys[i].clone(),
                similarity,
            })
            .collect()
    }

    fn keys(&self) -> Vec<&str> {
        self.keys.iter().map(String::as_str).collect()
    }
}

/// Similaridade de cosseno; 0.0 para vetores nulos ou de tamanhos diferentes.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// Vetor unitário determinístico a partir dos trigramas de `<token>`.
///
/// Cada trigrama semeia um gerador xorshift (via hash FNV-1a) e contribui com
/// um vetor pseudo-aleatório; tokens que compartilham trigramas compartilham
/// componentes, o que aproxima grafias parecidas.
pub fn subword_vector(token: &str, dim: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; dim];
    if dim == 0 {
        return sum;
    }
    let padded: Vec<char> = format!("<{}>", token.to_lowercase()).chars().collect();

    for gram in padded.windows(3) {
        let mut state = fnv1a(gram);
        for s in sum.iter_mut() {
            // xorshift64
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            *s += (state >> 40) as f32 / (1u64 << 23) as f32 - 1.0;
        }
    }

    let norm = sum.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for s in sum.iter_mut() {
            *s /= norm;
        }
    }
    sum
}

fn fnv1a(chars: &[char]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for c in chars {
        let mut buf = [0u8; 4];
        for byte in c.encode_utf8(&mut buf).bytes() {
            hash ^= byte as u64;
            hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
        }
    }
    // xorshift não pode partir de zero
    hash | 1
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "3 3\n\
        Titanic 1.0 0.0 0.0\n\
        avatar 0.9 0.1 0.0\n\
        james_cameron 0.0 1.0 0.0\n";

    #[test]
    fn test_parse_with_header() {
        let store = VectorStore::from_reader(SAMPLE.as_bytes()).unwrap();
        assert_eq!(store.len(), 3);
        assert_eq!(store.dim(), 3);
        // Chaves normalizadas para minúsculas
        assert!(store.contains("titanic"));
        assert!(store.contains("TITANIC"));
        assert_eq!(store.keys(), vec!["titanic", "avatar", "james_cameron"]);
    }

    #[test]
    fn test_parse_without_header() {
        let store = VectorStore::from_reader("a 1 0\nb 0 1\n".as_bytes()).unwrap();
        assert_eq!(store.dim(), 2);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_malformed_line_is_rejected() {
        let err = VectorStore::from_reader("a 1 0\nb 0 x\n".as_bytes()).unwrap_err();
        assert!(matches!(err, QaError::MalformedVectors { line: 2, .. }));

        let err = VectorStore::from_reader("a 1 0\nlonely\n".as_bytes()).unwrap_err();
        assert!(matches!(err, QaError::MalformedVectors { line: 2, .. }));
    }

    #[test]
    fn test_dimension_mismatch() {
        let err = VectorStore::from_reader("2 2\na 1 0\nb 0 1 1\n".as_bytes()).unwrap_err();
        assert!(matches!(err, QaError::DimensionMismatch { expected: 2, found: 3, .. }));
    }

    #[test]
    fn test_nearest_is_sorted_descending() {
        let store = VectorStore::from_reader(SAMPLE.as_bytes()).unwrap();
        let neighbors = store.nearest_to(&[1.0, 0.05, 0.0], 3);
        assert_eq!(neighbors.len(), 3);
        assert_eq!(neighbors[0].name, "titanic");
        assert_eq!(neighbors[1].name, "avatar");
        assert!(neighbors[0].similarity >= neighbors[1].similarity);
        assert!(neighbors[1].similarity >= neighbors[2].similarity);
    }

    #[test]
    fn test_k_nearest_excludes_query() {
        let store = VectorStore::from_reader(SAMPLE.as_bytes()).unwrap();
        let neighbors = store.k_nearest("titanic", 2);
        assert_eq!(neighbors.len(), 2);
        assert_eq!(neighbors[0].name, "avatar");
        assert!(neighbors.iter().all(|n| n.name != "titanic"));
    }

    #[test]
    fn test_oov_composes_known_parts() {
        let store = VectorStore::from_reader("new 1 0\nyork 0 1\n".as_bytes()).unwrap();
        assert_eq!(store.vector_of("new_york"), vec![0.5, 0.5]);
    }

    #[test]
    fn test_subword_vector_is_deterministic_and_unit() {
        let a = subword_vector("directed", 16);
        let b = subword_vector("directed", 16);
        assert_eq!(a, b);
        let norm: f32 = a.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4);
        assert!(subword_vector("x", 0).is_empty());
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }
}
