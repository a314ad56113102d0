//! # Classificador de Tokens (ENTITY / RELATION / OTHER)
//!
//! Decide, para cada token da pergunta, se ele denota uma entidade conhecida,
//! uma relação conhecida ou nenhuma das duas. É aqui que está a maior parte
//! das decisões do sistema.
//!
//! ## Algoritmo
//!
//! 1. **Match exato**: se o nome já é chave do vocabulário de entidades (ou de
//!    relações), o token recebe o tipo com confiança 1.0 e aponta para si mesmo.
//! 2. **Vizinhos**: calcula o embedding genérico do token e busca os 3 vizinhos
//!    mais próximos em cada vocabulário, consultando pelo nome do token ou pelo
//!    embedding genérico conforme [`NeighborQuery`]. Os 6 candidatos são
//!    ordenados por cosseno (ordenação estável).
//! 3. **Re-pontuação**: se o melhor cosseno ficou abaixo de `0.9`, cada
//!    candidato recebe
//!    $$ \text{score} = \text{round}\left(\frac{\cos + \text{ratio}(token, cand)}{2}, 2\right) $$
//!    e vence o maior score (empates: o primeiro na ordem anterior).
//! 4. **Rejeição**: score final abaixo de `0.2` → OTHER com confiança 0.
//!
//! O embedding resolve os casos claros; a similaridade de strings resgata
//! variações de grafia que o cosseno não coloca em primeiro lugar.

use serde::{Deserialize, Serialize};

use crate::config::NeighborQuery;
use crate::embedding::EmbeddingIndex;
use crate::similarity::sequence_ratio;
use crate::tokenizer::{Token, TokenKind};

pub const MAX_CONFIDENCE_THRESHOLD: f32 = 0.9;
pub const MIN_CONFIDENCE_THRESHOLD: f32 = 0.2;
pub const NEIGHBORS_PER_VOCABULARY: usize = 3;

/// Como o tipo do token foi decidido.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    /// O nome é chave de um dos vocabulários.
    ExactMatch,
    /// O vizinho de maior cosseno foi aceito diretamente.
    Nearest,
    /// Vencedor escolhido pelo score combinado (cosseno + string).
    Blended,
    /// Nenhum candidato atingiu o score mínimo.
    Rejected,
}

/// Um vizinho candidato com seu cosseno.
#[derive(Debug, Clone)]
struct Candidate {
    token: Token,
    cosine: f32,
}

pub struct TokenClassifier<'a> {
    words: &'a dyn EmbeddingIndex,
    entities: &'a dyn EmbeddingIndex,
    relations: &'a dyn EmbeddingIndex,
    max_confidence: f32,
    min_confidence: f32,
    neighbors: usize,
    query: NeighborQuery,
}

impl<'a> TokenClassifier<'a> {
    pub fn new(
        words: &'a dyn EmbeddingIndex,
        entities: &'a dyn EmbeddingIndex,
        relations: &'a dyn EmbeddingIndex,
    ) -> Self {
        Self {
            words,
            entities,
            relations,
            max_confidence: MAX_CONFIDENCE_THRESHOLD,
            min_confidence: MIN_CONFIDENCE_THRESHOLD,
            neighbors: NEIGHBORS_PER_VOCABULARY,
            query: NeighborQuery::default(),
        }
    }

    pub fn with_thresholds(mut self, max_confidence: f32, min_confidence: f32) -> Self {
        self.max_confidence = max_confidence;
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_neighbors(mut self, neighbors: usize) -> Self {
        self.neighbors = neighbors;
        self
    }

    pub fn with_neighbor_query(mut self, query: NeighborQuery) -> Self {
        self.query = query;
        self
    }

    /// Classifica todos os tokens, em ordem.
    pub fn classify_all(&self, tokens: &mut [Token]) -> Vec<Resolution> {
        tokens.iter_mut().map(|t| self.classify(t)).collect()
    }

    /// Preenche `kind`, `type_confidence`, `closest_token` (e `vector`) do token.
    ///
    /// Nunca falha: um token desconhecido por todos os vocabulários vira OTHER.
    pub fn classify(&self, token: &mut Token) -> Resolution {
        if let Some(kind) = self.exact_kind(&token.name) {
            tracing::info!("'{}' é uma chave exata do tipo {}", token.name, kind);
            token.kind = Some(kind);
            token.type_confidence = 1.0;
            token.closest_token = Some(Box::new(Token::canonical(token.name.clone(), kind)));
            return Resolution::ExactMatch;
        }

        tracing::info!("Gerando embedding para o token '{}'", token.name);
        let vector = self.words.vector_of(&token.name);

        let mut candidates = self.closest(self.entities, &token.name, &vector, TokenKind::Entity);
        candidates.extend(self.closest(self.relations, &token.name, &vector, TokenKind::Relation));
        // sort_by é estável: empates mantêm entidades antes de relações
        candidates.sort_by(|a, b| {
            b.cosine
                .partial_cmp(&a.cosine)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        token.vector = Some(vector);

        let (chosen, score, resolution) = self.decide(&token.name, candidates);

        tracing::info!(
            "Vizinho mais próximo de '{}': '{}' ({}), score {:.2}",
            token.name,
            chosen.name,
            chosen.kind.unwrap_or(TokenKind::Other),
            score
        );

        token.kind = chosen.kind;
        token.type_confidence = score.clamp(0.0, 1.0);
        token.closest_token = Some(Box::new(chosen));
        resolution
    }

    fn exact_kind(&self, name: &str) -> Option<TokenKind> {
        if self.entities.contains(name) {
            Some(TokenKind::Entity)
        } else if self.relations.contains(name) {
            Some(TokenKind::Relation)
        } else {
            None
        }
    }

    /// Vizinhos em um vocabulário.
    ///
    /// Em [`NeighborQuery::WordVector`], um embedding de dimensão diferente da
    /// do vocabulário não produz candidatos.
    fn closest(
        &self,
        index: &dyn EmbeddingIndex,
        name: &str,
        vector: &[f32],
        kind: TokenKind,
    ) -> Vec<Candidate> {
        let neighbors = match self.query {
            NeighborQuery::VocabularyName => index.k_nearest(name, self.neighbors),
            NeighborQuery::WordVector if vector.len() == index.dim() => {
                index.nearest_to(vector, self.neighbors)
            }
            NeighborQuery::WordVector => {
                tracing::warn!(
                    "Embedding de '{}' tem dimensão {}, vocabulário {} tem {}",
                    name,
                    vector.len(),
                    kind,
                    index.dim()
                );
                Vec::new()
            }
        };
        tracing::debug!("{} vizinhos de tipo {}: {:?}", neighbors.len(), kind, neighbors);

        neighbors
            .into_iter()
            .map(|n| Candidate {
                token: Token::canonical(n.name, kind),
                cosine: n.similarity,
            })
            .collect()
    }

    /// Escolhe o candidato e aplica os dois limiares.
    fn decide(&self, name: &str, candidates: Vec<Candidate>) -> (Token, f32, Resolution) {
        let Some(best) = candidates.first() else {
            tracing::debug!("Nenhum vizinho para '{}'", name);
            return (Token::other_placeholder(), 0.0, Resolution::Rejected);
        };

        let (mut index, mut score, mut resolution) = (0, best.cosine, Resolution::Nearest);

        if score < self.max_confidence {
            let blended: Vec<f32> = candidates
                .iter()
                .map(|c| round2((c.cosine as f64 + sequence_ratio(name, &c.token.name)) / 2.0) as f32)
                .collect();
            tracing::debug!(
                "Scores combinados: {:?}",
                candidates
                    .iter()
                    .zip(&blended)
                    .map(|(c, s)| (c.token.name.as_str(), *s))
                    .collect::<Vec<_>>()
            );

            for (i, s) in blended.iter().enumerate().skip(1) {
                if *s > blended[index] {
                    index = i;
                }
            }
            score = blended[index];
            resolution = Resolution::Blended;
        }

        if score < self.min_confidence {
            return (Token::other_placeholder(), 0.0, Resolution::Rejected);
        }

        let chosen = candidates
            .into_iter()
            .nth(index)
            .map(|c| c.token)
            .unwrap_or_else(Token::other_placeholder);
        (chosen, score, resolution)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::VectorStore;

    /// Vocabulários 3D com direções controladas:
    /// eixo 0 ~ filmes, eixo 1 ~ direção, eixo 2 ~ ruído.
    fn fixture() -> (VectorStore, VectorStore, VectorStore) {
        let mut words = VectorStore::new(3);
        words.insert("directed", vec![0.0, 1.0, 0.0]).unwrap();
        words.insert("director", vec![0.1, 0.7, 0.7]).unwrap();
        words.insert("zzz", vec![0.0, 0.0, -1.0]).unwrap();

        let mut entities = VectorStore::new(3);
        entities.insert("titanic", vec![1.0, 0.0, 0.0]).unwrap();
        entities.insert("avatar", vec![0.9, 0.1, 0.0]).unwrap();

        let mut relations = VectorStore::new(3);
        relations.insert("directed_by", vec![0.0, 1.0, 0.05]).unwrap();
        relations.insert("starring", vec![0.5, 0.0, 0.5]).unwrap();
        (words, entities, relations)
    }

    fn by_word_vector<'a>(
        w: &'a VectorStore,
        e: &'a VectorStore,
        r: &'a VectorStore,
    ) -> TokenClassifier<'a> {
        TokenClassifier::new(w, e, r).with_neighbor_query(NeighborQuery::WordVector)
    }

    #[test]
    fn test_exact_entity_match() {
        let (w, e, r) = fixture();
        let classifier = TokenClassifier::new(&w, &e, &r);
        let mut token = Token::new("titanic");
        assert_eq!(classifier.classify(&mut token), Resolution::ExactMatch);
        assert_eq!(token.kind, Some(TokenKind::Entity));
        assert_eq!(token.type_confidence, 1.0);
        assert_eq!(token.closest_token.as_ref().unwrap().name, "titanic");
        assert!(token.vector.is_none());
    }

    #[test]
    fn test_exact_relation_match() {
        let (w, e, r) = fixture();
        let mut token = Token::new("directed_by");
        TokenClassifier::new(&w, &e, &r).classify(&mut token);
        assert_eq!(token.kind, Some(TokenKind::Relation));
        assert_eq!(token.canonical_form().name, "directed_by");
    }

    #[test]
    fn test_high_cosine_skips_blending() {
        let (w, e, r) = fixture();
        let mut token = Token::new("directed");
        let resolution = by_word_vector(&w, &e, &r).classify(&mut token);
        assert_eq!(resolution, Resolution::Nearest);
        assert_eq!(token.kind, Some(TokenKind::Relation));
        assert_eq!(token.canonical_form().name, "directed_by");
        // confiança é o cosseno bruto, não um valor arredondado
        let cos = crate::embedding::cosine_similarity(&[0.0, 1.0, 0.0], &[0.0, 1.0, 0.05]);
        assert_eq!(token.type_confidence, cos);
        assert!(token.vector.is_some());
    }

    #[test]
    fn test_low_cosine_uses_blended_score() {
        let (w, e, r) = fixture();
        let mut token = Token::new("director");
        let resolution = by_word_vector(&w, &e, &r).classify(&mut token);
        assert_eq!(resolution, Resolution::Blended);
        assert_eq!(token.canonical_form().name, "directed_by");
        // score arredondado para 2 casas
        let scaled = token.type_confidence * 100.0;
        assert!((scaled - scaled.round()).abs() < 1e-3);
    }

    #[test]
    fn test_unrelated_token_is_other() {
        let (w, e, r) = fixture();
        let mut token = Token::new("zzz");
        let resolution = by_word_vector(&w, &e, &r).classify(&mut token);
        assert_eq!(resolution, Resolution::Rejected);
        assert_eq!(token.kind, Some(TokenKind::Other));
        assert_eq!(token.type_confidence, 0.0);
        assert_eq!(token.canonical_form().name, "<OTHER>");
    }

    #[test]
    fn test_empty_vocabularies_yield_other() {
        let words = VectorStore::new(3);
        let empty = VectorStore::new(3);
        let mut token = Token::new("anything");
        TokenClassifier::new(&words, &empty, &empty).classify(&mut token);
        assert_eq!(token.kind, Some(TokenKind::Other));
        assert!(token.closest_token.is_some());
    }

    #[test]
    fn test_equal_cosine_prefers_entity() {
        let mut words = VectorStore::new(3);
        words.insert("features", vec![2.0, 0.0, 0.0]).unwrap();
        let mut entities = VectorStore::new(3);
        entities.insert("feature", vec![1.0, 0.0, 0.0]).unwrap();
        let mut relations = VectorStore::new(3);
        relations.insert("featured_in", vec![1.0, 0.0, 0.0]).unwrap();

        let mut token = Token::new("features");
        let resolution = by_word_vector(&words, &entities, &relations).classify(&mut token);
        assert_eq!(resolution, Resolution::Nearest);
        assert_eq!(token.kind, Some(TokenKind::Entity));
        assert_eq!(token.canonical_form().name, "feature");
    }

    #[test]
    fn test_vocabulary_name_query_ignores_word_dimension() {
        let (_, e, r) = fixture();
        let mut words_3d = VectorStore::new(3);
        words_3d.insert("helmed", vec![0.0, 1.0, 0.0]).unwrap();
        let mut words_4d = VectorStore::new(4);
        words_4d.insert("helmed", vec![0.0, 1.0, 0.0, 0.0]).unwrap();

        let mut a = Token::new("helmed");
        let mut b = Token::new("helmed");
        let ra = TokenClassifier::new(&words_3d, &e, &r).classify(&mut a);
        let rb = TokenClassifier::new(&words_4d, &e, &r).classify(&mut b);

        assert_eq!(ra, rb);
        assert_eq!(a.kind, b.kind);
        assert_eq!(a.canonical_form().name, b.canonical_form().name);
        assert_eq!(a.type_confidence, b.type_confidence);
        // o embedding genérico continua registrado no token
        assert_eq!(a.vector.as_ref().map(Vec::len), Some(3));
        assert_eq!(b.vector.as_ref().map(Vec::len), Some(4));
    }

    #[test]
    fn test_word_vector_query_with_other_dimension_is_rejected() {
        let (_, e, r) = fixture();
        let mut words = VectorStore::new(4);
        words.insert("directed", vec![0.0, 1.0, 0.0, 0.0]).unwrap();

        let mut token = Token::new("directed");
        let resolution = by_word_vector(&words, &e, &r).classify(&mut token);
        assert_eq!(resolution, Resolution::Rejected);
        assert_eq!(token.kind, Some(TokenKind::Other));
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.456), 0.46);
        assert_eq!(round2(0.451), 0.45);
        // 0.145 é 0.14499... em binário: arredonda para baixo
        assert_eq!(round2(0.145), 0.14);
    }
}
