//! # Tokenizador de Perguntas
//!
//! Transforma a pergunta bruta na sequência de tokens candidatos que o
//! classificador vai rotular.
//!
//! ## Etapas
//!
//! 1. **Normalização**: minúsculas, e só sobrevivem sequências de `[a-z0-9_]`.
//! 2. **Stopwords**: remove a lista fechada de stopwords do inglês, **exceto**
//!    "by", necessária para relações compostas como "directed by".
//! 3. **Junção de compostos**: janela deslizante de tamanho 2; se `a_b` (ou
//!    `a b`) existe no vocabulário de entidades ou de relações, o par vira um
//!    único token e a janela avança duas posições.
//!
//! ```text
//! "Who directed the movie Top Gun?"
//!   -> [who, directed, the, movie, top, gun]     (normalização)
//!   -> [directed, movie, top, gun]               (stopwords)
//!   -> [directed, movie, top_gun]                (compostos, se "top_gun" ∈ ENT)
//! ```
//!
//! A junção é gulosa da esquerda para a direita: determinística e linear, mas
//! não necessariamente ótima.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::embedding::EmbeddingIndex;

/// Tipo atribuído a um token pelo classificador.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TokenKind {
    /// Aparece no vocabulário de entidades (ex: "titanic", "james_cameron").
    Entity,
    /// Aparece no vocabulário de relações (ex: "directed_by").
    Relation,
    /// Nem entidade nem relação; não participa da formação de pares.
    Other,
}

impl TokenKind {
    pub fn label(&self) -> &'static str {
        match self {
            TokenKind::Entity => "<ENTITY>",
            TokenKind::Relation => "<RELATION>",
            TokenKind::Other => "<OTHER>",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Unidade da pergunta, enriquecida pelo classificador.
///
/// Depois da tokenização só `name` está preenchido. O classificador preenche
/// `kind`, `type_confidence`, `closest_token` e, quando consulta o modelo de
/// palavras, `vector`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// Forma normalizada (minúsculas, `_` nos compostos).
    pub name: String,
    /// Embedding genérico; ausente quando o token casou exatamente com o vocabulário.
    pub vector: Option<Vec<f32>>,
    /// `None` até a classificação.
    pub kind: Option<TokenKind>,
    /// Score em `[0, 1]` que sustenta `kind`.
    pub type_confidence: f32,
    /// Cópia da entrada canônica do vocabulário à qual o token foi resolvido.
    pub closest_token: Option<Box<Token>>,
}

impl Token {
    /// Token bruto, ainda não classificado.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vector: None,
            kind: None,
            type_confidence: 0.0,
            closest_token: None,
        }
    }

    /// Entrada canônica de um vocabulário (confiança 1.0).
    pub fn canonical(name: impl Into<String>, kind: TokenKind) -> Self {
        Self {
            name: name.into(),
            vector: None,
            kind: Some(kind),
            type_confidence: 1.0,
            closest_token: None,
        }
    }

    /// Marcador usado quando nenhum vizinho é bom o bastante.
    pub fn other_placeholder() -> Self {
        Self {
            type_confidence: 0.0,
            ..Self::canonical(TokenKind::Other.label(), TokenKind::Other)
        }
    }

    pub fn is_classified(&self) -> bool {
        self.kind.is_some()
    }

    /// A forma do token usada no knowledge graph: o canônico, se houver.
    pub fn canonical_form(&self) -> &Token {
        self.closest_token.as_deref().unwrap_or(self)
    }
}

/// Stopwords do inglês (lista NLTK) sem "by".
pub const STOPWORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "you're", "you've",
    "you'll", "you'd", "your", "yours", "yourself", "yourselves", "he", "him", "his", "himself",
    "she", "she's", "her", "hers", "herself", "it", "it's", "its", "itself", "they", "them",
    "their", "theirs", "themselves", "what", "which", "who", "whom", "this", "that", "that'll",
    "these", "those", "am", "is", "are", "was", "were", "be", "been", "being", "have", "has",
    "had", "having", "do", "does", "did", "doing", "a", "an", "the", "and", "but", "if", "or",
    "because", "as", "until", "while", "of", "at", "for", "with", "about", "against", "between",
    "into", "through", "during", "before", "after", "above", "below", "to", "from", "up", "down",
    "in", "out", "on", "off", "over", "under", "again", "further", "then", "once", "here",
    "there", "when", "where", "why", "how", "all", "any", "both", "each", "few", "more", "most",
    "other", "some", "such", "no", "nor", "not", "only", "own", "same", "so", "than", "too",
    "very", "s", "t", "can", "will", "just", "don", "don't", "should", "should've", "now", "d",
    "ll", "m", "o", "re", "ve", "y", "ain", "aren", "aren't", "couldn", "couldn't", "didn",
    "didn't", "doesn", "doesn't", "hadn", "hadn't", "hasn", "hasn't", "haven", "haven't", "isn",
    "isn't", "ma", "mightn", "mightn't", "mustn", "mustn't", "needn", "needn't", "shan",
    "shan't", "shouldn", "shouldn't", "wasn", "wasn't", "weren", "weren't", "won", "won't",
    "wouldn", "wouldn't",
];

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("[a-z0-9_]+").expect("static regex"))
}

/// Minúsculas e extração das sequências `[a-z0-9_]`.
pub fn normalize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    word_pattern()
        .find_iter(&lower)
        .map(|m| m.as_str().to_string())
        .collect()
}

pub fn is_stopword(word: &str) -> bool {
    STOPWORDS.contains(&word)
}

/// Tokenizador ciente dos vocabulários de entidades e relações.
pub struct Tokenizer<'a> {
    entities: &'a dyn EmbeddingIndex,
    relations: &'a dyn EmbeddingIndex,
    min_question_tokens: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(entities: &'a dyn EmbeddingIndex, relations: &'a dyn EmbeddingIndex) -> Self {
        Self {
            entities,
            relations,
            min_question_tokens: 3,
        }
    }

    /// Abaixo deste número de palavras brutas a pergunta gera um aviso.
    pub fn with_min_question_tokens(mut self, min: usize) -> Self {
        self.min_question_tokens = min;
        self
    }

    /// Tokeniza a pergunta. Perguntas curtas apenas geram aviso no log.
    pub fn tokenize(&self, question: &str) -> Vec<Token> {
        tracing::info!("Tokenizando a pergunta: '{}'", question);
        let raw = normalize(question);

        if raw.len() < self.min_question_tokens {
            tracing::warn!(
                "Pergunta curta ({} palavras): uma pergunta deveria ter ao menos {}",
                raw.len(),
                self.min_question_tokens
            );
        }

        tracing::debug!("Tokens brutos: {:?}", raw);
        let filtered: Vec<String> = raw.into_iter().filter(|w| !is_stopword(w)).collect();
        let merged = self.join_compounds(filtered);
        tracing::info!("Tokens filtrados: {:?}", merged);

        merged.into_iter().map(Token::new).collect()
    }

    fn is_known(&self, candidate: &str) -> bool {
        self.entities.contains(candidate) || self.relations.contains(candidate)
    }

    /// Junta pares adjacentes que formam um termo composto conhecido.
    fn join_compounds(&self, words: Vec<String>) -> Vec<String> {
        let mut merged = Vec::with_capacity(words.len());
        let mut i = 0;

        while i < words.len() {
            if let Some(next) = words.get(i + 1) {
                let joined = format!("{}_{}", words[i], next);
                if self.is_known(&joined) {
                    merged.push(joined);
                    i += 2;
                    continue;
                }
                let spaced = format!("{} {}", words[i], next);
                if self.is_known(&spaced) {
                    merged.push(spaced);
                    i += 2;
                    continue;
                }
            }
            merged.push(words[i].clone());
            i += 1;
        }

        merged
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::VectorStore;

    fn vocab(keys: &[&str]) -> VectorStore {
        let mut store = VectorStore::new(2);
        for key in keys {
            store.insert(key, vec![1.0, 0.0]).unwrap();
        }
        store
    }

    fn names(tokens: &[Token]) -> Vec<&str> {
        tokens.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn test_empty_question() {
        let (ents, rels) = (vocab(&[]), vocab(&[]));
        let tokens = Tokenizer::new(&ents, &rels).tokenize("");
        assert!(tokens.is_empty());
    }

    #[test]
    fn test_normalize_strips_symbols() {
        assert_eq!(normalize("Who directed Titanic?!"), vec!["who", "directed", "titanic"]);
        assert_eq!(normalize("top_gun (1986)"), vec!["top_gun", "1986"]);
    }

    #[test]
    fn test_stopwords_removed_but_by_kept() {
        let (ents, rels) = (vocab(&[]), vocab(&[]));
        let tokens = Tokenizer::new(&ents, &rels).tokenize("the movie was directed by whom");
        assert_eq!(names(&tokens), vec!["movie", "directed", "by"]);
    }

    #[test]
    fn test_compound_relation_merged() {
        let ents = vocab(&["titanic"]);
        let rels = vocab(&["directed_by"]);
        let tokens = Tokenizer::new(&ents, &rels).tokenize("Titanic was directed by whom?");
        assert_eq!(names(&tokens), vec!["titanic", "directed_by"]);
        assert!(tokens.iter().all(|t| !t.is_classified()));
    }

    #[test]
    fn test_merge_advances_two_positions() {
        let ents = vocab(&["tom_cruise", "top_gun"]);
        let rels = vocab(&["played_in"]);
        let tokens = Tokenizer::new(&ents, &rels).tokenize("tom cruise played in top gun");
        assert_eq!(names(&tokens), vec!["tom_cruise", "played", "top_gun"]);
    }

    #[test]
    fn test_spaced_compound() {
        let ents = vocab(&[]);
        let mut rels = VectorStore::new(1);
        rels.insert("written by", vec![1.0]).unwrap();
        let tokens = Tokenizer::new(&ents, &rels).tokenize("troy was written by whom");
        assert_eq!(names(&tokens), vec!["troy", "written by"]);
    }

    #[test]
    fn test_kind_labels() {
        assert_eq!(TokenKind::Entity.label(), "<ENTITY>");
        assert_eq!(TokenKind::Other.to_string(), "<OTHER>");
        let placeholder = Token::other_placeholder();
        assert_eq!(placeholder.kind, Some(TokenKind::Other));
        assert_eq!(placeholder.type_confidence, 0.0);
    }
}
