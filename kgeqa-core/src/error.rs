//! # Erros de Carregamento
//!
//! O pipeline de perguntas nunca falha: toda falha por pergunta vira um valor
//! sentinela (ver [`crate::pipeline`]). Os erros abaixo existem apenas para a
//! fase de inicialização, quando vocabulários e fatos são lidos do disco.

use thiserror::Error;

/// Falhas ao carregar os recursos do sistema (vetores, fatos, configuração).
#[derive(Error, Debug)]
pub enum QaError {
    /// Erro de I/O ao abrir ou ler um arquivo.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// O CSV de fatos não pôde ser lido.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Linha malformada em um arquivo `.vec`.
    #[error("malformed vector file at line {line}: {reason}")]
    MalformedVectors { line: usize, reason: String },

    /// Um vetor com dimensão diferente da declarada pelo vocabulário.
    #[error("dimension mismatch for '{token}': expected {expected}, found {found}")]
    DimensionMismatch {
        token: String,
        expected: usize,
        found: usize,
    },

    /// Busca por embedding genérico com vetores de palavras incompatíveis.
    #[error("word vectors have dimension {words}, {vocabulary} vectors have {vocabulary_dim}")]
    WordDimension {
        vocabulary: &'static str,
        words: usize,
        vocabulary_dim: usize,
    },

    /// O CSV de fatos não tem as colunas `h`, `r` e `t`.
    #[error("fact table is missing column '{0}'")]
    MissingColumn(&'static str),

    /// Erro na montagem da configuração.
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, QaError>;
