//! # Configuração do Sistema
//!
//! Caminhos dos recursos e parâmetros de decisão do classificador.
//! Todos os campos têm valor padrão, então um arquivo de configuração vazio
//! (ou inexistente) é válido.
//!
//! ## Fontes, em ordem de prioridade crescente
//!
//! 1. Valores padrão abaixo.
//! 2. Arquivo opcional (TOML, YAML ou JSON, detectado pela extensão).
//! 3. Variáveis de ambiente `KGEQA__<CAMPO>` (ex: `KGEQA__MIN_CONFIDENCE_THRESHOLD=0.3`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Prefixo das variáveis de ambiente lidas por [`QaConfig::load`].
pub const ENV_PREFIX: &str = "KGEQA";

/// Com que consulta o classificador busca vizinhos em cada vocabulário.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeighborQuery {
    /// Pelo nome do token, com o vetor que o próprio vocabulário atribui a ele.
    #[default]
    VocabularyName,
    /// Pelo embedding genérico do token. Exige que os vetores de palavras
    /// tenham a mesma dimensão dos vocabulários.
    WordVector,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QaConfig {
    /// Embeddings genéricos de palavras (formato word2vec texto).
    #[serde(default = "default_word_vectors")]
    pub word_vectors_path: PathBuf,

    /// Embeddings das entidades (`ENT.vec`).
    #[serde(default = "default_entity_vectors")]
    pub entity_vectors_path: PathBuf,

    /// Embeddings das relações (`REL.vec`).
    #[serde(default = "default_relation_vectors")]
    pub relation_vectors_path: PathBuf,

    /// Tabela de fatos com cabeçalho `h,r,t`.
    #[serde(default = "default_facts")]
    pub facts_path: PathBuf,

    /// Acima deste cosseno o vizinho mais próximo é aceito sem re-pontuação.
    #[serde(default = "default_max_confidence")]
    pub max_confidence_threshold: f32,

    /// Abaixo deste score o token é rotulado como OTHER.
    #[serde(default = "default_min_confidence")]
    pub min_confidence_threshold: f32,

    /// Consulta usada na busca de vizinhos (`vocabulary_name` ou `word_vector`).
    #[serde(default)]
    pub neighbor_query: NeighborQuery,

    /// Quantos vizinhos buscar em cada vocabulário (entidades e relações).
    #[serde(default = "default_neighbors")]
    pub neighbors_per_vocabulary: usize,

    /// Perguntas com menos tokens brutos geram um aviso no log.
    #[serde(default = "default_min_question_tokens")]
    pub min_question_tokens: usize,
}

fn default_word_vectors() -> PathBuf { PathBuf::from("data/WORDS.vec") }
fn default_entity_vectors() -> PathBuf { PathBuf::from("data/ENT.vec") }
fn default_relation_vectors() -> PathBuf { PathBuf::from("data/REL.vec") }
fn default_facts() -> PathBuf { PathBuf::from("data/KG.csv") }
fn default_max_confidence() -> f32 { 0.9 }
fn default_min_confidence() -> f32 { 0.2 }
fn default_neighbors() -> usize { 3 }
fn default_min_question_tokens() -> usize { 3 }

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            word_vectors_path: default_word_vectors(),
            entity_vectors_path: default_entity_vectors(),
            relation_vectors_path: default_relation_vectors(),
            facts_path: default_facts(),
            max_confidence_threshold: default_max_confidence(),
            min_confidence_threshold: default_min_confidence(),
            neighbor_query: NeighborQuery::default(),
            neighbors_per_vocabulary: default_neighbors(),
            min_question_tokens: default_min_question_tokens(),
        }
    }
}

impl QaConfig {
    /// Monta a configuração a partir de um arquivo opcional e do ambiente.
    ///
    /// Um `path` ausente, ou apontando para um arquivo inexistente, não é erro:
    /// os valores padrão e as variáveis de ambiente continuam valendo.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }
        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(settings.try_deserialize()?)
    }
}
