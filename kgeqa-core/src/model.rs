//! # Modelo de Conhecimento
//!
//! Agrega os recursos somente-leitura que o pipeline consulta:
//! - **Palavras**: embeddings genéricos para qualquer token da pergunta.
//! - **Entidades** e **Relações**: os vocabulários do knowledge graph.
//! - **Fatos**: a tabela `(head, relation, tail)`.
//!
//! Tudo é carregado uma vez na inicialização e nunca mais modificado, então um
//! `QaModel` pode ser compartilhado entre threads sem trava.

use crate::config::QaConfig;
use crate::embedding::{EmbeddingIndex, Neighbor, VectorStore};
use crate::error::{QaError, Result};
use crate::facts::FactTable;

pub struct QaModel {
    words: Box<dyn EmbeddingIndex>,
    entities: Box<dyn EmbeddingIndex>,
    relations: Box<dyn EmbeddingIndex>,
    facts: FactTable,
}

impl QaModel {
    pub fn new(
        words: impl EmbeddingIndex + 'static,
        entities: impl EmbeddingIndex + 'static,
        relations: impl EmbeddingIndex + 'static,
        facts: FactTable,
    ) -> Self {
        Self {
            words: Box::new(words),
            entities: Box::new(entities),
            relations: Box::new(relations),
            facts,
        }
    }

    /// Carrega os quatro recursos a partir dos caminhos da configuração.
    ///
    /// Qualquer arquivo ausente ou malformado aborta a carga: sem eles o
    /// sistema não tem como responder nada.
    pub fn load(config: &QaConfig) -> Result<Self> {
        let words = VectorStore::load(&config.word_vectors_path)?;
        let entities = VectorStore::load(&config.entity_vectors_path)?;
        let relations = VectorStore::load(&config.relation_vectors_path)?;
        let facts = FactTable::load(&config.facts_path)?;
        tracing::info!(
            "Modelo carregado: {} entidades, {} relações, {} fatos",
            entities.len(),
            relations.len(),
            facts.len()
        );
        Ok(Self::new(words, entities, relations, facts))
    }

    pub fn words(&self) -> &dyn EmbeddingIndex {
        self.words.as_ref()
    }

    pub fn entities(&self) -> &dyn EmbeddingIndex {
        self.entities.as_ref()
    }

    pub fn relations(&self) -> &dyn EmbeddingIndex {
        self.relations.as_ref()
    }

    pub fn facts(&self) -> &FactTable {
        &self.facts
    }

    /// Confere que os vetores de palavras podem consultar os dois vocabulários.
    pub fn check_word_dimensions(&self) -> Result<()> {
        let words = self.words.dim();
        for (vocabulary, index) in [("entity", &self.entities), ("relation", &self.relations)] {
            if index.dim() != words {
                return Err(QaError::WordDimension {
                    vocabulary,
                    words,
                    vocabulary_dim: index.dim(),
                });
            }
        }
        Ok(())
    }

    /// Entidades mais próximas de uma palavra qualquer (exploração do vocabulário).
    pub fn closest_entities(&self, word: &str, k: usize) -> Vec<Neighbor> {
        self.entities.k_nearest(word, k)
    }

    /// Relações mais próximas de uma palavra qualquer.
    pub fn closest_relations(&self, word: &str, k: usize) -> Vec<Neighbor> {
        self.relations.k_nearest(word, k)
    }
}
