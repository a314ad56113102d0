//! # kgeqa-core: Perguntas e Respostas sobre Knowledge Graph Embeddings
//!
//! Este crate responde perguntas factuais simples em inglês ("who directed
//! titanic?") consultando um knowledge graph de triplas `(head, relation, tail)`.
//! Os embeddings do grafo e de palavras genéricas fazem a ponte entre o
//! vocabulário livre da pergunta e os nomes canônicos do grafo.
//!
//! ## Arquitetura do Sistema
//!
//! Uma pergunta atravessa quatro fases, sempre na mesma ordem:
//!
//! 1.  **Tokenização** ([`tokenizer`]): normalização, remoção de stopwords e
//!     junção de termos compostos conhecidos (`directed by` → `directed_by`).
//! 2.  **Classificação** ([`classifier`]): cada token vira ENTITY, RELATION ou
//!     OTHER, por match exato ou pelos vizinhos no espaço de embeddings
//!     ([`embedding`]), com desempate por similaridade de strings ([`similarity`]).
//! 3.  **Pares** ([`pairing`]): produto cartesiano entidades x relações, já nas
//!     formas canônicas do grafo.
//! 4.  **Seleção e Fato** ([`pairing`], [`facts`]): escolhe um par e completa a
//!     tripla com os tails da tabela de fatos.
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use kgeqa_core::{corpus::demo_model, QaPipeline};
//!
//! // 1. Modelo de demonstração (sem arquivos em disco)
//! let pipeline = QaPipeline::new(demo_model());
//!
//! // 2. Pergunta usando os nomes do grafo
//! let answer = pipeline.answer("titanic directed_by");
//!
//! assert_eq!(answer.head.as_deref(), Some("titanic"));
//! assert_eq!(answer.tails, vec!["james_cameron"]);
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Orquestrador que conecta as fases e emite eventos.
//! - [`model`]: Recursos somente-leitura (vocabulários e fatos).
//! - [`config`]: Caminhos e limiares, de arquivo ou ambiente.
//! - [`corpus`]: Knowledge graph de demonstração.

pub mod classifier;
pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod facts;
pub mod model;
pub mod pairing;
pub mod pipeline;
pub mod similarity;
pub mod tokenizer;

pub use config::QaConfig;
pub use error::{QaError, Result};
pub use model::QaModel;
pub use pipeline::{Answer, PipelineEvent, QaPipeline};
pub use tokenizer::{Token, TokenKind};
