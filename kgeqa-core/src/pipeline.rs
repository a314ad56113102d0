//! # Pipeline KGE-QA: fases da resposta e eventos de progresso
//!
//! Sequencia as quatro fases de resposta e emite um evento ao fim de cada
//! uma via canal (`mpsc`), permitindo que a interface mostre o "raciocínio"
//! do sistema passo a passo.
//!
//! ```text
//! Início → Tokenização → Classificação → Pares → Seleção + Fato → Fim
//!                                          │
//!                                          └─ sem pares → "Invalid question!"
//! ```
//!
//! Nenhuma fase é pulada ou reordenada; a única saída antecipada é a de
//! pergunta inválida, quando não há nenhum par (entidade, relação).

use std::sync::mpsc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::classifier::{Resolution, TokenClassifier};
use crate::config::{NeighborQuery, QaConfig};
use crate::error::Result;
use crate::model::QaModel;
use crate::pairing::{find_tail, form_pairs, pick_pair, NO_ANSWER};
use crate::tokenizer::{Token, TokenKind, Tokenizer};

/// Resposta sentinela quando não foi possível formar nenhum par.
pub const INVALID_QUESTION: &str = "Invalid question!";

/// Resultado de uma pergunta: a tripla `(head, relation, tails)`.
///
/// `head == None` indica pergunta inválida; nesse caso `tails` contém apenas
/// [`INVALID_QUESTION`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub head: Option<String>,
    pub relation: Option<String>,
    pub tails: Vec<String>,
}

impl Answer {
    pub fn invalid() -> Self {
        Self {
            head: None,
            relation: None,
            tails: vec![INVALID_QUESTION.to_string()],
        }
    }

    pub fn is_invalid(&self) -> bool {
        self.head.is_none()
    }

    /// Há pelo menos um fato real na resposta (nem inválida, nem sem resposta).
    pub fn is_found(&self) -> bool {
        !self.is_invalid() && self.tails.iter().all(|t| t != NO_ANSWER)
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (&self.head, &self.relation) {
            (Some(h), Some(r)) => write!(f, "{} -> {} -> {}", h, r, self.tails.join(", ")),
            _ => f.write_str(INVALID_QUESTION),
        }
    }
}

/// Eventos emitidos durante o processamento de uma pergunta.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum PipelineEvent {
    /// **Fase 0**: pergunta tokenizada (stopwords removidas, compostos juntados).
    TokenizationDone {
        tokens: Vec<String>,
        total: usize,
    },
    /// **Fase 1**: tipo decidido para um token.
    TokenClassified {
        token_index: usize,
        token_text: String,
        kind: TokenKind,
        confidence: f32,
        /// Nome canônico no knowledge graph.
        closest: String,
        resolution: Resolution,
    },
    /// **Fase 2**: troca das palavras da pergunta pelas formas do knowledge graph.
    TokensSwapped {
        swapped: Vec<(String, String)>,
    },
    /// **Fase 3**: pares (entidade, relação) candidatos.
    PairsFormed {
        pairs: Vec<(String, String)>,
    },
    /// **Fase 4**: par escolhido para completar a tripla.
    PairSelected {
        head: String,
        relation: String,
    },
    /// Pergunta sem nenhum par possível.
    InvalidQuestion {
        message: String,
    },
    /// **Conclusão**: resposta final.
    Done {
        answer: Answer,
        processing_ms: u64,
    },
}

/// O pipeline de perguntas e respostas.
///
/// Dono do [`QaModel`] (somente-leitura); cada chamada a [`QaPipeline::answer`]
/// é independente e não guarda estado entre perguntas.
pub struct QaPipeline {
    pub model: QaModel,
    config: QaConfig,
}

impl QaPipeline {
    /// Pipeline com os limiares padrão.
    pub fn new(model: QaModel) -> Self {
        Self::with_config(model, QaConfig::default())
    }

    pub fn with_config(model: QaModel, config: QaConfig) -> Self {
        Self { model, config }
    }

    /// Carrega o modelo a partir da configuração.
    ///
    /// Com [`NeighborQuery::WordVector`], vetores de palavras de dimensão
    /// diferente da dos vocabulários são rejeitados aqui.
    pub fn from_config(config: QaConfig) -> Result<Self> {
        let model = QaModel::load(&config)?;
        if config.neighbor_query == NeighborQuery::WordVector {
            model.check_word_dimensions()?;
        }
        Ok(Self::with_config(model, config))
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    pub fn tokenizer(&self) -> Tokenizer<'_> {
        Tokenizer::new(self.model.entities(), self.model.relations())
            .with_min_question_tokens(self.config.min_question_tokens)
    }

    pub fn classifier(&self) -> TokenClassifier<'_> {
        TokenClassifier::new(self.model.words(), self.model.entities(), self.model.relations())
            .with_thresholds(
                self.config.max_confidence_threshold,
                self.config.min_confidence_threshold,
            )
            .with_neighbors(self.config.neighbors_per_vocabulary)
            .with_neighbor_query(self.config.neighbor_query)
    }

    /// Responde uma pergunta de forma síncrona.
    ///
    /// Nunca falha: perguntas sem resposta voltam como valores sentinela.
    pub fn answer(&self, question: &str) -> Answer {
        let (tx, rx) = mpsc::channel();
        let answer = self.answer_streaming(question, tx);
        // Drena o canal; os eventos não interessam aqui
        rx.try_iter().for_each(drop);
        answer
    }

    /// Responde a pergunta emitindo um [`PipelineEvent`] por etapa.
    ///
    /// Um receptor já descartado não interrompe o processamento.
    pub fn answer_streaming(&self, question: &str, tx: mpsc::Sender<PipelineEvent>) -> Answer {
        let start = Instant::now();

        // === Tokenização ===
        let mut tokens: Vec<Token> = self.tokenizer().tokenize(question);
        let _ = tx.send(PipelineEvent::TokenizationDone {
            tokens: tokens.iter().map(|t| t.name.clone()).collect(),
            total: tokens.len(),
        });

        // === Fase 1: rotular cada token como ENTITY, RELATION ou OTHER ===
        let classifier = self.classifier();
        for (i, token) in tokens.iter_mut().enumerate() {
            let resolution = classifier.classify(token);
            let _ = tx.send(PipelineEvent::TokenClassified {
                token_index: i,
                token_text: token.name.clone(),
                kind: token.kind.unwrap_or(TokenKind::Other),
                confidence: token.type_confidence,
                closest: token.canonical_form().name.clone(),
                resolution,
            });
        }

        // === Fase 2: palavras da pergunta → formas canônicas do knowledge graph ===
        let swapped: Vec<Token> = tokens.iter().map(|t| t.canonical_form().clone()).collect();
        let labeled: Vec<(&str, TokenKind)> = tokens
            .iter()
            .map(|t| (t.name.as_str(), t.kind.unwrap_or(TokenKind::Other)))
            .collect();
        tracing::info!("Tokens rotulados: {:?}", labeled);
        let _ = tx.send(PipelineEvent::TokensSwapped {
            swapped: tokens
                .iter()
                .zip(&swapped)
                .map(|(t, s)| (t.name.clone(), s.name.clone()))
                .collect(),
        });

        // === Fase 3: triplas incompletas (entidade, relação) ===
        let pairs = form_pairs(&swapped, &swapped);
        let _ = tx.send(PipelineEvent::PairsFormed {
            pairs: pairs
                .iter()
                .map(|p| (p.entity.name.clone(), p.relation.name.clone()))
                .collect(),
        });

        // === Fase 4: escolher um par e completar o tail ===
        let answer = match pick_pair(&pairs, self.model.facts()) {
            None => {
                tracing::error!("{} '{}'", INVALID_QUESTION, question);
                let _ = tx.send(PipelineEvent::InvalidQuestion {
                    message: INVALID_QUESTION.to_string(),
                });
                Answer::invalid()
            }
            Some((head, relation)) => {
                let _ = tx.send(PipelineEvent::PairSelected {
                    head: head.clone(),
                    relation: relation.clone(),
                });
                let tails = find_tail(self.model.facts(), &head, &relation);
                Answer {
                    head: Some(head),
                    relation: Some(relation),
                    tails,
                }
            }
        };

        tracing::info!("Resposta: {}", answer);
        let _ = tx.send(PipelineEvent::Done {
            answer: answer.clone(),
            processing_ms: start.elapsed().as_millis() as u64,
        });
        answer
    }
}
