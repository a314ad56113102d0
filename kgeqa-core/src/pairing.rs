//! # Formação e Seleção de Pares (ENTITY, RELATION)
//!
//! Uma pergunta factual simples é uma tripla incompleta `(head, relation, ?)`.
//! Depois da classificação, todo par (entidade, relação) da pergunta é uma
//! hipótese de tripla; este módulo gera as hipóteses, escolhe uma e completa
//! o `tail` consultando a tabela de fatos.

use serde::{Deserialize, Serialize};

use crate::facts::FactTable;
use crate::tokenizer::{Token, TokenKind};

/// Resposta sentinela quando o par escolhido não tem fato correspondente.
pub const NO_ANSWER: &str = "No answer found!";

/// Hipótese `(entidade, relação)` de uma tripla incompleta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidatePair {
    pub entity: Token,
    pub relation: Token,
}

/// Produto cartesiano entidades x relações (entidade na ordem externa).
///
/// Tokens OTHER, ou de outro tipo que o esperado em cada lista, são descartados.
pub fn form_pairs(entities: &[Token], relations: &[Token]) -> Vec<CandidatePair> {
    let entities: Vec<&Token> = entities
        .iter()
        .filter(|t| t.kind == Some(TokenKind::Entity))
        .collect();
    let relations: Vec<&Token> = relations
        .iter()
        .filter(|t| t.kind == Some(TokenKind::Relation))
        .collect();

    if entities.is_empty() {
        tracing::error!("Pergunta inválida: nenhuma entidade encontrada");
    }
    if relations.is_empty() {
        tracing::error!("Pergunta inválida: nenhuma relação encontrada");
    }

    let pairs: Vec<CandidatePair> = entities
        .iter()
        .flat_map(|e| {
            relations.iter().map(move |r| CandidatePair {
                entity: (*e).clone(),
                relation: (*r).clone(),
            })
        })
        .collect();

    tracing::info!(
        "Pares candidatos: {:?}",
        pairs
            .iter()
            .map(|p| (p.entity.name.as_str(), p.relation.name.as_str()))
            .collect::<Vec<_>>()
    );
    pairs
}

/// Escolhe o par mais provável.
///
/// Começa pelo primeiro par e percorre todos: cada par que existe como
/// `head -> relation` na tabela sobrescreve a escolha, ou seja, o **último**
/// par confirmado vence. Sem nenhum par confirmado, fica o primeiro.
/// Retorna `None` apenas para uma lista vazia.
pub fn pick_pair(pairs: &[CandidatePair], facts: &FactTable) -> Option<(String, String)> {
    let mut selected = pairs.first()?;

    for pair in pairs {
        if facts.has_pair(&pair.entity.name, &pair.relation.name) {
            selected = pair;
        }
    }

    tracing::info!(
        "Par selecionado: ({}, {})",
        selected.entity.name,
        selected.relation.name
    );
    Some((selected.entity.name.clone(), selected.relation.name.clone()))
}

/// Completa a tripla: todos os tails de `head -> relation`, ou `[NO_ANSWER]`.
pub fn find_tail(facts: &FactTable, head: &str, relation: &str) -> Vec<String> {
    let tails = facts.tails(head, relation);
    if tails.is_empty() {
        tracing::info!("Nenhum fato para ({}, {}, ?)", head, relation);
        return vec![NO_ANSWER.to_string()];
    }
    tails
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::facts::Fact;

    fn entity(name: &str) -> Token {
        Token::canonical(name, TokenKind::Entity)
    }

    fn relation(name: &str) -> Token {
        Token::canonical(name, TokenKind::Relation)
    }

    fn facts() -> FactTable {
        FactTable::new(vec![
            Fact::new("titanic", "directed_by", "james_cameron"),
            Fact::new("avatar", "directed_by", "james_cameron"),
            Fact::new("titanic", "starring", "leonardo_dicaprio"),
            Fact::new("titanic", "starring", "kate_winslet"),
        ])
    }

    #[test]
    fn test_cartesian_product_order() {
        let tokens = vec![entity("titanic"), relation("directed_by"), entity("avatar"), relation("starring")];
        let pairs = form_pairs(&tokens, &tokens);
        assert_eq!(pairs.len(), 4);
        let names: Vec<(&str, &str)> = pairs
            .iter()
            .map(|p| (p.entity.name.as_str(), p.relation.name.as_str()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("titanic", "directed_by"),
                ("titanic", "starring"),
                ("avatar", "directed_by"),
                ("avatar", "starring"),
            ]
        );
    }

    #[test]
    fn test_other_tokens_dropped() {
        let tokens = vec![entity("titanic"), Token::other_placeholder(), Token::new("raw")];
        assert!(form_pairs(&tokens, &tokens).is_empty());
    }

    #[test]
    fn test_last_confirmed_pair_wins() {
        let pairs = vec![
            CandidatePair { entity: entity("titanic"), relation: relation("written_by") },
            CandidatePair { entity: entity("titanic"), relation: relation("directed_by") },
            CandidatePair { entity: entity("avatar"), relation: relation("directed_by") },
        ];
        let picked = pick_pair(&pairs, &facts()).unwrap();
        assert_eq!(picked, ("avatar".to_string(), "directed_by".to_string()));
    }

    #[test]
    fn test_unconfirmed_falls_back_to_first() {
        let pairs = vec![
            CandidatePair { entity: entity("troy"), relation: relation("written_by") },
            CandidatePair { entity: entity("troy"), relation: relation("starring") },
        ];
        let picked = pick_pair(&pairs, &facts()).unwrap();
        assert_eq!(picked, ("troy".to_string(), "written_by".to_string()));
        assert!(pick_pair(&[], &facts()).is_none());
    }

    #[test]
    fn test_find_tail() {
        let table = facts();
        assert_eq!(
            find_tail(&table, "titanic", "starring"),
            vec!["leonardo_dicaprio", "kate_winslet"]
        );
        assert_eq!(find_tail(&table, "troy", "starring"), vec![NO_ANSWER]);
    }
}
