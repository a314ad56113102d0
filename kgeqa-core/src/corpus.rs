//! # Conhecimento de Demonstração
//!
//! Um knowledge graph de brinquedo (filmes, linguagens, lugares) e perguntas
//! de exemplo, para rodar o sistema sem arquivos de dados.
//!
//! Os vetores do modelo de demonstração vêm de [`subword_vector`]: não há
//! semântica aprendida, só proximidade de grafia via trigramas. Serve para
//! demonstrar o fluxo; respostas reais exigem embeddings treinados.

use crate::embedding::{subword_vector, VectorStore};
use crate::facts::{Fact, FactTable};
use crate::model::QaModel;

/// Dimensão dos vetores de demonstração.
pub const DEMO_DIM: usize = 64;

/// Triplas `(head, relation, tail)` do domínio de demonstração.
pub const DEMO_FACTS: &[(&str, &str, &str)] = &[
    ("Titanic", "directed_by", "James_Cameron"),
    ("Avatar", "directed_by", "James_Cameron"),
    ("James_Cameron", "director", "Avatar"),
    ("Titanic", "starring", "Leonardo_DiCaprio"),
    ("Titanic", "starring", "Kate_Winslet"),
    ("Top_Gun", "starring", "Tom_Cruise"),
    ("Tom_Cruise", "played_in", "Top_Gun"),
    ("Tom_Cruise", "played_in", "Mission_Impossible"),
    ("Troy", "written_by", "David_Benioff"),
    ("Troy", "starring", "Brad_Pitt"),
    ("Lisp", "influenced", "Python"),
    ("Python", "influenced_by", "Lisp"),
    ("Paris", "located_in", "France"),
    ("Indonesia", "languages_spoken", "Indonesian"),
];

/// Perguntas de exemplo (algumas formas diferentes para o mesmo fato).
pub fn demo_questions() -> Vec<&'static str> {
    vec![
        "who directed titanic?",
        "titanic directed by whom?",
        "who played in titanic movie?",
        "Troy movie is written by whom?",
        "who wrote the movie troy?",
        "what movies did tom cruise play in?",
        "which language influenced python?",
        "where is paris located?",
        "what's the spoken language in Indonesia?",
    ]
}

pub fn demo_facts() -> FactTable {
    FactTable::new(
        DEMO_FACTS
            .iter()
            .map(|(h, r, t)| Fact::new(h, r, t))
            .collect(),
    )
}

/// Modelo completo de demonstração.
///
/// Entidades e relações são as do [`DEMO_FACTS`]; o vocabulário de palavras é
/// vazio, então todo token da pergunta recebe o vetor de trigramas.
pub fn demo_model() -> QaModel {
    let facts = demo_facts();

    let entities = demo_store(facts.entities());
    let relations = demo_store(facts.relations());
    QaModel::new(VectorStore::new(DEMO_DIM), entities, relations, facts)
}

fn demo_store(names: Vec<&str>) -> VectorStore {
    let mut store = VectorStore::new(DEMO_DIM);
    for name in names {
        // subword_vector sempre devolve DEMO_DIM componentes
        store
            .insert(name, subword_vector(name, DEMO_DIM))
            .expect("vetor de demonstração com a dimensão do vocabulário");
    }
    store
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingIndex;

    #[test]
    fn test_demo_vocabularies_cover_facts() {
        let model = demo_model();
        assert_eq!(model.facts().len(), DEMO_FACTS.len());
        assert!(model.entities().contains("titanic"));
        assert!(model.entities().contains("james_cameron"));
        assert!(model.relations().contains("directed_by"));
        assert!(!model.relations().contains("titanic"));
    }

    #[test]
    fn test_demo_store_has_every_name() {
        let facts = demo_facts();
        let entities = demo_store(facts.entities());
        assert_eq!(entities.len(), facts.entities().len());
        assert_eq!(entities.dim(), DEMO_DIM);
    }

    #[test]
    fn test_demo_questions_not_empty() {
        assert!(demo_questions().iter().all(|q| !q.trim().is_empty()));
    }
}
