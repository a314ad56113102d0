//! # Tabela de Fatos (Knowledge Graph)
//!
//! Triplas `(head, relation, tail)` carregadas uma única vez de um CSV com
//! cabeçalho `h,r,t`. Heads e tails são normalizados para minúsculas na carga,
//! relações são mantidas como estão.
//!
//! A tabela é somente-leitura depois de carregada; todas as consultas são
//! filtros de igualdade exata sobre qualquer combinação das três colunas.

use std::io::Read;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{QaError, Result};

/// Um fato do domínio, ex: `(titanic, directed_by, james_cameron)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Fact {
    pub head: String,
    pub relation: String,
    pub tail: String,
}

impl Fact {
    /// Cria um fato já normalizado (head e tail em minúsculas).
    pub fn new(head: &str, relation: &str, tail: &str) -> Self {
        Self {
            head: head.to_lowercase(),
            relation: relation.to_string(),
            tail: tail.to_lowercase(),
        }
    }
}

/// Filtro de igualdade por coluna; `None` significa "qualquer valor".
#[derive(Debug, Clone, Copy, Default)]
pub struct FactQuery<'a> {
    pub head: Option<&'a str>,
    pub relation: Option<&'a str>,
    pub tail: Option<&'a str>,
}

impl<'a> FactQuery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn head(mut self, head: &'a str) -> Self {
        self.head = Some(head);
        self
    }

    pub fn relation(mut self, relation: &'a str) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn tail(mut self, tail: &'a str) -> Self {
        self.tail = Some(tail);
        self
    }

    fn matches(&self, fact: &Fact) -> bool {
        self.head.map_or(true, |h| fact.head == h)
            && self.relation.map_or(true, |r| fact.relation == r)
            && self.tail.map_or(true, |t| fact.tail == t)
    }
}

#[derive(Debug, Clone, Default)]
pub struct FactTable {
    facts: Vec<Fact>,
}

impl FactTable {
    pub fn new(facts: Vec<Fact>) -> Self {
        Self { facts }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::info!("Lendo fatos do knowledge graph de {}", path.display());
        let table = Self::from_reader(std::fs::File::open(path)?)?;
        tracing::info!("{} fatos carregados", table.len());
        Ok(table)
    }

    /// Lê o CSV. As colunas são localizadas pelo nome no cabeçalho (`h`, `r`, `t`),
    /// então colunas extras ou fora de ordem são aceitas.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let column = |name: &'static str| {
            headers
                .iter()
                .position(|h| h.eq_ignore_ascii_case(name))
                .ok_or(QaError::MissingColumn(name))
        };
        let (h, r, t) = (column("h")?, column("r")?, column("t")?);

        let mut facts = Vec::new();
        for record in reader.records() {
            let record = record?;
            let (Some(head), Some(relation), Some(tail)) = (record.get(h), record.get(r), record.get(t))
            else {
                continue;
            };
            facts.push(Fact::new(head, relation, tail));
        }

        Ok(Self { facts })
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Fact> {
        self.facts.iter()
    }

    /// Linhas que satisfazem o filtro, na ordem da tabela.
    pub fn query<'a>(&'a self, query: FactQuery<'a>) -> impl Iterator<Item = &'a Fact> + 'a {
        self.facts.iter().filter(move |f| query.matches(f))
    }

    /// Existe ao menos um fato `head -> relation -> ?`.
    pub fn has_pair(&self, head: &str, relation: &str) -> bool {
        self.query(FactQuery::new().head(head).relation(relation))
            .next()
            .is_some()
    }

    /// Todos os tails de `head -> relation`, na ordem da tabela.
    pub fn tails(&self, head: &str, relation: &str) -> Vec<String> {
        self.query(FactQuery::new().head(head).relation(relation))
            .map(|f| f.tail.clone())
            .collect()
    }

    /// Busca livre: fatos em que alguma coluna começa com `term`.
    ///
    /// `term` é interpretado como expressão regular ancorada no início e sem
    /// distinção de maiúsculas; se não for uma regex válida, vira um prefixo literal.
    pub fn search(&self, term: &str) -> Vec<&Fact> {
        let pattern = Regex::new(&format!("(?i)^(?:{})", term))
            .or_else(|_| Regex::new(&format!("(?i)^{}", regex::escape(term))));
        let Ok(pattern) = pattern else {
            return Vec::new();
        };
        self.facts
            .iter()
            .filter(|f| {
                pattern.is_match(&f.head) || pattern.is_match(&f.relation) || pattern.is_match(&f.tail)
            })
            .collect()
    }

    /// Heads e tails distintos, na ordem de primeira ocorrência.
    pub fn entities(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.facts
            .iter()
            .flat_map(|f| [f.head.as_str(), f.tail.as_str()])
            .filter(|e| seen.insert(*e))
            .collect()
    }

    /// Relações distintas, na ordem de primeira ocorrência.
    pub fn relations(&self) -> Vec<&str> {
        let mut seen = std::collections::HashSet::new();
        self.facts
            .iter()
            .map(|f| f.relation.as_str())
            .filter(|r| seen.insert(*r))
            .collect()
    }
}
