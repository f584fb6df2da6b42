//! # Store de Estatísticas em Memória
//!
//! Implementa os três índices de apoio ([`TextFrequencyIndex`], [`CooccurrenceIndex`],
//! [`CandidateSource`]) a partir de um snapshot JSON carregado uma vez no início do processo.
//!
//! ## Formato do snapshot
//!
//! ```json
//! {
//!   "total_documents": 1000,
//!   "phrases": { "bond": 100 },
//!   "anchors": {
//!     "bond": { "wiki_occurrences": 50, "facc_occurrences": 12,
//!               "entities": { "Bond_(finance)": 0.6, "James_Bond": 0.3 } }
//!   },
//!   "entity_documents": { "Bond_(finance)": [1, 2, 3], "James_Bond": [3, 9] }
//! }
//! ```
//!
//! A consulta AND entre entidades é a interseção dos conjuntos de documentos.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::IndexError;
use crate::index::{CandidateSource, CooccurrenceIndex, MentionStats, TextFrequencyIndex};

/// Conteúdo serializável do store
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsSnapshot {
    #[serde(default)]
    pub total_documents: u64,
    /// frase (minúscula) -> frequência de documentos
    #[serde(default)]
    pub phrases: HashMap<String, u64>,
    /// menção (minúscula) -> estatísticas de âncora
    #[serde(default)]
    pub anchors: HashMap<String, MentionStats>,
    /// entidade -> documentos do corpus anotado em que ela aparece
    #[serde(default)]
    pub entity_documents: HashMap<String, BTreeSet<u64>>,
}

impl StatsSnapshot {
    pub fn new(total_documents: u64) -> Self {
        Self {
            total_documents,
            ..Default::default()
        }
    }

    pub fn with_phrase(mut self, phrase: &str, document_frequency: u64) -> Self {
        self.phrases.insert(phrase.to_lowercase(), document_frequency);
        self
    }

    /// Registra uma menção com suas ocorrências como âncora (wiki e facc) e candidatos
    pub fn with_anchor(
        mut self,
        mention: &str,
        wiki_occurrences: u64,
        facc_occurrences: u64,
        entities: &[(&str, f64)],
    ) -> Self {
        self.anchors.insert(
            mention.to_lowercase(),
            MentionStats {
                wiki_occurrences,
                facc_occurrences,
                entities: entities
                    .iter()
                    .map(|(id, cmn)| (id.to_string(), *cmn))
                    .collect(),
            },
        );
        self
    }

    pub fn with_entity_documents(
        mut self,
        entity: &str,
        documents: impl IntoIterator<Item = u64>,
    ) -> Self {
        self.entity_documents
            .insert(entity.to_string(), documents.into_iter().collect());
        self
    }
}

/// Store somente-leitura; compartilhável entre threads sem travas.
#[derive(Debug, Clone, Default)]
pub struct StatsStore {
    snapshot: StatsSnapshot,
}

impl StatsStore {
    pub fn new(snapshot: StatsSnapshot) -> Self {
        Self { snapshot }
    }

    /// Carrega o snapshot de um arquivo JSON e verifica se o corpus não está vazio
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, IndexError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| IndexError::Unavailable(format!("{}: {}", path.display(), e)))?;
        let store = Self::from_json(&content)?;
        store.check_ready()?;
        Ok(store)
    }

    pub fn from_json(content: &str) -> Result<Self, IndexError> {
        let snapshot: StatsSnapshot = serde_json::from_str(content)
            .map_err(|e| IndexError::Unavailable(format!("snapshot inválido: {}", e)))?;
        Ok(Self::new(snapshot))
    }

    /// Um corpus sem documentos não serve consultas
    pub fn check_ready(&self) -> Result<(), IndexError> {
        if self.snapshot.total_documents == 0 {
            return Err(IndexError::Unavailable(
                "corpus de co-ocorrência vazio".to_string(),
            ));
        }
        Ok(())
    }

    pub fn snapshot(&self) -> &StatsSnapshot {
        &self.snapshot
    }
}

impl TextFrequencyIndex for StatsStore {
    fn phrase_document_frequency(&self, text: &str) -> Result<u64, IndexError> {
        Ok(self
            .snapshot
            .phrases
            .get(&text.to_lowercase())
            .copied()
            .unwrap_or(0))
    }
}

impl CooccurrenceIndex for StatsStore {
    fn document_count(&self, entity_ids: &[&str]) -> Result<u64, IndexError> {
        let ids: BTreeSet<&str> = entity_ids.iter().copied().collect();
        let mut sets = Vec::with_capacity(ids.len());
        for id in &ids {
            match self.snapshot.entity_documents.get(*id) {
                Some(docs) => sets.push(docs),
                None => return Ok(0),
            }
        }
        // Começa pelo menor conjunto para reduzir a interseção
        sets.sort_by_key(|docs| docs.len());
        let Some((first, rest)) = sets.split_first() else {
            return self.total_document_count();
        };
        let count = first
            .iter()
            .filter(|&doc| rest.iter().all(|other| other.contains(doc)))
            .count();
        Ok(count as u64)
    }

    fn total_document_count(&self) -> Result<u64, IndexError> {
        Ok(self.snapshot.total_documents)
    }
}

impl CandidateSource for StatsStore {
    fn candidates(&self, mention: &str, commonness_floor: f64) -> Result<MentionStats, IndexError> {
        Ok(self
            .snapshot
            .anchors
            .get(&mention.to_lowercase())
            .cloned()
            .unwrap_or_default()
            .above_floor(commonness_floor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SNAPSHOT: &str = r#"{
        "total_documents": 1000,
        "phrases": { "bond": 100 },
        "anchors": {
            "bond": { "wiki_occurrences": 50, "facc_occurrences": 12,
                      "entities": { "Bond_(finance)": 0.6, "James_Bond": 0.3, "Bond_Street": 0.0005 } }
        },
        "entity_documents": { "Bond_(finance)": [1, 2, 3], "James_Bond": [3, 9], "Gold": [2, 3, 9] }
    }"#;

    fn store() -> StatsStore {
        StatsStore::from_json(SNAPSHOT).unwrap()
    }

    #[test]
    fn test_phrase_frequency_case_insensitive() {
        let s = store();
        assert_eq!(s.phrase_document_frequency("Bond").unwrap(), 100);
        assert_eq!(s.phrase_document_frequency("unknown").unwrap(), 0);
    }

    #[test]
    fn test_document_count_and() {
        let s = store();
        assert_eq!(s.document_count(&["Bond_(finance)"]).unwrap(), 3);
        assert_eq!(s.document_count(&["Bond_(finance)", "James_Bond"]).unwrap(), 1);
        assert_eq!(s.document_count(&["Bond_(finance)", "Gold", "James_Bond"]).unwrap(), 1);
        assert_eq!(s.document_count(&["James_Bond", "James_Bond"]).unwrap(), 2);
        assert_eq!(s.document_count(&["Nope", "James_Bond"]).unwrap(), 0);
    }

    #[test]
    fn test_candidates_apply_floor() {
        let s = store();
        let stats = s.candidates("bond", 0.001).unwrap();
        assert_eq!(stats.wiki_occurrences, 50);
        assert_eq!(stats.entities.len(), 2);
        let missing = s.candidates("nothing", 0.001).unwrap();
        assert_eq!(missing, MentionStats::default());
    }

    #[test]
    fn test_empty_corpus_is_not_ready() {
        let s = StatsStore::from_json("{}").unwrap();
        assert!(matches!(s.check_ready(), Err(IndexError::Unavailable(_))));
        assert!(store().check_ready().is_ok());
    }

    #[test]
    fn test_invalid_json() {
        assert!(StatsStore::from_json("{ nope").is_err());
    }
}
