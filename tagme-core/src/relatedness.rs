//! # Relacionamento entre Entidades (Milne & Witten)
//!
//! Mede quão relacionadas duas entidades são a partir da co-ocorrência no corpus anotado:
//!
//! ```text
//! A = docs(e1)   B = docs(e2)   C = docs(e1 AND e2)   N = total de documentos
//!
//! rel(e1, e2) = 1 - (ln(max(A,B)) - ln(C)) / (ln(N) - ln(min(A,B)))
//! ```
//!
//! Regras:
//! - `rel(e, e) = 1.0` sem consultar o índice;
//! - `min(A,B) = 0` ou `C = 0` ⇒ 0;
//! - denominador `<= 0` (quando `min(A,B) >= N`) ⇒ 0, registrado em `debug!`;
//! - o resultado é limitado a `[0, 1]`.
//!
//! ## Cache
//! Toda contagem (entidade sozinha ou par) é memorizada pela tupla ordenada e sem repetição
//! dos identificadores, então `(A, B)` e `(B, A)` caem na mesma entrada. O cache vive apenas
//! durante uma consulta. Cada chave é calculada uma única vez mesmo com votação paralela;
//! consultas que falham não ficam no cache.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;
use tracing::debug;

use crate::error::IndexError;
use crate::index::CooccurrenceIndex;

/// Chave canônica: identificadores ordenados e sem duplicatas
pub type CacheKey = Vec<String>;

/// Canonicaliza um conjunto de entidades numa chave de cache
pub fn canonical_key(entity_ids: &[&str]) -> CacheKey {
    entity_ids
        .iter()
        .copied()
        .collect::<BTreeSet<&str>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Cache de contagens de documentos, com cálculo único por chave.
#[derive(Default)]
pub struct RelatednessCache {
    counts: Mutex<HashMap<CacheKey, Arc<OnceCell<u64>>>>,
}

impl RelatednessCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contagem de documentos com todas as entidades, consultando o índice só na primeira vez.
    pub fn document_count(
        &self,
        entity_ids: &[&str],
        index: &dyn CooccurrenceIndex,
    ) -> Result<u64, IndexError> {
        let key = canonical_key(entity_ids);
        let cell = {
            let mut counts = self.counts.lock();
            counts.entry(key.clone()).or_default().clone()
        };
        cell.get_or_try_init(|| {
            let ids: Vec<&str> = key.iter().map(String::as_str).collect();
            index.document_count(&ids)
        })
        .copied()
    }

    /// Número de chaves já calculadas
    pub fn len(&self) -> usize {
        self.counts
            .lock()
            .values()
            .filter(|cell| cell.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Valor memorizado para um conjunto, se houver
    pub fn cached(&self, entity_ids: &[&str]) -> Option<u64> {
        self.counts
            .lock()
            .get(&canonical_key(entity_ids))
            .and_then(|cell| cell.get().copied())
    }
}

/// Calcula o relacionamento entre entidades de uma consulta.
pub struct RelatednessEngine {
    index: Arc<dyn CooccurrenceIndex>,
    cache: RelatednessCache,
    total_documents: OnceCell<u64>,
}

impl RelatednessEngine {
    /// Cria um motor com cache novo (um por consulta)
    pub fn new(index: Arc<dyn CooccurrenceIndex>) -> Self {
        Self {
            index,
            cache: RelatednessCache::new(),
            total_documents: OnceCell::new(),
        }
    }

    pub fn cache(&self) -> &RelatednessCache {
        &self.cache
    }

    /// Relacionamento simétrico em `[0, 1]`.
    pub fn relatedness(&self, e1: &str, e2: &str) -> Result<f64, IndexError> {
        if e1 == e2 {
            return Ok(1.0);
        }

        let a = self.cache.document_count(&[e1], self.index.as_ref())?;
        let b = self.cache.document_count(&[e2], self.index.as_ref())?;
        let (min, max) = (a.min(b), a.max(b));
        if min == 0 {
            return Ok(0.0);
        }

        let conj = self.cache.document_count(&[e1, e2], self.index.as_ref())?;
        if conj == 0 {
            return Ok(0.0);
        }

        let total = *self
            .total_documents
            .get_or_try_init(|| self.index.total_document_count())?;

        let numerator = (max as f64).ln() - (conj as f64).ln();
        let denominator = (total as f64).ln() - (min as f64).ln();
        if !(denominator.is_finite() && denominator > 0.0) {
            debug!(
                e1,
                e2,
                min_docs = min,
                total_docs = total,
                "Denominador degenerado no relacionamento; usando 0"
            );
            return Ok(0.0);
        }

        let rel = 1.0 - numerator / denominator;
        Ok(rel.clamp(0.0, 1.0))
    }
}
