//! # Poda por Confiança (rho)
//!
//! Para cada par desambiguado `(menção, entidade)`:
//!
//! ```text
//! coerência(m, e) = média de rel(e, e_j) para as entidades e_j das OUTRAS menções
//!                   (0 se só existe uma menção desambiguada)
//! rho(m, e)       = (link_prob(m) + coerência(m, e)) / 2
//! ```
//!
//! O link fica se `rho >= rho_th`.

use std::collections::BTreeMap;

use tracing::debug;

use crate::disambiguation::Disambiguation;
use crate::error::IndexError;
use crate::relatedness::RelatednessEngine;

/// menção -> (entidade, rho)
pub type PrunedLinks = BTreeMap<String, (String, f64)>;

pub struct PruningEngine<'a> {
    relatedness: &'a RelatednessEngine,
    rho_th: f64,
}

impl<'a> PruningEngine<'a> {
    pub fn new(relatedness: &'a RelatednessEngine, rho_th: f64) -> Self {
        Self { relatedness, rho_th }
    }

    pub fn prune(
        &self,
        disambiguated: &Disambiguation,
        link_probs: &BTreeMap<String, f64>,
    ) -> Result<PrunedLinks, IndexError> {
        let mut links = PrunedLinks::new();
        for (mention, entity) in disambiguated {
            let rho = self.rho_score(mention, entity, disambiguated, link_probs)?;
            if rho >= self.rho_th {
                links.insert(mention.clone(), (entity.clone(), rho));
            } else {
                debug!(mention = %mention, entity = %entity, rho, "Link podado");
            }
        }
        Ok(links)
    }

    pub fn rho_score(
        &self,
        mention: &str,
        entity: &str,
        disambiguated: &Disambiguation,
        link_probs: &BTreeMap<String, f64>,
    ) -> Result<f64, IndexError> {
        let link_prob = link_probs.get(mention).copied().unwrap_or(0.0);
        let coherence = self.coherence_score(mention, entity, disambiguated)?;
        Ok((link_prob + coherence) / 2.0)
    }

    /// Relacionamento médio de `entity` com as entidades escolhidas para as outras menções
    pub fn coherence_score(
        &self,
        mention: &str,
        entity: &str,
        disambiguated: &Disambiguation,
    ) -> Result<f64, IndexError> {
        let others = disambiguated.len().saturating_sub(1);
        if others == 0 {
            return Ok(0.0);
        }
        let mut total = 0.0;
        for (other_mention, other_entity) in disambiguated {
            if other_mention == mention {
                continue;
            }
            total += self.relatedness.relatedness(other_entity, entity)?;
        }
        Ok(total / others as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StatsSnapshot, StatsStore};
    use proptest::prelude::*;
    use std::sync::Arc;

    fn engine() -> RelatednessEngine {
        let snapshot = StatsSnapshot::new(1000)
            .with_entity_documents("Bond_(finance)", 0..100)
            .with_entity_documents("Mexico", 50..150)
            .with_entity_documents("Yield_(finance)", 0..10);
        RelatednessEngine::new(Arc::new(StatsStore::new(snapshot)))
    }

    fn disamb(pairs: &[(&str, &str)]) -> Disambiguation {
        pairs.iter().map(|(m, e)| (m.to_string(), e.to_string())).collect()
    }

    fn link_probs(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs.iter().map(|(m, lp)| (m.to_string(), *lp)).collect()
    }

    #[test]
    fn test_single_mention_rho_is_half_link_prob() {
        let rel = engine();
        let pruning = PruningEngine::new(&rel, 0.0);
        let d = disamb(&[("bond", "Bond_(finance)")]);
        let links = pruning.prune(&d, &link_probs(&[("bond", 0.5)])).unwrap();
        assert_eq!(links["bond"], ("Bond_(finance)".to_string(), 0.25));
    }

    #[test]
    fn test_coherence_average() {
        let rel = engine();
        let pruning = PruningEngine::new(&rel, 0.0);
        let d = disamb(&[
            ("bond", "Bond_(finance)"),
            ("mexico", "Mexico"),
            ("yield", "Yield_(finance)"),
        ]);
        let expected = (rel.relatedness("Mexico", "Bond_(finance)").unwrap()
            + rel.relatedness("Yield_(finance)", "Bond_(finance)").unwrap())
            / 2.0;
        let coherence = pruning.coherence_score("bond", "Bond_(finance)", &d).unwrap();
        assert!((coherence - expected).abs() < 1e-12);
    }

    #[test]
    fn test_rho_threshold_drops_links() {
        let rel = engine();
        let d = disamb(&[("bond", "Bond_(finance)"), ("mexico", "Mexico")]);
        let lp = link_probs(&[("bond", 0.5), ("mexico", 0.01)]);
        let links = PruningEngine::new(&rel, 0.5).prune(&d, &lp).unwrap();
        // rel(Bond, Mexico) = 1 - ln2/ln10 ≈ 0.699; rho(bond) ≈ 0.60, rho(mexico) ≈ 0.35
        assert!(links.contains_key("bond"));
        assert!(!links.contains_key("mexico"));
    }

    proptest! {
        #[test]
        fn prop_raising_rho_th_never_adds_links(low in 0.0f64..=1.0, delta in 0.0f64..=1.0) {
            let high = (low + delta).min(1.0);
            let rel = engine();
            let d = disamb(&[("bond", "Bond_(finance)"), ("mexico", "Mexico"), ("yield", "Yield_(finance)")]);
            let lp = link_probs(&[("bond", 0.5), ("mexico", 0.2), ("yield", 0.05)]);
            let low_links = PruningEngine::new(&rel, low).prune(&d, &lp).unwrap();
            let high_links = PruningEngine::new(&rel, high).prune(&d, &lp).unwrap();
            prop_assert!(high_links.len() <= low_links.len());
            for mention in high_links.keys() {
                prop_assert!(low_links.contains_key(mention));
            }
        }
    }
}
