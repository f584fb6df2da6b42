//! # Estatísticas de Demonstração
//!
//! Um snapshot pequeno, montado à mão, em torno da consulta de exemplo
//! "What Is Target Yield For Mexico 10 Year Government Bond By End Of 2018".
//! Serve para rodar o servidor sem um índice real e para os testes do pipeline.
//!
//! | Menção            | freq. frase | âncora | link prob | destino                          |
//! |-------------------|-------------|--------|-----------|----------------------------------|
//! | target            | 1000        | 300    | 0.30      | descartada (⊂ "target yield")    |
//! | target yield      | 50          | 30     | 0.60      | Yield_to_maturity / Yield_(finance) |
//! | yield             | 2000        | 200    | 0.10      | descartada (⊂ "target yield")    |
//! | mexico            | 5000        | 4000   | 0.80      | Mexico                           |
//! | government        | 8000        | 400    | 0.05      | descartada (⊂ "government bond") |
//! | government bond   | 200         | 90     | 0.45      | Government_bond                  |
//! | bond              | 100         | 50     | 0.50      | Bond_(finance)                   |
//! | is                | 100000      | 5      | 0.00005   | abaixo de link_prob_th           |
//! | end               | 10000       | 1      | -         | poucas ocorrências como âncora   |
//! | 2018              | 900         | 500    | -         | numérica                         |

use crate::store::{StatsSnapshot, StatsStore};

/// Consulta de exemplo
pub const DEMO_QUERY: &str =
    "What Is Target Yield For Mexico 10 Year Government Bond By End Of 2018";

/// Snapshot de demonstração
pub fn demo_snapshot() -> StatsSnapshot {
    StatsSnapshot::new(10_000)
        // frequência de documentos das frases
        .with_phrase("target", 1000)
        .with_phrase("target yield", 50)
        .with_phrase("yield", 2000)
        .with_phrase("mexico", 5000)
        .with_phrase("government", 8000)
        .with_phrase("government bond", 200)
        .with_phrase("bond", 100)
        .with_phrase("is", 100_000)
        .with_phrase("end", 10_000)
        .with_phrase("2018", 900)
        // âncoras e candidatos
        .with_anchor("target", 300, 120, &[("Target_Corporation", 0.7), ("Target_(archery)", 0.2)])
        .with_anchor("target yield", 30, 8, &[("Yield_to_maturity", 0.6), ("Yield_(finance)", 0.4)])
        .with_anchor(
            "yield",
            200,
            60,
            &[("Yield_(finance)", 0.5), ("Crop_yield", 0.3), ("Yield_(engineering)", 0.2)],
        )
        .with_anchor(
            "mexico",
            4000,
            2500,
            &[("Mexico", 0.9), ("Mexico_City", 0.05), ("Mexico_national_football_team", 0.05)],
        )
        .with_anchor("government", 400, 150, &[("Government", 0.8), ("Federal_government_of_Mexico", 0.1)])
        .with_anchor("government bond", 90, 40, &[("Government_bond", 0.95), ("Bond_(finance)", 0.01)])
        .with_anchor(
            "bond",
            50,
            30,
            &[("Bond_(finance)", 0.55), ("James_Bond", 0.3), ("Chemical_bond", 0.15)],
        )
        .with_anchor("is", 5, 0, &[("Is_(band)", 1.0)])
        .with_anchor("end", 1, 0, &[("End_(film)", 1.0)])
        .with_anchor("2018", 500, 200, &[("2018", 1.0)])
        // documentos do corpus anotado por entidade
        .with_entity_documents("Yield_to_maturity", 1000..1300)
        .with_entity_documents("Yield_(finance)", 1000..1600)
        .with_entity_documents("Crop_yield", 8500..8900)
        .with_entity_documents("Yield_(engineering)", 9000..9100)
        .with_entity_documents("Mexico", 1200..2200)
        .with_entity_documents("Mexico_City", 2100..2500)
        .with_entity_documents("Mexico_national_football_team", 5000..5200)
        .with_entity_documents("Government_bond", 1100..1500)
        .with_entity_documents("Bond_(finance)", 1050..1700)
        .with_entity_documents("James_Bond", 6000..6400)
        .with_entity_documents("Chemical_bond", 7000..7500)
        .with_entity_documents("Target_Corporation", 8000..8300)
        .with_entity_documents("Target_(archery)", 9500..9600)
        .with_entity_documents("Government", 3000..5000)
        .with_entity_documents("Federal_government_of_Mexico", 1800..2100)
}

/// Store de demonstração pronto para uso
pub fn demo_store() -> StatsStore {
    StatsStore::new(demo_snapshot())
}

/// Consultas de demonstração para a interface
pub fn demo_queries() -> Vec<&'static str> {
    vec![
        DEMO_QUERY,
        "mexico government bond yield",
        "james bond",
        "target yield 2018",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{CooccurrenceIndex, TextFrequencyIndex};

    #[test]
    fn test_demo_store_is_ready() {
        let store = demo_store();
        assert!(store.check_ready().is_ok());
        assert_eq!(store.phrase_document_frequency("bond").unwrap(), 100);
        assert_eq!(store.document_count(&["Bond_(finance)", "Government_bond"]).unwrap(), 400);
    }

    #[test]
    fn test_demo_queries_are_not_empty() {
        assert!(demo_queries().iter().all(|q| !q.trim().is_empty()));
    }
}
