//! # Configuração do Linker
//!
//! Os quatro limiares do TAGME têm um valor padrão por processo ([`Thresholds`]) e podem ser
//! sobrescritos por requisição ([`ThresholdOverrides`]). Todo valor final é validado antes
//! de o pipeline rodar.
//!
//! | Limiar          | Padrão | Papel                                                        |
//! |-----------------|--------|--------------------------------------------------------------|
//! | `rho_th`        | 0.20   | confiança mínima (rho) para aceitar um link                  |
//! | `link_prob_th`  | 0.001  | link probability mínima para uma menção sobreviver          |
//! | `cmn_th`        | 0.02   | commonness mínima de um candidato na desambiguação (tau)    |
//! | `k_th`          | 0.3    | fração dos candidatos que entra no top-k (epsilon)          |
//!
//! A configuração é lida de YAML:
//!
//! ```yaml
//! thresholds:
//!   rho_th: 0.2
//!   k_th: 0.3
//! sf_source: wiki
//! voting_deadline_ms: 2000
//! server:
//!   bind_addr: "0.0.0.0:9002"
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{LinkError, Result};

/// Fonte da contagem "como âncora" de uma menção.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SurfaceFormSource {
    /// Âncoras da Wikipedia
    #[default]
    Wiki,
    /// Anotações do corpus FACC
    Facc,
}

/// Limiares efetivos de uma consulta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub rho_th: f64,
    pub link_prob_th: f64,
    pub cmn_th: f64,
    pub k_th: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            rho_th: 0.20,
            link_prob_th: 0.001,
            cmn_th: 0.02,
            k_th: 0.3,
        }
    }
}

/// Sobrescritas opcionais vindas da requisição.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ThresholdOverrides {
    #[serde(default)]
    pub rho_th: Option<f64>,
    #[serde(default, alias = "lnk_prob_th")]
    pub link_prob_th: Option<f64>,
    #[serde(default)]
    pub cmn_th: Option<f64>,
    #[serde(default)]
    pub k_th: Option<f64>,
}

impl Thresholds {
    /// Aplica as sobrescritas e valida o resultado.
    pub fn with_overrides(&self, overrides: &ThresholdOverrides) -> Result<Thresholds> {
        let merged = Thresholds {
            rho_th: overrides.rho_th.unwrap_or(self.rho_th),
            link_prob_th: overrides.link_prob_th.unwrap_or(self.link_prob_th),
            cmn_th: overrides.cmn_th.unwrap_or(self.cmn_th),
            k_th: overrides.k_th.unwrap_or(self.k_th),
        };
        merged.validate()?;
        Ok(merged)
    }

    /// Todo limiar deve ser finito e estar em [0, 1].
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("rho_th", self.rho_th),
            ("link_prob_th", self.link_prob_th),
            ("cmn_th", self.cmn_th),
            ("k_th", self.k_th),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(LinkError::InvalidThreshold { name, value });
            }
        }
        Ok(())
    }
}

/// Configuração do servidor HTTP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9002".to_string(),
        }
    }
}

/// Configuração completa do processo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkerConfig {
    /// Limiares padrão, sobrescrevíveis por requisição
    pub thresholds: Thresholds,
    /// Piso interno de commonness ao buscar candidatos (independe de `cmn_th`)
    pub commonness_floor: f64,
    /// Menções com mais tokens que isso são descartadas
    pub max_mention_tokens: usize,
    /// Mínimo de ocorrências como âncora para uma menção ser considerada
    pub min_anchor_occurrences: u64,
    pub sf_source: SurfaceFormSource,
    /// Prazo da fase de votação; `None` desliga o prazo
    pub voting_deadline_ms: Option<u64>,
    /// Vota em paralelo (rayon) por par (menção, entidade)
    pub parallel_voting: bool,
    pub server: ServerConfig,
    /// Snapshot JSON das estatísticas; ausente usa o store de demonstração
    pub stats_path: Option<PathBuf>,
}

impl Default for LinkerConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            commonness_floor: 0.001,
            max_mention_tokens: 6,
            min_anchor_occurrences: 2,
            sf_source: SurfaceFormSource::Wiki,
            voting_deadline_ms: None,
            parallel_voting: true,
            server: ServerConfig::default(),
            stats_path: None,
        }
    }
}

impl LinkerConfig {
    /// Carrega a configuração de um arquivo YAML
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| LinkError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_yaml(&content)
    }

    /// Carrega a configuração de uma string YAML
    pub fn from_yaml(content: &str) -> Result<Self> {
        let config: LinkerConfig =
            serde_yaml::from_str(content).map_err(|e| LinkError::Config(e.to_string()))?;
        config.thresholds.validate()?;
        if !(0.0..=1.0).contains(&config.commonness_floor) {
            return Err(LinkError::Config(format!(
                "commonness_floor fora de [0, 1]: {}",
                config.commonness_floor
            )));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = LinkerConfig::default();
        assert_eq!(cfg.thresholds.rho_th, 0.20);
        assert_eq!(cfg.thresholds.k_th, 0.3);
        assert_eq!(cfg.commonness_floor, 0.001);
        assert_eq!(cfg.max_mention_tokens, 6);
        assert_eq!(cfg.sf_source, SurfaceFormSource::Wiki);
    }

    #[test]
    fn test_parse_partial_yaml() {
        let yaml = r#"
thresholds:
  rho_th: 0.1
sf_source: facc
voting_deadline_ms: 500
server:
  bind_addr: "127.0.0.1:8080"
"#;
        let cfg = LinkerConfig::from_yaml(yaml).unwrap();
        assert_eq!(cfg.thresholds.rho_th, 0.1);
        // campos ausentes ficam no padrão
        assert_eq!(cfg.thresholds.cmn_th, 0.02);
        assert_eq!(cfg.sf_source, SurfaceFormSource::Facc);
        assert_eq!(cfg.voting_deadline_ms, Some(500));
        assert_eq!(cfg.server.bind_addr, "127.0.0.1:8080");
    }

    #[test]
    fn test_yaml_with_invalid_threshold_is_rejected() {
        let err = LinkerConfig::from_yaml("thresholds:\n  k_th: 1.5\n").unwrap_err();
        assert!(matches!(err, LinkError::InvalidThreshold { name: "k_th", .. }));
    }

    #[test]
    fn test_overrides() {
        let base = Thresholds::default();
        let merged = base
            .with_overrides(&ThresholdOverrides {
                rho_th: Some(0.5),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(merged.rho_th, 0.5);
        assert_eq!(merged.link_prob_th, base.link_prob_th);
    }

    #[test]
    fn test_invalid_overrides() {
        let base = Thresholds::default();
        let nan = ThresholdOverrides {
            cmn_th: Some(f64::NAN),
            ..Default::default()
        };
        assert!(matches!(
            base.with_overrides(&nan),
            Err(LinkError::InvalidThreshold { name: "cmn_th", .. })
        ));
        let negative = ThresholdOverrides {
            rho_th: Some(-0.1),
            ..Default::default()
        };
        assert!(base.with_overrides(&negative).is_err());
    }

    #[test]
    fn test_override_alias_from_json() {
        let o: ThresholdOverrides = serde_json::from_str(r#"{"lnk_prob_th": 0.2}"#).unwrap();
        assert_eq!(o.link_prob_th, Some(0.2));
    }
}
