use crate::core::currency::CurrencyCode;
use crate::core::rates::Multipliers;
use anyhow::{Context, Result, bail};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::{fs, path::PathBuf};
use tracing::debug;

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct MultiplierConfig {
    pub from: CurrencyCode,
    pub to: CurrencyCode,
    pub factor: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

/// Direct rates given by hand, relative to `reference`.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FixedProviderConfig {
    pub reference: CurrencyCode,
    pub rates: BTreeMap<CurrencyCode, f64>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ProvidersConfig {
    pub yahoo: Option<YahooProviderConfig>,
    pub fixed: Option<FixedProviderConfig>,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        ProvidersConfig {
            yahoo: Some(YahooProviderConfig {
                base_url: "https://query1.finance.yahoo.com".to_string(),
            }),
            fixed: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub currencies: Vec<CurrencyCode>,
    pub reference: Option<CurrencyCode>,
    #[serde(default)]
    pub multipliers: Vec<MultiplierConfig>,
    #[serde(default)]
    pub providers: ProvidersConfig,
    pub data_path: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "xrate", "xrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_data_path(&self) -> Result<PathBuf> {
        if let Some(custom_path) = &self.data_path {
            return Ok(PathBuf::from(custom_path));
        }
        let proj_dirs = ProjectDirs::from("io", "xrate", "xrate")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.data_dir().to_path_buf())
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config = Self::from_yaml(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for m in &self.multipliers {
            if !(m.factor.is_finite() && m.factor > 0.0) {
                bail!(
                    "Multiplier for {}/{} must be positive, got {}",
                    m.from,
                    m.to,
                    m.factor
                );
            }
        }
        if let Some(fixed) = &self.providers.fixed {
            for (code, rate) in &fixed.rates {
                if !(rate.is_finite() && *rate > 0.0) {
                    bail!(
                        "Fixed rate for {}/{} must be positive, got {}",
                        fixed.reference,
                        code,
                        rate
                    );
                }
            }
        }
        Ok(())
    }

    pub fn multipliers(&self) -> Multipliers {
        self.multipliers
            .iter()
            .map(|m| (m.from.clone(), m.to.clone(), m.factor))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(c: &str) -> CurrencyCode {
        c.parse().unwrap()
    }

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
currencies: [eur, USD, CAD]
reference: EUR
multipliers:
  - from: USD
    to: EUR
    factor: 1.1
  - from: cad
    to: eur
    factor: 1.2
"#;

        let config = AppConfig::from_yaml(yaml_str).expect("Failed to deserialize");
        assert_eq!(
            config.currencies,
            vec![code("EUR"), code("USD"), code("CAD")]
        );
        assert_eq!(config.reference, Some(code("EUR")));
        assert_eq!(config.multipliers.len(), 2);
        assert_eq!(config.multipliers[1].from, code("CAD"));

        let multipliers = config.multipliers();
        assert_eq!(multipliers.factor(&code("USD"), &code("EUR")), 1.1);
        assert_eq!(multipliers.factor(&code("CAD"), &code("EUR")), 1.2);
        assert_eq!(multipliers.factor(&code("EUR"), &code("CAD")), 1.0);

        // Providers default to yahoo when omitted
        assert_eq!(
            config.providers.yahoo.as_ref().unwrap().base_url,
            "https://query1.finance.yahoo.com"
        );
        assert!(config.providers.fixed.is_none());
        assert!(config.data_path.is_none());
    }

    #[test]
    fn test_config_with_providers() {
        let yaml_str = r#"
currencies: [EUR, USD]
providers:
  yahoo:
    base_url: "http://example.com/yahoo"
  fixed:
    reference: EUR
    rates:
      USD: 1.42
      CAD: 1.12
data_path: /tmp/xrate
"#;
        let config = AppConfig::from_yaml(yaml_str).unwrap();
        assert_eq!(
            config.providers.yahoo.as_ref().unwrap().base_url,
            "http://example.com/yahoo"
        );
        let fixed = config.providers.fixed.as_ref().unwrap();
        assert_eq!(fixed.reference, code("EUR"));
        assert_eq!(fixed.rates.get(&code("CAD")), Some(&1.12));
        assert!(config.multipliers.is_empty());
        assert_eq!(
            config.default_data_path().unwrap(),
            PathBuf::from("/tmp/xrate")
        );
    }

    #[test]
    fn test_non_positive_multiplier_is_rejected() {
        let yaml_str = r#"
currencies: [EUR, USD]
multipliers:
  - from: USD
    to: EUR
    factor: 0
"#;
        let err = AppConfig::from_yaml(yaml_str).unwrap_err();
        assert!(err.to_string().contains("must be positive"));
    }

    #[test]
    fn test_unknown_code_shape_is_rejected() {
        let yaml_str = "currencies: [EURO]\n";
        assert!(AppConfig::from_yaml(yaml_str).is_err());
    }

    #[test]
    fn test_load_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load_from_path(dir.path().join("missing.yaml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
