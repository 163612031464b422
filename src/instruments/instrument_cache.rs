use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::instruments::InstrumentProvider;
use crate::types::instrument::{Instrument, InstrumentId};

/// Largest precision a `Decimal` can carry.
const MAX_PRECISION: u32 = 28;

#[derive(Debug, Copy, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct InstrumentSpec {
    /// Decimal places of the venue's price increment.
    price_precision: u32,

    /// Decimal places of the venue's quantity increment.
    quantity_precision: u32,
}

impl InstrumentSpec {
    fn validate(&self) -> Result<()> {
        if self.price_precision > MAX_PRECISION {
            bail!("price_precision must be <= {MAX_PRECISION}");
        }
        if self.quantity_precision > MAX_PRECISION {
            bail!("quantity_precision must be <= {MAX_PRECISION}");
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct InstrumentsFile {
    instruments: HashMap<String, InstrumentSpec>,
}

/// Instrument metadata loaded from `instruments.yml`.
#[derive(Debug, Default)]
pub struct InstrumentCache {
    instruments: HashMap<InstrumentId, Instrument>,
}

static CACHE: OnceCell<InstrumentCache> = OnceCell::new();

impl InstrumentCache {
    pub const DEFAULT_FILE_NAME: &'static str = "instruments.yml";

    /// Loads the process-wide cache on first use; later calls return the same cache.
    pub fn load(path: impl AsRef<Path>) -> Result<&'static InstrumentCache> {
        let path = path.as_ref();

        CACHE.get_or_try_init(|| {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read instruments {}", path.display()))?;

            Self::from_yaml(&raw)
                .with_context(|| format!("failed to load instruments {}", path.display()))
        })
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        let file: InstrumentsFile =
            serde_yaml::from_str(raw).context("failed to parse instruments")?;

        if file.instruments.is_empty() {
            bail!("instruments must not be empty");
        }

        let mut instruments = HashMap::with_capacity(file.instruments.len());
        for (key, spec) in file.instruments {
            let id: InstrumentId = key.parse()?;
            spec.validate().with_context(|| format!("invalid instrument {key}"))?;

            let instrument =
                Instrument::new(id.clone(), spec.price_precision, spec.quantity_precision);
            instruments.insert(id, instrument);
        }

        Ok(Self { instruments })
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }
}

impl InstrumentProvider for InstrumentCache {
    fn instrument(&self, id: &InstrumentId) -> Option<Instrument> {
        self.instruments.get(id).cloned()
    }
}

impl InstrumentProvider for &'static InstrumentCache {
    fn instrument(&self, id: &InstrumentId) -> Option<Instrument> {
        (**self).instrument(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_yaml() {
        let yaml = r#"
instruments:
  XBT/USD.KRAKEN:
    price_precision: 1
    quantity_precision: 8
  ETH/USD.KRAKEN:
    price_precision: 2
    quantity_precision: 8
"#;
        let cache = InstrumentCache::from_yaml(yaml).unwrap();
        assert_eq!(cache.len(), 2);

        let instrument = cache
            .instrument(&InstrumentId::new("XBT/USD", "KRAKEN"))
            .unwrap();
        assert_eq!(instrument.price_precision(), 1);
        assert_eq!(instrument.quantity_precision(), 8);
    }

    #[test]
    fn test_lookup_is_case_insensitive_on_key() {
        let yaml = r#"
instruments:
  xbt/usd.kraken:
    price_precision: 1
    quantity_precision: 8
"#;
        let cache = InstrumentCache::from_yaml(yaml).unwrap();
        assert!(cache.instrument(&"XBT/USD.KRAKEN".parse().unwrap()).is_some());
    }

    #[test]
    fn test_missing_instrument() {
        let cache = InstrumentCache::default();
        assert!(cache.instrument(&InstrumentId::new("XBT/USD", "KRAKEN")).is_none());
    }

    #[test]
    fn test_rejects_empty_and_invalid() {
        assert!(InstrumentCache::from_yaml("instruments: {}").is_err());

        let yaml = r#"
instruments:
  XBTUSD:
    price_precision: 1
    quantity_precision: 8
"#;
        assert!(InstrumentCache::from_yaml(yaml).is_err());

        let yaml = r#"
instruments:
  XBT/USD.KRAKEN:
    price_precision: 40
    quantity_precision: 8
"#;
        assert!(InstrumentCache::from_yaml(yaml).is_err());
    }
}
