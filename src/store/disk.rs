use crate::core::currency::CurrencyCode;
use crate::core::error::{RateError, Result};
use crate::core::rates::{RateStore, StoredRate};
use async_trait::async_trait;
use fjall::{Config, Keyspace, PartitionCreateOptions, PartitionHandle, PersistMode};
use std::path::Path;
use tracing::debug;

const RATES_PARTITION: &str = "rates";

/// Rate store persisted in a fjall partition. Keys are `FROM/TO`, values are
/// JSON encoded [`StoredRate`]s.
pub struct DiskRateStore {
    keyspace: Keyspace,
    partition: PartitionHandle,
}

impl DiskRateStore {
    pub fn open(path: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(path)?;

        let keyspace = Config::new(path).open()?;
        let partition =
            keyspace.open_partition(RATES_PARTITION, PartitionCreateOptions::default())?;
        debug!("Opened rate store at {}", path.display());
        Ok(Self {
            keyspace,
            partition,
        })
    }
}

fn pair_key(from: &CurrencyCode, to: &CurrencyCode) -> String {
    format!("{from}/{to}")
}

fn parse_pair_key(key: &[u8]) -> Option<(CurrencyCode, CurrencyCode)> {
    let key = std::str::from_utf8(key).ok()?;
    let (from, to) = key.split_once('/')?;
    Some((from.parse().ok()?, to.parse().ok()?))
}

#[async_trait]
impl RateStore for DiskRateStore {
    async fn set_rate(&self, from: &CurrencyCode, to: &CurrencyCode, rate: f64) -> Result<()> {
        let res: anyhow::Result<()> = (|| {
            let value = serde_json::to_vec(&StoredRate::now(rate))?;
            self.partition.insert(pair_key(from, to), value)?;
            self.keyspace.persist(PersistMode::Buffer)?;
            Ok(())
        })();
        res.map_err(|e| RateError::store_write(from, to, e))?;
        debug!("Rate PUT for {}/{}", from, to);
        Ok(())
    }

    async fn get_rate(&self, from: &CurrencyCode, to: &CurrencyCode) -> Result<Option<StoredRate>> {
        let res: anyhow::Result<Option<StoredRate>> = (|| {
            match self.partition.get(pair_key(from, to))? {
                Some(value) => Ok(Some(serde_json::from_slice(&value)?)),
                None => Ok(None),
            }
        })();
        res.map_err(|e| RateError::StoreRead(format!("{from}/{to}: {e}")))
    }

    async fn all_rates(&self) -> Result<Vec<(CurrencyCode, CurrencyCode, StoredRate)>> {
        let mut all = Vec::new();
        for item in self.partition.iter() {
            let (key, value) = item.map_err(|e| RateError::StoreRead(e.to_string()))?;
            let Some((from, to)) = parse_pair_key(&key) else {
                debug!("Skipping unreadable rate key {:?}", key);
                continue;
            };
            let stored: StoredRate = serde_json::from_slice(&value)
                .map_err(|e| RateError::StoreRead(format!("{from}/{to}: {e}")))?;
            all.push((from, to, stored));
        }
        all.sort_by(|a, b| (&a.0, &a.1).cmp(&(&b.0, &b.1)));
        Ok(all)
    }
}
