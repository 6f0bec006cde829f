use super::PersistenceStore;
use crate::error::BotError;
use crate::models::{BalanceState, Position};
use crate::Result;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// JSON file store
///
/// Layout:
/// - `positions.json`: array of positions, oldest first
/// - `simulated_balances.json`: `{ "fiat": "...", "crypto": "..." }`
///
/// Every write goes to `<file>.tmp` first and is then renamed over the target.
pub struct JsonFileStore {
    positions_path: PathBuf,
    balances_path: PathBuf,
    initial_balances: BalanceState,
}

impl JsonFileStore {
    pub fn new(
        positions_path: impl Into<PathBuf>,
        balances_path: impl Into<PathBuf>,
        initial_balances: BalanceState,
    ) -> Self {
        Self {
            positions_path: positions_path.into(),
            balances_path: balances_path.into(),
            initial_balances,
        }
    }

    pub fn positions_path(&self) -> &Path {
        &self.positions_path
    }

    pub fn balances_path(&self) -> &Path {
        &self.balances_path
    }

    /// Read and decode a file, `None` if it does not exist
    async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
        let raw = match tokio::fs::read_to_string(path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(BotError::Persistence(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&raw).map(Some).map_err(|e| {
            BotError::Persistence(format!("Corrupt file {}: {}", path.display(), e))
        })
    }

    async fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let body = serde_json::to_string_pretty(value)?;
        let tmp_path = tmp_path_for(path);

        // Contents must be durable before the rename makes them visible
        let write_tmp = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(body.as_bytes()).await?;
            file.sync_all().await
        };
        write_tmp.await.map_err(|e: std::io::Error| {
            BotError::Persistence(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        tokio::fs::rename(&tmp_path, path).await.map_err(|e| {
            BotError::Persistence(format!(
                "Failed to move {} into place: {}",
                tmp_path.display(),
                e
            ))
        })?;

        Ok(())
    }
}

fn tmp_path_for(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    PathBuf::from(name)
}

#[async_trait]
impl PersistenceStore for JsonFileStore {
    async fn load_positions(&self) -> Result<Vec<Position>> {
        let positions = Self::read_json::<Vec<Position>>(&self.positions_path)
            .await?
            .unwrap_or_default();

        tracing::debug!(
            "Loaded {} positions from {}",
            positions.len(),
            self.positions_path.display()
        );
        Ok(positions)
    }

    async fn save_positions(&self, positions: &[Position]) -> Result<()> {
        Self::write_json_atomic(&self.positions_path, positions).await?;
        tracing::debug!(
            "Saved {} positions to {}",
            positions.len(),
            self.positions_path.display()
        );
        Ok(())
    }

    async fn load_simulated_balances(&self) -> Result<BalanceState> {
        if let Some(balances) = Self::read_json::<BalanceState>(&self.balances_path).await? {
            return Ok(balances);
        }

        tracing::info!(
            "📂 No simulated balances at {}, initializing fiat={} crypto={}",
            self.balances_path.display(),
            self.initial_balances.fiat_balance,
            self.initial_balances.crypto_balance
        );
        self.save_simulated_balances(&self.initial_balances).await?;
        Ok(self.initial_balances)
    }

    async fn save_simulated_balances(&self, balances: &BalanceState) -> Result<()> {
        Self::write_json_atomic(&self.balances_path, balances).await
    }
}
