use tracing::debug;

use crate::errors::CoreError;
use crate::models::history::SimulationHistory;

use super::format;

/// High-level storage operations: save/load the simulation history to/from
/// snapshot bytes or files.
pub struct StorageManager;

impl StorageManager {
    /// Serialize the history to snapshot bytes (portable, platform-independent).
    ///
    /// Flow: SimulationHistory → bincode → ISIM format bytes
    pub fn save_to_bytes(history: &SimulationHistory) -> Result<Vec<u8>, CoreError> {
        let payload = bincode::serialize(history)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize history: {e}")))?;
        debug!(bytes = payload.len(), "serialized simulation history");
        Ok(format::write_file(format::CURRENT_VERSION, &payload))
    }

    /// Deserialize the history from snapshot bytes.
    pub fn load_from_bytes(data: &[u8]) -> Result<SimulationHistory, CoreError> {
        let (header, payload) = format::read_file(data)?;
        let history: SimulationHistory = bincode::deserialize(payload)
            .map_err(|e| CoreError::Deserialization(format!("Failed to deserialize history: {e}")))?;
        debug!(version = header.version, bytes = header.payload_len, "loaded simulation history");
        Ok(history)
    }

    /// Save the history to a snapshot file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save_to_file(history: &SimulationHistory, path: &str) -> Result<(), CoreError> {
        let bytes = Self::save_to_bytes(history)?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load the history from a snapshot file on disk (native only).
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_from_file(path: &str) -> Result<SimulationHistory, CoreError> {
        let bytes = std::fs::read(path)?;
        Self::load_from_bytes(&bytes)
    }
}
