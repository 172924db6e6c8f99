use serde::Deserialize;
use std::collections::BTreeMap;

use ethers::types::H256;
use honeypot_core::utils::hex_to_h256;

use crate::errors::{Result, SimulationError};

/// Trace estruturado (struct logger) de uma transação
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionTrace {
    #[serde(default)]
    pub gas: u64,
    #[serde(default)]
    pub failed: bool,
    #[serde(default)]
    pub return_value: String,
    #[serde(default)]
    pub struct_logs: Vec<TraceStep>,
}

/// Um passo de execução do trace
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceStep {
    #[serde(default)]
    pub pc: u64,
    pub op: String,
    #[serde(default)]
    pub depth: u64,
    /// Snapshot do storage do contrato em execução neste passo
    #[serde(default)]
    pub storage: Option<BTreeMap<String, String>>,
}

impl ExecutionTrace {
    /// Interpreta a resposta JSON de `debug_traceTransaction`
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| SimulationError::Trace(e.to_string()))
    }

    /// Chaves do último snapshot de storage entre os passos `SLOAD`.
    ///
    /// O snapshot é cumulativo, então o último contém todas as chaves lidas.
    pub fn sload_keys(&self) -> Result<Vec<H256>> {
        let last = self
            .struct_logs
            .iter()
            .filter(|step| step.op == "SLOAD")
            .filter_map(|step| step.storage.as_ref())
            .last();
        let Some(storage) = last else {
            return Ok(Vec::new());
        };
        storage
            .keys()
            .map(|key| {
                hex_to_h256(key)
                    .ok_or_else(|| SimulationError::Trace(format!("chave de storage inválida: {}", key)))
            })
            .collect()
    }
}
