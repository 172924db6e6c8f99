/*!
 * Honeypot Types
 *
 * Tipos comuns usados em toda a workspace Honeypot
 */

use ethereum_types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::percentage;

/// Identidade do token sob teste
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub address: Address,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "decimal")]
    pub decimals: u8,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (0x{:x})", self.symbol, self.address)
    }
}

/// Resultado de uma simulação de compra/venda.
///
/// Quando algum passo falha apenas `is_sellable`, `failed_state` e
/// `error_message` são preenchidos.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulationResult {
    pub is_sellable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_tax: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub buy_gas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sell_gas: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transfer_error: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SimulationResult {
    /// Resultado de uma simulação interrompida no estado `state`
    pub fn failed(state: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            is_sellable: false,
            failed_state: Some(state.into()),
            error_message: Some(message.into()),
            ..Default::default()
        }
    }
}

/// Resumo do supply de um token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSupply {
    pub total_supply: U256,
    pub burned_supply: U256,
    pub circulating_supply: U256,
    /// Percentual queimado, uma casa decimal
    pub burned_rate: f64,
}

impl TokenSupply {
    pub fn new(total_supply: U256, burned_supply: U256) -> Self {
        let burned_supply = burned_supply.min(total_supply);
        let burned_rate = percentage(burned_supply, total_supply, 1).unwrap_or(0.0);
        Self {
            total_supply,
            burned_supply,
            circulating_supply: total_supply - burned_supply,
            burned_rate,
        }
    }
}
