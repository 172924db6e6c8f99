/*!
 * Perfis de rede
 *
 * Configuração estática por chain. O registro é construído uma única vez na
 * inicialização e passado por referência aos componentes.
 */

use ethereum_types::Address;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::utils::hex_to_address;

/// Conta sentinela (burn) usada para chamadas administrativas no sandbox
pub const SENTINEL_ADDRESS: &str = "0x000000000000000000000000000000000000dead";

/// Prefixo das variáveis de ambiente que sobrescrevem o RPC de uma rede
pub const RPC_ENV_PREFIX: &str = "HONEYPOT_RPC_";

/// Retorna o endereço sentinela
pub fn sentinel_address() -> Address {
    Address::from_low_u64_be(0xdead)
}

/// Configuração estática de uma chain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkProfile {
    pub name: String,
    pub chain_id: u64,
    pub rpc: String,
    /// Ativo nativo embrulhado (WETH, WBNB, ...)
    pub wrapped_native: Address,
    pub router: Address,
    pub factory: Address,
    #[serde(default = "default_burn_addresses")]
    pub burn_addresses: Vec<Address>,
    #[serde(default)]
    pub lockers: BTreeMap<String, Address>,
}

fn default_burn_addresses() -> Vec<Address> {
    let mut burn = vec![sentinel_address()];
    burn.extend((0u64..=7).map(Address::from_low_u64_be));
    burn
}

/// Registro imutável de perfis de rede
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetworkRegistry {
    networks: BTreeMap<String, NetworkProfile>,
}

impl NetworkRegistry {
    pub fn new(profiles: impl IntoIterator<Item = NetworkProfile>) -> Self {
        Self {
            networks: profiles
                .into_iter()
                .map(|p| (p.name.clone(), p))
                .collect(),
        }
    }

    /// Perfis embutidos (RPC precisa ser configurado via ambiente ou arquivo)
    pub fn builtin() -> Result<Self> {
        let table = [
            (
                "ethereum",
                1u64,
                "0xc02aaa39b223fe8d0a0e5c4f27ead9083c756cc2",
                "0x7a250d5630b4cf539739df2c5dacb4c659f2488d",
                "0x5c69bee701ef814a2b6a3edd4b1652cb9cc5aa6f",
            ),
            (
                "bsc",
                56,
                "0xbb4cdb9cbd36b01bd1cbaebf2de08d9173bc095c",
                "0x10ed43c718714eb63d5aa57b78b54704e256024e",
                "0xca143ce32fe78f1f7019d7d551a6402fc5350c73",
            ),
            (
                "base",
                8453,
                "0x4200000000000000000000000000000000000006",
                "0x327df1e6de05895d2ab08513aadd9313fe505d86",
                "0xfda619b6d20975be80a10332cd39b9a4b0faa8bb",
            ),
            (
                "avalanche",
                43114,
                "0xb31f66aa3c1e785363f0875a1b74e27b85fd66c7",
                "0x60ae616a2155ee3d9a68541ba4544862310933d4",
                "0x9ad6c38be94206ca50bb0d90783181662f0cfa10",
            ),
            (
                "fantom",
                250,
                "0x21be370d5312f44cb42ce377bc9b8a0cef1a4c83",
                "0xf491e7b69e4244ad4002bc14e878a34207e38c29",
                "0x152ee697f2e276fa89e96742e9bb9ab1f2e61be3",
            ),
        ];

        let mut profiles = Vec::with_capacity(table.len());
        for (name, chain_id, wrapped, router, factory) in table {
            profiles.push(NetworkProfile {
                name: name.to_string(),
                chain_id,
                rpc: String::new(),
                wrapped_native: parse_address(wrapped)?,
                router: parse_address(router)?,
                factory: parse_address(factory)?,
                burn_addresses: default_burn_addresses(),
                lockers: BTreeMap::new(),
            });
        }
        Ok(Self::new(profiles))
    }

    /// Carrega perfis a partir de um JSON (lista de perfis)
    pub fn from_json_str(json: &str) -> Result<Self> {
        let profiles: Vec<NetworkProfile> =
            serde_json::from_str(json).map_err(|e| Error::ConfigError(e.to_string()))?;
        Ok(Self::new(profiles))
    }

    /// Carrega perfis a partir de um arquivo JSON
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    /// Aplica `HONEYPOT_RPC_<NOME>` sobre o RPC de cada perfil
    pub fn with_env_overrides(self) -> Self {
        self.with_rpc_overrides(|name| {
            std::env::var(format!("{}{}", RPC_ENV_PREFIX, name.to_uppercase())).ok()
        })
    }

    /// Sobrescreve RPCs a partir de uma função de consulta
    pub fn with_rpc_overrides<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        for (name, profile) in self.networks.iter_mut() {
            if let Some(rpc) = lookup(name) {
                debug!(network = %name, "rpc sobrescrito pelo ambiente");
                profile.rpc = rpc;
            }
        }
        self
    }

    /// Obtém o perfil de uma rede, exigindo RPC configurado
    pub fn get(&self, name: &str) -> Result<&NetworkProfile> {
        let profile = self
            .networks
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("rede {}", name)))?;
        if profile.rpc.is_empty() {
            return Err(Error::ConfigError(format!("rede {} sem rpc configurado", name)));
        }
        Ok(profile)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.networks.keys().map(String::as_str)
    }
}

fn parse_address(raw: &str) -> Result<Address> {
    hex_to_address(raw).ok_or_else(|| Error::DecodeError(format!("endereço inválido: {}", raw)))
}
