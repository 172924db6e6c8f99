//! Descoberta do slot de saldos de um token.
//!
//! Os candidatos vêm das constantes do bytecode. Para cada candidato é
//! calculado o slot de mapping do endereço sentinela, e o conjunto calculado é
//! cruzado com as chaves lidas (`SLOAD`) durante um `balanceOf` rastreado.

use ethers::types::{Address, H256, U256};
use honeypot_bytecode::{minimal_proxy_target, scan_code, BytecodeScan, ScanError};
use honeypot_core::utils::{h256_to_u256, keccak256};
use tracing::{debug, info};

use crate::contracts::{build_tx, function};
use crate::errors::Result;
use crate::traits::{ChainClient, SandboxBackend};

/// Slot de mapping Solidity: `keccak256(pad32(owner) ++ pad32(slot))`
pub fn mapping_slot(owner: Address, candidate: H256) -> H256 {
    let mut buf = [0u8; 64];
    buf[12..32].copy_from_slice(owner.as_bytes());
    buf[32..].copy_from_slice(candidate.as_bytes());
    H256(keccak256(&buf))
}

/// Chaves de storage lidas durante a transação `tx_hash`
pub async fn discover_used_slots<S>(sandbox: &S, tx_hash: H256) -> Result<Vec<H256>>
where
    S: SandboxBackend + ?Sized,
{
    sandbox.trace_transaction(tx_hash).await?.sload_keys()
}

/// Elementos de `computed` presentes em `used`, na ordem de `computed`
pub fn intersect(computed: &[H256], used: &[H256]) -> Vec<H256> {
    computed
        .iter()
        .filter(|slot| used.contains(slot))
        .copied()
        .collect()
}

/// Resultado da descoberta de slots de um token
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SlotDiscovery {
    /// Constantes candidatas, na ordem do bytecode
    pub candidates: Vec<H256>,
    /// Slots de mapping do sentinela efetivamente lidos
    pub matched: Vec<H256>,
}

impl SlotDiscovery {
    pub fn from_traces(owner: Address, candidates: Vec<H256>, used: &[H256]) -> Self {
        let computed: Vec<H256> = candidates.iter().map(|c| mapping_slot(owner, *c)).collect();
        let matched = intersect(&computed, used);
        Self { candidates, matched }
    }

    /// Mais de um slot casado indica saldo escalado por reflexão
    pub fn is_reflection(&self) -> bool {
        self.matched.len() > 1
    }

    /// O último slot casado é tratado como o slot de saldos
    pub fn balance_slot(&self) -> Option<H256> {
        self.matched.last().copied()
    }
}

/// Analisa o código implantado em `token`, seguindo proxies mínimos
pub async fn scan_target<C>(client: &C, token: Address) -> Result<BytecodeScan>
where
    C: ChainClient + ?Sized,
{
    let code = client.get_code(token).await?;
    if code.is_empty() {
        return Err(ScanError::EmptyCode.into());
    }
    let code = match minimal_proxy_target(&code) {
        Some(implementation) => {
            debug!(?token, ?implementation, "proxy mínimo detectado");
            client.get_code(implementation).await?
        }
        None => code,
    };
    Ok(scan_code(&code))
}

/// Rastreia um `balanceOf(sentinela)` e cruza as chaves lidas com os candidatos
pub async fn discover<S>(sandbox: &S, token: Address, scan: &BytecodeScan) -> Result<SlotDiscovery>
where
    S: SandboxBackend + ?Sized,
{
    let owner = sandbox.sentinel();
    let data = function("balanceOf(address) view returns (uint256)")?
        .encode_input(&[ethers::abi::Token::Address(owner)])?;
    let receipt = sandbox
        .send_transaction(&build_tx(Some(owner), Some(token), data, None, None))
        .await?;

    let used = discover_used_slots(sandbox, receipt.transaction_hash).await?;
    let discovery = SlotDiscovery::from_traces(owner, scan.storage_slots.clone(), &used);
    info!(
        ?token,
        candidates = discovery.candidates.len(),
        used = used.len(),
        matched = discovery.matched.len(),
        reflection = discovery.is_reflection(),
        "descoberta de slots concluída"
    );
    Ok(discovery)
}

/// Valores não nulos dos slots candidatos de um contrato
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateValues {
    pub values: Vec<(H256, H256)>,
    /// Valores com formato de endereço (20 bytes significativos)
    pub addresses: Vec<Address>,
}

fn as_address(value: H256) -> Option<Address> {
    let word = h256_to_u256(value);
    let lower = U256::one() << 152;
    let upper = U256::one() << 160;
    (word >= lower && word < upper).then(|| Address::from_slice(&value.as_bytes()[12..]))
}

/// Lê cada slot candidato de `address` e devolve os não nulos
pub async fn read_candidate_slots<C>(
    client: &C,
    address: Address,
    candidates: &[H256],
) -> Result<CandidateValues>
where
    C: ChainClient + ?Sized,
{
    let mut out = CandidateValues::default();
    for slot in candidates {
        let value = client.get_storage_at(address, *slot).await?;
        if value.is_zero() {
            continue;
        }
        if let Some(found) = as_address(value) {
            if !out.addresses.contains(&found) {
                out.addresses.push(found);
            }
        }
        out.values.push((*slot, value));
    }
    Ok(out)
}
