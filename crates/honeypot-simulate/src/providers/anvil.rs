use std::time::Duration;

use async_trait::async_trait;
use ethers::core::rand::thread_rng;
use ethers::providers::{Http, Middleware, Provider, ProviderError, RpcError};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt, H256, U256, U64,
};
use ethers::utils::{parse_ether, Anvil, AnvilInstance};
use honeypot_core::{sentinel_address, utils::u256_to_h256, NetworkProfile};
use serde_json::json;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::{
    errors::{panic_message, Result, SimulationError},
    trace::ExecutionTrace,
    traits::{ChainClient, SandboxBackend, SandboxProvider},
};

/// Opções de inicialização do Anvil
#[derive(Debug, Clone)]
pub struct AnvilOptions {
    /// Saldo nativo das contas da simulação, em ether
    pub wallet_balance_ether: u64,
    /// Segundos avançados por bloco minerado
    pub seconds_per_block: u64,
    /// Limite de gas por bloco
    pub block_gas_limit: u64,
    /// Tempo máximo de espera pelo processo, em milissegundos
    pub spawn_timeout_ms: u64,
}

impl Default for AnvilOptions {
    fn default() -> Self {
        Self {
            wallet_balance_ether: 10_000,
            seconds_per_block: 5,
            block_gas_limit: 50_000_000,
            spawn_timeout_ms: 30_000,
        }
    }
}

/// Sandbox de simulação sobre um fork do Anvil
pub struct AnvilSandbox {
    pub id: Uuid,
    provider: Provider<Http>,
    anvil: Mutex<Option<AnvilInstance>>,
    wallets: (Address, Address),
    sentinel: Address,
    seconds_per_block: u64,
}

impl AnvilSandbox {
    async fn ensure_open(&self) -> Result<()> {
        if self.anvil.lock().await.is_none() {
            warn!(session = %self.id, "tentativa de uso de sessao encerrada");
            return Err(SimulationError::SessionClosed);
        }
        Ok(())
    }

    async fn request<T, R>(&self, method: &str, params: T) -> Result<R>
    where
        T: std::fmt::Debug + serde::Serialize + Send + Sync,
        R: serde::Serialize + serde::de::DeserializeOwned + std::fmt::Debug + Send,
    {
        self.ensure_open().await?;
        self.provider
            .request(method, params)
            .await
            .map_err(|e| SimulationError::Rpc(format!("{}: {}", method, provider_message(&e))))
    }

    async fn set_balance(&self, address: Address, amount: U256) -> Result<()> {
        self.request::<_, ()>("anvil_setBalance", (address, amount)).await
    }
}

/// Mensagem do erro JSON-RPC, quando houver, para preservar o motivo do revert
fn provider_message(e: &ProviderError) -> String {
    e.as_error_response()
        .map(|r| r.message.clone())
        .unwrap_or_else(|| e.to_string())
}

#[async_trait]
impl ChainClient for AnvilSandbox {
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes> {
        self.ensure_open().await?;
        self.provider
            .call(tx, None)
            .await
            .map_err(|e| SimulationError::Rpc(provider_message(&e)))
    }

    async fn send_transaction(&self, tx: &TypedTransaction) -> Result<TransactionReceipt> {
        self.ensure_open().await?;

        // eth_call antes do envio para obter o motivo do revert
        if let Err(e) = self.provider.call(tx, None).await {
            return Err(SimulationError::SendTransaction(provider_message(&e)));
        }

        let pending = self
            .provider
            .send_transaction(tx.clone(), None)
            .await
            .map_err(|e| SimulationError::SendTransaction(provider_message(&e)))?;

        let receipt = pending
            .await
            .map_err(|e| SimulationError::AwaitTransaction(provider_message(&e)))?
            .ok_or_else(|| SimulationError::AwaitTransaction("sem recibo".into()))?;

        if receipt.status == Some(U64::zero()) {
            return Err(SimulationError::TransactionReverted(receipt.transaction_hash));
        }
        Ok(receipt)
    }

    async fn get_code(&self, address: Address) -> Result<Bytes> {
        self.ensure_open().await?;
        self.provider
            .get_code(address, None)
            .await
            .map_err(|e| SimulationError::Rpc(provider_message(&e)))
    }

    async fn get_storage_at(&self, address: Address, slot: H256) -> Result<H256> {
        self.ensure_open().await?;
        self.provider
            .get_storage_at(address, slot, None)
            .await
            .map_err(|e| SimulationError::Rpc(provider_message(&e)))
    }

    async fn get_balance(&self, address: Address) -> Result<U256> {
        self.ensure_open().await?;
        self.provider
            .get_balance(address, None)
            .await
            .map_err(|e| SimulationError::Rpc(provider_message(&e)))
    }

    async fn gas_price(&self) -> Result<U256> {
        self.ensure_open().await?;
        self.provider
            .get_gas_price()
            .await
            .map_err(|e| SimulationError::Rpc(provider_message(&e)))
    }
}

#[async_trait]
impl SandboxBackend for AnvilSandbox {
    fn id(&self) -> String {
        self.id.to_string()
    }

    fn wallets(&self) -> (Address, Address) {
        self.wallets
    }

    fn sentinel(&self) -> Address {
        self.sentinel
    }

    async fn mine(&self, blocks: u64) -> Result<()> {
        debug!(session = %self.id, blocks, "minerando blocos");
        self.request::<_, ()>(
            "anvil_mine",
            (U256::from(blocks), U256::from(self.seconds_per_block)),
        )
        .await
    }

    async fn set_storage(&self, address: Address, slot: H256, value: U256) -> Result<()> {
        debug!(session = %self.id, ?address, ?slot, %value, "escrevendo storage");
        let _: bool = self
            .request("anvil_setStorageAt", (address, slot, u256_to_h256(value)))
            .await?;
        Ok(())
    }

    async fn unlock_account(&self, address: Address) -> Result<()> {
        self.request::<_, ()>("anvil_impersonateAccount", [address]).await
    }

    async fn lock_account(&self, address: Address) -> Result<()> {
        self.request::<_, ()>("anvil_stopImpersonatingAccount", [address])
            .await
    }

    async fn trace_transaction(&self, tx_hash: H256) -> Result<ExecutionTrace> {
        let raw: serde_json::Value = self
            .request(
                "debug_traceTransaction",
                (tx_hash, json!({"disableMemory": true, "disableStack": true})),
            )
            .await
            .map_err(|e| SimulationError::Trace(e.to_string()))?;
        ExecutionTrace::from_value(raw)
    }

    async fn destroy(&self) {
        let mut guard = self.anvil.lock().await;
        match guard.take() {
            Some(anvil) => {
                drop(anvil);
                info!(session = %self.id, "sessao encerrada");
            }
            None => warn!(session = %self.id, "tentativa de encerrar sessao ja fechada"),
        }
    }
}

/// Provedor de sandboxes baseado no Anvil
#[derive(Debug, Clone, Default)]
pub struct AnvilProvider {
    pub options: AnvilOptions,
}

impl AnvilProvider {
    pub fn new(options: AnvilOptions) -> Self {
        Self { options }
    }

    /// O fork sempre usa HTTP, mesmo quando o perfil aponta para websocket
    fn normalize_rpc_url(endpoint: &str) -> String {
        match Url::parse(endpoint) {
            Ok(mut url) => {
                match url.scheme() {
                    "ws" => {
                        let _ = url.set_scheme("http");
                    }
                    "wss" => {
                        let _ = url.set_scheme("https");
                    }
                    _ => {}
                }
                url.to_string()
            }
            Err(_) => endpoint.to_string(),
        }
    }
}

#[async_trait]
impl SandboxProvider for AnvilProvider {
    type Sandbox = AnvilSandbox;

    async fn create_sandbox(&self, profile: &NetworkProfile) -> Result<Self::Sandbox> {
        let builder = Anvil::new()
            .fork(Self::normalize_rpc_url(&profile.rpc))
            .chain_id(profile.chain_id)
            .timeout(self.options.spawn_timeout_ms)
            .args([
                "--auto-impersonate".to_string(),
                "--steps-tracing".to_string(),
                "--disable-code-size-limit".to_string(),
                "--gas-limit".to_string(),
                self.options.block_gas_limit.to_string(),
            ]);

        // Anvil::spawn entra em pânico quando o processo falha
        let anvil = tokio::task::spawn_blocking(move || builder.spawn())
            .await
            .map_err(|e| {
                if e.is_panic() {
                    SimulationError::AnvilSpawn(panic_message(e.into_panic().as_ref()))
                } else {
                    SimulationError::AnvilSpawn(e.to_string())
                }
            })?;

        let provider = Provider::<Http>::try_from(anvil.endpoint())
            .map_err(|e| SimulationError::ProviderCreation(e.to_string()))?
            .interval(Duration::from_millis(1));

        // ThreadRng não é Send: precisa sair de escopo antes do primeiro await
        let (main, transit) = {
            let mut rng = thread_rng();
            (
                LocalWallet::new(&mut rng).address(),
                LocalWallet::new(&mut rng).address(),
            )
        };

        let sandbox = AnvilSandbox {
            id: Uuid::new_v4(),
            provider,
            anvil: Mutex::new(Some(anvil)),
            wallets: (main, transit),
            sentinel: sentinel_address(),
            seconds_per_block: self.options.seconds_per_block,
        };

        let balance = parse_ether(self.options.wallet_balance_ether)
            .map_err(|e| SimulationError::InvalidInput(e.to_string()))?;
        for account in [main, transit, sandbox.sentinel] {
            sandbox.set_balance(account, balance).await?;
        }
        sandbox.unlock_account(sandbox.sentinel).await?;

        info!(session = %sandbox.id, network = %profile.name, "sandbox criado");
        Ok(sandbox)
    }
}
