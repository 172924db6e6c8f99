use async_trait::async_trait;
use ethers::types::{
    transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt, H256, U256,
};
use honeypot_core::NetworkProfile;

use crate::errors::Result;
use crate::trace::ExecutionTrace;

/// Cliente de chain consumido pela simulação
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Executa uma chamada somente leitura
    async fn call(&self, tx: &TypedTransaction) -> Result<Bytes>;

    /// Envia uma transação e aguarda o recibo
    async fn send_transaction(&self, tx: &TypedTransaction) -> Result<TransactionReceipt>;

    /// Obtém o código implantado em um endereço
    async fn get_code(&self, address: Address) -> Result<Bytes>;

    /// Lê um slot de storage
    async fn get_storage_at(&self, address: Address, slot: H256) -> Result<H256>;

    /// Saldo nativo de uma conta
    async fn get_balance(&self, address: Address) -> Result<U256>;

    /// Preço de gas corrente
    async fn gas_price(&self) -> Result<U256>;
}

/// Operações administrativas sobre um fork isolado
#[async_trait]
pub trait SandboxBackend: ChainClient {
    /// Identificador da sessão
    fn id(&self) -> String;

    /// As duas contas financiadas da simulação (principal, trânsito)
    fn wallets(&self) -> (Address, Address);

    /// Conta sentinela desbloqueada para chamadas administrativas
    fn sentinel(&self) -> Address;

    /// Avança `blocks` blocos e o tempo proporcionalmente
    async fn mine(&self, blocks: u64) -> Result<()>;

    /// Escreve diretamente um valor no storage de um contrato
    async fn set_storage(&self, address: Address, slot: H256, value: U256) -> Result<()>;

    /// Permite enviar transações em nome de `address`
    async fn unlock_account(&self, address: Address) -> Result<()>;

    /// Revoga o desbloqueio de `address`
    async fn lock_account(&self, address: Address) -> Result<()>;

    /// Trace em nível de instrução de uma transação
    async fn trace_transaction(&self, tx_hash: H256) -> Result<ExecutionTrace>;

    /// Libera o sandbox
    async fn destroy(&self);
}

/// Fábrica de sandboxes
#[async_trait]
pub trait SandboxProvider: Send + Sync {
    type Sandbox: SandboxBackend;

    /// Cria um fork no topo da chain descrita por `profile`
    async fn create_sandbox(&self, profile: &NetworkProfile) -> Result<Self::Sandbox>;
}
