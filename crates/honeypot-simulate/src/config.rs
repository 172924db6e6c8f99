//! Parâmetros da simulação

use ethers::types::{Address, Bytes, U256};
use ethers::utils::parse_ether;

/// Constantes de uma rodada de simulação.
///
/// Valores em wei, exceto quando indicado. O `Default` reproduz o protocolo
/// usado em produção.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Blocos minerados antes do primeiro passo no protocolo V1
    pub v1_mine_blocks: u64,
    /// Blocos minerados antes do primeiro passo no protocolo V2
    pub v2_mine_blocks: u64,
    /// Ativo nativo depositado como ativo de cotação embrulhado (V1)
    pub wrap_amount: U256,
    /// Entrada de cada compra no protocolo V1
    pub v1_buy_amount: U256,
    /// Valor nativo enviado ao roteador de trânsito em cada compra (V2)
    pub v2_buy_amount: U256,
    pub v1_gas_limit: U256,
    pub v2_gas_limit: U256,
    /// Supply sintético, em unidades inteiras do token (sem decimais)
    pub synthetic_supply_units: u64,
    /// Ativo nativo adicionado como liquidez no bootstrap
    pub liquidity_value: U256,
    /// Segundos somados ao relógio atual para o deadline do roteador
    pub deadline_secs: i64,
    /// Creation code do roteador de trânsito (obrigatório no V2)
    pub transit_router_bytecode: Option<Bytes>,
    /// Ativo de cotação do V1; sem valor, o nativo embrulhado da rede
    pub quote_asset: Option<Address>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            v1_mine_blocks: 500,
            v2_mine_blocks: 250,
            wrap_amount: ether(5000),
            v1_buy_amount: U256::exp10(12),
            v2_buy_amount: ether(1),
            v1_gas_limit: U256::from(3_000_000u64),
            v2_gas_limit: U256::from(7_000_000u64),
            synthetic_supply_units: 500_000_000,
            liquidity_value: ether(100),
            deadline_secs: 3600 * 24,
            transit_router_bytecode: None,
            quote_asset: None,
        }
    }
}

impl SimulationConfig {
    pub fn with_transit_router(mut self, bytecode: Bytes) -> Self {
        self.transit_router_bytecode = Some(bytecode);
        self
    }

    pub fn with_quote_asset(mut self, quote: Address) -> Self {
        self.quote_asset = Some(quote);
        self
    }

    /// Ativo de cotação efetivo para uma rede
    pub fn quote_for(&self, wrapped_native: Address) -> Address {
        self.quote_asset.unwrap_or(wrapped_native)
    }

    /// Supply sintético em unidades mínimas para um token com `decimals`
    pub fn synthetic_supply(&self, decimals: u8) -> U256 {
        U256::from(self.synthetic_supply_units) * U256::exp10(decimals as usize)
    }

    /// Deadline absoluto para chamadas ao roteador
    pub fn deadline(&self) -> U256 {
        let now = chrono::Utc::now().timestamp();
        U256::from(now.saturating_add(self.deadline_secs).max(0) as u64)
    }
}

fn ether(amount: u64) -> U256 {
    parse_ether(amount).unwrap_or_else(|_| U256::from(amount) * U256::exp10(18))
}
