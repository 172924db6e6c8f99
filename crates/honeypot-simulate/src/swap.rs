//! Execução de swaps e extração de saída, imposto e custo de gas.

use std::collections::HashMap;

use ethers::abi::{AbiParser, Event, RawLog};
use ethers::types::{Address, Log, TransactionReceipt, H256, U256};
use honeypot_core::utils::{format_units_f64, hex_to_h256, percentage};
use once_cell::sync::Lazy;
use tracing::debug;

use crate::contracts::{erc20, router, TxOpts};
use crate::errors::{Result, SimulationError};
use crate::traits::ChainClient;

/// Evento emitido pelo roteador de trânsito com `(calculated, output)`
pub static TRANSIT_SWAP_TOPIC: Lazy<H256> = Lazy::new(|| {
    hex_to_h256("0x015fc8ee969fd902d9ebd12a31c54446400a2b512a405366fe14defd6081d220")
        .unwrap_or_default()
});

/// Evento emitido pelo roteador de trânsito com `(bfBalance, aftBalance)`
pub static TRANSIT_BALANCE_TOPIC: Lazy<H256> = Lazy::new(|| {
    hex_to_h256("0x740f7e210cf19d27b8ab2cec1ebb61687bdc5f38f8bd56f0c8e5d22ed71854db")
        .unwrap_or_default()
});

const PAIR_SWAP: &str = "Swap";
const WITHDRAWAL: &str = "Withdrawal";

fn build_event_map() -> HashMap<&'static str, (H256, Event)> {
    let mut map = HashMap::new();
    let mut parser = AbiParser::default();
    // Uniswap V2 pair
    if let Ok(ev) = parser.parse_event("event Swap(address indexed sender,uint256 amount0In,uint256 amount1In,uint256 amount0Out,uint256 amount1Out,address indexed to)") {
        map.insert(PAIR_SWAP, (ev.signature(), ev));
    }
    // WETH9
    if let Ok(ev) = parser.parse_event("event Withdrawal(address indexed src,uint256 wad)") {
        map.insert(WITHDRAWAL, (ev.signature(), ev));
    }
    map
}

static EVENTS: Lazy<HashMap<&'static str, (H256, Event)>> = Lazy::new(build_event_map);

fn decode(name: &str, log: &Log) -> Option<Vec<(String, ethers::abi::Token)>> {
    let (topic, event) = EVENTS.get(name)?;
    if log.topics.first() != Some(topic) {
        return None;
    }
    let raw = RawLog {
        topics: log.topics.clone(),
        data: log.data.to_vec(),
    };
    event
        .parse_log(raw)
        .ok()
        .map(|decoded| decoded.params.into_iter().map(|p| (p.name, p.value)).collect())
}

fn param(params: &[(String, ethers::abi::Token)], name: &str) -> Option<ethers::abi::Token> {
    params
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, value)| value.clone())
}

/// Saída efetiva de um swap a partir dos logs do recibo.
///
/// Procura o `Swap` do par cujo `sender`/`to` envolve o roteador e a carteira;
/// sem ele usa o último `Withdrawal` do ativo nativo embrulhado.
pub fn extract_output(logs: &[Log], wallet: Address, router: Address) -> Option<U256> {
    let swap = logs.iter().filter_map(|log| decode(PAIR_SWAP, log)).find(|params| {
        let parties = [
            param(params, "sender").and_then(|t| t.into_address()),
            param(params, "to").and_then(|t| t.into_address()),
        ];
        parties.contains(&Some(router)) && parties.contains(&Some(wallet))
    });

    if let Some(params) = swap {
        let amount1 = param(&params, "amount1Out").and_then(|t| t.into_uint())?;
        if !amount1.is_zero() {
            return Some(amount1);
        }
        return param(&params, "amount0Out").and_then(|t| t.into_uint());
    }

    logs.iter()
        .filter_map(|log| decode(WITHDRAWAL, log))
        .last()
        .and_then(|params| param(&params, "wad"))
        .and_then(|t| t.into_uint())
}

/// Valores reportados pelo roteador de trânsito
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouterLogs {
    pub calculated: U256,
    pub output: U256,
    pub balance_before: U256,
    pub balance_after: U256,
}

fn two_words(log: &Log) -> Option<(U256, U256)> {
    let data = log.data.as_ref();
    if data.len() < 64 {
        return None;
    }
    Some((
        U256::from_big_endian(&data[..32]),
        U256::from_big_endian(&data[32..64]),
    ))
}

/// Extrai os eventos de swap e saldo do roteador de trânsito
pub fn extract_router_logs(logs: &[Log]) -> Option<RouterLogs> {
    let find = |topic: &H256| logs.iter().find(|log| log.topics.contains(topic));
    let (calculated, output) = two_words(find(&*TRANSIT_SWAP_TOPIC)?)?;
    let (balance_before, balance_after) = two_words(find(&*TRANSIT_BALANCE_TOPIC)?)?;
    Some(RouterLogs { calculated, output, balance_before, balance_after })
}

/// `(calculated - output) / calculated * 100` com três casas.
///
/// Negativo quando a saída supera a cotação; `None` para cotação zero.
pub fn calculate_tax(calculated: U256, output: U256) -> Option<f64> {
    if output <= calculated {
        percentage(calculated - output, calculated, 3)
    } else {
        percentage(output - calculated, calculated, 3).map(|p| -p)
    }
}

/// Custo do gas em unidades nativas, cinco casas
pub fn gas_cost(receipt: &TransactionReceipt, fallback_price: U256) -> f64 {
    let used = receipt.gas_used.unwrap_or_default();
    let price = receipt.effective_gas_price.unwrap_or(fallback_price);
    format_units_f64(used.saturating_mul(price), 18, 5)
}

/// Caminho de compra: `[native, quote, base]`, ou direto quando a cotação é o nativo
pub fn buy_path(native: Address, quote: Address, base: Address) -> Vec<Address> {
    if quote == native {
        vec![quote, base]
    } else {
        vec![native, quote, base]
    }
}

/// Caminho de venda: `[base, quote, native]`, ou direto quando a cotação é o nativo
pub fn sell_path(native: Address, quote: Address, base: Address) -> Vec<Address> {
    if quote == native {
        vec![base, quote]
    } else {
        vec![base, quote, native]
    }
}

/// Resultado de um swap pelo roteador público
#[derive(Debug, Clone)]
pub struct SwapOutcome {
    /// Saída cotada por `getAmountsOut` antes do swap
    pub calculated: U256,
    /// Saída observada nos logs
    pub output: U256,
    pub receipt: TransactionReceipt,
}

/// Aprova o roteador para cada token do caminho ainda sem allowance
pub async fn ensure_allowance<C>(
    client: &C,
    owner: Address,
    spender: Address,
    tokens: &[Address],
) -> Result<()>
where
    C: ChainClient + ?Sized,
{
    for token in tokens {
        if erc20::allowance(client, *token, owner, spender).await?.is_zero() {
            erc20::approve(client, TxOpts::from(owner), *token, spender, U256::MAX).await?;
        }
    }
    Ok(())
}

/// Cota e executa um swap com `amount` de entrada para `wallet`
pub async fn swap_with_quote<C>(
    client: &C,
    router_address: Address,
    wallet: Address,
    amount: U256,
    path: &[Address],
    gas: U256,
    deadline: U256,
) -> Result<SwapOutcome>
where
    C: ChainClient + ?Sized,
{
    ensure_allowance(client, wallet, router_address, path).await?;
    let calculated = router::get_amounts_out(client, router_address, amount, path).await?;

    let receipt = router::swap_exact_tokens_for_tokens(
        client,
        TxOpts::from(wallet).gas(gas),
        router_address,
        amount,
        path,
        wallet,
        deadline,
    )
    .await?;

    let output = extract_output(&receipt.logs, wallet, router_address)
        .ok_or_else(|| SimulationError::Abi("swap sem log de saída".into()))?;
    debug!(%calculated, %output, "swap executado");
    Ok(SwapOutcome { calculated, output, receipt })
}
