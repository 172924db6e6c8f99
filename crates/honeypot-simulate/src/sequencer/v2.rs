use ethers::types::{TransactionReceipt, U256};
use honeypot_core::{SimulationResult, Token};

use super::{AtState, Progress, SimulationState, Simulator, StepResult};
use crate::contracts::{erc20, factory, transit, TxOpts};
use crate::errors::SimulationError;
use crate::swap::{calculate_tax, extract_router_logs, gas_cost, RouterLogs};
use crate::traits::SandboxBackend;

fn router_logs(receipt: &TransactionReceipt) -> Result<RouterLogs, SimulationError> {
    extract_router_logs(&receipt.logs)
        .ok_or_else(|| SimulationError::Abi("roteador de trânsito sem logs de swap".into()))
}

/// Protocolo V2: roteador de trânsito implantado no sandbox. A checagem de
/// transferência roda em uma única chamada e sua falha encerra a simulação.
pub(super) async fn execute<S>(
    sim: &Simulator<'_>,
    sandbox: &S,
    token: &Token,
    progress: &Progress,
) -> StepResult<SimulationResult>
where
    S: SandboxBackend,
{
    use SimulationState::*;

    let config = sim.config;
    let profile = sim.profile;
    let (main, transit_wallet) = sandbox.wallets();
    let gas = config.v2_gas_limit;
    let blocks = config.v2_mine_blocks;
    let native = profile.wrapped_native;

    progress.enter(Prepare);
    sandbox.mine(blocks).await.at(Prepare)?;
    let creation_code = config
        .transit_router_bytecode
        .as_ref()
        .ok_or_else(|| {
            SimulationError::InvalidInput("bytecode do roteador de trânsito ausente".into())
        })
        .at(Prepare)?;
    let router = transit::deploy(
        sandbox,
        TxOpts::from(transit_wallet).gas(gas),
        creation_code,
        profile.factory,
        native,
    )
    .await
    .at(Prepare)?;
    sim.ensure_liquidity(sandbox, token, progress).await?;

    progress.enter(Buy);
    sandbox.mine(blocks).await.at(Buy)?;
    let pair = factory::get_pair(sandbox, profile.factory, token.address, native)
        .await
        .at(Buy)?;
    for asset in [token.address, native] {
        erc20::approve(sandbox, TxOpts::from(main), asset, router, U256::MAX)
            .await
            .at(Buy)?;
    }
    let buy = transit::buy(
        sandbox,
        TxOpts::from(main).value(config.v2_buy_amount).gas(gas),
        router,
        &[native, token.address],
        pair,
    )
    .await
    .at(Buy)?;
    let buy_logs = router_logs(&buy).at(Buy)?;

    progress.enter(TransferCheck);
    sandbox.mine(blocks).await.at(TransferCheck)?;
    for owner in [main, transit_wallet] {
        erc20::approve(sandbox, TxOpts::from(owner), token.address, router, U256::MAX)
            .await
            .at(TransferCheck)?;
    }
    transit::transfer_check(
        sandbox,
        TxOpts::from(main).gas(gas),
        router,
        token.address,
        transit_wallet,
    )
    .await
    .at(TransferCheck)?;

    progress.enter(SellCheck);
    sandbox.mine(blocks).await.at(SellCheck)?;
    let holding = erc20::balance_of(sandbox, token.address, main).await.at(SellCheck)?;
    let sell = transit::sell(
        sandbox,
        TxOpts::from(main).gas(gas),
        router,
        &[token.address, native],
        pair,
        holding,
    )
    .await
    .at(SellCheck)?;
    let sell_logs = router_logs(&sell).at(SellCheck)?;

    let gas_price = sandbox.gas_price().await.at(SellCheck)?;
    Ok(SimulationResult {
        is_sellable: true,
        buy_tax: calculate_tax(buy_logs.calculated, buy_logs.output),
        sell_tax: calculate_tax(sell_logs.calculated, sell_logs.output),
        buy_gas: Some(gas_cost(&buy, gas_price)),
        sell_gas: Some(gas_cost(&sell, gas_price)),
        ..Default::default()
    })
}
