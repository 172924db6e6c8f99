use ethers::types::U256;
use honeypot_core::{SimulationResult, Token};
use tracing::warn;

use super::{AtState, Progress, SimulationState, Simulator, StepResult};
use crate::contracts::{erc20, weth, TxOpts};
use crate::swap::{buy_path, calculate_tax, gas_cost, sell_path, swap_with_quote};
use crate::traits::SandboxBackend;

/// Protocolo V1: roteador público e ida e volta de transferência entre as
/// duas carteiras. Transferências bloqueadas apenas marcam `transfer_error`.
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
    let (main, transit) = sandbox.wallets();
    let gas = config.v1_gas_limit;
    let blocks = config.v1_mine_blocks;

    progress.enter(Prepare);
    sandbox.mine(blocks).await.at(Prepare)?;
    let quote = erc20::resolve(sandbox, config.quote_for(profile.wrapped_native))
        .await
        .at(Prepare)?;
    weth::deposit(
        sandbox,
        TxOpts::from(main).gas(gas),
        profile.wrapped_native,
        config.wrap_amount,
    )
    .await
    .at(Prepare)?;
    sim.ensure_liquidity(sandbox, token, progress).await?;

    let buy_route = buy_path(profile.wrapped_native, quote.address, token.address);
    let sell_route = sell_path(profile.wrapped_native, quote.address, token.address);

    progress.enter(Buy);
    sandbox.mine(blocks).await.at(Buy)?;
    let before = erc20::balance_of(sandbox, token.address, main).await.at(Buy)?;
    let buy = swap_with_quote(
        sandbox,
        profile.router,
        main,
        config.v1_buy_amount,
        &buy_route,
        gas,
        config.deadline(),
    )
    .await
    .at(Buy)?;
    let bought = erc20::balance_of(sandbox, token.address, main)
        .await
        .at(Buy)?
        .saturating_sub(before);

    progress.enter(Approve);
    for owner in [main, transit] {
        erc20::approve(sandbox, TxOpts::from(owner), token.address, profile.router, U256::MAX)
            .await
            .at(Approve)?;
    }
    sandbox.mine(blocks).await.at(Approve)?;

    progress.enter(Sell);
    let holding = erc20::balance_of(sandbox, token.address, main).await.at(Sell)?;
    let sell = swap_with_quote(
        sandbox,
        profile.router,
        main,
        holding,
        &sell_route,
        gas,
        config.deadline(),
    )
    .await
    .at(Sell)?;
    sandbox.mine(blocks).await.at(Sell)?;

    progress.enter(SecondBuy);
    swap_with_quote(
        sandbox,
        profile.router,
        main,
        config.v1_buy_amount,
        &buy_route,
        gas,
        config.deadline(),
    )
    .await
    .at(SecondBuy)?;
    let second = erc20::balance_of(sandbox, token.address, main).await.at(SecondBuy)?;
    sandbox.mine(blocks).await.at(SecondBuy)?;

    let mut transfer_error = false;

    progress.enter(Transfer);
    let sent = erc20::transfer(
        sandbox,
        TxOpts::from(main).gas(gas),
        token.address,
        transit,
        second / 2,
    )
    .await;
    if let Err(e) = sent {
        warn!(token = %token, error = %e, "transferência bloqueada");
        transfer_error = true;
    }
    sandbox.mine(blocks).await.at(Transfer)?;

    progress.enter(TransferBack);
    let received = erc20::balance_of(sandbox, token.address, transit).await.at(TransferBack)?;
    let returned = erc20::transfer(
        sandbox,
        TxOpts::from(transit).gas(gas),
        token.address,
        main,
        received,
    )
    .await;
    if let Err(e) = returned {
        warn!(token = %token, error = %e, "transferência de volta bloqueada");
        transfer_error = true;
    }

    let gas_price = sandbox.gas_price().await.at(TransferBack)?;
    Ok(SimulationResult {
        is_sellable: true,
        buy_tax: calculate_tax(buy.calculated, bought),
        sell_tax: calculate_tax(sell.calculated, sell.output),
        buy_gas: Some(gas_cost(&buy.receipt, gas_price)),
        sell_gas: Some(gas_cost(&sell.receipt, gas_price)),
        transfer_error: Some(transfer_error),
        ..Default::default()
    })
}
