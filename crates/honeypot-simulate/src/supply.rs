//! Resumo de supply e queima de um token

use ethers::types::{Address, U256};
use futures::future::try_join_all;
use honeypot_core::{NetworkProfile, TokenSupply};

use crate::contracts::erc20;
use crate::errors::Result;
use crate::traits::ChainClient;

/// Supply total, queimado (saldo das carteiras de queima) e circulante
pub async fn token_supply<C>(
    client: &C,
    profile: &NetworkProfile,
    token: Address,
) -> Result<TokenSupply>
where
    C: ChainClient + ?Sized,
{
    let total = erc20::total_supply(client, token).await?;
    let balances = try_join_all(
        profile
            .burn_addresses
            .iter()
            .map(|wallet| erc20::balance_of(client, token, *wallet)),
    )
    .await?;
    let burned = balances
        .into_iter()
        .fold(U256::zero(), |acc, balance| acc.saturating_add(balance));
    Ok(TokenSupply::new(total, burned))
}
