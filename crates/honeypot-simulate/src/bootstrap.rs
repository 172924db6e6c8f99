//! Criação de liquidez sintética para tokens sem par ou sem supply.

use ethers::types::{Address, U256};
use honeypot_core::{NetworkProfile, Token};
use tracing::info;

use crate::config::SimulationConfig;
use crate::contracts::{erc20, factory, router, TxOpts};
use crate::errors::{Result, SimulationError};
use crate::reflection::reflection_from_token;
use crate::slots::{discover, scan_target, SlotDiscovery};
use crate::traits::SandboxBackend;

/// O que o bootstrap escreveu no sandbox
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    pub discovery: SlotDiscovery,
    /// Supply usado nos cálculos (real ou sintético)
    pub total_supply: U256,
    pub synthetic_supply: bool,
    /// Valor bruto gravado no slot de saldos do sentinela
    pub seeded: U256,
    pub pair: Address,
}

/// Liquidez é criada quando não há par ou o supply reportado é zero
pub fn needs_bootstrap(pair: Address, total_supply: U256) -> bool {
    pair.is_zero() || total_supply.is_zero()
}

pub struct Bootstrapper<'a> {
    profile: &'a NetworkProfile,
    config: &'a SimulationConfig,
}

impl<'a> Bootstrapper<'a> {
    pub fn new(profile: &'a NetworkProfile, config: &'a SimulationConfig) -> Self {
        Self { profile, config }
    }

    /// Grava metade do supply no saldo do sentinela e adiciona um quarto como liquidez
    pub async fn run<S>(&self, sandbox: &S, token: &Token) -> Result<BootstrapReport>
    where
        S: SandboxBackend + ?Sized,
    {
        let sentinel = sandbox.sentinel();
        // permanece desbloqueado até o encerramento da sessão
        sandbox.unlock_account(sentinel).await?;
        self.seed(sandbox, token, sentinel).await
    }

    async fn seed<S>(&self, sandbox: &S, token: &Token, sentinel: Address) -> Result<BootstrapReport>
    where
        S: SandboxBackend + ?Sized,
    {
        let scan = scan_target(sandbox, token.address).await?;
        let discovery = discover(sandbox, token.address, &scan).await?;
        let slot = discovery
            .balance_slot()
            .ok_or_else(|| SimulationError::Bootstrap("slot de saldos não encontrado".into()))?;

        let reported = erc20::total_supply(sandbox, token.address).await?;
        let synthetic_supply = reported.is_zero();
        let total_supply = if synthetic_supply {
            self.config.synthetic_supply(token.decimals)
        } else {
            reported
        };

        let half = total_supply / 2;
        let seeded = if discovery.is_reflection() {
            reflection_from_token(half, total_supply)?
        } else {
            half
        };
        sandbox.set_storage(token.address, slot, seeded).await?;

        erc20::approve(
            sandbox,
            TxOpts::from(sentinel),
            token.address,
            self.profile.router,
            U256::MAX,
        )
        .await?;
        router::add_liquidity_eth(
            sandbox,
            TxOpts::from(sentinel).value(self.config.liquidity_value),
            self.profile.router,
            token.address,
            total_supply / 4,
            sentinel,
            self.config.deadline(),
        )
        .await?;

        let pair =
            factory::get_pair(sandbox, self.profile.factory, token.address, self.profile.wrapped_native)
                .await?;
        if pair.is_zero() {
            return Err(SimulationError::Bootstrap("par não criado após addLiquidityETH".into()));
        }

        info!(
            token = %token,
            reflection = discovery.is_reflection(),
            synthetic_supply,
            ?pair,
            "liquidez criada"
        );
        Ok(BootstrapReport { discovery, total_supply, synthetic_supply, seeded, pair })
    }
}
