//! Máquina de estados da simulação de compra e venda.
//!
//! Cada estado depende do estado anterior já confirmado no sandbox, então a
//! execução é estritamente sequencial. Uma falha em qualquer passo vira um
//! [`StepFailure`] com o estado e o motivo classificado.

mod v1;
mod v2;

use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU8, Ordering};

use ethers::types::Address;
use futures::FutureExt;
use honeypot_core::{NetworkProfile, SimulationResult, Token};
use tracing::{error, info, warn};

use crate::bootstrap::{needs_bootstrap, Bootstrapper};
use crate::config::SimulationConfig;
use crate::contracts::{erc20, factory};
use crate::errors::{panic_message, Result, SimulationError};
use crate::traits::{SandboxBackend, SandboxProvider};

pub const WITHOUT_REASON: &str = "Honeypot test failed without a reason";
pub const UNKNOWN_REASON: &str = "Honeypot test failed with a unknown reason";

const REVERT_MARKERS: [&str; 2] = ["VM Exception", "execution reverted"];

/// Variante do protocolo de simulação
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolVariant {
    /// Roteador público com ida e volta de transferência (falha de
    /// transferência é apenas sinalizada)
    #[default]
    V1,
    /// Roteador de trânsito implantado no sandbox; a checagem de
    /// transferência é fatal
    V2,
}

/// Estados da simulação, na ordem em que são visitados
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SimulationState {
    Prepare,
    Bootstrap,
    Buy,
    Approve,
    Sell,
    SecondBuy,
    Transfer,
    TransferBack,
    TransferCheck,
    SellCheck,
}

impl SimulationState {
    const ALL: [SimulationState; 10] = [
        Self::Prepare,
        Self::Bootstrap,
        Self::Buy,
        Self::Approve,
        Self::Sell,
        Self::SecondBuy,
        Self::Transfer,
        Self::TransferBack,
        Self::TransferCheck,
        Self::SellCheck,
    ];

    /// Nome reportado em `failedState`
    pub fn name(&self) -> &'static str {
        match self {
            Self::Prepare => "Prepare",
            Self::Bootstrap => "Bootstrap",
            Self::Buy => "Buy",
            Self::Approve => "Approve",
            Self::Sell => "Sell",
            Self::SecondBuy => "Second Buy",
            Self::Transfer => "Transfer",
            Self::TransferBack => "TransferBack",
            Self::TransferCheck => "TransferCheck",
            Self::SellCheck => "SellCheck",
        }
    }
}

impl fmt::Display for SimulationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Motivo classificado de uma falha de passo
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    Reverted(String),
    RevertedWithoutReason,
    Unknown,
}

impl FailureReason {
    /// Classifica a mensagem textual de erro devolvida pelo backend
    pub fn classify(message: &str) -> Self {
        let marker = REVERT_MARKERS
            .iter()
            .filter_map(|m| message.find(m))
            .min();
        if let Some(start) = marker {
            let tail = &message[start..];
            return match tail.split_once(':') {
                Some((_, reason)) if !reason.trim().is_empty() => {
                    Self::Reverted(reason.trim().to_string())
                }
                _ => Self::RevertedWithoutReason,
            };
        }
        if message.contains("without") {
            return Self::RevertedWithoutReason;
        }
        Self::Unknown
    }

    pub fn from_error(err: &SimulationError) -> Self {
        match err {
            SimulationError::TransactionReverted(_) => Self::RevertedWithoutReason,
            other => Self::classify(&other.to_string()),
        }
    }

    /// Texto reportado em `errorMessage`
    pub fn message(&self) -> String {
        match self {
            Self::Reverted(reason) => reason.clone(),
            Self::RevertedWithoutReason => WITHOUT_REASON.to_string(),
            Self::Unknown => UNKNOWN_REASON.to_string(),
        }
    }
}

/// Falha de um passo da simulação
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepFailure {
    pub state: SimulationState,
    pub reason: FailureReason,
}

impl StepFailure {
    pub fn new(state: SimulationState, err: &SimulationError) -> Self {
        warn!(state = %state, error = %err, "passo da simulação falhou");
        Self { state, reason: FailureReason::from_error(err) }
    }

    pub fn into_result(self) -> SimulationResult {
        SimulationResult::failed(self.state.name(), self.reason.message())
    }
}

pub(crate) type StepResult<T> = std::result::Result<T, StepFailure>;

/// Associa o estado corrente a um erro de chain
pub(crate) trait AtState<T> {
    fn at(self, state: SimulationState) -> StepResult<T>;
}

impl<T> AtState<T> for Result<T> {
    fn at(self, state: SimulationState) -> StepResult<T> {
        self.map_err(|e| StepFailure::new(state, &e))
    }
}

/// Último estado visitado, consultado quando a execução entra em pânico
pub(crate) struct Progress {
    state: AtomicU8,
    token: Address,
}

impl Progress {
    fn new(token: Address) -> Self {
        Self { state: AtomicU8::new(SimulationState::Prepare as u8), token }
    }

    pub(crate) fn enter(&self, state: SimulationState) {
        self.state.store(state as u8, Ordering::SeqCst);
        info!(token = ?self.token, state = %state, "entrando no estado");
    }

    fn current(&self) -> SimulationState {
        let index = self.state.load(Ordering::SeqCst) as usize;
        SimulationState::ALL
            .get(index)
            .copied()
            .unwrap_or(SimulationState::Prepare)
    }
}

/// Executa o protocolo de simulação sobre um sandbox exclusivo
pub struct Simulator<'a> {
    pub(crate) profile: &'a NetworkProfile,
    pub(crate) config: &'a SimulationConfig,
    variant: ProtocolVariant,
}

impl<'a> Simulator<'a> {
    pub fn new(
        profile: &'a NetworkProfile,
        config: &'a SimulationConfig,
        variant: ProtocolVariant,
    ) -> Self {
        Self { profile, config, variant }
    }

    /// Executa a simulação e encerra o sandbox, com sucesso ou falha
    pub async fn run<S>(&self, sandbox: S, token: &Token) -> SimulationResult
    where
        S: SandboxBackend,
    {
        let progress = Progress::new(token.address);
        info!(token = %token, session = %sandbox.id(), variant = ?self.variant, "simulação iniciada");

        let outcome = AssertUnwindSafe(self.execute(&sandbox, token, &progress))
            .catch_unwind()
            .await;
        let sentinel = sandbox.sentinel();
        if let Err(e) = sandbox.lock_account(sentinel).await {
            warn!(session = %sandbox.id(), error = %e, "falha ao bloquear sentinela");
        }
        sandbox.destroy().await;

        match outcome {
            Ok(Ok(result)) => {
                info!(
                    token = %token,
                    buy_tax = ?result.buy_tax,
                    sell_tax = ?result.sell_tax,
                    transfer_error = ?result.transfer_error,
                    "simulação concluída"
                );
                result
            }
            Ok(Err(failure)) => failure.into_result(),
            Err(payload) => {
                let state = progress.current();
                error!(
                    token = %token,
                    state = %state,
                    panic = %panic_message(payload.as_ref()),
                    "simulação interrompida por pânico"
                );
                SimulationResult::failed(state.name(), UNKNOWN_REASON)
            }
        }
    }

    async fn execute<S>(
        &self,
        sandbox: &S,
        token: &Token,
        progress: &Progress,
    ) -> StepResult<SimulationResult>
    where
        S: SandboxBackend,
    {
        match self.variant {
            ProtocolVariant::V1 => v1::execute(self, sandbox, token, progress).await,
            ProtocolVariant::V2 => v2::execute(self, sandbox, token, progress).await,
        }
    }

    /// Cria liquidez quando o token não tem par ou supply
    pub(crate) async fn ensure_liquidity<S>(
        &self,
        sandbox: &S,
        token: &Token,
        progress: &Progress,
    ) -> StepResult<()>
    where
        S: SandboxBackend,
    {
        let pair = factory::get_pair(
            sandbox,
            self.profile.factory,
            token.address,
            self.profile.wrapped_native,
        )
        .await
        .at(SimulationState::Prepare)?;
        let supply = erc20::total_supply(sandbox, token.address)
            .await
            .at(SimulationState::Prepare)?;

        if needs_bootstrap(pair, supply) {
            progress.enter(SimulationState::Bootstrap);
            Bootstrapper::new(self.profile, self.config)
                .run(sandbox, token)
                .await
                .at(SimulationState::Bootstrap)?;
        }
        Ok(())
    }
}

/// Provisiona um sandbox, resolve o token e executa a simulação.
///
/// Só retorna erro quando o sandbox não pôde ser criado.
pub async fn simulate_token<P>(
    provider: &P,
    profile: &NetworkProfile,
    config: &SimulationConfig,
    variant: ProtocolVariant,
    address: Address,
) -> Result<SimulationResult>
where
    P: SandboxProvider,
{
    let sandbox = provider.create_sandbox(profile).await.map_err(|e| {
        error!(network = %profile.name, error = %e, "falha ao provisionar sandbox");
        SimulationError::EnvironmentUnavailable(e.to_string())
    })?;

    let token = match erc20::resolve(&sandbox, address).await {
        Ok(token) => token,
        Err(e) => {
            let failure = StepFailure::new(SimulationState::Prepare, &e);
            sandbox.destroy().await;
            return Ok(failure.into_result());
        }
    };

    Ok(Simulator::new(profile, config, variant).run(sandbox, &token).await)
}
