/*! honeypot-simulate
 *
 * Simulação de compra, venda e transferência de tokens em forks locais.
 * O sandbox padrão é um fork do Anvil; a máquina de estados consome apenas
 * as traits `SandboxBackend`/`SandboxProvider`.
 */

pub mod bootstrap;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod providers;
pub mod reflection;
pub mod sequencer;
pub mod slots;
pub mod supply;
pub mod swap;
pub mod trace;
pub mod traits;

pub use bootstrap::{BootstrapReport, Bootstrapper};
pub use config::SimulationConfig;
pub use errors::*;
pub use providers::*;
pub use sequencer::{
    simulate_token, FailureReason, ProtocolVariant, SimulationState, Simulator, StepFailure,
};
pub use slots::SlotDiscovery;
pub use supply::token_supply;
pub use trace::{ExecutionTrace, TraceStep};
pub use traits::*;
