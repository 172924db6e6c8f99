use std::env;
use std::time::Instant;

use anyhow::{Context, Result};
use ethers::types::{Address, Bytes};
use honeypot_core::NetworkRegistry;
use honeypot_simulate::{simulate_token, AnvilProvider, ProtocolVariant, SimulationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!(
            "Uso: {} <REDE> <TOKEN> [v1|v2] [BYTECODE_ROTEADOR_TRANSITO]",
            args[0]
        );
        std::process::exit(1);
    }

    // RPC vem de HONEYPOT_RPC_<REDE>
    let registry = NetworkRegistry::builtin()
        .context("falha ao carregar redes")?
        .with_env_overrides();
    let profile = registry.get(&args[1]).context("rede não configurada")?;
    let token: Address = args[2].parse().context("endereço do token inválido")?;

    let variant = match args.get(3).map(String::as_str) {
        Some("v2") => ProtocolVariant::V2,
        _ => ProtocolVariant::V1,
    };
    let mut config = SimulationConfig::default();
    if let Some(path) = args.get(4) {
        let raw = std::fs::read_to_string(path).context("falha ao ler bytecode")?;
        let bytecode: Bytes = raw.trim().parse().context("bytecode inválido")?;
        config = config.with_transit_router(bytecode);
    }

    let start = Instant::now();
    let result = simulate_token(&AnvilProvider::default(), profile, &config, variant, token)
        .await
        .context("sandbox indisponível")?;
    info!("Simulação concluída em {:.2?}", start.elapsed());

    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}
