use std::env;

use anyhow::{Context, Result};
use ethers::types::Address;
use honeypot_core::utils::{format_h256, format_token_amount};
use honeypot_core::NetworkRegistry;
use honeypot_simulate::contracts::erc20;
use honeypot_simulate::slots::{discover, read_candidate_slots, scan_target};
use honeypot_simulate::{token_supply, AnvilProvider, SandboxBackend, SandboxProvider};
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 3 {
        eprintln!("Uso: {} <REDE> <TOKEN>", args[0]);
        std::process::exit(1);
    }

    let registry = NetworkRegistry::builtin()
        .context("falha ao carregar redes")?
        .with_env_overrides();
    let profile = registry.get(&args[1]).context("rede não configurada")?;
    let address: Address = args[2].parse().context("endereço do token inválido")?;

    let sandbox = AnvilProvider::default()
        .create_sandbox(profile)
        .await
        .context("falha ao criar sandbox")?;
    info!("Sandbox {} criado", sandbox.id());

    let outcome = async {
        let token = erc20::resolve(&sandbox, address).await?;
        let scan = scan_target(&sandbox, address).await?;
        let discovery = discover(&sandbox, address, &scan).await?;
        let stored = read_candidate_slots(&sandbox, address, &scan.storage_slots).await?;
        let supply = token_supply(&sandbox, profile, address).await?;
        Ok::<_, honeypot_simulate::SimulationError>((token, scan, discovery, stored, supply))
    }
    .await;
    sandbox.destroy().await;
    let (token, scan, discovery, stored, supply) = outcome.context("falha na descoberta")?;

    println!("Token: {}", token);
    println!("Métodos: {}", scan.method_ids().join(", "));
    println!("Slots candidatos: {}", discovery.candidates.len());
    for slot in &discovery.matched {
        println!("  casado: {}", format_h256(slot));
    }
    println!("Reflexão: {}", discovery.is_reflection());
    println!("Endereços em storage: {:?}", stored.addresses);
    println!(
        "Supply: {} (queimado {}%, circulante {})",
        format_token_amount(&supply.total_supply, token.decimals),
        supply.burned_rate,
        format_token_amount(&supply.circulating_supply, token.decimals),
    );
    Ok(())
}
