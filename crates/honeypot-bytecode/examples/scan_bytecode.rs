use std::env;

use honeypot_bytecode::{minimal_proxy_target, scan_bytecode, utils::decode_hex};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <BYTECODE_HEX>", args[0]);
        std::process::exit(1);
    }
    let bytecode = &args[1];

    if let Some(target) = minimal_proxy_target(&decode_hex(bytecode)?) {
        println!("EIP-1167 proxy for 0x{:x}", target);
        return Ok(());
    }

    let scan = scan_bytecode(bytecode)?;
    println!("Methods ({}):", scan.methods.len());
    for id in scan.method_ids() {
        println!("  {}", id);
    }
    println!("Storage slot candidates ({}):", scan.storage_slots.len());
    for slot in &scan.storage_slots {
        println!("  0x{:x}", slot);
    }
    println!("Addresses in code ({}):", scan.adr_in_code.len());
    for addr in &scan.adr_in_code {
        println!("  0x{:x}", addr);
    }
    Ok(())
}
