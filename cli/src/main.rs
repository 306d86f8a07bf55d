//! bountyindex CLI — inspect a persisted snapshot.
//!
//! Usage:
//! ```bash
//! bountyindex stats ./bounty-index.json
//! bountyindex info
//! ```

use std::env;
use std::fs;
use std::process;

use bountyindex_core::query::index_stats;
use bountyindex_core::types::BountyIndex;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        print_usage();
        process::exit(1);
    }

    match args[1].as_str() {
        "stats" => {
            let Some(path) = args.get(2) else {
                eprintln!("stats requires a snapshot path");
                process::exit(1);
            };
            cmd_stats(path);
        }
        "info" => cmd_info(),
        "version" | "--version" | "-V" => {
            println!("bountyindex {}", env!("CARGO_PKG_VERSION"));
        }
        "help" | "--help" | "-h" => print_usage(),
        other => {
            eprintln!("Unknown command: {other}");
            print_usage();
            process::exit(1);
        }
    }
}

fn print_usage() {
    println!("bountyindex {}", env!("CARGO_PKG_VERSION"));
    println!("Incremental on-chain bounty-marketplace indexer\n");
    println!("USAGE:");
    println!("    bountyindex <COMMAND>\n");
    println!("COMMANDS:");
    println!("    stats <path>  Print per-status counts and the checkpoint of a snapshot");
    println!("    info          Show BountyIndex configuration defaults");
    println!("    version       Print version");
    println!("    help          Print this help");
}

fn cmd_stats(path: &str) {
    let contents = match fs::read_to_string(path) {
        Ok(c) => c,
        Err(err) => {
            eprintln!("Could not read {path}: {err}");
            process::exit(1);
        }
    };
    let index: BountyIndex = match serde_json::from_str(&contents) {
        Ok(i) => i,
        Err(err) => {
            eprintln!("Could not parse {path}: {err}");
            process::exit(1);
        }
    };

    let stats = index_stats(Some(&index));
    println!("Snapshot {path}");
    println!("  chain id:      {}", index.chain_id);
    println!("  factory:       {}", index.factory_address);
    println!("  checkpoint:    block {}", stats.last_synced_block);
    println!("  bounties:      {}", stats.total);
    for (status, count) in &stats.by_status {
        println!("    {status:<10} {count}");
    }
    println!("  agents:        {}", stats.agent_count);
}

fn cmd_info() {
    println!("BountyIndex v{}", env!("CARGO_PKG_VERSION"));
    println!("  Default max block range: 10000 blocks/query");
    println!("  Default poll interval: 30000 ms");
    println!("  Snapshot format: pretty-printed JSON, rewritten wholesale per sync");
    println!("  Event vocabulary: bounty factory + lifecycle, identity + reputation registries");
}
