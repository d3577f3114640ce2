use crate::setup::SetupLogger;
use crate::utils;
use colored::Colorize;
use ledgerflow_core::{Stack, StartOptions};
use std::sync::Arc;

pub async fn handle(name: &str, no_rollback: bool, verbose: bool) -> anyhow::Result<()> {
    let logger = Arc::new(SetupLogger::new());
    let manager = utils::stack_manager(verbose)?.with_observer(logger.clone());

    println!("{}", format!("Starting stack '{}'...", name).yellow());
    let result = manager.start(name, &StartOptions { no_rollback }).await;
    logger.print_summary(name);
    let stack = result?;

    println!();
    println!(
        "{}",
        format!("✓ Stack '{}' started!", stack.name).green().bold()
    );
    print_endpoints(&stack);
    Ok(())
}

fn print_endpoints(stack: &Stack) {
    for member in &stack.members {
        println!(
            "  Web UI for member '{}': {}",
            member.id,
            format!("http://127.0.0.1:{}/ui", member.ports.firefly).cyan()
        );
    }
    if stack.prometheus_enabled
        && let Some(port) = stack.exposed_prometheus_port
    {
        println!(
            "  Metrics dashboard: {}",
            format!("http://127.0.0.1:{}", port).cyan()
        );
    }
    if !stack.deployed_contracts.is_empty() {
        println!();
        println!("Deployed contracts:");
        for contract in &stack.deployed_contracts {
            println!("  {} {}", contract.name.bold(), contract.describe().dimmed());
        }
    }
    println!();
    println!(
        "To see logs for your stack run: {}",
        format!("lflow logs {}", stack.name).cyan()
    );
}
