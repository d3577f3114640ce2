//! deploy / contracts

use crate::utils;
use colored::Colorize;
use std::path::Path;

pub async fn deploy(
    name: &str,
    file: &Path,
    contract_name: Option<&str>,
    member: usize,
    extra_args: &[String],
    verbose: bool,
) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;

    let contract_name = match contract_name {
        Some(contract_name) => contract_name.to_string(),
        None => {
            let names = manager.contracts(name, file)?;
            match names.as_slice() {
                [only] => only.clone(),
                [] => anyhow::bail!("no contracts found in {}", file.display()),
                _ => anyhow::bail!(
                    "{} contains several contracts, choose one with --contract: {}",
                    file.display(),
                    names.join(", ")
                ),
            }
        }
    };

    let pb = utils::spinner(format!("Deploying {}...", contract_name));
    let result = manager
        .deploy_contract(name, file, &contract_name, member, extra_args)
        .await;
    pb.finish_and_clear();
    let deployed = result?;

    println!(
        "{}",
        format!("✓ Deployed {}", deployed.name).green().bold()
    );
    println!("  {}", deployed.describe());
    Ok(())
}

pub fn contracts(name: &str, file: &Path, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    for contract in manager.contracts(name, file)? {
        println!("{}", contract);
    }
    Ok(())
}
