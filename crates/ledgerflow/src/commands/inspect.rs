//! ls / info / logs / pull / upgrade / accounts

use crate::utils;
use colored::Colorize;
use ledgerflow_core::PullOptions;

pub fn ls(verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    let names = manager.list()?;
    if names.is_empty() {
        println!("{}", "No stacks yet. Create one with `lflow init <name>`".dimmed());
        return Ok(());
    }

    println!("{}", "Stacks:".bold());
    for name in names {
        match manager.load(&name) {
            Ok(stack) => println!(
                "  {} {}",
                name.cyan(),
                format!(
                    "({} members, {}, created {})",
                    stack.members.len(),
                    stack.blockchain_provider,
                    stack.created_at.format("%Y-%m-%d %H:%M")
                )
                .dimmed()
            ),
            Err(e) => println!("  {} {}", name.cyan(), format!("(unreadable: {})", e).red()),
        }
    }
    Ok(())
}

pub async fn info(name: &str, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    let info = manager.info(name).await?;

    println!("{}", info.images);
    println!("{}", info.containers);
    println!("Compose file: {}", info.compose_file.display().to_string().cyan());
    Ok(())
}

pub async fn logs(name: &str, follow: bool, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    let output = manager.logs(name, follow).await?;
    print!("{}", output);
    Ok(())
}

fn pull_options(retries: Option<u32>) -> anyhow::Result<PullOptions> {
    let settings = ledgerflow_config::Settings::load()?;
    Ok(PullOptions {
        retries: retries.unwrap_or(settings.pull_retries),
    })
}

pub async fn pull(name: &str, retries: Option<u32>, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    let options = pull_options(retries)?;

    let images = manager.images(name)?;
    let pb = utils::spinner(format!("Pulling {} images for '{}'...", images.len(), name));
    let result = manager.pull(name, &options).await;
    pb.finish_and_clear();
    result?;

    for image in &images {
        println!("  {} {}", "✓".green(), image);
    }
    println!("{}", format!("✓ Images for '{}' are up to date", name).green().bold());
    Ok(())
}

pub async fn upgrade(name: &str, retries: Option<u32>, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    let options = pull_options(retries)?;

    let pb = utils::spinner(format!("Upgrading stack '{}'...", name));
    let result = manager.upgrade(name, &options).await;
    pb.finish_and_clear();
    result?;

    println!("{}", format!("✓ Stack '{}' upgraded", name).green().bold());
    println!("  Run `lflow start {}` to bring it back up", name);
    Ok(())
}

pub fn accounts(name: &str, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    let accounts = manager.accounts(name)?;
    println!("{}", serde_json::to_string_pretty(&accounts)?);
    Ok(())
}
