//! stop / reset / remove

use crate::utils;
use colored::Colorize;

pub async fn stop(name: &str, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    let pb = utils::spinner(format!("Stopping stack '{}'...", name));
    let result = manager.stop(name).await;
    pb.finish_and_clear();
    result?;

    println!("{}", format!("✓ Stack '{}' stopped", name).green().bold());
    Ok(())
}

pub async fn reset(name: &str, yes: bool, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    manager.load(name)?;
    if !utils::confirm(
        &format!(
            "This will remove all data from stack '{}' and return it to its initialized state. Continue?",
            name
        ),
        yes,
    )? {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    let pb = utils::spinner(format!("Resetting stack '{}'...", name));
    let result = manager.reset(name).await;
    pb.finish_and_clear();
    result?;

    println!("{}", format!("✓ Stack '{}' has been reset", name).green().bold());
    Ok(())
}

pub async fn remove(name: &str, yes: bool, verbose: bool) -> anyhow::Result<()> {
    let manager = utils::stack_manager(verbose)?;
    manager.load(name)?;
    if !utils::confirm(
        &format!(
            "This will completely remove stack '{}' and all of its data. Continue?",
            name
        ),
        yes,
    )? {
        println!("{}", "Cancelled".dimmed());
        return Ok(());
    }

    let pb = utils::spinner(format!("Removing stack '{}'...", name));
    let result = manager.remove(name).await;
    pb.finish_and_clear();
    result?;

    println!("{}", format!("✓ Stack '{}' removed", name).green().bold());
    Ok(())
}
