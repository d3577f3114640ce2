use indicatif::{ProgressBar, ProgressStyle};
use ledgerflow_container::DockerCli;
use ledgerflow_stack::{StackManager, StackRepository};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

/// `<home>/stacks` に対する docker バックエンドのマネージャ
pub fn stack_manager(verbose: bool) -> anyhow::Result<StackManager> {
    let stacks_dir = ledgerflow_config::stacks_dir()?;
    tracing::debug!("Stacks directory: {}", stacks_dir.display());
    Ok(StackManager::new(
        StackRepository::new(stacks_dir),
        Arc::new(DockerCli::new(verbose)),
    ))
}

pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) =
        ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed_precise}] {msg}")
    {
        pb.set_style(style);
    }
    pb.set_message(message.into());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// `[y/N]` で確認。`yes` なら聞かずに true
pub fn confirm(prompt: &str, yes: bool) -> anyhow::Result<bool> {
    if yes {
        return Ok(true);
    }
    print!("{} [y/N]: ", prompt);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}
