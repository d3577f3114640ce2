//! 初回起動の進捗表示
//!
//! オーケストレータから届くステップ通知を時刻付きで表示し、
//! 最後にサマリーを出す。

use chrono::Local;
use colored::Colorize;
use ledgerflow_stack::{SetupObserver, SetupStep};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// ステップの実行結果
#[derive(Debug, Clone)]
pub enum StepResult {
    Success { duration: Duration },
    Failed { error: String, duration: Duration },
}

impl StepResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn duration(&self) -> Duration {
        match self {
            Self::Success { duration } | Self::Failed { duration, .. } => *duration,
        }
    }
}

/// セットアップログ出力器
pub struct SetupLogger {
    start_time: Instant,
    step_results: Mutex<Vec<(SetupStep, StepResult)>>,
}

impl SetupLogger {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            step_results: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, step: SetupStep, result: StepResult) {
        if let Ok(mut results) = self.step_results.lock() {
            results.push((step, result));
        }
    }

    fn results(&self) -> Vec<(SetupStep, StepResult)> {
        self.step_results
            .lock()
            .map(|results| results.clone())
            .unwrap_or_default()
    }

    /// サマリーを出力。ステップが一つも動いていなければ何もしない
    pub fn print_summary(&self, stack_name: &str) {
        let results = self.results();
        if results.is_empty() {
            return;
        }

        let total_duration = self.start_time.elapsed();
        let error_count = results.iter().filter(|(_, r)| !r.is_success()).count();
        let slowest_step = results
            .iter()
            .map(|(step, result)| (step, result.duration()))
            .max_by_key(|(_, d)| *d);

        println!();
        println!("{}", "═".repeat(44));
        println!("Setup Summary: {}", stack_name.cyan().bold());
        println!("{}", "─".repeat(44));
        println!("Total time:    {}", format_duration(total_duration).green());
        if let Some((step, duration)) = slowest_step {
            println!(
                "Slowest step:  {} ({})",
                step.name(),
                format_duration(duration)
            );
        }
        println!("Steps:         {}/{}", results.len(), SetupStep::ALL.len());
        if error_count > 0 {
            println!("Errors:        {}", error_count.to_string().red().bold());
            for (step, result) in &results {
                if let StepResult::Failed { error, .. } = result {
                    println!("  {} {}: {}", "✗".red(), step.name(), error);
                }
            }
        } else {
            println!("Errors:        {}", "0".green());
        }
        println!("{}", "═".repeat(44));
    }
}

impl Default for SetupLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl SetupObserver for SetupLogger {
    fn step_started(&self, step: SetupStep) {
        println!(
            "[{}] {} [{}/{}] {}",
            timestamp().dimmed(),
            "▶".cyan(),
            step.number(),
            SetupStep::ALL.len(),
            step
        );
    }

    fn step_succeeded(&self, step: SetupStep, elapsed: Duration) {
        println!(
            "[{}] {} {} ({})",
            timestamp().dimmed(),
            "✓".green().bold(),
            step.name(),
            format_duration(elapsed).dimmed()
        );
        self.record(step, StepResult::Success { duration: elapsed });
    }

    fn step_failed(&self, step: SetupStep, error: &str, elapsed: Duration) {
        println!(
            "[{}] {} {}: {}",
            timestamp().dimmed(),
            "✗".red().bold(),
            step.name(),
            error.red()
        );
        self.record(
            step,
            StepResult::Failed {
                error: error.to_string(),
                duration: elapsed,
            },
        );
    }

    fn notice(&self, message: &str) {
        println!("[{}]   → {}", timestamp().dimmed(), message.yellow());
    }
}

fn timestamp() -> String {
    Local::now().format("%H:%M:%S").to_string()
}

/// Duration を読みやすい形式にフォーマット
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if total_secs >= 60 {
        let minutes = total_secs / 60;
        let secs = total_secs % 60;
        format!("{}m {}s", minutes, secs)
    } else if total_secs >= 1 {
        format!("{}.{}s", total_secs, millis / 100)
    } else {
        format!("{}ms", millis)
    }
}
