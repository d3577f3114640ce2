//! On-disk store of stack records

use crate::error::{Result, StackError};
use ledgerflow_core::{Stack, StackLayout};
use std::path::{Path, PathBuf};

/// Loads and saves whole [`Stack`] snapshots under `<stacks>/<name>/stack.json`
#[derive(Debug, Clone)]
pub struct StackRepository {
    stacks_dir: PathBuf,
}

impl StackRepository {
    pub fn new(stacks_dir: impl Into<PathBuf>) -> Self {
        Self {
            stacks_dir: stacks_dir.into(),
        }
    }

    pub fn stacks_dir(&self) -> &Path {
        &self.stacks_dir
    }

    pub fn layout(&self, name: &str) -> StackLayout {
        StackLayout::new(&self.stacks_dir, name)
    }

    pub fn exists(&self, name: &str) -> bool {
        self.layout(name).stack_file.is_file()
    }

    pub fn load(&self, name: &str) -> Result<Stack> {
        let layout = self.layout(name);
        if !layout.stack_file.is_file() {
            return Err(StackError::NotFound(name.to_string()));
        }
        tracing::debug!("Reading {}", layout.stack_file.display());
        let content = std::fs::read_to_string(&layout.stack_file)?;
        let stack: Stack = serde_json::from_str(&content)?;
        stack.validate()?;
        Ok(stack)
    }

    pub fn save(&self, stack: &Stack) -> Result<()> {
        let layout = self.layout(&stack.name);
        std::fs::create_dir_all(&layout.stack_dir)?;
        std::fs::write(&layout.stack_file, serde_json::to_string_pretty(stack)?)?;
        Ok(())
    }

    /// Names of every directory holding a `stack.json`, sorted
    pub fn list(&self) -> Result<Vec<String>> {
        if !self.stacks_dir.is_dir() {
            return Ok(vec![]);
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(&self.stacks_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if self.exists(&name) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }

    pub fn delete(&self, name: &str) -> Result<()> {
        let dir = self.layout(name).stack_dir;
        if dir.exists() {
            std::fs::remove_dir_all(dir)?;
        }
        Ok(())
    }
}

/// Stack names become directory, container and volume names
pub fn validate_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        && !name.starts_with('-');
    if valid {
        Ok(())
    } else {
        Err(StackError::InvalidName(name.to_string()))
    }
}
