//! Data exchange TLS material

use crate::error::{Result, StackError};
use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

pub const CERT_FILE: &str = "cert.pem";
pub const KEY_FILE: &str = "key.pem";

/// Subject of a member's data exchange certificate
pub fn subject(member_id: &str) -> String {
    format!("/CN=dataexchange_{member_id}/O=member_{member_id}")
}

/// Writes a self-signed `cert.pem` / `key.pem` pair into a directory
#[async_trait]
pub trait CredentialGenerator: Send + Sync {
    async fn self_signed(&self, dir: &Path, member_id: &str) -> Result<()>;
}

/// `openssl req` argument builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpensslReq {
    subject: String,
    days: u32,
    key_out: String,
    out: String,
}

impl OpensslReq {
    /// New unencrypted self-signed X.509 certificate
    pub fn self_signed(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            days: 365,
            key_out: KEY_FILE.to_string(),
            out: CERT_FILE.to_string(),
        }
    }

    pub fn days(mut self, days: u32) -> Self {
        self.days = days;
        self
    }

    pub fn key_out(mut self, path: impl Into<String>) -> Self {
        self.key_out = path.into();
        self
    }

    pub fn out(mut self, path: impl Into<String>) -> Self {
        self.out = path.into();
        self
    }

    pub fn to_args(&self) -> Vec<String> {
        let mut args: Vec<String> = ["req", "-new", "-x509", "-nodes"]
            .map(String::from)
            .to_vec();
        args.extend([
            "-days".to_string(),
            self.days.to_string(),
            "-subj".to_string(),
            self.subject.clone(),
            "-keyout".to_string(),
            self.key_out.clone(),
            "-out".to_string(),
            self.out.clone(),
        ]);
        args
    }
}

/// Runs the `openssl` binary
#[derive(Debug, Clone, Copy, Default)]
pub struct OpensslCli;

#[async_trait]
impl CredentialGenerator for OpensslCli {
    async fn self_signed(&self, dir: &Path, member_id: &str) -> Result<()> {
        let args = OpensslReq::self_signed(subject(member_id)).to_args();
        tracing::debug!("Running: openssl {}", args.join(" "));

        let output = Command::new("openssl")
            .args(&args)
            .current_dir(dir)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| StackError::Credentials {
                member: member_id.to_string(),
                message: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(StackError::Credentials {
                member: member_id.to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_req_args() {
        let args = OpensslReq::self_signed(subject("1")).to_args();
        assert_eq!(
            args,
            vec![
                "req",
                "-new",
                "-x509",
                "-nodes",
                "-days",
                "365",
                "-subj",
                "/CN=dataexchange_1/O=member_1",
                "-keyout",
                "key.pem",
                "-out",
                "cert.pem"
            ]
        );
    }

    #[test]
    fn test_req_overrides() {
        let args = OpensslReq::self_signed("/CN=x")
            .days(30)
            .key_out("k.pem")
            .out("c.pem")
            .to_args();
        assert!(args.windows(2).any(|w| w == ["-days", "30"]));
        assert!(args.windows(2).any(|w| w == ["-keyout", "k.pem"]));
        assert_eq!(args.last().map(String::as_str), Some("c.pem"));
    }
}
