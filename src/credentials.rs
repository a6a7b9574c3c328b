//! KVM login credentials
//!
//! The secret is kept in zeroize-on-drop storage and never shows up in
//! `Debug` output, so it cannot leak into logs.

use std::io::{self, BufRead, Write};
use tracing::{debug, info};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{Result, WatchdogError};

pub const USERNAME_ENV: &str = "KVMWD_KVM_USERNAME";
pub const PASSWORD_ENV: &str = "KVMWD_KVM_PASSWORD";

/// Username/secret pair for basic auth against the KVM
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    username: String,
    secret: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            secret: secret.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Source of the credentials, asked exactly once before monitoring starts
pub trait CredentialProvider {
    fn acquire(&self) -> Result<Credentials>;
}

/// Interactive prompt: username is echoed, the password is not
#[derive(Debug, Default)]
pub struct TerminalPrompt;

impl CredentialProvider for TerminalPrompt {
    fn acquire(&self) -> Result<Credentials> {
        let stdin = io::stdin();
        let username = read_username(&mut stdin.lock(), &mut io::stdout())
            .map_err(|e| acquisition_error("couldn't read username", e))?;

        let secret = rpassword::prompt_password("[AUTH]: Password: ")
            .map_err(|e| acquisition_error("couldn't read password", e))?;

        info!("Credentials read for KVM user {}", username);
        Ok(Credentials::new(username, secret))
    }
}

/// Reads `KVMWD_KVM_USERNAME` / `KVMWD_KVM_PASSWORD`, for running without a TTY
#[derive(Debug, Default)]
pub struct EnvCredentials;

impl EnvCredentials {
    fn from_lookup<F>(lookup: F) -> Result<Credentials>
    where
        F: Fn(&str) -> Option<String>,
    {
        let missing =
            |name: &str| WatchdogError::CredentialAcquisition(format!("{name} is not set"));

        let username = lookup(USERNAME_ENV).ok_or_else(|| missing(USERNAME_ENV))?;
        let mut secret = lookup(PASSWORD_ENV).ok_or_else(|| missing(PASSWORD_ENV))?;

        let credentials = Credentials::new(username, secret.as_str());
        secret.zeroize();

        debug!("Credentials loaded from environment");
        Ok(credentials)
    }
}

impl CredentialProvider for EnvCredentials {
    fn acquire(&self) -> Result<Credentials> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }
}

fn read_username<R: BufRead, W: Write>(input: &mut R, prompt: &mut W) -> io::Result<String> {
    write!(prompt, "[AUTH]: Username: ")?;
    prompt.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stdin closed before a username was entered",
        ));
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn acquisition_error(what: &str, err: io::Error) -> WatchdogError {
    WatchdogError::CredentialAcquisition(format!("{what}: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_debug_redacts_secret() {
        let creds = Credentials::new("admin", "hunter2");
        let printed = format!("{:?}", creds);
        assert!(printed.contains("admin"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn test_read_username_strips_line_ending() {
        let mut input = io::Cursor::new(b"admin\r\nignored\n".to_vec());
        let mut prompt = Vec::new();

        let username = read_username(&mut input, &mut prompt).unwrap();
        assert_eq!(username, "admin");
        assert_eq!(prompt, b"[AUTH]: Username: ");
    }

    #[test]
    fn test_read_username_fails_on_eof() {
        let mut input = io::Cursor::new(Vec::new());
        let err = read_username(&mut input, &mut io::sink()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    fn lookup_in<'a>(vars: &'a HashMap<&'a str, &'a str>) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| vars.get(name).map(|v| v.to_string())
    }

    #[test]
    fn test_env_credentials_require_both_variables() {
        let vars = HashMap::from([(USERNAME_ENV, "admin")]);
        let err = EnvCredentials::from_lookup(lookup_in(&vars)).unwrap_err();
        assert!(matches!(
            err,
            WatchdogError::CredentialAcquisition(ref msg) if msg.contains(PASSWORD_ENV)
        ));
    }

    #[test]
    fn test_env_credentials() {
        let vars = HashMap::from([(USERNAME_ENV, "admin"), (PASSWORD_ENV, "hunter2")]);
        let creds = EnvCredentials::from_lookup(lookup_in(&vars)).unwrap();
        assert_eq!(creds.username(), "admin");
        assert_eq!(creds.secret(), "hunter2");
    }
}
