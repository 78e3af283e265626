use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[cfg(unix)]
use std::os::unix::fs::PermissionsExt;

pub fn token_path() -> PathBuf {
    let home = std::env::var_os("HOME").unwrap_or_default();
    let mut p = PathBuf::from(home);
    p.push(".config");
    p.push("finboard");
    p.push("token");
    p
}

pub fn load_token(path: &Path) -> anyhow::Result<String> {
    let s = fs::read_to_string(path)?;
    let t = s.trim().to_string();
    if t.is_empty() {
        anyhow::bail!("empty token file");
    }
    Ok(t)
}

pub fn save_token(path: &Path, token: &str) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut f = fs::File::create(path)?;
    #[cfg(unix)]
    f.set_permissions(fs::Permissions::from_mode(0o600))?;
    f.write_all(token.as_bytes())?;
    f.write_all(b"\n")?;
    Ok(())
}

/// The bearer credential every API call carries.
///
/// Built once per process and handed to the client explicitly; `sign_in` and `sign_out` are
/// the only places the stored token changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// An explicit token wins over the token file.
    pub fn resolve(explicit: Option<String>, token_file: &Path) -> Self {
        let token = explicit
            .filter(|t| !t.trim().is_empty())
            .or_else(|| load_token(token_file).ok());
        Self { token }
    }

    pub fn sign_in(token_file: &Path, token: &str) -> anyhow::Result<Self> {
        let token = token.trim();
        if token.is_empty() {
            anyhow::bail!("refusing to store an empty token");
        }
        save_token(token_file, token)?;
        tracing::info!(path = %token_file.display(), "stored bearer token");
        Ok(Self::with_token(token))
    }

    pub fn sign_out(token_file: &Path) -> anyhow::Result<Self> {
        if token_file.exists() {
            fs::remove_file(token_file)?;
            tracing::info!(path = %token_file.display(), "removed bearer token");
        }
        Ok(Self::anonymous())
    }

    pub fn bearer(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.is_some()
    }
}
