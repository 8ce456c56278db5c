use std::sync::Arc;

use anyhow::Result;
use tracing::warn;

use super::scope::{FileScope, MemoryScope, TokenScope, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

/// Two-scope credential store feeding the request pipeline.
///
/// The durable scope survives restarts; the session scope lives for the
/// process. At most one of them holds the access token at a time, chosen by
/// the remember-me flag at sign-in. The refresh token, when present, is
/// always kept durable so a remembered session can be revived after a
/// restart.
///
/// Clone is cheap - both scopes are shared behind Arcs.
#[derive(Clone)]
pub struct TokenVault {
    durable: Arc<dyn TokenScope>,
    session: Arc<dyn TokenScope>,
}

impl TokenVault {
    pub fn new(durable: Arc<dyn TokenScope>, session: Arc<dyn TokenScope>) -> Self {
        Self { durable, session }
    }

    /// Default wiring: a JSON file under the user config directory for the
    /// durable scope and process memory for the session scope.
    pub fn open() -> Result<Self> {
        Ok(Self::new(
            Arc::new(FileScope::default_location()?),
            Arc::new(MemoryScope::new()),
        ))
    }

    /// Both scopes in memory. Nothing touches the filesystem, which also
    /// makes this the vault of choice in tests.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryScope::new()), Arc::new(MemoryScope::new()))
    }

    /// Store credentials after sign-in or registration.
    ///
    /// `remember` picks the scope for the access token; the other scope is
    /// cleared so exactly one copy exists. The refresh token, when supplied,
    /// lands in the durable scope regardless.
    pub fn store(
        &self,
        access_token: &str,
        refresh_token: Option<&str>,
        remember: bool,
    ) -> Result<()> {
        if access_token.is_empty() {
            warn!("Refusing to store an empty access token");
            return Ok(());
        }

        let (target, other) = if remember {
            (&self.durable, &self.session)
        } else {
            (&self.session, &self.durable)
        };

        target.set(ACCESS_TOKEN_KEY, access_token)?;
        other.remove(ACCESS_TOKEN_KEY)?;

        if let Some(refresh_token) = refresh_token {
            self.durable.set(REFRESH_TOKEN_KEY, refresh_token)?;
        }
        Ok(())
    }

    /// Swap in a refreshed access token, keeping it in whichever scope holds
    /// the current one. With no token stored anywhere the durable scope wins,
    /// so a revived remembered session stays remembered.
    pub fn replace_access_token(&self, access_token: &str) -> Result<()> {
        if self.durable.get(ACCESS_TOKEN_KEY).is_some() {
            self.durable.set(ACCESS_TOKEN_KEY, access_token)
        } else if self.session.get(ACCESS_TOKEN_KEY).is_some() {
            self.session.set(ACCESS_TOKEN_KEY, access_token)
        } else {
            self.durable.set(ACCESS_TOKEN_KEY, access_token)
        }
    }

    /// Current access token, durable scope first.
    pub fn access_token(&self) -> Option<String> {
        self.durable
            .get(ACCESS_TOKEN_KEY)
            .or_else(|| self.session.get(ACCESS_TOKEN_KEY))
    }

    /// Current refresh token. Only ever read from the durable scope.
    pub fn refresh_token(&self) -> Option<String> {
        self.durable.get(REFRESH_TOKEN_KEY)
    }

    /// Remove every stored token from both scopes. Clearing an already empty
    /// vault is fine.
    pub fn clear(&self) -> Result<()> {
        self.durable.remove(ACCESS_TOKEN_KEY)?;
        self.durable.remove(REFRESH_TOKEN_KEY)?;
        self.session.remove(ACCESS_TOKEN_KEY)?;
        self.session.remove(REFRESH_TOKEN_KEY)?;
        Ok(())
    }

    /// Whether either scope currently holds an access token.
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }
}
