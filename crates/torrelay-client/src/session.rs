//! Authenticated remote session shared by the daemon and tracker clients.
//!
//! # Design
//! - The liveness flag is an optimistic cache; it is re-verified with a probe before use.
//! - Reconnect swaps in a new HTTP client bound to a fresh cookie jar.
//!   Jars are never cleared in place.
//! - Every writer of the session state holds the write lock for the whole login exchange,
//!   so concurrent callers never observe a half-replaced cookie store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::cookie::Jar;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ClientError, ClientResult};

/// User agent sent with every outbound request.
pub(crate) const USER_AGENT: &str = concat!("torrelay/", env!("CARGO_PKG_VERSION"));

/// Site-specific login exchange and liveness check.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Short label used in logs.
    fn target(&self) -> &str;

    /// Perform the login exchange using `client`'s cookie store.
    ///
    /// Implementations succeed only on an explicit success signal from the remote.
    async fn login(&self, client: &Client) -> ClientResult<()>;

    /// Cheap read-only request confirming the session is still accepted.
    ///
    /// The default reports "unknown", which makes every check fall through to a login.
    async fn probe(&self, client: &Client) -> bool {
        let _ = client;
        false
    }
}

/// Cookie-bound session against one remote service.
pub struct RemoteSession<A> {
    auth: A,
    timeout: Duration,
    state: RwLock<SessionState>,
}

struct SessionState {
    client: Client,
    live: bool,
    /// Bumped after every successful login.
    epoch: u64,
}

impl<A: Authenticator> RemoteSession<A> {
    /// Create an unauthenticated session; no request is sent until first use.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if the HTTP client cannot be built.
    pub fn new(auth: A, timeout: Duration) -> ClientResult<Self> {
        Ok(Self {
            state: RwLock::new(SessionState {
                client: build_http_client(timeout)?,
                live: false,
                epoch: 0,
            }),
            auth,
            timeout,
        })
    }

    /// Authenticator driving this session.
    pub const fn authenticator(&self) -> &A {
        &self.auth
    }

    /// Cached liveness belief; may be stale.
    pub async fn is_live(&self) -> bool {
        self.state.read().await.live
    }

    /// Run the login exchange on the current cookie store.
    ///
    /// # Errors
    ///
    /// Propagates the authenticator's failure; liveness stays `false`.
    pub async fn authenticate(&self) -> ClientResult<Client> {
        let mut state = self.state.write().await;
        self.login_locked(&mut state).await
    }

    /// Return a client whose session is believed valid, logging in when needed.
    ///
    /// A live session is confirmed with one probe; a failed probe marks the
    /// session stale and falls through to a login.
    ///
    /// # Errors
    ///
    /// Propagates the login failure when re-authentication is required and fails.
    pub async fn ensure_authenticated(&self) -> ClientResult<Client> {
        let (cached, seen_epoch) = {
            let state = self.state.read().await;
            (state.live.then(|| state.client.clone()), state.epoch)
        };

        if let Some(client) = cached {
            if self.auth.probe(&client).await {
                return Ok(client);
            }
            debug!(target_name = self.auth.target(), "session probe failed");
        }

        let mut state = self.state.write().await;
        if state.live && state.epoch != seen_epoch {
            return Ok(state.client.clone());
        }
        self.login_locked(&mut state).await
    }

    /// Discard the cookie store and log in again on a fresh one.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Transport` if a new client cannot be built, or the
    /// authenticator's failure.
    pub async fn reconnect(&self) -> ClientResult<Client> {
        let mut state = self.state.write().await;
        warn!(target_name = self.auth.target(), "reconnecting session");
        state.live = false;
        state.client = build_http_client(self.timeout)?;
        self.login_locked(&mut state).await
    }

    async fn login_locked(&self, state: &mut SessionState) -> ClientResult<Client> {
        state.live = false;
        self.auth.login(&state.client).await?;
        state.live = true;
        state.epoch = state.epoch.wrapping_add(1);
        info!(target_name = self.auth.target(), "session authenticated");
        Ok(state.client.clone())
    }
}

/// Build an HTTP client bound to a brand-new cookie jar.
pub(crate) fn build_http_client(timeout: Duration) -> ClientResult<Client> {
    Client::builder()
        .cookie_provider(Arc::new(Jar::default()))
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|source| ClientError::Transport { source })
}
