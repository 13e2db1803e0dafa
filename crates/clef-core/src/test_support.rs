//! Helpers shared by the crate's tests.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;

use crate::auth::TokenStore;
use crate::error::{Error, Result};

/// In-memory token store standing in for the OS keychain.
#[derive(Clone, Default)]
pub struct MemoryTokenStore {
    token: Arc<Mutex<Option<String>>>,
    fail: bool,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::default();
        *store.token.lock().unwrap() = Some(token.to_string());
        store
    }

    /// A store whose every operation reports `StorageUnavailable`.
    pub fn failing() -> Self {
        Self {
            token: Arc::new(Mutex::new(None)),
            fail: true,
        }
    }

    pub fn current(&self) -> Option<String> {
        self.token.lock().unwrap().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load_token(&self) -> Result<Option<String>> {
        if self.fail {
            return Err(Error::StorageUnavailable("test store offline".to_string()));
        }
        Ok(self.token.lock().unwrap().clone())
    }

    fn save_token(&self, token: &str) -> Result<()> {
        if self.fail {
            return Err(Error::StorageUnavailable("test store offline".to_string()));
        }
        *self.token.lock().unwrap() = Some(token.to_string());
        Ok(())
    }

    fn clear_token(&self) -> Result<()> {
        if self.fail {
            return Err(Error::StorageUnavailable("test store offline".to_string()));
        }
        *self.token.lock().unwrap() = None;
        Ok(())
    }
}

/// Serve a router on an ephemeral local port and return its address.
pub async fn spawn_backend(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}
