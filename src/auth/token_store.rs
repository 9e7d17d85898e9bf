use std::sync::RwLock;

/// Read-only source of the current bearer token
pub trait TokenStore: Send + Sync {
    /// Current token, or `None` when the user is not signed in
    fn get_token(&self) -> Option<String>;
}

/// In-process token store; set on login, cleared on logout
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: RwLock::new(Some(token.into())),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        if let Ok(mut slot) = self.token.write() {
            *slot = Some(token.into());
        }
    }

    pub fn clear(&self) {
        if let Ok(mut slot) = self.token.write() {
            *slot = None;
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Option<String> {
        self.token
            .read()
            .ok()
            .and_then(|slot| slot.clone())
            .filter(|t| !t.trim().is_empty())
    }
}

/// Reads the token from an environment variable on every call
#[derive(Debug, Clone)]
pub struct EnvTokenStore {
    var: String,
}

impl EnvTokenStore {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl TokenStore for EnvTokenStore {
    fn get_token(&self) -> Option<String> {
        std::env::var(&self.var)
            .ok()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_login_logout() {
        let store = MemoryTokenStore::new();
        assert!(store.get_token().is_none());

        store.set_token("tok-1");
        assert_eq!(store.get_token().as_deref(), Some("tok-1"));

        store.clear();
        assert!(store.get_token().is_none());
    }

    #[test]
    fn test_blank_token_counts_as_absent() {
        let store = MemoryTokenStore::with_token("   ");
        assert!(store.get_token().is_none());
    }

    #[test]
    fn test_env_store_missing_var() {
        let store = EnvTokenStore::new("REALTIME_SESSIONS_TEST_TOKEN_UNSET");
        assert!(store.get_token().is_none());
        assert_eq!(store.var(), "REALTIME_SESSIONS_TEST_TOKEN_UNSET");
    }
}
