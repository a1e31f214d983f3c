//! Durable credential storage (bearer token + cached role).

use gloo::storage::{LocalStorage, Storage};
use log::warn;

use crate::api::ApiClient;
use crate::config::{ROLE_KEY, TOKEN_KEY};

/// Minimal string key-value store.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

/// `window.localStorage`, raw strings (no JSON quoting).
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStore;

impl KeyValueStore for BrowserStore {
    fn get(&self, key: &str) -> Option<String> {
        LocalStorage::raw().get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = LocalStorage::raw().set_item(key, value) {
            warn!("localStorage.setItem({key}) failed: {e:?}");
        }
    }

    fn remove(&self, key: &str) {
        LocalStorage::delete(key);
    }
}

/// Token and role persistence. Every write mirrors the token onto the
/// shared client's default `Authorization` header.
#[derive(Clone, Debug)]
pub struct Credentials<S = BrowserStore> {
    store: S,
    client: ApiClient,
}

impl Credentials<BrowserStore> {
    pub fn browser(client: ApiClient) -> Self {
        Self::new(BrowserStore, client)
    }
}

impl<S: KeyValueStore> Credentials<S> {
    pub fn new(store: S, client: ApiClient) -> Self {
        Self { store, client }
    }

    /// Persists `token`; an empty token clears everything instead.
    pub fn save(&self, token: &str) {
        if token.is_empty() {
            self.clear();
            return;
        }
        self.store.set(TOKEN_KEY, token);
        self.client.set_bearer(Some(token));
    }

    pub fn save_role(&self, role: &str) {
        if role.is_empty() {
            self.store.remove(ROLE_KEY);
        } else {
            self.store.set(ROLE_KEY, role);
        }
    }

    pub fn read(&self) -> Option<String> {
        self.store.get(TOKEN_KEY).filter(|t| !t.is_empty())
    }

    pub fn read_role(&self) -> Option<String> {
        self.store.get(ROLE_KEY).filter(|r| !r.is_empty())
    }

    pub fn clear(&self) {
        self.store.remove(TOKEN_KEY);
        self.store.remove(ROLE_KEY);
        self.client.set_bearer(None);
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;

    use super::KeyValueStore;

    /// In-memory store; clones share their contents.
    #[derive(Clone, Debug, Default)]
    pub struct MemoryStore(Rc<RefCell<HashMap<String, String>>>);

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.0.borrow().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) {
            self.0.borrow_mut().insert(key.to_string(), value.to_string());
        }

        fn remove(&self, key: &str) {
            self.0.borrow_mut().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    fn credentials() -> (Credentials<MemoryStore>, MemoryStore, ApiClient) {
        let store = MemoryStore::default();
        let client = ApiClient::new("http://127.0.0.1:8000/api");
        (Credentials::new(store.clone(), client.clone()), store, client)
    }

    #[test]
    fn save_then_read_round_trips() {
        let (creds, _, client) = credentials();
        creds.save("aaa.bbb.ccc");
        assert_eq!(creds.read().as_deref(), Some("aaa.bbb.ccc"));
        assert_eq!(client.authorization().as_deref(), Some("Bearer aaa.bbb.ccc"));
    }

    #[test]
    fn clear_removes_token_role_and_header() {
        let (creds, store, client) = credentials();
        creds.save("aaa.bbb.ccc");
        creds.save_role("admin");

        creds.clear();

        assert_eq!(creds.read(), None);
        assert_eq!(creds.read_role(), None);
        assert_eq!(store.get(TOKEN_KEY), None);
        assert_eq!(client.authorization(), None);
    }

    #[test]
    fn saving_an_empty_token_clears() {
        let (creds, _, client) = credentials();
        creds.save("aaa.bbb.ccc");
        creds.save_role("petugas");
        creds.save("");
        assert_eq!(creds.read(), None);
        assert_eq!(creds.read_role(), None);
        assert_eq!(client.bearer(), None);
    }

    #[test]
    fn tokens_are_stored_under_the_canonical_key() {
        let (creds, store, _) = credentials();
        creds.save("t.o.k");
        creds.save_role("admin");
        assert_eq!(store.get("authToken").as_deref(), Some("t.o.k"));
        assert_eq!(store.get("role").as_deref(), Some("admin"));
    }
}
