//! Named request agents
//!
//! A registry is created empty, filled by `create`, and torn down with
//! `close_all`. It is meant for single-threaded use by one test run; share it
//! behind a lock if several tasks need it.

use crate::error::{Error, Result};
use crate::http::{ClientConfig, RequestAgent};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tracing::info;

/// Store of request agents by name
#[derive(Debug, Default)]
pub struct ClientRegistry {
    agents: HashMap<String, RequestAgent>,
}

impl ClientRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an agent for `config` and store it under `name`
    pub fn create(
        &mut self,
        name: impl Into<String>,
        config: ClientConfig,
    ) -> Result<&mut RequestAgent> {
        match self.agents.entry(name.into()) {
            Entry::Occupied(entry) => Err(Error::DuplicateName {
                name: entry.key().clone(),
            }),
            Entry::Vacant(entry) => {
                let agent = RequestAgent::open(config)?;
                info!(name = %entry.key(), "Client registered");
                Ok(entry.insert(agent))
            }
        }
    }

    /// Open an agent with default settings for `base_url`
    pub fn create_with_url(
        &mut self,
        name: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Result<&mut RequestAgent> {
        let name = name.into();
        if self.agents.contains_key(&name) {
            return Err(Error::DuplicateName { name });
        }
        self.create(name, ClientConfig::new(base_url)?)
    }

    /// Look up an agent
    pub fn get(&self, name: &str) -> Result<&RequestAgent> {
        self.agents.get(name).ok_or_else(|| not_found(name))
    }

    /// Look up an agent for reconfiguration
    pub fn get_mut(&mut self, name: &str) -> Result<&mut RequestAgent> {
        self.agents.get_mut(name).ok_or_else(|| not_found(name))
    }

    /// Whether an agent is registered under `name`
    pub fn contains(&self, name: &str) -> bool {
        self.agents.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.agents.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Number of registered agents
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Close and forget one agent
    pub fn close(&mut self, name: &str) -> Result<()> {
        let agent = self.agents.remove(name).ok_or_else(|| not_found(name))?;
        agent.close();
        Ok(())
    }

    /// Close every agent and clear the registry
    pub fn close_all(&mut self) {
        for (_, agent) in self.agents.drain() {
            agent.close();
        }
    }
}

fn not_found(name: &str) -> Error {
    Error::NotFound {
        name: name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_get() {
        let mut registry = ClientRegistry::new();
        registry
            .create_with_url("users", "https://users.example.com")
            .unwrap();

        let agent = registry.get("users").unwrap();
        assert_eq!(agent.config().base_url, "https://users.example.com");
        assert!(registry.contains("users"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_duplicate_name_is_rejected() {
        let mut registry = ClientRegistry::new();
        registry.create_with_url("users", "https://a.example.com").unwrap();

        let err = registry
            .create_with_url("users", "https://b.example.com")
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateName { ref name } if name == "users"));

        let config = ClientConfig::new("https://c.example.com").unwrap();
        assert!(matches!(
            registry.create("users", config),
            Err(Error::DuplicateName { .. })
        ));
        assert_eq!(
            registry.get("users").unwrap().config().base_url,
            "https://a.example.com"
        );
    }

    #[test]
    fn test_missing_name() {
        let mut registry = ClientRegistry::new();
        assert!(matches!(
            registry.get("ghost"),
            Err(Error::NotFound { ref name }) if name == "ghost"
        ));
        assert!(matches!(
            registry.get_mut("ghost"),
            Err(Error::NotFound { .. })
        ));
        assert!(matches!(registry.close("ghost"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_invalid_config_is_not_stored() {
        let mut registry = ClientRegistry::new();
        assert!(matches!(
            registry.create_with_url("broken", ""),
            Err(Error::InvalidConfig { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_get_mut_allows_auth_changes() {
        let mut registry = ClientRegistry::new();
        registry.create_with_url("api", "https://api.example.com").unwrap();
        registry.get_mut("api").unwrap().set_oauth_token("tok");
        assert_eq!(registry.get("api").unwrap().bearer_token(), Some("tok"));
    }

    #[test]
    fn test_close_all_clears() {
        let mut registry = ClientRegistry::new();
        registry.create_with_url("b", "https://b.example.com").unwrap();
        registry.create_with_url("a", "https://a.example.com").unwrap();
        assert_eq!(registry.names(), vec!["a", "b"]);

        registry.close("a").unwrap();
        assert_eq!(registry.names(), vec!["b"]);

        registry.close_all();
        assert!(registry.is_empty());
        registry.create_with_url("b", "https://b.example.com").unwrap();
    }
}
