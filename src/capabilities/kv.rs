//! Key-value capability for small string flags (theme preference). The
//! shell backs it with whatever the platform offers; the web shell uses
//! `localStorage`.

use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 512;
pub const MAX_VALUE_LENGTH: usize = 4096;

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("invalid value: {reason}")]
    InvalidValue { reason: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOutput {
    /// Result of a get; `None` when the key has never been written.
    Value(Option<String>),
    /// Acknowledgement of a set.
    Done,
}

pub type KvResult = Result<KvOutput, KvError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum KvOperation {
    Get { key: String },
    Set { key: String, value: String },
}

impl Operation for KvOperation {
    type Output = KvResult;
}

fn validate_key(key: &str) -> Result<(), KvError> {
    if key.is_empty() || key.trim().is_empty() {
        return Err(KvError::InvalidKey {
            key: key.to_string(),
            reason: "key cannot be empty".to_string(),
        });
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(KvError::InvalidKey {
            key: key.chars().take(50).collect(),
            reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
        });
    }
    if key.chars().any(char::is_control) {
        return Err(KvError::InvalidKey {
            key: key.to_string(),
            reason: "key contains control characters".to_string(),
        });
    }
    Ok(())
}

pub struct Kv<E> {
    context: CapabilityContext<KvOperation, E>,
}

impl<Ev> Capability<Ev> for Kv<Ev> {
    type Operation = KvOperation;
    type MappedSelf<MappedEv> = Kv<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Kv::new(self.context.map_event(f))
    }
}

impl<E> Kv<E>
where
    E: Send + 'static,
{
    pub fn new(context: CapabilityContext<KvOperation, E>) -> Self {
        Self { context }
    }

    pub fn get<F>(&self, key: &str, callback: F)
    where
        F: FnOnce(KvResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        match validate_key(key) {
            Ok(()) => {
                let key = key.to_string();
                self.context.spawn(async move {
                    let result = context.request_from_shell(KvOperation::Get { key }).await;
                    context.update_app(callback(result));
                });
            }
            Err(error) => {
                self.context.spawn(async move {
                    context.update_app(callback(Err(error)));
                });
            }
        }
    }

    pub fn set<F>(&self, key: &str, value: &str, callback: F)
    where
        F: FnOnce(KvResult) -> E + Send + 'static,
    {
        let context = self.context.clone();
        let checked = validate_key(key).and_then(|()| {
            if value.len() > MAX_VALUE_LENGTH {
                Err(KvError::InvalidValue {
                    reason: format!("value exceeds maximum length of {MAX_VALUE_LENGTH} bytes"),
                })
            } else {
                Ok(())
            }
        });

        match checked {
            Ok(()) => {
                let key = key.to_string();
                let value = value.to_string();
                self.context.spawn(async move {
                    let result = context
                        .request_from_shell(KvOperation::Set { key, value })
                        .await;
                    context.update_app(callback(result));
                });
            }
            Err(error) => {
                self.context.spawn(async move {
                    context.update_app(callback(Err(error)));
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_validation() {
        assert!(validate_key("picstream-theme").is_ok());
        assert!(validate_key("").is_err());
        assert!(validate_key("   ").is_err());
        assert!(validate_key("a\0b").is_err());
        assert!(validate_key(&"k".repeat(MAX_KEY_LENGTH + 1)).is_err());
    }
}
