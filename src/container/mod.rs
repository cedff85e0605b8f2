use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

mod error;

pub use error::{Error, Result};

/// The maximum allowed length for a [`ContainerID`].
const CONTAINER_ID_MAX_LEN: usize = 255;

/// Number of characters shown when a [`ContainerID`] is abbreviated in log output.
const CONTAINER_ID_SHORT_LEN: usize = 12;

/// A validated container identifier.
///
/// # Examples
///
/// ```
/// # use creo_logstream::container::{ContainerID, Error};
/// let raw_id = "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd";
/// let container_id = ContainerID::new(raw_id).unwrap();
/// assert_eq!(container_id.as_ref(), "abc123abc123abc123abc123abc123abc123abc123abc123abc123abc123abcd");
/// assert_eq!(container_id.short(), "abc123abc123");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerID(Arc<str>);

impl ContainerID {
    /// Creates a new `ContainerID` from the given raw id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidContainerID`] if the input is empty or its length exceeds
    /// [`CONTAINER_ID_MAX_LEN`].
    pub fn new(src: impl AsRef<str>) -> Result<Self> {
        let src = src.as_ref();
        if src.is_empty() || src.len() > CONTAINER_ID_MAX_LEN {
            return Err(Error::InvalidContainerID(src.to_owned()));
        }

        Ok(Self(src.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the abbreviated form used by the docker CLI, i.e., the first 12 characters.
    pub fn short(&self) -> &str {
        match self.0.char_indices().nth(CONTAINER_ID_SHORT_LEN) {
            Some((idx, _)) => &self.0[..idx],
            None => &self.0,
        }
    }

    pub fn to_arc(&self) -> Arc<str> {
        Arc::clone(&self.0)
    }
}

impl AsRef<str> for ContainerID {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ContainerID {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContainerID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A running container as reported by the container runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRecord {
    id: ContainerID,
    name: Arc<str>,
}

impl ContainerRecord {
    pub fn new(id: ContainerID, name: impl Into<Arc<str>>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }

    pub fn id(&self) -> &ContainerID {
        &self.id
    }

    /// Display name of the container, exactly as the runtime lists it.
    pub fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_rejects_empty() {
        let err = ContainerID::new("").unwrap_err();
        assert!(matches!(err, Error::InvalidContainerID(ref id) if id.is_empty()));
    }

    #[test]
    fn test_container_id_rejects_too_long() {
        let raw = "a".repeat(CONTAINER_ID_MAX_LEN + 1);
        assert!(ContainerID::new(&raw).is_err());
        assert!(ContainerID::new(&raw[..CONTAINER_ID_MAX_LEN]).is_ok());
    }

    #[test]
    fn test_short_id() {
        let id = ContainerID::new("0123456789abcdef").unwrap();
        assert_eq!(id.short(), "0123456789ab");

        let id = ContainerID::new("abc").unwrap();
        assert_eq!(id.short(), "abc");
    }

    #[test]
    fn test_record_accessors() {
        let id = ContainerID::new("deadbeef").unwrap();
        let record = ContainerRecord::new(id.clone(), "/web");
        assert_eq!(record.id(), &id);
        assert_eq!(record.name(), "/web");
    }
}
