//! Contains all of the types needed to specify options to write operations.
//!
//! The options structs in this module use the
//! [`typed-builder`](https://crates.io/crates/typed-builder) crate to derive a type-safe builder
//! API on them. For example, to create an instance of
//! [`WriteOptions`](struct.WriteOptions.html) with only `ordered` and `retry_writes` set, the
//! builder API can be used as follows:
//!
//! ```rust
//! # use mongodb_write_core::options::WriteOptions;
//! #
//! let options = WriteOptions::builder()
//!     .ordered(false)
//!     .retry_writes(true)
//!     .build();
//! ```

use std::{
    fmt,
    hash::{Hash, Hasher},
    str::FromStr,
};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_with::skip_serializing_none;
use typed_builder::TypedBuilder;

pub use crate::concern::*;
use crate::error::{Error, Result};

/// The default port a MongoDB server listens on.
pub const DEFAULT_PORT: u16 = 27017;

/// Options shared by every write operation.
#[skip_serializing_none]
#[derive(Clone, Debug, Default, PartialEq, TypedBuilder, Serialize, Deserialize)]
#[builder(field_defaults(default, setter(into)))]
#[serde(rename_all = "camelCase")]
#[non_exhaustive]
pub struct WriteOptions {
    /// If true, when a write fails the remaining writes in the batch are not attempted. Defaults
    /// to true.
    pub ordered: Option<bool>,

    /// The write concern for the operation. If unset, the server's default write concern is
    /// used, which is acknowledged.
    pub write_concern: Option<WriteConcern>,

    /// Whether the write may be transparently retried. Defaults to false.
    ///
    /// When enabled, the deployment is checked for retryable write support before the write is
    /// sent, and writes against deployments that cannot support them fail immediately.
    #[serde(skip)]
    pub retry_writes: Option<bool>,

    /// Opt out of document-level validation.
    pub bypass_document_validation: Option<bool>,
}

/// An enum representing the address of a MongoDB server.
#[derive(Clone, Debug, Eq)]
#[non_exhaustive]
pub enum ServerAddress {
    /// A TCP/IP host and port combination.
    Tcp {
        /// The hostname or IP address where the MongoDB server can be found.
        host: String,

        /// The TCP port that the MongoDB server is listening on.
        ///
        /// The default is 27017.
        port: Option<u16>,
    },
}

impl ServerAddress {
    /// Parses an address string into a `ServerAddress`.
    pub fn parse(address: impl AsRef<str>) -> Result<Self> {
        let address = address.as_ref();
        let mut parts = address.split(':');

        let host = match parts.next() {
            Some(part) if !part.is_empty() => part,
            _ => {
                return Err(Error::invalid_argument(format!(
                    "invalid server address: \"{}\"",
                    address
                )))
            }
        };

        let port = match parts.next() {
            Some(part) => {
                let port = u16::from_str(part).map_err(|_| {
                    Error::invalid_argument(format!(
                        "port must be valid 16-bit unsigned integer, instead got: {}",
                        part
                    ))
                })?;

                if port == 0 {
                    return Err(Error::invalid_argument(format!(
                        "invalid server address: \"{}\"; port must be non-zero",
                        address
                    )));
                }
                if parts.next().is_some() {
                    return Err(Error::invalid_argument(format!(
                        "address \"{}\" contains more than one unescaped ':'",
                        address
                    )));
                }

                Some(port)
            }
            None => None,
        };

        Ok(ServerAddress::Tcp {
            host: host.to_lowercase(),
            port,
        })
    }

    /// The hostname of this address.
    pub fn host(&self) -> &str {
        match self {
            Self::Tcp { host, .. } => host.as_str(),
        }
    }

    /// The port of this address, if one was specified.
    pub fn port(&self) -> Option<u16> {
        match self {
            Self::Tcp { port, .. } => *port,
        }
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        Self::Tcp {
            host: "localhost".into(),
            port: None,
        }
    }
}

impl PartialEq for ServerAddress {
    fn eq(&self, other: &Self) -> bool {
        self.host() == other.host()
            && self.port().unwrap_or(DEFAULT_PORT) == other.port().unwrap_or(DEFAULT_PORT)
    }
}

impl Hash for ServerAddress {
    fn hash<H>(&self, state: &mut H)
    where
        H: Hasher,
    {
        self.host().hash(state);
        self.port().unwrap_or(DEFAULT_PORT).hash(state);
    }
}

impl FromStr for ServerAddress {
    type Err = Error;

    fn from_str(address: &str) -> Result<Self> {
        ServerAddress::parse(address)
    }
}

impl fmt::Display for ServerAddress {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "{}:{}",
            self.host(),
            self.port().unwrap_or(DEFAULT_PORT)
        )
    }
}

impl<'de> Deserialize<'de> for ServerAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: String = Deserialize::deserialize(deserializer)?;
        Self::parse(s.as_str()).map_err(|e| serde::de::Error::custom(format!("{}", e)))
    }
}

impl Serialize for ServerAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod test {
    use pretty_assertions::assert_eq;

    use super::{ServerAddress, WriteOptions, DEFAULT_PORT};
    use crate::{bson::doc, options::WriteConcern};

    #[test]
    fn parse_server_address() {
        let address = ServerAddress::parse("Example.com:27018").unwrap();
        assert_eq!(address.host(), "example.com");
        assert_eq!(address.port(), Some(27018));
        assert_eq!(address.to_string(), "example.com:27018");

        let address = ServerAddress::parse("localhost").unwrap();
        assert_eq!(address.port(), None);
        assert_eq!(address, ServerAddress::parse(format!("localhost:{DEFAULT_PORT}")).unwrap());

        assert!(ServerAddress::parse("").is_err());
        assert!(ServerAddress::parse("host:port").is_err());
        assert!(ServerAddress::parse("host:0").is_err());
        assert!(ServerAddress::parse("host:1:2").is_err());
    }

    #[test]
    fn write_options_serialize_without_unset_fields() {
        let options = WriteOptions::builder()
            .ordered(false)
            .write_concern(WriteConcern::majority())
            .retry_writes(true)
            .build();
        assert_eq!(
            crate::bson::to_document(&options).unwrap(),
            doc! { "ordered": false, "writeConcern": { "w": "majority" } }
        );
        assert_eq!(
            crate::bson::to_document(&WriteOptions::default()).unwrap(),
            doc! {}
        );
    }
}
