//! SNMP v1/v2c GET client.
//!
//! - `oid`: object identifiers
//! - `value`: owned values and variable bindings
//! - `client`: the `snmp2` session adapter and the [`SnmpClient`] seam used
//!   by the probe

pub mod client;
pub mod oid;
pub mod value;

pub use client::{error_status_name, ClientConfig, GetResponse, SnmpClient, UdpClient, MAX_OIDS};
pub use oid::{ObjectId, ParseOidError};
pub use value::{Value, VarBind, Version};
