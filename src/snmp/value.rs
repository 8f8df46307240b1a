//! Owned variable bindings, detached from the session's receive buffer.

use std::fmt;
use std::str::FromStr;

use super::oid::ObjectId;

/// Community-based protocol version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Version {
    V1,
    #[default]
    V2c,
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Version::V1 => f.write_str("1"),
            Version::V2c => f.write_str("2c"),
        }
    }
}

impl FromStr for Version {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "v1" => Ok(Version::V1),
            "2c" | "v2c" => Ok(Version::V2c),
            other => Err(format!("unsupported SNMP version '{other}', expected '1' or '2c'")),
        }
    }
}

/// A variable-binding value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Integer(i64),
    OctetString(Vec<u8>),
    Null,
    ObjectIdentifier(ObjectId),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Opaque(Vec<u8>),
    Counter64(u64),
    NoSuchObject,
    NoSuchInstance,
    EndOfMibView,
    /// Any other ASN.1 type; no label renderer accepts it.
    Unsupported,
}

impl Value {
    /// Raw bytes of string-like values.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::OctetString(b) | Value::Opaque(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    /// Any integer-valued type widened to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(v) => Some(*v),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => Some(i64::from(*v)),
            Value::Counter64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }
}

impl From<&snmp2::Value<'_>> for Value {
    fn from(value: &snmp2::Value<'_>) -> Self {
        match value {
            snmp2::Value::Integer(v) => Value::Integer(*v),
            snmp2::Value::OctetString(b) => Value::OctetString(b.to_vec()),
            snmp2::Value::Null => Value::Null,
            snmp2::Value::ObjectIdentifier(oid) => {
                ObjectId::from_oid(oid).map_or(Value::Unsupported, Value::ObjectIdentifier)
            }
            snmp2::Value::IpAddress(addr) => Value::IpAddress(*addr),
            snmp2::Value::Counter32(v) => Value::Counter32(*v),
            snmp2::Value::Unsigned32(v) => Value::Gauge32(*v),
            snmp2::Value::Timeticks(v) => Value::TimeTicks(*v),
            snmp2::Value::Opaque(b) => Value::Opaque(b.to_vec()),
            snmp2::Value::Counter64(v) => Value::Counter64(*v),
            snmp2::Value::NoSuchObject => Value::NoSuchObject,
            snmp2::Value::NoSuchInstance => Value::NoSuchInstance,
            snmp2::Value::EndOfMibView => Value::EndOfMibView,
            _ => Value::Unsupported,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Integer(v) => write!(f, "{v}"),
            Value::OctetString(b) | Value::Opaque(b) => match std::str::from_utf8(b) {
                Ok(s) => write!(f, "{s:?}"),
                Err(_) => {
                    f.write_str("0x")?;
                    for byte in b {
                        write!(f, "{byte:02x}")?;
                    }
                    Ok(())
                }
            },
            Value::Null => f.write_str("NULL"),
            Value::ObjectIdentifier(oid) => write!(f, "{oid}"),
            Value::IpAddress([a, b, c, d]) => write!(f, "{a}.{b}.{c}.{d}"),
            Value::Counter32(v) | Value::Gauge32(v) | Value::TimeTicks(v) => write!(f, "{v}"),
            Value::Counter64(v) => write!(f, "{v}"),
            Value::NoSuchObject => f.write_str("noSuchObject"),
            Value::NoSuchInstance => f.write_str("noSuchInstance"),
            Value::EndOfMibView => f.write_str("endOfMibView"),
            Value::Unsupported => f.write_str("unsupported"),
        }
    }
}

/// One `(name, value)` pair of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VarBind {
    pub oid: ObjectId,
    pub value: Value,
}

impl VarBind {
    pub fn new(oid: ObjectId, value: Value) -> Self {
        Self { oid, value }
    }
}
