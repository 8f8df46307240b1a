//! Info-label extraction from SNMP response variables.
//!
//! The extractor is a dispatch table from OID to label name and value
//! renderer. Supporting another field means adding one rule; nothing else in
//! the polling path changes.

use std::collections::BTreeMap;
use std::fmt;
use tracing::info;

use crate::error::ConfigurationError;
use crate::snmp::{ObjectId, Value, VarBind};

/// Label name → label value for `snmp_about_info`, rebuilt every cycle.
pub type InfoLabels = BTreeMap<String, String>;

/// Renders a variable's value as a label value, or `None` when the value has
/// the wrong type for this field.
pub type Render = fn(&Value) -> Option<String>;

/// SNMPv2-MIB::sysContact.0
pub fn sys_contact() -> ObjectId {
    ObjectId::from_arcs([1, 3, 6, 1, 2, 1, 1, 4, 0])
}

/// SNMPv2-MIB::sysServices.0
pub fn sys_services() -> ObjectId {
    ObjectId::from_arcs([1, 3, 6, 1, 2, 1, 1, 7, 0])
}

/// OCTET STRING decoded as UTF-8, invalid sequences replaced.
pub fn render_text(value: &Value) -> Option<String> {
    value
        .as_bytes()
        .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
}

/// sysServices bitmask as binary digits, zero-padded to the seven OSI
/// layers; wider values keep their natural width.
pub fn render_services(value: &Value) -> Option<String> {
    value
        .as_i64()
        .filter(|n| *n >= 0)
        .map(|n| format!("{n:07b}"))
}

/// Checks a label name against the Prometheus data model. Names starting
/// with `__` are reserved.
pub fn validate_label_name(name: &str) -> Result<(), ConfigurationError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if valid_start && valid_rest && !name.starts_with("__") {
        Ok(())
    } else {
        Err(ConfigurationError::InvalidLabelName(name.to_string()))
    }
}

#[derive(Clone)]
struct Rule {
    label: String,
    render: Render,
}

/// Fixed table of known response fields.
#[derive(Clone)]
pub struct LabelExtractor {
    rules: BTreeMap<ObjectId, Rule>,
}

impl fmt::Debug for LabelExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.rules.iter().map(|(oid, rule)| (oid.to_string(), &rule.label)))
            .finish()
    }
}

impl Default for LabelExtractor {
    /// `contact` from sysContact.0 and `sysServices` from sysServices.0.
    fn default() -> Self {
        Self::empty()
            .with_rule(sys_contact(), "contact", render_text)
            .with_rule(sys_services(), "sysServices", render_services)
    }
}

impl LabelExtractor {
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn with_rule(mut self, oid: ObjectId, label: impl Into<String>, render: Render) -> Self {
        self.rules.insert(
            oid,
            Rule {
                label: label.into(),
                render,
            },
        );
        self
    }

    /// OIDs the table knows about, in ascending order.
    pub fn oids(&self) -> Vec<ObjectId> {
        self.rules.keys().cloned().collect()
    }

    /// Builds a fresh label map from `variables`.
    pub fn extract(&self, variables: &[VarBind]) -> InfoLabels {
        self.extract_counted(variables).0
    }

    /// Like [`extract`](Self::extract), also returning how many variables
    /// had no entry in the table.
    pub fn extract_counted(&self, variables: &[VarBind]) -> (InfoLabels, usize) {
        let mut labels = InfoLabels::new();
        let mut unmatched = 0;

        for (index, variable) in variables.iter().enumerate() {
            match self.rules.get(&variable.oid) {
                Some(rule) => match (rule.render)(&variable.value) {
                    Some(value) => {
                        labels.insert(rule.label.clone(), value);
                    }
                    None => {
                        info!(
                            "{}: oid {} for label '{}' has unusable value: {}",
                            index, variable.oid, rule.label, variable.value
                        );
                    }
                },
                None => {
                    unmatched += 1;
                    info!(
                        "{}: unmatched oid: {}  value: {}",
                        index, variable.oid, variable.value
                    );
                }
            }
        }

        (labels, unmatched)
    }
}
