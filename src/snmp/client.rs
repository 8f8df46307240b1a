//! UDP transport for community-based SNMP GET requests.
//!
//! Encoding and the session itself come from `snmp2`; this adapter owns
//! target resolution, per-attempt timeouts, retries and the round-trip
//! timing around each exchange.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicI32, Ordering};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use snmp2::AsyncSession;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::oid::ObjectId;
use super::value::{Value, VarBind, Version};
use crate::error::TransportError;

/// Maximum number of OIDs accepted in a single GET.
pub const MAX_OIDS: usize = 60;

/// Response to one GET, with the time spent on the wire.
#[derive(Debug, Clone)]
pub struct GetResponse {
    pub variables: Vec<VarBind>,
    /// From just before the request was handed to the session to just after
    /// its response came back.
    pub round_trip: Duration,
    /// Wall-clock arrival time of the response.
    pub received_at: DateTime<Utc>,
}

/// Anything that can answer an SNMP GET.
pub trait SnmpClient: Send + Sync {
    fn get(
        &self,
        oids: &[ObjectId],
    ) -> impl Future<Output = Result<GetResponse, TransportError>> + Send;
}

/// Connection parameters for [`UdpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub target: String,
    pub port: u16,
    pub community: String,
    pub version: Version,
    /// Per-attempt wait for a response.
    pub timeout: Duration,
    /// Additional attempts after the first one times out.
    pub retries: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            target: "127.0.0.1".to_string(),
            port: 161,
            community: "public".to_string(),
            version: Version::V2c,
            timeout: Duration::from_secs(2),
            retries: 3,
        }
    }
}

/// SNMP client bound to a single agent.
pub struct UdpClient {
    session: Mutex<AsyncSession>,
    peer: SocketAddr,
    community: Vec<u8>,
    version: Version,
    timeout: Duration,
    retries: u32,
    next_request_id: AtomicI32,
}

impl UdpClient {
    /// Resolves the target and opens a session to it.
    pub async fn connect(config: &ClientConfig) -> Result<Self, TransportError> {
        let resolve_err = |reason: String| TransportError::Resolve {
            target: config.target.clone(),
            reason,
        };

        let peer = tokio::net::lookup_host((config.target.as_str(), config.port))
            .await
            .map_err(|e| resolve_err(e.to_string()))?
            .next()
            .ok_or_else(|| resolve_err("no addresses found".to_string()))?;

        // Start from a time-derived id so restarts don't reuse recent ids.
        let seed = (Utc::now().timestamp_subsec_nanos() & 0x3fff_ffff) as i32;
        let community = config.community.as_bytes().to_vec();
        let session = open_session(peer, &community, config.version, seed.max(1)).await?;

        info!(
            "SNMP v{} client connected to {} (timeout {:?}, retries {})",
            config.version, peer, config.timeout, config.retries
        );

        Ok(Self {
            session: Mutex::new(session),
            peer,
            community,
            version: config.version,
            timeout: config.timeout,
            retries: config.retries,
            // The session advances its own counter; this one only seeds
            // replacement sessions.
            next_request_id: AtomicI32::new(seed.max(1).wrapping_add(0x0100_0000)),
        })
    }

    fn request_id_seed(&self) -> i32 {
        let id = self.next_request_id.fetch_add(0x0100_0000, Ordering::Relaxed);
        // Stay in the positive range; some agents mishandle negative ids.
        id & 0x7fff_ffff
    }

    /// One GET on `session`. `None` when no response arrived in time.
    async fn attempt(
        &self,
        session: &mut AsyncSession,
        oids: &[snmp2::Oid<'static>],
    ) -> Result<Option<GetResponse>, TransportError> {
        let names: Vec<&snmp2::Oid<'_>> = oids.iter().collect();

        let sent = Instant::now();
        let response = match tokio::time::timeout(self.timeout, session.get_many(&names)).await {
            Ok(response) => response.map_err(|e| TransportError::Protocol(format!("{e:?}")))?,
            Err(_) => return Ok(None),
        };
        let round_trip = sent.elapsed();
        let received_at = Utc::now();

        if response.error_status != 0 {
            return Err(TransportError::Agent {
                status: response.error_status,
                name: error_status_name(response.error_status),
                index: response.error_index,
            });
        }

        let mut variables = Vec::with_capacity(oids.len());
        for (name, value) in response.varbinds {
            match ObjectId::from_oid(&name) {
                Some(oid) => variables.push(VarBind::new(oid, Value::from(&value))),
                None => debug!("Dropping variable with an OID arc wider than 32 bits"),
            }
        }

        Ok(Some(GetResponse {
            variables,
            round_trip,
            received_at,
        }))
    }
}

async fn open_session(
    peer: SocketAddr,
    community: &[u8],
    version: Version,
    request_id: i32,
) -> Result<AsyncSession, TransportError> {
    let session = match version {
        Version::V1 => AsyncSession::new_v1(peer, community, request_id).await?,
        Version::V2c => AsyncSession::new_v2c(peer, community, request_id).await?,
    };
    Ok(session)
}

impl SnmpClient for UdpClient {
    async fn get(&self, oids: &[ObjectId]) -> Result<GetResponse, TransportError> {
        if oids.is_empty() {
            return Err(TransportError::NoOids);
        }
        if oids.len() > MAX_OIDS {
            return Err(TransportError::TooManyOids {
                count: oids.len(),
                max: MAX_OIDS,
            });
        }

        let names = oids
            .iter()
            .map(ObjectId::to_oid)
            .collect::<Result<Vec<_>, _>>()
            .map_err(TransportError::Protocol)?;

        let mut session = self.session.lock().await;
        let attempts = self.retries + 1;
        for attempt in 1..=attempts {
            if let Some(response) = self.attempt(&mut session, &names).await? {
                return Ok(response);
            }

            // A late reply to the abandoned request must not be read as the
            // answer to the next one, so each retry gets a fresh socket.
            *session = open_session(
                self.peer,
                &self.community,
                self.version,
                self.request_id_seed(),
            )
            .await?;

            if attempt < attempts {
                warn!(
                    "No response from {} within {:?} (attempt {}/{}), retrying",
                    self.peer, self.timeout, attempt, attempts
                );
            }
        }

        Err(TransportError::Timeout {
            attempts,
            timeout: self.timeout,
        })
    }
}

/// RFC 3416 error-status names.
pub fn error_status_name(status: u32) -> &'static str {
    match status {
        0 => "noError",
        1 => "tooBig",
        2 => "noSuchName",
        3 => "badValue",
        4 => "readOnly",
        5 => "genErr",
        6 => "noAccess",
        7 => "wrongType",
        8 => "wrongLength",
        9 => "wrongEncoding",
        10 => "wrongValue",
        11 => "noCreation",
        12 => "inconsistentValue",
        13 => "resourceUnavailable",
        14 => "commitFailed",
        15 => "undoFailed",
        16 => "authorizationError",
        17 => "notWritable",
        18 => "inconsistentName",
        _ => "unknown",
    }
}
