//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Identity**: `DeliveryId`, `TenantId`
//! - **Lifecycle**: `DeliveryStatus`, `DeliveryRecord`
//! - **Artifacts**: `ArtifactNamespace`, `ArtifactRef`
//! - **Actors**: `ActorKind`

use crate::errors::ParseError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Wall-clock instant used throughout the data model.
pub type Timestamp = DateTime<Utc>;

// =============================================================================
// IDENTITY
// =============================================================================

/// Opaque identifier of a delivery record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeliveryId(pub Uuid);

impl DeliveryId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight characters of the hyphenated form, for log lines.
    pub fn short(&self) -> String {
        self.0.to_string().chars().take(8).collect()
    }
}

impl Default for DeliveryId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DeliveryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DeliveryId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseError::InvalidId(s.to_string()))
    }
}

/// Identifier of the business (tenant) that owns a delivery.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|_| ParseError::InvalidId(s.to_string()))
    }
}

// =============================================================================
// LIFECYCLE
// =============================================================================

/// Lifecycle state of a delivery record.
///
/// `SIGNED` and `DOC_UPLOADED` record which artifact arrived last; readiness
/// for finalization is decided by the artifact pointers, never by status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeliveryStatus {
    Created,
    Signed,
    DocUploaded,
    Finalized,
    Closed,
    Expired,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Created => "CREATED",
            DeliveryStatus::Signed => "SIGNED",
            DeliveryStatus::DocUploaded => "DOC_UPLOADED",
            DeliveryStatus::Finalized => "FINALIZED",
            DeliveryStatus::Closed => "CLOSED",
            DeliveryStatus::Expired => "EXPIRED",
        }
    }

    /// `CLOSED` and `EXPIRED` are terminal: no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DeliveryStatus::Closed | DeliveryStatus::Expired)
    }

    /// Whether upload handlers may still attach artifacts.
    pub fn accepts_artifacts(&self) -> bool {
        !matches!(
            self,
            DeliveryStatus::Finalized | DeliveryStatus::Closed | DeliveryStatus::Expired
        )
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeliveryStatus {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CREATED" => Ok(DeliveryStatus::Created),
            "SIGNED" => Ok(DeliveryStatus::Signed),
            "DOC_UPLOADED" => Ok(DeliveryStatus::DocUploaded),
            "FINALIZED" => Ok(DeliveryStatus::Finalized),
            "CLOSED" => Ok(DeliveryStatus::Closed),
            "EXPIRED" => Ok(DeliveryStatus::Expired),
            other => Err(ParseError::UnknownStatus(other.to_string())),
        }
    }
}

// =============================================================================
// ARTIFACTS
// =============================================================================

/// Storage namespace of an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactNamespace {
    Signature,
    Original,
    Final,
}

impl ArtifactNamespace {
    pub const ALL: [ArtifactNamespace; 3] = [
        ArtifactNamespace::Signature,
        ArtifactNamespace::Original,
        ArtifactNamespace::Final,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactNamespace::Signature => "signature",
            ArtifactNamespace::Original => "original",
            ArtifactNamespace::Final => "final",
        }
    }
}

impl fmt::Display for ArtifactNamespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactNamespace {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "signature" => Ok(ArtifactNamespace::Signature),
            "original" => Ok(ArtifactNamespace::Original),
            "final" => Ok(ArtifactNamespace::Final),
            other => Err(ParseError::UnknownNamespace(other.to_string())),
        }
    }
}

/// Reference to a stored artifact: namespace plus a path partitioned by
/// tenant and delivery (`{tenant}/{delivery}/{file}`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactRef {
    pub namespace: ArtifactNamespace,
    pub path: String,
}

impl ArtifactRef {
    pub fn new(namespace: ArtifactNamespace, path: impl Into<String>) -> Self {
        Self {
            namespace,
            path: path.into(),
        }
    }

    /// Canonical location of a signature image. `extension` is `png` or `jpg`.
    pub fn signature(tenant_id: TenantId, delivery_id: DeliveryId, extension: &str) -> Self {
        Self::new(
            ArtifactNamespace::Signature,
            format!("{}/{}/signature.{}", tenant_id, delivery_id, extension),
        )
    }

    /// Canonical location of the original document.
    pub fn original(tenant_id: TenantId, delivery_id: DeliveryId) -> Self {
        Self::new(
            ArtifactNamespace::Original,
            format!("{}/{}/original.pdf", tenant_id, delivery_id),
        )
    }

    /// Canonical location of the composed final document.
    pub fn final_document(tenant_id: TenantId, delivery_id: DeliveryId) -> Self {
        Self::new(
            ArtifactNamespace::Final,
            format!("{}/{}/final.pdf", tenant_id, delivery_id),
        )
    }
}

impl fmt::Display for ArtifactRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.namespace, self.path)
    }
}

// =============================================================================
// ACTORS
// =============================================================================

/// Who caused an audited event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorKind {
    Employee,
    Client,
    System,
}

impl ActorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorKind::Employee => "employee",
            ActorKind::Client => "client",
            ActorKind::System => "system",
        }
    }
}

// =============================================================================
// AGGREGATE ROOT
// =============================================================================

/// The aggregate tracking one physical handoff.
///
/// ## Invariants
///
/// - `final_doc_ref` is set if and only if `status == Finalized`.
/// - Artifact pointers are set at most once and never cleared.
/// - `finalizing_at` is non-null only while a composition attempt is in
///   flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: DeliveryId,
    pub tenant_id: TenantId,
    /// Commercial document number, free text.
    pub doc_number: Option<String>,
    /// Issuing business name printed on the certification page.
    pub business_name: String,
    /// Recipient who signs for the delivery.
    pub signer_name: String,
    /// Recipient email; an email access token is only issued when present.
    pub signer_email: Option<String>,
    pub status: DeliveryStatus,
    pub signature_ref: Option<ArtifactRef>,
    pub original_doc_ref: Option<ArtifactRef>,
    pub final_doc_ref: Option<ArtifactRef>,
    /// Persistent mutual-exclusion token; `None` means unlocked.
    pub finalizing_at: Option<Timestamp>,
    /// SHA-256 hex digest of the original document bytes.
    pub original_hash: Option<String>,
    pub created_at: Timestamp,
    pub finalized_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
}

impl DeliveryRecord {
    /// Create a record in `CREATED` with no artifacts.
    pub fn new(
        tenant_id: TenantId,
        business_name: impl Into<String>,
        signer_name: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id: DeliveryId::new(),
            tenant_id,
            doc_number: None,
            business_name: business_name.into(),
            signer_name: signer_name.into(),
            signer_email: None,
            status: DeliveryStatus::Created,
            signature_ref: None,
            original_doc_ref: None,
            final_doc_ref: None,
            finalizing_at: None,
            original_hash: None,
            created_at,
            finalized_at: None,
            expires_at: None,
        }
    }

    pub fn with_doc_number(mut self, doc_number: impl Into<String>) -> Self {
        self.doc_number = Some(doc_number.into());
        self
    }

    pub fn with_signer_email(mut self, email: impl Into<String>) -> Self {
        self.signer_email = Some(email.into());
        self
    }

    pub fn with_expiry(mut self, expires_at: Timestamp) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    /// Both input artifacts are attached.
    pub fn has_all_artifacts(&self) -> bool {
        self.signature_ref.is_some() && self.original_doc_ref.is_some()
    }

    /// Finalized by status or by the presence of the final artifact.
    pub fn is_finalized(&self) -> bool {
        self.status == DeliveryStatus::Finalized || self.final_doc_ref.is_some()
    }

    /// Whether a finalization attempt currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.finalizing_at.is_some()
    }

    /// Ready but not yet finalized: candidates for a retry sweep.
    pub fn awaits_finalization(&self) -> bool {
        self.has_all_artifacts() && !self.is_finalized() && !self.status.is_terminal()
    }

    /// Base name for the downloaded file: document number when present,
    /// otherwise the delivery identifier.
    pub fn download_stem(&self) -> String {
        match self.doc_number.as_deref().map(str::trim) {
            Some(doc) if !doc.is_empty() => doc.to_string(),
            _ => self.id.to_string(),
        }
    }
}
