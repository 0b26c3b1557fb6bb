use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackError {
    #[error("unknown certification track: {0}")]
    Unknown(String),
}

//
// ─── BLUEPRINT ─────────────────────────────────────────────────────────────────
//

/// One syllabus domain of an exam blueprint with its exam weight.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlueprintDomain {
    pub code: &'static str,
    pub label: &'static str,
    pub weight: f64,
}

const fn domain(code: &'static str, label: &'static str, weight: f64) -> BlueprintDomain {
    BlueprintDomain {
        code,
        label,
        weight,
    }
}

const CISSP_BLUEPRINT: &[BlueprintDomain] = &[
    domain("RISK_MGMT", "Domain 1: Security and Risk Management", 0.15),
    domain("ASSET_SEC", "Domain 2: Asset Security", 0.10),
    domain(
        "SEC_ARCH_ENG",
        "Domain 3: Security Architecture and Engineering",
        0.13,
    ),
    domain(
        "COMM_NET_SEC",
        "Domain 4: Communication and Network Security",
        0.13,
    ),
    domain("IAM", "Domain 5: Identity and Access Management (IAM)", 0.13),
    domain("SEC_ASSESS_TEST", "Domain 6: Security Assessment and Testing", 0.12),
    domain("SEC_OPS", "Domain 7: Security Operations", 0.13),
    domain("SOFTWARE_DEV_SEC", "Domain 8: Software Development Security", 0.11),
];

const SECURITY_PLUS_BLUEPRINT: &[BlueprintDomain] = &[
    domain("D1", "General Security Concepts", 0.12),
    domain("D2", "Threats, Vulnerabilities, Mitigations", 0.22),
    domain("D3", "Security Architecture", 0.18),
    domain("D4", "Operations & Incident Response", 0.28),
    domain("D5", "Governance, Risk, Compliance", 0.20),
];

const AWS_SAP_BLUEPRINT: &[BlueprintDomain] = &[
    domain("D1", "Design for Org Complexity", 0.26),
    domain("D2", "Design for New Solutions", 0.29),
    domain("D3", "Continuous Improvement", 0.25),
    domain("D4", "Security & Reliability", 0.20),
];

//
// ─── TRACK ─────────────────────────────────────────────────────────────────────
//

/// Certification track. Each variant owns a static domain/weight table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CertTrack {
    #[default]
    #[serde(rename = "CISSP")]
    Cissp,
    #[serde(rename = "SEC_PLUS")]
    SecurityPlus,
    #[serde(rename = "AWS_SAP")]
    AwsSap,
}

impl CertTrack {
    pub const ALL: [CertTrack; 3] = [CertTrack::Cissp, CertTrack::SecurityPlus, CertTrack::AwsSap];

    /// Identifier stamped on persisted records (`certID`).
    #[must_use]
    pub fn cert_id(self) -> &'static str {
        match self {
            CertTrack::Cissp => "CISSP",
            CertTrack::SecurityPlus => "SEC_PLUS",
            CertTrack::AwsSap => "AWS_SAP",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            CertTrack::Cissp => "CISSP",
            CertTrack::SecurityPlus => "SECURITY+",
            CertTrack::AwsSap => "AWS SA PRO",
        }
    }

    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            CertTrack::Cissp => "cissp",
            CertTrack::SecurityPlus => "securityplus",
            CertTrack::AwsSap => "awssap",
        }
    }

    #[must_use]
    pub fn accent(self) -> &'static str {
        match self {
            CertTrack::Cissp => "#00ff41",
            CertTrack::SecurityPlus => "#0073ae",
            CertTrack::AwsSap => "#FF9900",
        }
    }

    /// Exam blueprint for this track, in syllabus order.
    #[must_use]
    pub fn blueprint(self) -> &'static [BlueprintDomain] {
        match self {
            CertTrack::Cissp => CISSP_BLUEPRINT,
            CertTrack::SecurityPlus => SECURITY_PLUS_BLUEPRINT,
            CertTrack::AwsSap => AWS_SAP_BLUEPRINT,
        }
    }

    /// Looks up a blueprint domain by its (already normalised) code.
    #[must_use]
    pub fn domain(self, code: &str) -> Option<&'static BlueprintDomain> {
        self.blueprint().iter().find(|d| d.code == code)
    }

    /// Resolves the track for a route path. Unknown paths fall back to CISSP.
    #[must_use]
    pub fn from_path(path: &str) -> Self {
        let normalized = path.to_lowercase();
        if normalized.contains("awssap") {
            CertTrack::AwsSap
        } else if normalized.contains("securityplus") {
            CertTrack::SecurityPlus
        } else {
            CertTrack::Cissp
        }
    }

    /// Parses a persisted `certID` value.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::Unknown` if the value names no track.
    pub fn from_cert_id(value: &str) -> Result<Self, TrackError> {
        Self::ALL
            .into_iter()
            .find(|t| t.cert_id() == value)
            .ok_or_else(|| TrackError::Unknown(value.to_string()))
    }
}

impl fmt::Display for CertTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for CertTrack {
    type Err = TrackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_', '+', ' '], "").as_str() {
            "cissp" => Ok(CertTrack::Cissp),
            "securityplus" | "secplus" | "security" => Ok(CertTrack::SecurityPlus),
            "awssap" | "awssapro" | "aws" => Ok(CertTrack::AwsSap),
            _ => Err(TrackError::Unknown(s.to_string())),
        }
    }
}

/// Normalises a free-form domain label to a blueprint code.
///
/// Uppercases, replaces whitespace with `_`, and folds the short aliases some
/// content uses for CISSP domains 6 and 8.
#[must_use]
pub fn normalize_domain(raw: &str) -> String {
    let sanitized: String = raw
        .trim()
        .chars()
        .map(|c| {
            if c.is_whitespace() {
                '_'
            } else {
                c.to_ascii_uppercase()
            }
        })
        .collect();

    match sanitized.as_str() {
        "SEC_ASSESS" => "SEC_ASSESS_TEST".to_string(),
        "SOFT_DEV_SEC" => "SOFTWARE_DEV_SEC".to_string(),
        _ => sanitized,
    }
}
