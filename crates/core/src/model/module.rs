use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{DrillId, ModuleId};
use crate::model::question::{Drill, Question};
use crate::model::track::{CertTrack, normalize_domain};

/// Question text of the stand-in drill served when a quiz config will not parse.
pub const CORRUPT_CONFIG_TEXT: &str = "CORRUPT_JSON_DATA_MODEL";

/// Group code for modules whose domain is not on the track blueprint.
pub const UNMAPPED_GROUP: &str = "UNMAPPED";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ModuleError {
    #[error("module title cannot be empty")]
    EmptyTitle,

    #[error("invalid module type: {0}")]
    InvalidKind(String),

    #[error("module is a {0}, not a quiz")]
    NotAQuiz(ModuleKind),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// How a module's content is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModuleKind {
    Quiz,
    Diagram,
    Lab,
    Legacy,
}

impl ModuleKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ModuleKind::Quiz => "QUIZ",
            ModuleKind::Diagram => "DIAGRAM",
            ModuleKind::Lab => "LAB",
            ModuleKind::Legacy => "LEGACY",
        }
    }
}

impl FromStr for ModuleKind {
    type Err = ModuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "QUIZ" => Ok(ModuleKind::Quiz),
            "DIAGRAM" => Ok(ModuleKind::Diagram),
            "LAB" | "INTERACTIVE" => Ok(ModuleKind::Lab),
            "LEGACY" => Ok(ModuleKind::Legacy),
            _ => Err(ModuleError::InvalidKind(s.to_string())),
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//
// ─── MODULE ────────────────────────────────────────────────────────────────────
//

/// Fields of a module that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewModule {
    pub track: CertTrack,
    pub title: String,
    pub domain: String,
    pub kind: ModuleKind,
    pub description: String,
    pub config: Option<String>,
    pub asset_path: Option<String>,
}

impl NewModule {
    /// The domain is normalised to a blueprint code. A blank domain files the
    /// module under the first domain of the track.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::EmptyTitle` for a blank title.
    pub fn new(
        track: CertTrack,
        title: impl Into<String>,
        domain: &str,
        kind: ModuleKind,
    ) -> Result<Self, ModuleError> {
        let title = title.into().trim().to_string();
        if title.is_empty() {
            return Err(ModuleError::EmptyTitle);
        }
        let domain = if domain.trim().is_empty() {
            track
                .blueprint()
                .first()
                .map(|d| d.code.to_string())
                .unwrap_or_default()
        } else {
            normalize_domain(domain)
        };

        Ok(Self {
            track,
            title,
            domain,
            kind,
            description: String::new(),
            config: None,
            asset_path: None,
        })
    }

    #[must_use]
    pub fn with_config(mut self, raw: impl Into<String>) -> Self {
        self.config = Some(raw.into());
        self
    }

    #[must_use]
    pub fn with_asset_path(mut self, path: impl Into<String>) -> Self {
        self.asset_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn into_module(self, id: ModuleId) -> StudyModule {
        StudyModule {
            id,
            track: self.track,
            title: self.title,
            domain: self.domain,
            kind: self.kind,
            description: self.description,
            config: self.config,
            asset_path: self.asset_path,
        }
    }
}

/// A unit of study content in the vault.
///
/// `config` holds the raw JSON the module was ingested with. It is only
/// parsed on demand, so a bad document never blocks listing the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyModule {
    pub id: ModuleId,
    #[serde(rename = "certID")]
    pub track: CertTrack,
    pub title: String,
    pub domain: String,
    #[serde(rename = "type")]
    pub kind: ModuleKind,
    pub description: String,
    pub config: Option<String>,
    pub asset_path: Option<String>,
}

/// Why a quiz module was served without its own questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigFault {
    Missing,
    Corrupt(String),
}

/// A drill built from a quiz module, plus what went wrong reading it, if anything.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleDrill {
    pub drill: Drill,
    pub fault: Option<ConfigFault>,
}

#[derive(Deserialize)]
struct QuizConfig {
    #[serde(default)]
    id: Option<DrillId>,
    questions: Vec<Question>,
}

impl StudyModule {
    /// Drill id used when the config does not name one.
    #[must_use]
    pub fn default_drill_id(&self) -> DrillId {
        DrillId::new(format!("module-{}", self.id))
    }

    /// Builds the drill for a quiz module.
    ///
    /// A missing config yields a drill with no questions. A config that does
    /// not parse yields a single unanswerable placeholder question.
    ///
    /// # Errors
    ///
    /// Returns `ModuleError::NotAQuiz` for any other module type.
    pub fn quiz_drill(&self) -> Result<ModuleDrill, ModuleError> {
        if self.kind != ModuleKind::Quiz {
            return Err(ModuleError::NotAQuiz(self.kind));
        }

        let raw = self.config.as_deref().map(str::trim).filter(|c| !c.is_empty());
        let (id, questions, fault) = match raw {
            None => (None, Vec::new(), Some(ConfigFault::Missing)),
            Some(raw) => match serde_json::from_str::<QuizConfig>(raw) {
                Ok(config) => (config.id, config.questions, None),
                Err(e) => (
                    None,
                    vec![corrupt_placeholder()],
                    Some(ConfigFault::Corrupt(e.to_string())),
                ),
            },
        };

        Ok(ModuleDrill {
            drill: Drill {
                id: id.unwrap_or_else(|| self.default_drill_id()),
                title: self.title.clone(),
                domain: self.domain.clone(),
                questions,
            },
            fault,
        })
    }
}

fn corrupt_placeholder() -> Question {
    Question {
        id: 0,
        text: CORRUPT_CONFIG_TEXT.to_string(),
        options: Vec::new(),
        correct_answer: String::new(),
        explanation: String::new(),
    }
}

//
// ─── GROUPING ──────────────────────────────────────────────────────────────────
//

/// Modules filed under one blueprint domain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleGroup {
    pub code: String,
    pub label: String,
    pub modules: Vec<StudyModule>,
}

/// Groups a track's modules by blueprint domain, in syllabus order.
///
/// Domains without modules are left out. Modules of other tracks are ignored;
/// modules whose domain is off the blueprint land in a trailing
/// [`UNMAPPED_GROUP`].
#[must_use]
pub fn group_by_domain(track: CertTrack, modules: Vec<StudyModule>) -> Vec<ModuleGroup> {
    let mut groups: Vec<ModuleGroup> = track
        .blueprint()
        .iter()
        .map(|d| ModuleGroup {
            code: d.code.to_string(),
            label: d.label.to_string(),
            modules: Vec::new(),
        })
        .collect();
    let mut unmapped = Vec::new();

    for module in modules.into_iter().filter(|m| m.track == track) {
        match groups.iter_mut().find(|g| g.code == module.domain) {
            Some(group) => group.modules.push(module),
            None => unmapped.push(module),
        }
    }

    groups.retain(|g| !g.modules.is_empty());
    if !unmapped.is_empty() {
        groups.push(ModuleGroup {
            code: UNMAPPED_GROUP.to_string(),
            label: "Unmapped".to_string(),
            modules: unmapped,
        });
    }
    groups
}
