//! Unified validation issue type used across all checking phases.

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Parse,
    Structural,
    Config,
    Topology,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Parse => write!(f, "Parse"),
            Phase::Structural => write!(f, "Structural"),
            Phase::Config => write!(f, "Config"),
            Phase::Topology => write!(f, "Topology"),
        }
    }
}

/// A single validation finding. Findings are accumulated, never thrown:
/// every checking pass returns all of them.
#[derive(Debug, Clone)]
pub struct ValidationIssue {
    pub code: String,
    pub phase: Phase,
    pub message: String,
    pub node_id: Option<String>,
}

impl std::fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.node_id {
            Some(id) => write!(
                f,
                "[{}:{}] {} (node '{}')",
                self.phase, self.code, self.message, id
            ),
            None => write!(f, "[{}:{}] {}", self.phase, self.code, self.message),
        }
    }
}

impl std::error::Error for ValidationIssue {}

impl ValidationIssue {
    pub fn parse(code: &str, message: impl Into<String>) -> Self {
        ValidationIssue {
            code: code.into(),
            phase: Phase::Parse,
            message: message.into(),
            node_id: None,
        }
    }

    pub fn structural(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        ValidationIssue {
            code: code.into(),
            phase: Phase::Structural,
            message: message.into(),
            node_id,
        }
    }

    pub fn config(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        ValidationIssue {
            code: code.into(),
            phase: Phase::Config,
            message: message.into(),
            node_id,
        }
    }

    pub fn topology(code: &str, message: impl Into<String>, node_id: Option<String>) -> Self {
        ValidationIssue {
            code: code.into(),
            phase: Phase::Topology,
            message: message.into(),
            node_id,
        }
    }
}
