use std::fmt;

use petgraph::stable_graph::NodeIndex;

/// Machine-readable error codes for scripted callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    NoRoot,
    MultipleRoots,
    NotAcyclic,
    CycleDetected,
    RootNotEssential,
    UnknownNode,
    NotPassThrough,
    InvalidDocument,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1002",
            Self::NoRoot => "E2001",
            Self::MultipleRoots => "E2002",
            Self::NotAcyclic => "E2003",
            Self::CycleDetected => "E2004",
            Self::RootNotEssential => "E2005",
            Self::UnknownNode => "E2006",
            Self::NotPassThrough => "E2007",
            Self::InvalidDocument => "E3001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::NoRoot => "Network has no root",
            Self::MultipleRoots => "Network has more than one root",
            Self::NotAcyclic => "Network contains a directed cycle",
            Self::CycleDetected => "Edge would create a cycle",
            Self::RootNotEssential => "Root is not in the essential node set",
            Self::UnknownNode => "Node does not belong to this network",
            Self::NotPassThrough => "Node is not a pass-through node",
            Self::InvalidDocument => "Network document is malformed",
        }
    }

    /// Optional remediation hint surfaced next to the error.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in reticulate.toml and retry."),
            Self::NoRoot => Some("Every network needs exactly one node without parents."),
            Self::MultipleRoots => Some("Join the roots under a common ancestor first."),
            Self::NotAcyclic | Self::CycleDetected => {
                Some("Remove or reverse edges until the network is acyclic.")
            }
            Self::RootNotEssential => {
                Some("The essential-node oracle must always include the root.")
            }
            Self::UnknownNode | Self::NotPassThrough => None,
            Self::InvalidDocument => Some("Check the node names referenced by each edge."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Errors raised by network edits and by the precondition checks of the
/// resolver and the normalizer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetworkError {
    #[error("network has no root (no node with in-degree 0)")]
    NoRoot,

    #[error("network has {count} roots; exactly one is required")]
    MultipleRoots { count: usize },

    #[error("network contains a directed cycle")]
    NotAcyclic,

    /// Inserting an edge would close the cycle `path[0] -> path[1] -> ... -> path[0]`.
    #[error("edge would create a cycle through {} nodes", path.len())]
    CycleDetected { path: Vec<NodeIndex> },

    #[error("root {0:?} is not in the essential node set")]
    RootNotEssential(NodeIndex),

    #[error("node {0:?} does not belong to this network")]
    UnknownNode(NodeIndex),

    #[error("node {node:?} has degrees ({in_degree}, {out_degree}); expected (1, 1)")]
    NotPassThrough {
        node: NodeIndex,
        in_degree: usize,
        out_degree: usize,
    },
}

impl NetworkError {
    /// Map this error onto its stable code.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NoRoot => ErrorCode::NoRoot,
            Self::MultipleRoots { .. } => ErrorCode::MultipleRoots,
            Self::NotAcyclic => ErrorCode::NotAcyclic,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
            Self::RootNotEssential(_) => ErrorCode::RootNotEssential,
            Self::UnknownNode(_) => ErrorCode::UnknownNode,
            Self::NotPassThrough { .. } => ErrorCode::NotPassThrough,
        }
    }
}
