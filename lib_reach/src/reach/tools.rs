//! # REACH Endpoints
//!
//! Known append and listgen tool names. The client itself accepts any
//! string, so new endpoints work before they are listed here; these enums
//! exist for argument parsing and discoverability.

use std::fmt;
use std::str::FromStr;

/// Append (enrichment) endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppendTool {
    Contact,
    Demographic,
    B2cOnlineAudience,
    B2bOnlineAudience,
    Firmographic,
    C2b,
    IpToDomain,
    HemToBusinessDomain,
}

impl AppendTool {
    pub const ALL: [AppendTool; 8] = [
        AppendTool::Contact,
        AppendTool::Demographic,
        AppendTool::B2cOnlineAudience,
        AppendTool::B2bOnlineAudience,
        AppendTool::Firmographic,
        AppendTool::C2b,
        AppendTool::IpToDomain,
        AppendTool::HemToBusinessDomain,
    ];

    /// The path segment used in the request URL.
    pub fn as_str(self) -> &'static str {
        match self {
            AppendTool::Contact => "contact",
            AppendTool::Demographic => "demographic",
            AppendTool::B2cOnlineAudience => "b2cOnlineAudience",
            AppendTool::B2bOnlineAudience => "b2bOnlineAudience",
            AppendTool::Firmographic => "firmographic",
            AppendTool::C2b => "c2b",
            AppendTool::IpToDomain => "iptodomain",
            AppendTool::HemToBusinessDomain => "hemtobusinessdomain",
        }
    }
}

/// Listgen (streaming list generation) endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListgenTool {
    Abm,
}

impl ListgenTool {
    pub const ALL: [ListgenTool; 1] = [ListgenTool::Abm];

    pub fn as_str(self) -> &'static str {
        match self {
            ListgenTool::Abm => "abm",
        }
    }
}

/// Returned when a name matches no known tool.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown tool {name:?}, expected one of: {expected}")]
pub struct UnknownTool {
    pub name: String,
    pub expected: String,
}

macro_rules! tool_text {
    ($tool:ty) => {
        impl fmt::Display for $tool {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $tool {
            type Err = UnknownTool;

            /// Case-insensitive match on the path segment.
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <$tool>::ALL
                    .into_iter()
                    .find(|t| t.as_str().eq_ignore_ascii_case(s))
                    .ok_or_else(|| UnknownTool {
                        name: s.to_string(),
                        expected: <$tool>::ALL.map(|t| t.as_str()).join(", "),
                    })
            }
        }
    };
}

tool_text!(AppendTool);
tool_text!(ListgenTool);
