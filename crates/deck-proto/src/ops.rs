use serde::{Deserialize, Serialize};
use std::fmt;

/// Long-running or toggled device activities shown as "in progress" flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagKind {
    Mapping,
    Saving,
    Recording,
    Streaming,
    Locked,
}

impl FlagKind {
    pub fn label(self) -> &'static str {
        match self {
            FlagKind::Mapping => "mapping",
            FlagKind::Saving => "saving",
            FlagKind::Recording => "recording",
            FlagKind::Streaming => "streaming",
            FlagKind::Locked => "locked",
        }
    }
}

impl fmt::Display for FlagKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
