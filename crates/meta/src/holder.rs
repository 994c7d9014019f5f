use crate::error::{Error, ErrorKind, Result};
use exn::{OptionExt, ResultExt};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// The kind of entity a piece of metadata is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HolderKind {
    Global,
    Manga,
    Chapter,
    Category,
    Source,
}
impl HolderKind {
    pub const ALL: [Self; 5] = [Self::Global, Self::Manga, Self::Chapter, Self::Category, Self::Source];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Manga => "manga",
            Self::Chapter => "chapter",
            Self::Category => "category",
            Self::Source => "source",
        }
    }
}
impl FromStr for HolderKind {
    type Err = Error;
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_raise(|| ErrorKind::InvalidHolder(s.to_string()))
    }
}
impl Display for HolderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A concrete metadata holder: the global scope or one identified entity.
///
/// Sources are identified by the backend's 64-bit source ID, which is
/// transported as a string (it does not survive a round-trip through
/// JavaScript numbers on the server side).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Holder {
    Global,
    Manga(i64),
    Chapter(i64),
    Category(i64),
    Source(String),
}
impl Holder {
    pub fn kind(&self) -> HolderKind {
        match self {
            Self::Global => HolderKind::Global,
            Self::Manga(_) => HolderKind::Manga,
            Self::Chapter(_) => HolderKind::Chapter,
            Self::Category(_) => HolderKind::Category,
            Self::Source(_) => HolderKind::Source,
        }
    }

    /// The holder's ID as stored: empty for the global scope.
    pub fn id(&self) -> String {
        match self {
            Self::Global => String::new(),
            Self::Manga(id) | Self::Chapter(id) | Self::Category(id) => id.to_string(),
            Self::Source(id) => id.clone(),
        }
    }

    /// Rebuild a holder from its stored `(kind, id)` pair.
    pub fn from_parts(kind: HolderKind, id: &str) -> Result<Self> {
        let numeric = || id.trim().parse::<i64>().or_raise(|| ErrorKind::InvalidHolder(format!("{kind}:{id}")));
        Ok(match kind {
            HolderKind::Global => Self::Global,
            HolderKind::Manga => Self::Manga(numeric()?),
            HolderKind::Chapter => Self::Chapter(numeric()?),
            HolderKind::Category => Self::Category(numeric()?),
            HolderKind::Source if id.trim().is_empty() => exn::bail!(ErrorKind::InvalidHolder(format!("{kind}:"))),
            HolderKind::Source => Self::Source(id.trim().to_string()),
        })
    }
}
impl FromStr for Holder {
    type Err = Error;

    /// Parses `global` or `<kind>:<id>` (e.g. `manga:42`, `source:2499283573021220255`).
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (kind, id) = s.split_once(':').unwrap_or((s, ""));
        let kind = kind.parse::<HolderKind>()?;
        if kind != HolderKind::Global && id.is_empty() {
            exn::bail!(ErrorKind::InvalidHolder(s.to_string()));
        }
        Self::from_parts(kind, id)
    }
}
impl Display for Holder {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::Global => f.write_str("global"),
            other => write!(f, "{}:{}", other.kind(), other.id()),
        }
    }
}
