use std::fmt;

/// Logical cache tag.
///
/// Queries provide a tag, mutations invalidate it. Invalidation is per tag,
/// never per record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CacheTag {
    Users,
}

impl CacheTag {
    pub const ALL: [CacheTag; 1] = [CacheTag::Users];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            CacheTag::Users => "Users",
        }
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
