//! Change descriptions passed to `notify` and to notification handlers.

use smallvec::SmallVec;

/// What changed on a reactive object.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Change {
    /// Refresh everything.
    #[default]
    All,
    /// A single property.
    Property(String),
    /// Several properties, in the order they were named.
    Properties(SmallVec<[String; 4]>),
}

impl Change {
    pub fn property(name: impl Into<String>) -> Self {
        Change::Property(name.into())
    }

    pub fn properties<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Change::Properties(names.into_iter().map(Into::into).collect())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Change::All)
    }

    /// A property list that names nothing.
    pub fn is_empty(&self) -> bool {
        matches!(self, Change::Properties(names) if names.is_empty())
    }

    /// The named properties; empty for [`Change::All`].
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let names: &[String] = match self {
            Change::All => &[],
            Change::Property(name) => std::slice::from_ref(name),
            Change::Properties(names) => names.as_slice(),
        };
        names.iter().map(String::as_str)
    }

    /// Whether a consumer interested in `name` should refresh.
    pub fn affects(&self, name: &str) -> bool {
        self.is_all() || self.names().any(|changed| changed == name)
    }
}

impl From<&str> for Change {
    fn from(name: &str) -> Self {
        Change::property(name)
    }
}

impl From<String> for Change {
    fn from(name: String) -> Self {
        Change::Property(name)
    }
}

impl From<Option<&str>> for Change {
    fn from(name: Option<&str>) -> Self {
        name.map(Change::property).unwrap_or_default()
    }
}

/// Collects a property list, skipping `None` entries.
impl<S: Into<String>> FromIterator<Option<S>> for Change {
    fn from_iter<I: IntoIterator<Item = Option<S>>>(iter: I) -> Self {
        Change::Properties(iter.into_iter().flatten().map(Into::into).collect())
    }
}
