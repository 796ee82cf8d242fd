use serde::{
    Deserialize, Serialize,
    de::{self, Deserializer, IgnoredAny, MapAccess, Visitor},
};
use std::fmt;
use std::marker::PhantomData;

pub type JsonMap = serde_json::Map<String, serde_json::Value>;

/// A GraphQL node ID
#[derive(Clone, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    pub fn new<S: Into<String>>(s: S) -> Id {
        Id(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Id> for serde_json::Value {
    fn from(value: Id) -> serde_json::Value {
        value.0.into()
    }
}

/// An opaque pagination cursor.  Cursors are only ever passed back to the
/// server exactly as received.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new<S: Into<String>>(s: S) -> Cursor {
        Cursor(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<Cursor> for serde_json::Value {
    fn from(value: Cursor) -> serde_json::Value {
        value.0.into()
    }
}

/// The `pageInfo` block of a GraphQL connection
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub end_cursor: Option<Cursor>,
    pub has_next_page: bool,
}

/// A single edge of a GraphQL connection
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Edge<T> {
    pub node: T,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Variable {
    pub gql_type: String,
    pub value: serde_json::Value,
}

// Utility type for use in deserializing just `foo` from a map of the form
// `{"anything": foo}`
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Singleton<T>(pub T);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Singleton<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(SingletonVisitor::new())
    }
}

struct SingletonVisitor<T>(PhantomData<T>);

impl<T> SingletonVisitor<T> {
    fn new() -> Self {
        SingletonVisitor(PhantomData)
    }
}

impl<'de, T: Deserialize<'de>> Visitor<'de> for SingletonVisitor<T> {
    type Value = Singleton<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a string-keyed map containing a single field")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        if let Some((_, value)) = map.next_entry::<String, T>()? {
            if map.next_entry::<String, IgnoredAny>()?.is_some() {
                Err(de::Error::invalid_length(
                    map.size_hint().unwrap_or(0).saturating_add(2),
                    &self,
                ))
            } else {
                Ok(Singleton(value))
            }
        } else {
            Err(de::Error::invalid_length(0, &self))
        }
    }
}

/// Deserialize the `edges` of a connection, skipping edges and nodes that the
/// server nulled out because of a field error.  Use with
/// `#[serde(deserialize_with = "gqlient::nonnull_edges")]`.
pub fn nonnull_edges<'de, T, D>(deserializer: D) -> Result<Vec<Edge<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    let edges = Vec::<Option<Edge<Option<T>>>>::deserialize(deserializer)?;
    Ok(edges
        .into_iter()
        .filter_map(|e| e?.node.map(|node| Edge { node }))
        .collect())
}
