use crate::QueryPayload;
use crate::types::{JsonMap, Variable};
use indenter::indented;
use std::fmt::{self, Write};

/// The type of GraphQL operation declared by a document
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OperationKind {
    Query,
    Mutation,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Query => f.write_str("query"),
            OperationKind::Mutation => f.write_str("mutation"),
        }
    }
}

/// A single top-level GraphQL field together with the variables it uses and
/// the means of decoding its result
pub trait Operation {
    type Output;

    /// Whether the field is sent as part of a query or a mutation
    const KIND: OperationKind;

    /// Write the field and its selection set, terminated by a newline
    fn write_field<W: Write>(&self, s: W) -> fmt::Result;

    /// The variables referenced by the field, in declaration order
    fn variables(&self) -> impl IntoIterator<Item = (String, Variable)>;

    /// Decode the `data` object of a response to this operation
    fn parse_data(&self, data: JsonMap) -> Result<Self::Output, serde_json::Error>;

    /// Render the complete request document and variable map.
    ///
    /// # Panics
    ///
    /// Panics if [`Operation::write_field()`] returns an error when writing to
    /// a `String`.
    fn payload(&self) -> QueryPayload {
        let mut variables = JsonMap::new();
        let mut varstr = String::new();
        for (name, Variable { gql_type, value }) in self.variables() {
            if !varstr.is_empty() {
                varstr.push_str(", ");
            }
            write!(&mut varstr, "${name}: {gql_type}")
                .expect("writing to a string should not fail");
            variables.insert(name, value);
        }
        let mut query = if varstr.is_empty() {
            format!("{} {{\n", Self::KIND)
        } else {
            format!("{} ({varstr}) {{\n", Self::KIND)
        };
        self.write_field(indented(&mut query).with_str("    "))
            .expect("writing to a string should not fail");
        query.push_str("}\n");
        QueryPayload { query, variables }
    }
}
