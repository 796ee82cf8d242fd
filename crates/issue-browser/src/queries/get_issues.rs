use super::QueryLimits;
use crate::path::RepoPath;
use crate::types::Organization;
use gqlient::{Cursor, JsonMap, Operation, OperationKind, Singleton, Variable};
use indoc::indoc;
use std::fmt::{self, Write};

/// An [`Operation`] for retrieving an organization, one of its repositories,
/// and a page of the repository's open issues starting after a given cursor
///
/// For each issue, only the last few reactions are retrieved.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GetIssuesPage {
    /// The organization & repository to query
    path: RepoPath,

    /// The pagination cursor after which to retrieve issues, or `None` for
    /// the first page
    cursor: Option<Cursor>,

    /// Page sizes for issues and reactions
    limits: QueryLimits,
}

impl GetIssuesPage {
    pub fn new(path: RepoPath, cursor: Option<Cursor>, limits: QueryLimits) -> GetIssuesPage {
        GetIssuesPage {
            path,
            cursor,
            limits,
        }
    }

    pub fn path(&self) -> &RepoPath {
        &self.path
    }

    pub fn cursor(&self) -> Option<&Cursor> {
        self.cursor.as_ref()
    }

    /// Is this a request for the first page of issues?
    pub fn is_first_page(&self) -> bool {
        self.cursor.is_none()
    }
}

impl Operation for GetIssuesPage {
    type Output = Option<Organization>;
    const KIND: OperationKind = OperationKind::Query;

    fn write_field<W: Write>(&self, mut s: W) -> fmt::Result {
        write!(
            s,
            indoc! {"
            organization(login: $organization) {{
                name
                url
                repository(name: $repository) {{
                    id
                    name
                    url
                    viewerHasStarred
                    issues(first: {page_size}, after: $cursor, states: [OPEN]) {{
                        totalCount
                        pageInfo {{
                            endCursor
                            hasNextPage
                        }}
                        edges {{
                            node {{
                                id
                                title
                                url
                                reactions(last: {reaction_page_size}) {{
                                    edges {{
                                        node {{
                                            id
                                            content
                                        }}
                                    }}
                                }}
                            }}
                        }}
                    }}
                }}
            }}
        "},
            page_size = self.limits.page_size,
            reaction_page_size = self.limits.reaction_page_size,
        )
    }

    fn variables(&self) -> [(String, Variable); 3] {
        [
            (
                String::from("organization"),
                Variable {
                    gql_type: String::from("String!"),
                    value: self.path.organization().into(),
                },
            ),
            (
                String::from("repository"),
                Variable {
                    gql_type: String::from("String!"),
                    value: self.path.repository().into(),
                },
            ),
            (
                String::from("cursor"),
                Variable {
                    gql_type: String::from("String"),
                    value: self.cursor.clone().into(),
                },
            ),
        ]
    }

    fn parse_data(&self, data: JsonMap) -> Result<Option<Organization>, serde_json::Error> {
        serde_json::from_value::<Singleton<Option<Organization>>>(data.into()).map(|r| r.0)
    }
}
