use gqlient::{Cursor, Edge, Id, PageInfo};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A GitHub organization together with the one repository being browsed
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Organization {
    /// The organization's display name, if it has set one
    pub name: Option<String>,

    /// The HTTP URL to the organization's profile page
    pub url: String,

    /// The repository being browsed, or `None` if it could not be resolved
    pub repository: Option<Repository>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Repository {
    /// The repository's GraphQL node ID
    pub id: Id,

    /// The name of the repository sans owner
    pub name: String,

    /// The HTTP URL to the web view for the repository
    pub url: String,

    /// Whether the authenticated user has starred the repository
    pub viewer_has_starred: bool,

    /// The open issues fetched so far
    pub issues: IssueConnection,
}

impl Repository {
    pub fn end_cursor(&self) -> Option<&Cursor> {
        self.issues.page_info.end_cursor.as_ref()
    }

    pub fn has_next_page(&self) -> bool {
        self.issues.page_info.has_next_page
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueConnection {
    /// The total number of open issues in the repository
    pub total_count: u64,
    pub page_info: PageInfo,

    /// Issues nulled out by field errors are omitted
    #[serde(deserialize_with = "gqlient::nonnull_edges")]
    pub edges: Vec<Edge<Issue>>,
}

impl IssueConnection {
    pub fn issues(&self) -> impl Iterator<Item = &Issue> {
        self.edges.iter().map(|e| &e.node)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Issue {
    pub id: Id,
    pub title: String,
    pub url: String,
    pub reactions: ReactionConnection,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct ReactionConnection {
    #[serde(deserialize_with = "gqlient::nonnull_edges")]
    pub edges: Vec<Edge<Reaction>>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Reaction {
    pub id: Id,
    pub content: ReactionContent,
}

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReactionContent {
    ThumbsUp,
    ThumbsDown,
    Laugh,
    Hooray,
    Confused,
    Heart,
    Rocket,
    Eyes,
}

impl fmt::Display for ReactionContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let emoji = match self {
            ReactionContent::ThumbsUp => "👍",
            ReactionContent::ThumbsDown => "👎",
            ReactionContent::Laugh => "😄",
            ReactionContent::Hooray => "🎉",
            ReactionContent::Confused => "😕",
            ReactionContent::Heart => "❤️",
            ReactionContent::Rocket => "🚀",
            ReactionContent::Eyes => "👀",
        };
        f.write_str(emoji)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn deserialize_organization() {
        let org = serde_json::from_value::<Organization>(serde_json::json!({
            "name": "The Road to learn React",
            "url": "https://github.com/the-road-to-learn-react",
            "repository": {
                "id": "MDEwOlJlcG9zaXRvcnk2MzM1MjkwNw==",
                "name": "the-road-to-learn-react",
                "url": "https://github.com/the-road-to-learn-react/the-road-to-learn-react",
                "viewerHasStarred": false,
                "issues": {
                    "totalCount": 42,
                    "pageInfo": {
                        "endCursor": "Y3Vyc29yOnYyOpHOEz2k9g==",
                        "hasNextPage": true,
                    },
                    "edges": [
                        {
                            "node": {
                                "id": "MDU6SXNzdWUyMDY5ODM5NzE=",
                                "title": "Typo in chapter 2",
                                "url": "https://github.com/the-road-to-learn-react/the-road-to-learn-react/issues/1",
                                "reactions": {
                                    "edges": [
                                        {
                                            "node": {
                                                "id": "MDg6UmVhY3Rpb24xNTI3ODU1OQ==",
                                                "content": "THUMBS_UP",
                                            }
                                        }
                                    ]
                                }
                            }
                        }
                    ]
                }
            }
        }))
        .unwrap();
        let repo = org.repository.unwrap();
        assert_eq!(repo.name, "the-road-to-learn-react");
        assert!(!repo.viewer_has_starred);
        assert!(repo.has_next_page());
        assert_eq!(
            repo.end_cursor().map(Cursor::as_str),
            Some("Y3Vyc29yOnYyOpHOEz2k9g==")
        );
        assert_eq!(repo.issues.total_count, 42);
        let issues = repo.issues.issues().collect::<Vec<_>>();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].title, "Typo in chapter 2");
        assert_eq!(
            issues[0].reactions.edges[0].node.content,
            ReactionContent::ThumbsUp
        );
    }

    #[test]
    fn deserialize_unresolved_repository() {
        let org = serde_json::from_value::<Organization>(serde_json::json!({
            "name": null,
            "url": "https://github.com/octo-org",
            "repository": null,
        }))
        .unwrap();
        assert_eq!(org.name, None);
        assert_eq!(org.repository, None);
    }
}
