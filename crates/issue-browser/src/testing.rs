//! Fixtures shared by the unit tests
use crate::types::Organization;
use gqlient::JsonMap;

pub(crate) const REPO_ID: &str = "R_kgDOAAAAAQ";

/// Build the `data` object of a `GetIssuesPage` response for a repository
/// with the given ID whose page contains issues with the given IDs
pub(crate) fn issues_data(
    repo_id: &str,
    issue_ids: &[&str],
    end_cursor: Option<&str>,
    has_next_page: bool,
) -> JsonMap {
    let edges = issue_ids
        .iter()
        .map(|id| {
            serde_json::json!({
                "node": {
                    "id": id,
                    "title": format!("Issue {id}"),
                    "url": format!("https://github.com/octo-org/octo-repo/issues/{id}"),
                    "reactions": {
                        "edges": [
                            {"node": {"id": format!("{id}-r1"), "content": "HEART"}},
                        ]
                    },
                }
            })
        })
        .collect::<Vec<_>>();
    JsonMap::from_iter([(
        "organization".into(),
        serde_json::json!({
            "name": "Octo Org",
            "url": "https://github.com/octo-org",
            "repository": {
                "id": repo_id,
                "name": "octo-repo",
                "url": "https://github.com/octo-org/octo-repo",
                "viewerHasStarred": false,
                "issues": {
                    "totalCount": 17,
                    "pageInfo": {
                        "endCursor": end_cursor,
                        "hasNextPage": has_next_page,
                    },
                    "edges": edges,
                },
            },
        }),
    )])
}

pub(crate) fn organization(
    repo_id: &str,
    issue_ids: &[&str],
    end_cursor: Option<&str>,
    has_next_page: bool,
) -> Organization {
    let data = issues_data(repo_id, issue_ids, end_cursor, has_next_page);
    let value = data
        .get("organization")
        .cloned()
        .expect("fixture should contain an organization");
    serde_json::from_value(value).expect("fixture should deserialize")
}

/// Returns the IDs of the accumulated issues, in order
pub(crate) fn issue_ids(org: Option<&Organization>) -> Vec<String> {
    org.and_then(|o| o.repository.as_ref())
        .map(|r| r.issues.issues().map(|i| i.id.to_string()).collect())
        .unwrap_or_default()
}

pub(crate) fn starred_data(field: &str, starred: bool) -> JsonMap {
    JsonMap::from_iter([(
        field.into(),
        serde_json::json!({"starrable": {"viewerHasStarred": starred}}),
    )])
}
