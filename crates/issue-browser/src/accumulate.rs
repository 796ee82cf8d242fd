use crate::types::{IssueConnection, Organization, Repository};
use gqlient::{Cursor, Id};

/// How a freshly fetched page of issues is combined with what has already
/// been accumulated
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Merge {
    /// Discard everything accumulated so far and start over from the fetched
    /// page
    Replace,

    /// Keep the accumulated organization & repository and append the fetched
    /// issues to the end of the accumulated ones
    Append,
}

impl Merge {
    /// A first-page fetch (no cursor) replaces; a continuation appends
    pub fn for_cursor(cursor: Option<&Cursor>) -> Merge {
        if cursor.is_some() {
            Merge::Append
        } else {
            Merge::Replace
        }
    }
}

/// Summary of a single merge
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Merged {
    /// Number of issue edges contributed by the fetched page
    pub appended: usize,

    /// Number of issue edges accumulated after the merge
    pub total: usize,
}

/// The accumulated organization → repository → issues tree for a single
/// repository path
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IssueTree {
    organization: Option<Organization>,
}

impl IssueTree {
    pub fn new() -> IssueTree {
        IssueTree::default()
    }

    pub fn organization(&self) -> Option<&Organization> {
        self.organization.as_ref()
    }

    pub fn repository(&self) -> Option<&Repository> {
        self.organization.as_ref()?.repository.as_ref()
    }

    fn repository_mut(&mut self) -> Option<&mut Repository> {
        self.organization.as_mut()?.repository.as_mut()
    }

    /// Number of issue edges accumulated so far
    pub fn edge_count(&self) -> usize {
        self.repository().map_or(0, |r| r.issues.edges.len())
    }

    pub fn merge(&mut self, fetched: Option<Organization>, how: Merge) -> Merged {
        match how {
            Merge::Replace => self.replace(fetched),
            Merge::Append => self.append(fetched),
        }
    }

    fn replace(&mut self, fetched: Option<Organization>) -> Merged {
        self.organization = fetched;
        let total = self.edge_count();
        Merged {
            appended: total,
            total,
        }
    }

    fn append(&mut self, fetched: Option<Organization>) -> Merged {
        let Some(fetched) = fetched.and_then(|org| org.repository) else {
            tracing::debug!("Continuation returned no repository; keeping accumulated issues");
            return self.unchanged();
        };
        let Some(repo) = self.repository_mut() else {
            tracing::warn!("Continuation arrived with nothing accumulated to append to; ignoring");
            return self.unchanged();
        };
        if repo.id != fetched.id {
            tracing::warn!(
                accumulated = %repo.id,
                fetched = %fetched.id,
                "Continuation is for a different repository; ignoring"
            );
            return self.unchanged();
        }
        let IssueConnection {
            total_count,
            page_info,
            edges,
        } = fetched.issues;
        let appended = edges.len();
        repo.issues.edges.extend(edges);
        repo.issues.total_count = total_count;
        if page_info.end_cursor.is_some() {
            // endCursor is null when the page has no items, which happens when
            // the current cursor is already at the end, so don't update the
            // cursor to null.
            repo.issues.page_info.end_cursor = page_info.end_cursor;
        }
        repo.issues.page_info.has_next_page = page_info.has_next_page;
        Merged {
            appended,
            total: repo.issues.edges.len(),
        }
    }

    fn unchanged(&self) -> Merged {
        Merged {
            appended: 0,
            total: self.edge_count(),
        }
    }

    /// Set `viewerHasStarred` on the accumulated repository if its ID is
    /// `repo_id`.  Returns `true` if the repository was found.
    pub fn set_starred(&mut self, repo_id: &Id, starred: bool) -> bool {
        match self.repository_mut() {
            Some(repo) if &repo.id == repo_id => {
                repo.viewer_has_starred = starred;
                true
            }
            _ => false,
        }
    }
}

impl From<Option<Organization>> for IssueTree {
    fn from(organization: Option<Organization>) -> IssueTree {
        IssueTree { organization }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{REPO_ID, issue_ids, organization};
    use pretty_assertions::assert_eq;

    #[test]
    fn merge_mode_from_cursor() {
        assert_eq!(Merge::for_cursor(None), Merge::Replace);
        assert_eq!(Merge::for_cursor(Some(&Cursor::new("abc"))), Merge::Append);
    }

    #[test]
    fn replace_twice_keeps_only_second_page() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A", "B", "C"], Some("c3"), true)),
            Merge::Replace,
        );
        let merged = tree.merge(
            Some(organization(REPO_ID, &["A", "B"], Some("c2"), true)),
            Merge::Replace,
        );
        assert_eq!(
            merged,
            Merged {
                appended: 2,
                total: 2
            }
        );
        assert_eq!(issue_ids(tree.organization()), ["A", "B"]);
    }

    #[test]
    fn append_preserves_order() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A", "B"], Some("c2"), true)),
            Merge::Replace,
        );
        let merged = tree.merge(
            Some(organization(REPO_ID, &["C", "D"], Some("c4"), false)),
            Merge::Append,
        );
        assert_eq!(
            merged,
            Merged {
                appended: 2,
                total: 4
            }
        );
        assert_eq!(issue_ids(tree.organization()), ["A", "B", "C", "D"]);
        let repo = tree.repository().unwrap();
        assert_eq!(repo.end_cursor(), Some(&Cursor::new("c4")));
        assert!(!repo.has_next_page());
    }

    #[test]
    fn replace_after_accumulating_resets() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A", "B"], Some("c2"), true)),
            Merge::Replace,
        );
        tree.merge(
            Some(organization(REPO_ID, &["C", "D"], Some("c4"), true)),
            Merge::Append,
        );
        tree.merge(
            Some(organization("R_other", &["E"], Some("c1"), false)),
            Merge::Replace,
        );
        assert_eq!(issue_ids(tree.organization()), ["E"]);
    }

    #[test]
    fn empty_continuation_is_noop() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A", "B"], Some("c2"), false)),
            Merge::Replace,
        );
        let before = tree.clone();
        let merged = tree.merge(
            Some(organization(REPO_ID, &[], None, false)),
            Merge::Append,
        );
        assert_eq!(
            merged,
            Merged {
                appended: 0,
                total: 2
            }
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn continuation_refreshes_total_count_but_not_starred() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A"], Some("c1"), true)),
            Merge::Replace,
        );
        assert!(tree.set_starred(&Id::new(REPO_ID), true));
        let mut next = organization(REPO_ID, &["B"], Some("c2"), false);
        if let Some(repo) = next.repository.as_mut() {
            repo.issues.total_count = 2;
            repo.name = String::from("renamed");
        }
        tree.merge(Some(next), Merge::Append);
        let repo = tree.repository().unwrap();
        assert_eq!(repo.issues.total_count, 2);
        assert!(repo.viewer_has_starred);
        assert_eq!(repo.name, "octo-repo");
    }

    #[test]
    fn continuation_without_repository_keeps_tree() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A", "B"], Some("c2"), true)),
            Merge::Replace,
        );
        let before = tree.clone();
        let mut partial = organization(REPO_ID, &[], None, false);
        partial.repository = None;
        tree.merge(Some(partial), Merge::Append);
        assert_eq!(tree, before);
        tree.merge(None, Merge::Append);
        assert_eq!(tree, before);
    }

    #[test]
    fn continuation_for_other_repository_is_ignored() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A"], Some("c1"), true)),
            Merge::Replace,
        );
        let before = tree.clone();
        tree.merge(
            Some(organization("R_other", &["Z"], Some("z1"), false)),
            Merge::Append,
        );
        assert_eq!(tree, before);
    }

    #[test]
    fn replace_with_nothing_clears() {
        let mut tree = IssueTree::new();
        tree.merge(
            Some(organization(REPO_ID, &["A"], Some("c1"), true)),
            Merge::Replace,
        );
        let merged = tree.merge(None, Merge::Replace);
        assert_eq!(merged, Merged::default());
        assert_eq!(tree.organization(), None);
    }

    #[test]
    fn set_starred_requires_matching_id() {
        let mut tree = IssueTree::from(Some(organization(REPO_ID, &[], None, false)));
        assert!(!tree.set_starred(&Id::new("R_other"), true));
        assert!(!tree.repository().unwrap().viewer_has_starred);
        assert!(tree.set_starred(&Id::new(REPO_ID), true));
        assert!(tree.repository().unwrap().viewer_has_starred);
    }
}
