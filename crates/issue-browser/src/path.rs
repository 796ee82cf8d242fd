use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A GitHub repository identified by a path of the form
/// `ORGANIZATION/REPOSITORY`
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RepoPath {
    organization: String,
    repository: String,
}

impl RepoPath {
    pub fn new<S: Into<String>, T: Into<String>>(
        organization: S,
        repository: T,
    ) -> Result<RepoPath, PathError> {
        let organization = organization.into();
        let repository = repository.into();
        let path = format!("{organization}/{repository}");
        if organization.is_empty() {
            Err(PathError::EmptyOrganization(path))
        } else if repository.is_empty() {
            Err(PathError::EmptyRepository(path))
        } else if organization.contains('/') || repository.contains('/') {
            Err(PathError::ExtraSeparator(path))
        } else {
            Ok(RepoPath {
                organization,
                repository,
            })
        }
    }

    pub fn organization(&self) -> &str {
        &self.organization
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }
}

impl FromStr for RepoPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<RepoPath, PathError> {
        let s = s.trim();
        let Some((organization, repository)) = s.split_once('/') else {
            return Err(PathError::NoSeparator(s.to_owned()));
        };
        RepoPath::new(organization, repository)
    }
}

impl fmt::Display for RepoPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.organization, self.repository)
    }
}

#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum PathError {
    #[error("repository path {0:?} is not of the form ORGANIZATION/REPOSITORY")]
    NoSeparator(String),
    #[error("repository path {0:?} contains more than one '/'")]
    ExtraSeparator(String),
    #[error("repository path {0:?} has an empty organization")]
    EmptyOrganization(String),
    #[error("repository path {0:?} has an empty repository name")]
    EmptyRepository(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_path() {
        let path = "the-road-to-learn-react/the-road-to-learn-react"
            .parse::<RepoPath>()
            .unwrap();
        assert_eq!(path.organization(), "the-road-to-learn-react");
        assert_eq!(path.repository(), "the-road-to-learn-react");
        assert_eq!(
            path.to_string(),
            "the-road-to-learn-react/the-road-to-learn-react"
        );
    }

    #[test]
    fn parse_path_trims_whitespace() {
        let path = "  octocat/hello-world\n".parse::<RepoPath>().unwrap();
        assert_eq!(path, RepoPath::new("octocat", "hello-world").unwrap());
    }

    #[test]
    fn no_separator() {
        assert_eq!(
            "no-slash-here".parse::<RepoPath>(),
            Err(PathError::NoSeparator("no-slash-here".into()))
        );
    }

    #[test]
    fn extra_separator() {
        assert_matches!(
            "octocat/hello-world/issues".parse::<RepoPath>(),
            Err(PathError::ExtraSeparator(_))
        );
    }

    #[test]
    fn empty_sides() {
        assert_matches!(
            "/hello-world".parse::<RepoPath>(),
            Err(PathError::EmptyOrganization(_))
        );
        assert_matches!(
            "octocat/".parse::<RepoPath>(),
            Err(PathError::EmptyRepository(_))
        );
        assert_matches!("/".parse::<RepoPath>(), Err(PathError::EmptyOrganization(_)));
    }
}
