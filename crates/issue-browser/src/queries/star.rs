use gqlient::{Id, JsonMap, Operation, OperationKind, Singleton, Variable};
use indoc::indoc;
use serde::Deserialize;
use std::fmt::{self, Write};

/// Whether a [`ToggleStar`] mutation stars or unstars its repository
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum StarAction {
    Star,
    Unstar,
}

impl StarAction {
    /// Returns the action that flips a repository's current starred state
    pub fn toggling(currently_starred: bool) -> StarAction {
        if currently_starred {
            StarAction::Unstar
        } else {
            StarAction::Star
        }
    }

    fn mutation_field(self) -> &'static str {
        match self {
            StarAction::Star => "addStar",
            StarAction::Unstar => "removeStar",
        }
    }
}

/// An [`Operation`] that stars or unstars a repository and returns the
/// resulting value of its `viewerHasStarred` field
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ToggleStar {
    /// The GraphQL node ID of the repository to (un)star
    repo_id: Id,

    action: StarAction,
}

impl ToggleStar {
    pub fn new(repo_id: Id, action: StarAction) -> ToggleStar {
        ToggleStar { repo_id, action }
    }

    pub fn repo_id(&self) -> &Id {
        &self.repo_id
    }

    pub fn action(&self) -> StarAction {
        self.action
    }
}

impl Operation for ToggleStar {
    /// `None` if the mutation returned no result
    type Output = Option<bool>;
    const KIND: OperationKind = OperationKind::Mutation;

    fn write_field<W: Write>(&self, mut s: W) -> fmt::Result {
        write!(
            s,
            indoc! {"
            {field}(input: {{starrableId: $repo_id}}) {{
                starrable {{
                    viewerHasStarred
                }}
            }}
        "},
            field = self.action.mutation_field(),
        )
    }

    fn variables(&self) -> [(String, Variable); 1] {
        [(
            String::from("repo_id"),
            Variable {
                gql_type: String::from("ID!"),
                value: self.repo_id.clone().into(),
            },
        )]
    }

    fn parse_data(&self, data: JsonMap) -> Result<Option<bool>, serde_json::Error> {
        let Singleton(payload) =
            serde_json::from_value::<Singleton<Option<StarPayload>>>(data.into())?;
        Ok(payload
            .and_then(|p| p.starrable)
            .map(|s| s.viewer_has_starred))
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
struct StarPayload {
    starrable: Option<Starrable>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Starrable {
    viewer_has_starred: bool,
}
