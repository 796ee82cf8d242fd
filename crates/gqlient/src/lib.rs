mod queries;
mod types;
pub use crate::queries::*;
pub use crate::types::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;
use ureq::{
    Agent, SendBody,
    http::{
        Request,
        header::{HeaderValue, InvalidHeaderValue},
    },
    middleware::MiddlewareNext,
};

pub static GRAPHQL_API_URL: &str = "https://api.github.com/graphql";

static USER_AGENT: &str = concat!(
    env!("CARGO_PKG_NAME"),
    "/",
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("CARGO_PKG_REPOSITORY"),
    ")",
);

/// Something that can deliver a GraphQL request and hand back the decoded
/// response envelope
pub trait Transport {
    fn send(&self, payload: &QueryPayload) -> Result<Envelope, TransportError>;
}

/// A GraphQL client bound to a single endpoint and bearer token
#[derive(Clone, Debug)]
pub struct Client {
    inner: Agent,
    endpoint: String,
}

impl Client {
    pub fn with_endpoint<S: Into<String>>(
        endpoint: S,
        token: &str,
    ) -> Result<Client, BuildClientError> {
        let endpoint = endpoint.into();
        let auth = HeaderValue::from_str(&format!("Bearer {token}"))?;
        let inner = Agent::config_builder()
            .https_only(endpoint.starts_with("https://"))
            .user_agent(USER_AGENT)
            .middleware(
                move |mut req: Request<SendBody<'_>>, next: MiddlewareNext<'_>| {
                    let _ = req.headers_mut().insert("Authorization", auth.clone());
                    let _ = req
                        .headers_mut()
                        .insert("X-Github-Next-Global-ID", HeaderValue::from_static("1"));
                    next.handle(req)
                },
            )
            .build()
            .into();
        Ok(Client { inner, endpoint })
    }

    /// Construct a client for `endpoint` authenticated with the GitHub token
    /// found in the environment or the local `gh` configuration
    pub fn with_local_token<S: Into<String>>(endpoint: S) -> Result<Client, BuildClientError> {
        let token = gh_token::get()?;
        Client::with_endpoint(endpoint, &token)
    }
}

impl Transport for Client {
    fn send(&self, payload: &QueryPayload) -> Result<Envelope, TransportError> {
        let bytes = self
            .inner
            .post(self.endpoint.as_str())
            .send_json(payload)
            .map_err(|e| match e {
                ureq::Error::StatusCode(status) => TransportError::Status(status),
                e => TransportError::Http(Box::new(e)),
            })?
            .into_body()
            .read_to_vec()
            .map_err(|e| TransportError::Read(Box::new(e)))?;
        tracing::trace!(
            endpoint = %self.endpoint,
            size = bytes.len(),
            "Received GraphQL response"
        );
        serde_json::from_slice::<Envelope>(&bytes).map_err(Into::into)
    }
}

#[derive(Debug, Error)]
pub enum BuildClientError {
    #[error("invalid authorization token")]
    Auth(#[from] InvalidHeaderValue),
    #[error("failed to fetch GitHub access token")]
    GetToken(#[from] gh_token::Error),
}

/// A failure to obtain a well-formed response envelope.  GraphQL-level
/// errors are not represented here; they arrive inside the [`Envelope`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to perform GraphQL request")]
    Http(#[source] Box<ureq::Error>),
    #[error("GraphQL endpoint responded with HTTP status {0}")]
    Status(u16),
    #[error("failed to read GraphQL response")]
    Read(#[source] Box<ureq::Error>),
    #[error("failed to deserialize GraphQL response")]
    Json(#[from] serde_json::Error),
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct QueryPayload {
    pub query: String,
    pub variables: JsonMap,
}

/// The top-level body of a GraphQL response.  `data` and `errors` may both be
/// present at once.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Envelope {
    #[serde(default)]
    pub data: Option<JsonMap>,
    #[serde(default, deserialize_with = "nonempty_errors")]
    pub errors: Option<GqlError>,
}

impl Envelope {
    /// Decode `data` with `op` while carrying any errors along unchanged.
    ///
    /// If `data` cannot be decoded but the server also reported errors, the
    /// errors are returned without any data rather than failing.
    pub fn interpret<O: Operation>(
        self,
        op: &O,
    ) -> Result<Interpreted<O::Output>, serde_json::Error> {
        let data = match self.data.map(|d| op.parse_data(d)).transpose() {
            Ok(data) => data,
            Err(e) if self.errors.is_some() => {
                tracing::warn!(error = %e, "Discarding undecodable data returned alongside errors");
                None
            }
            Err(e) => return Err(e),
        };
        Ok(Interpreted {
            data,
            errors: self.errors,
        })
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Interpreted<T> {
    pub data: Option<T>,
    pub errors: Option<GqlError>,
}

fn nonempty_errors<'de, D>(deserializer: D) -> Result<Option<GqlError>, D::Error>
where
    D: Deserializer<'de>,
{
    let errors = Option::<GqlError>::deserialize(deserializer)?;
    Ok(errors.filter(|e| !e.is_empty()))
}

/// The non-empty `errors` list of a GraphQL response
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GqlError(Vec<GqlInnerError>);

impl GqlError {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn messages(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(|e| e.message.as_str())
    }
}

impl FromIterator<GqlInnerError> for GqlError {
    fn from_iter<I: IntoIterator<Item = GqlInnerError>>(iter: I) -> Self {
        GqlError(iter.into_iter().collect())
    }
}

impl fmt::Display for GqlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Query errored:")?;
        let mut first = true;
        for e in &self.0 {
            if !std::mem::take(&mut first) {
                writeln!(f, "---")?;
            }
            if let Some(ref t) = e.err_type {
                writeln!(f, "    Type: {t}")?;
            }
            writeln!(f, "    Message: {}", e.message)?;
            if let Some(ref p) = e.path {
                write!(f, "    Path: ")?;
                for (i, seg) in p.iter().enumerate() {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{seg}")?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for GqlError {}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GqlInnerError {
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub err_type: Option<String>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
}

impl GqlInnerError {
    pub fn new<S: Into<String>>(message: S) -> GqlInnerError {
        GqlInnerError {
            err_type: None,
            message: message.into(),
            path: None,
        }
    }
}

/// One step of the response path at which a GraphQL error occurred
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    Field(String),
    Index(u64),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSegment::Field(name) => write!(f, "{name}"),
            PathSegment::Index(i) => write!(f, "{i}"),
        }
    }
}
