use anyhow::Context;
use clap::Parser;
use gqlient::{Client, GRAPHQL_API_URL, GqlError};
use issue_browser::{Outcome, QueryLimits, Repository, Runner, Session};
use serde_jsonlines::WriteExt;
use std::io::Write;
use std::num::NonZeroUsize;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Browse the open issues of a GitHub repository via GraphQL
#[derive(Clone, Debug, Eq, Parser, PartialEq)]
struct Arguments {
    /// GraphQL endpoint to send requests to
    #[arg(long, default_value = GRAPHQL_API_URL, value_name = "URL")]
    api_url: String,

    /// Maximum number of pages of issues to fetch
    #[arg(short = 'n', long, default_value = "1")]
    pages: NonZeroUsize,

    /// Dump the fetched issues to the given file as JSON Lines
    #[arg(short, long)]
    outfile: Option<patharg::OutputArg>,

    /// Number of issues to request per page of results
    #[arg(short = 'P', long, default_value = "10")]
    page_size: NonZeroUsize,

    /// Number of most recent reactions to request per issue
    #[arg(short = 'R', long, default_value = "3")]
    reactions: NonZeroUsize,

    /// Star the repository if it is not already starred
    ///
    /// Mutually exclusive with `--unstar`
    #[arg(long, conflicts_with = "unstar")]
    star: bool,

    /// Unstar the repository if it is currently starred
    ///
    /// Mutually exclusive with `--star`
    #[arg(long)]
    unstar: bool,

    /// Repository to browse, in the form `organization/repository`
    #[arg(default_value = "the-road-to-learn-react/the-road-to-learn-react")]
    path: String,
}

impl Arguments {
    fn limits(&self) -> QueryLimits {
        QueryLimits {
            page_size: self.page_size,
            reaction_page_size: self.reactions,
        }
    }

    /// The desired `viewerHasStarred` state, if one was requested
    fn want_starred(&self) -> Option<bool> {
        match (self.star, self.unstar) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let args = Arguments::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let client = Client::with_local_token(args.api_url.clone())
        .context("failed to construct GraphQL client")?;
    let mut runner = Runner::new(client, Session::new(args.limits()));

    let start = Instant::now();
    eprintln!("[·] Fetching issues for {} …", args.path);
    runner.set_path(&args.path)?;
    check(runner.settle())?;
    let mut pages = 1;
    while pages < args.pages.get()
        && runner
            .session()
            .repository()
            .is_some_and(Repository::has_next_page)
    {
        runner.fetch_more()?;
        check(runner.settle())?;
        pages += 1;
    }
    eprintln!(
        "[·] Fetched {pages} page(s) of issues in {:?}",
        start.elapsed()
    );

    if let Some(want) = args.want_starred() {
        match runner.session().repository() {
            Some(repo) if repo.viewer_has_starred == want => {
                eprintln!("[·] Repository is already {}", starred_label(want));
            }
            Some(_) => {
                runner.toggle_star()?;
                check(runner.settle())?;
            }
            None => eprintln!("[·] No repository loaded; not changing star"),
        }
    }

    show(runner.session());

    if let Some(outfile) = args.outfile {
        eprintln!("[·] Dumping to {outfile:#} …");
        let mut fp = outfile.create().context("failed to open file")?;
        if let Some(repo) = runner.session().repository() {
            fp.write_json_lines(repo.issues.issues())
                .context("failed to dump issues")?;
        }
        fp.flush().context("failed to flush filehandle")?;
    }

    Ok(())
}

/// Fail on the first failed request; print any GraphQL errors returned by a
/// star mutation
fn check(outcomes: Vec<Outcome>) -> anyhow::Result<()> {
    for outcome in outcomes {
        match outcome {
            Outcome::Failed(e) => return Err(e).context("request to GitHub failed"),
            Outcome::Starred { starred, errors } => {
                if let Some(starred) = starred {
                    eprintln!("[·] Repository is now {}", starred_label(starred));
                }
                if let Some(errors) = errors {
                    something_went_wrong(&errors);
                }
            }
            Outcome::Loaded { .. } | Outcome::Superseded => (),
        }
    }
    Ok(())
}

fn show(session: &Session) {
    if let Some(errors) = session.errors() {
        something_went_wrong(errors);
    }
    let Some(org) = session.organization() else {
        return;
    };
    println!("Issues from Organization:");
    println!("  {} <{}>", org.name.as_deref().unwrap_or("(unnamed)"), org.url);
    let Some(repo) = org.repository.as_ref() else {
        return;
    };
    println!("In Repository:");
    println!(
        "  {} <{}> ({})",
        repo.name,
        repo.url,
        starred_label(repo.viewer_has_starred)
    );
    println!(
        "Showing {} of {} open issues:",
        repo.issues.edges.len(),
        repo.issues.total_count
    );
    for issue in repo.issues.issues() {
        println!("  - {} <{}>", issue.title, issue.url);
        let reactions = issue
            .reactions
            .edges
            .iter()
            .map(|e| e.node.content.to_string())
            .collect::<Vec<_>>();
        if !reactions.is_empty() {
            println!("      {}", reactions.join(" "));
        }
    }
    if repo.has_next_page() {
        println!("More issues are available; pass `--pages` to fetch them.");
    }
}

fn something_went_wrong(errors: &GqlError) {
    println!("Something went wrong:");
    print!("{errors}");
}

fn starred_label(starred: bool) -> &'static str {
    if starred { "starred" } else { "not starred" }
}
