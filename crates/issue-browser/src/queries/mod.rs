mod get_issues;
mod star;
pub use self::get_issues::GetIssuesPage;
pub use self::star::{StarAction, ToggleStar};
use std::num::NonZeroUsize;

/// Default number of issues requested per page
pub const DEFAULT_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(10).expect("10 != 0");

/// Default number of (most recent) reactions requested per issue
pub const DEFAULT_REACTION_PAGE_SIZE: NonZeroUsize = NonZeroUsize::new(3).expect("3 != 0");

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct QueryLimits {
    /// How many issues to request per page
    pub page_size: NonZeroUsize,

    /// How many reactions to request per issue
    pub reaction_page_size: NonZeroUsize,
}

impl Default for QueryLimits {
    fn default() -> QueryLimits {
        QueryLimits {
            page_size: DEFAULT_PAGE_SIZE,
            reaction_page_size: DEFAULT_REACTION_PAGE_SIZE,
        }
    }
}
