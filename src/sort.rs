//! Post ordering.
//!
//! [`sort_posts`] reorders the feed in place according to a
//! [`SortCriterion`].  The sort is stable, so records the criterion does not
//! distinguish keep their relative order; the two "president" criteria rely
//! on that to act as a filter-to-front.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, warn};

use crate::source::Post;

/// The sort control's value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SortCriterion {
    #[default]
    CommentsHigh,
    CommentsLow,
    DateNewer,
    DateOlder,
    /// Posts about Joe Biden first.
    PresidentOne,
    /// Posts about Donald Trump first.
    PresidentTwo,
    /// Any other control value.  Accepted silently; leaves order unchanged.
    Unrecognized(String),
}

impl SortCriterion {
    /// The six recognised criteria in control order.
    pub const ALL: [SortCriterion; 6] = [
        SortCriterion::CommentsHigh,
        SortCriterion::CommentsLow,
        SortCriterion::DateNewer,
        SortCriterion::DateOlder,
        SortCriterion::PresidentOne,
        SortCriterion::PresidentTwo,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Self::CommentsHigh => "comments_high",
            Self::CommentsLow => "comments_low",
            Self::DateNewer => "date_newer",
            Self::DateOlder => "date_older",
            Self::PresidentOne => "president_one",
            Self::PresidentTwo => "president_two",
            Self::Unrecognized(value) => value,
        }
    }

    /// Human label shown next to the sort control.
    pub fn label(&self) -> &str {
        match self {
            Self::CommentsHigh => "Más comentarios",
            Self::CommentsLow => "Menos comentarios",
            Self::DateNewer => "Más recientes",
            Self::DateOlder => "Más antiguos",
            Self::PresidentOne => "Joe Biden",
            Self::PresidentTwo => "Donald Trump",
            Self::Unrecognized(value) => value,
        }
    }

    /// The criterion after this one, wrapping around.  An unrecognised value
    /// moves to the default.
    pub fn next(&self) -> SortCriterion {
        match Self::ALL.iter().position(|c| c == self) {
            Some(i) => Self::ALL[(i + 1) % Self::ALL.len()].clone(),
            None => SortCriterion::default(),
        }
    }
}

impl FromStr for SortCriterion {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "comments_high" => Self::CommentsHigh,
            "comments_low" => Self::CommentsLow,
            "date_newer" => Self::DateNewer,
            "date_older" => Self::DateOlder,
            "president_one" => Self::PresidentOne,
            "president_two" => Self::PresidentTwo,
            other => Self::Unrecognized(other.to_string()),
        })
    }
}

impl fmt::Display for SortCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sort `posts` in place.
///
/// `None` slots sink to the end.  An unreadable comment count (NaN) is
/// ranked as zero so the comparator stays a total order and one bad record
/// cannot abort the sort.
pub fn sort_posts(posts: &mut [Option<Post>], criterion: &SortCriterion) {
    if posts.is_empty() {
        return;
    }
    if let SortCriterion::Unrecognized(value) = criterion {
        warn!(criterion = %value, "unrecognised sort criterion; keeping order");
        return;
    }

    if let SortCriterion::DateNewer | SortCriterion::DateOlder = criterion {
        sort_by_date(posts, *criterion == SortCriterion::DateNewer);
        return;
    }

    posts.sort_by(|a, b| match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => compare(a, b, criterion),
    });
}

/// Each date is parsed once, not once per comparison.
fn sort_by_date(posts: &mut [Option<Post>], newest_first: bool) {
    posts.sort_by_cached_key(|slot| match slot {
        None => (true, 0),
        Some(post) => {
            let at = post.created_at();
            (false, if newest_first { at.saturating_neg() } else { at })
        }
    });
}

fn compare(a: &Post, b: &Post, criterion: &SortCriterion) -> Ordering {
    match criterion {
        SortCriterion::CommentsHigh => compare_counts(b, a),
        SortCriterion::CommentsLow => compare_counts(a, b),
        SortCriterion::PresidentOne => president_first(a, b, "Joe Biden"),
        SortCriterion::PresidentTwo => president_first(a, b, "Donald Trump"),
        // Dates go through `sort_by_date`.
        SortCriterion::DateNewer | SortCriterion::DateOlder | SortCriterion::Unrecognized(_) => {
            Ordering::Equal
        }
    }
}

fn compare_counts(a: &Post, b: &Post) -> Ordering {
    count_key(a)
        .partial_cmp(&count_key(b))
        .unwrap_or(Ordering::Equal)
}

fn count_key(post: &Post) -> f64 {
    let count = post.comment_count();
    if count.is_nan() {
        debug!(value = ?post.num_comments, "unreadable comment count ranked as zero");
        return 0.0;
    }
    count
}

fn president_first(a: &Post, b: &Post, name: &str) -> Ordering {
    let (a_match, b_match) = (a.president() == name, b.president() == name);
    // `true` must come first, so compare reversed.
    b_match.cmp(&a_match)
}
