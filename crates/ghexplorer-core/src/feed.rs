// Paginated feed behind the trending and search views
use crate::{models::Repository, search::SearchProvider, Result};
use ghexplorer_api::{SearchParams, SortKey, SortOrder};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// What a feed is currently showing
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FeedQuery {
    pub query: String,
    pub sort: SortKey,
    pub order: SortOrder,
}

impl FeedQuery {
    pub fn new(query: impl Into<String>, sort: SortKey, order: SortOrder) -> Self {
        Self {
            query: query.into(),
            sort,
            order,
        }
    }

    pub fn is_blank(&self) -> bool {
        self.query.trim().is_empty()
    }
}

/// Permission to run exactly one fetch.
///
/// A ticket remembers the query and page it was issued for. The controller
/// only accepts a completion whose ticket is the one currently in flight,
/// so a response that arrives after the query changed is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    id: u64,
    pub query: FeedQuery,
    pub page: u32,
    pub per_page: u32,
}

impl FetchTicket {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn params(&self) -> SearchParams {
        SearchParams {
            query: self.query.query.clone(),
            sort: self.query.sort,
            order: self.query.order,
            per_page: self.per_page,
            page: self.page,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedState {
    /// No query
    Idle,
    Fetching,
    Ready,
    /// The last page added nothing new; scrolling no longer fetches
    Exhausted,
    /// The last fetch failed; waits for an explicit retry
    Failed,
}

/// What happened when a completion was applied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Number of previously unseen records appended
    Appended(usize),
    Exhausted,
    Failed,
    /// The ticket was superseded; nothing changed
    Stale,
}

pub struct FeedController {
    per_page: u32,
    query: Option<FeedQuery>,
    items: Vec<Repository>,
    seen: HashSet<u64>,
    /// Page the next fetch asks for
    cursor: u32,
    exhausted: bool,
    in_flight: Option<u64>,
    error: Option<String>,
    next_ticket: u64,
}

impl FeedController {
    pub fn new(per_page: u32) -> Self {
        Self {
            per_page: per_page.max(1),
            query: None,
            items: Vec::new(),
            seen: HashSet::new(),
            cursor: 1,
            exhausted: false,
            in_flight: None,
            error: None,
            next_ticket: 0,
        }
    }

    /// Switch to a new query/sort/order.
    ///
    /// Setting the active query again is a no-op. Anything else resets the
    /// feed, orphans the in-flight fetch and, unless the query is blank,
    /// hands back a ticket for page 1.
    pub fn set_query(&mut self, query: FeedQuery) -> Option<FetchTicket> {
        let blank = query.is_blank();
        if self.query.as_ref() == Some(&query) || (blank && self.query.is_none()) {
            return None;
        }

        self.reset();
        if blank {
            debug!("Feed cleared");
            return None;
        }

        debug!(query = %query.query, sort = %query.sort, "Feed query changed");
        self.query = Some(query);
        self.issue()
    }

    /// Scroll-proximity signal. Only fetches when the feed has a query,
    /// nothing is in flight, and the feed is neither exhausted nor failed.
    pub fn request_next_page(&mut self) -> Option<FetchTicket> {
        if self.query.is_none() || self.in_flight.is_some() || self.exhausted || self.error.is_some()
        {
            return None;
        }
        self.issue()
    }

    /// Re-issue the page that failed
    pub fn retry(&mut self) -> Option<FetchTicket> {
        if self.error.is_none() || self.in_flight.is_some() || self.query.is_none() {
            return None;
        }
        self.error = None;
        self.issue()
    }

    /// Apply the result of the fetch a ticket was issued for
    pub fn complete(&mut self, ticket: &FetchTicket, result: Result<Vec<Repository>>) -> FetchOutcome {
        if self.in_flight != Some(ticket.id) {
            debug!(
                ticket = ticket.id,
                page = ticket.page,
                "Discarding response for superseded fetch"
            );
            return FetchOutcome::Stale;
        }
        self.in_flight = None;

        match result {
            Ok(repos) => {
                let received = repos.len();
                let mut added = 0;
                for repo in repos {
                    if self.seen.insert(repo.id) {
                        self.items.push(repo);
                        added += 1;
                    }
                }
                self.cursor += 1;

                if added == 0 {
                    info!("Feed exhausted at page {}", ticket.page);
                    self.exhausted = true;
                    FetchOutcome::Exhausted
                } else {
                    debug!(
                        "Page {}: {} received, {} new, {} total",
                        ticket.page,
                        received,
                        added,
                        self.items.len()
                    );
                    FetchOutcome::Appended(added)
                }
            }
            Err(e) => {
                warn!("Fetching page {} failed: {}", ticket.page, e);
                self.error = Some(e.to_string());
                FetchOutcome::Failed
            }
        }
    }

    pub fn state(&self) -> FeedState {
        if self.query.is_none() {
            FeedState::Idle
        } else if self.in_flight.is_some() {
            FeedState::Fetching
        } else if self.error.is_some() {
            FeedState::Failed
        } else if self.exhausted {
            FeedState::Exhausted
        } else {
            FeedState::Ready
        }
    }

    pub fn items(&self) -> &[Repository] {
        &self.items
    }

    pub fn query(&self) -> Option<&FeedQuery> {
        self.query.as_ref()
    }

    pub fn cursor(&self) -> u32 {
        self.cursor
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    fn reset(&mut self) {
        self.query = None;
        self.items.clear();
        self.seen.clear();
        self.cursor = 1;
        self.exhausted = false;
        self.in_flight = None;
        self.error = None;
    }

    fn issue(&mut self) -> Option<FetchTicket> {
        let query = self.query.clone()?;
        let id = self.next_ticket;
        self.next_ticket += 1;
        self.in_flight = Some(id);

        Some(FetchTicket {
            id,
            query,
            page: self.cursor,
            per_page: self.per_page,
        })
    }
}

/// True when the selection is within `threshold` rows of the last item
pub fn is_near_end(selected: usize, len: usize, threshold: usize) -> bool {
    len > 0 && selected.saturating_add(threshold).saturating_add(1) >= len
}

/// Run the fetch for `ticket` and apply the result
pub async fn drive(
    controller: &mut FeedController,
    provider: &dyn SearchProvider,
    ticket: FetchTicket,
) -> FetchOutcome {
    let result = provider.search(&ticket.params()).await;
    controller.complete(&ticket, result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::fixtures::repo;
    use crate::search::MockSearchProvider;
    use crate::Error;

    fn trending() -> FeedQuery {
        FeedQuery::new("stars:>10000", SortKey::Stars, SortOrder::Desc)
    }

    fn ids(feed: &FeedController) -> Vec<u64> {
        feed.items().iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_new_feed_is_idle() {
        let mut feed = FeedController::new(25);
        assert_eq!(feed.state(), FeedState::Idle);
        assert_eq!(feed.cursor(), 1);
        assert!(feed.request_next_page().is_none());
    }

    #[test]
    fn test_set_query_issues_first_page() {
        let mut feed = FeedController::new(25);
        let ticket = feed.set_query(trending()).unwrap();

        assert_eq!(ticket.page, 1);
        assert_eq!(ticket.params().per_page, 25);
        assert_eq!(ticket.params().query, "stars:>10000");
        assert_eq!(feed.state(), FeedState::Fetching);
    }

    #[test]
    fn test_same_query_is_noop() {
        let mut feed = FeedController::new(25);
        feed.set_query(trending()).unwrap();
        assert!(feed.set_query(trending()).is_none());
    }

    #[test]
    fn test_overlapping_pages_are_deduplicated() {
        let mut feed = FeedController::new(2);
        let first = feed.set_query(trending()).unwrap();
        assert_eq!(
            feed.complete(&first, Ok(vec![repo(1, "a"), repo(2, "b")])),
            FetchOutcome::Appended(2)
        );

        let second = feed.request_next_page().unwrap();
        assert_eq!(second.page, 2);
        assert_eq!(
            feed.complete(&second, Ok(vec![repo(2, "b"), repo(3, "c")])),
            FetchOutcome::Appended(1)
        );

        assert_eq!(ids(&feed), vec![1, 2, 3]);
        assert_eq!(feed.cursor(), 3);
    }

    #[test]
    fn test_duplicates_within_a_page_keep_first() {
        let mut feed = FeedController::new(5);
        let ticket = feed.set_query(trending()).unwrap();
        feed.complete(&ticket, Ok(vec![repo(1, "first"), repo(1, "second")]));

        assert_eq!(feed.items().len(), 1);
        assert_eq!(feed.items()[0].name, "first");
    }

    #[test]
    fn test_empty_page_exhausts_feed() {
        let mut feed = FeedController::new(2);
        let first = feed.set_query(trending()).unwrap();
        feed.complete(&first, Ok(vec![repo(1, "a")]));

        let second = feed.request_next_page().unwrap();
        assert_eq!(feed.complete(&second, Ok(vec![])), FetchOutcome::Exhausted);

        assert!(feed.is_exhausted());
        assert_eq!(feed.state(), FeedState::Exhausted);
        assert!(feed.request_next_page().is_none());
    }

    #[test]
    fn test_page_of_only_seen_items_exhausts_feed() {
        let mut feed = FeedController::new(2);
        let first = feed.set_query(trending()).unwrap();
        feed.complete(&first, Ok(vec![repo(1, "a")]));

        let second = feed.request_next_page().unwrap();
        assert_eq!(feed.complete(&second, Ok(vec![repo(1, "a")])), FetchOutcome::Exhausted);
    }

    #[test]
    fn test_in_flight_guard() {
        let mut feed = FeedController::new(2);
        feed.set_query(trending()).unwrap();

        assert!(feed.request_next_page().is_none());
        assert!(feed.request_next_page().is_none());
        assert!(feed.is_in_flight());
    }

    #[test]
    fn test_query_change_resets_and_rejects_late_response() {
        let mut feed = FeedController::new(2);
        let first = feed.set_query(trending()).unwrap();
        feed.complete(&first, Ok(vec![repo(1, "a"), repo(2, "b")]));
        let old_page = feed.request_next_page().unwrap();

        let forks = FeedQuery::new("stars:>10000", SortKey::Forks, SortOrder::Desc);
        let fresh = feed.set_query(forks).unwrap();
        assert!(feed.items().is_empty());
        assert_eq!(feed.cursor(), 1);
        assert_eq!(fresh.page, 1);

        // The page-2 response for the old sort shows up late
        assert_eq!(
            feed.complete(&old_page, Ok(vec![repo(9, "late")])),
            FetchOutcome::Stale
        );
        assert!(feed.items().is_empty());
        assert!(feed.is_in_flight());

        assert_eq!(
            feed.complete(&fresh, Ok(vec![repo(5, "e")])),
            FetchOutcome::Appended(1)
        );
        assert_eq!(ids(&feed), vec![5]);
    }

    #[test]
    fn test_ticket_cannot_be_applied_twice() {
        let mut feed = FeedController::new(2);
        let ticket = feed.set_query(trending()).unwrap();
        feed.complete(&ticket, Ok(vec![repo(1, "a")]));

        assert_eq!(
            feed.complete(&ticket, Ok(vec![repo(2, "b")])),
            FetchOutcome::Stale
        );
        assert_eq!(ids(&feed), vec![1]);
    }

    #[test]
    fn test_failure_keeps_cursor_and_blocks_scroll() {
        let mut feed = FeedController::new(2);
        let first = feed.set_query(trending()).unwrap();
        feed.complete(&first, Ok(vec![repo(1, "a")]));

        let second = feed.request_next_page().unwrap();
        let outcome = feed.complete(&second, Err(Error::ApiError("Status 502".into())));

        assert_eq!(outcome, FetchOutcome::Failed);
        assert_eq!(feed.state(), FeedState::Failed);
        assert_eq!(feed.cursor(), 2);
        assert!(feed.error().unwrap().contains("502"));
        assert!(feed.request_next_page().is_none());

        let again = feed.retry().unwrap();
        assert_eq!(again.page, 2);
        assert!(feed.error().is_none());
        assert!(feed.retry().is_none());
    }

    #[test]
    fn test_blank_query_goes_idle() {
        let mut feed = FeedController::new(2);
        let ticket = feed.set_query(trending()).unwrap();
        feed.complete(&ticket, Ok(vec![repo(1, "a")]));

        assert!(feed
            .set_query(FeedQuery::new("  ", SortKey::Stars, SortOrder::Desc))
            .is_none());
        assert_eq!(feed.state(), FeedState::Idle);
        assert!(feed.items().is_empty());
    }

    #[test]
    fn test_is_near_end() {
        assert!(!is_near_end(0, 0, 3));
        assert!(!is_near_end(0, 10, 3));
        assert!(!is_near_end(5, 10, 3));
        assert!(is_near_end(6, 10, 3));
        assert!(is_near_end(9, 10, 0));
        assert!(!is_near_end(8, 10, 0));
    }

    #[tokio::test]
    async fn test_drive_uses_ticket_parameters() {
        let mut provider = MockSearchProvider::new();
        provider
            .expect_search()
            .withf(|params: &SearchParams| {
                params.page == 1 && params.per_page == 25 && params.sort == SortKey::Updated
            })
            .times(1)
            .returning(|_| Ok(vec![repo(1, "a"), repo(2, "b")]));

        let mut feed = FeedController::new(25);
        let ticket = feed
            .set_query(FeedQuery::new("stars:>10000", SortKey::Updated, SortOrder::Desc))
            .unwrap();

        let outcome = drive(&mut feed, &provider, ticket).await;
        assert_eq!(outcome, FetchOutcome::Appended(2));
        assert_eq!(feed.state(), FeedState::Ready);
    }

    #[tokio::test]
    async fn test_drive_until_exhausted() {
        let mut provider = MockSearchProvider::new();
        provider.expect_search().returning(|params: &SearchParams| match params.page {
            1 => Ok(vec![repo(1, "a"), repo(2, "b")]),
            2 => Ok(vec![repo(2, "b"), repo(3, "c")]),
            _ => Ok(vec![]),
        });

        let mut feed = FeedController::new(2);
        let mut next = feed.set_query(trending());
        let mut fetches = 0;
        while let Some(ticket) = next {
            drive(&mut feed, &provider, ticket).await;
            fetches += 1;
            next = feed.request_next_page();
        }

        assert_eq!(fetches, 3);
        assert_eq!(ids(&feed), vec![1, 2, 3]);
        assert!(feed.is_exhausted());
    }

    #[tokio::test]
    async fn test_drive_failure_surfaces_error() {
        let mut provider = MockSearchProvider::new();
        provider
            .expect_search()
            .returning(|_| Err(Error::RateLimitExceeded));

        let mut feed = FeedController::new(2);
        let ticket = feed.set_query(trending()).unwrap();

        assert_eq!(drive(&mut feed, &provider, ticket).await, FetchOutcome::Failed);
        assert!(feed.error().unwrap().contains("Rate limit"));
    }
}
