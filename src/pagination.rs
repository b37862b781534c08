//! Cursor strategies for paginated listing endpoints.
//!
//! Providers signal the end of a collection differently: GitHub search only
//! stops returning items, CircleCI hands back a `next_page_token` until there
//! is nothing left. Both are driven by the same [`Paginator`] loop.

/// One page of a listing response.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// Opaque continuation token, when the provider uses one
    pub next_page_token: Option<String>,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, next_page_token: Option<String>) -> Self {
        Self {
            items,
            next_page_token,
        }
    }
}

/// Position within a paginated collection.
pub trait PageCursor: Sized {
    /// Cursor for the first page.
    fn first() -> Self;

    /// Query parameters selecting the page this cursor points at.
    fn query(&self) -> Vec<(&'static str, String)>;

    /// Cursor for the following page, or `None` once `page` was the last one.
    fn advance<T>(self, page: &Page<T>) -> Option<Self>;
}

/// 1-based page number. Exhausted only by an empty page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumericPageCursor {
    page: u32,
}

impl NumericPageCursor {
    pub fn page(&self) -> u32 {
        self.page
    }
}

impl PageCursor for NumericPageCursor {
    fn first() -> Self {
        Self { page: 1 }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        vec![("page", self.page.to_string())]
    }

    fn advance<T>(self, page: &Page<T>) -> Option<Self> {
        if page.items.is_empty() {
            None
        } else {
            Some(Self {
                page: self.page + 1,
            })
        }
    }
}

/// Token handed back by the previous response. Exhausted by an absent token,
/// regardless of how many items the last page carried.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpaqueTokenCursor {
    token: Option<String>,
}

impl OpaqueTokenCursor {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

impl PageCursor for OpaqueTokenCursor {
    fn first() -> Self {
        Self { token: None }
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        self.token
            .iter()
            .map(|token| ("page-token", token.clone()))
            .collect()
    }

    fn advance<T>(self, page: &Page<T>) -> Option<Self> {
        page.next_page_token.clone().map(|token| Self { token: Some(token) })
    }
}

/// Drives a cursor through `next_cursor -> fetch -> advance` until the
/// provider reports exhaustion.
///
/// ```ignore
/// let mut pages = Paginator::<NumericPageCursor>::new();
/// while let Some(cursor) = pages.next_cursor() {
///     let page = client.fetch(&cursor).await?;
///     pages.advance(cursor, &page);
///     // project page.items
/// }
/// ```
#[derive(Debug)]
pub struct Paginator<C> {
    state: State<C>,
    pages_fetched: usize,
}

#[derive(Debug)]
enum State<C> {
    Ready(C),
    InFlight,
    Exhausted,
}

impl<C: PageCursor> Paginator<C> {
    pub fn new() -> Self {
        Self {
            state: State::Ready(C::first()),
            pages_fetched: 0,
        }
    }

    /// Takes the cursor of the next page to fetch.
    ///
    /// Returns `None` once exhausted, and also while a page is in flight
    /// (i.e. `advance` has not been called for the previous cursor).
    pub fn next_cursor(&mut self) -> Option<C> {
        match std::mem::replace(&mut self.state, State::InFlight) {
            State::Ready(cursor) => Some(cursor),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Records the page fetched with `cursor` and decides whether to continue.
    pub fn advance<T>(&mut self, cursor: C, page: &Page<T>) {
        self.pages_fetched += 1;
        self.state = match cursor.advance(page) {
            Some(next) => State::Ready(next),
            None => State::Exhausted,
        };
    }

    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }
}

impl<C: PageCursor> Default for Paginator<C> {
    fn default() -> Self {
        Self::new()
    }
}
