//! Paginated key tables for the public and private scopes.

use tracing::debug;

use crate::error::ApiResult;
use crate::models::{DataKey, KeyListQuery, KeyType, PagedKeys, SearchField, Visibility};
use crate::service::KeyService;

/// Default rows per page.
pub const DEFAULT_PAGE_SIZE: u64 = 10;

/// Where the total row count comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalSource {
    /// `meta.total_count` of the response; the server pages.
    #[default]
    ServerMeta,
    /// Length of the returned rows; the client pages.
    LocalSlice,
}

/// Paging and filter fields of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub total_count: u64,
    pub current_page: u64,
    pub page_size: u64,
    pub search_input: String,
    pub select: SearchField,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            total_count: 0,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            search_input: String::new(),
            select: SearchField::Name,
        }
    }
}

/// Per-family record counts of the last applied response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeCounts {
    pub pgp: usize,
    pub x509: usize,
}

impl TypeCounts {
    pub fn from_keys(keys: &[DataKey]) -> Self {
        keys.iter().fold(Self::default(), |mut acc, key| {
            match key.family() {
                Some(KeyType::Pgp) => acc.pgp += 1,
                Some(KeyType::X509) => acc.x509 += 1,
                None => {}
            }
            acc
        })
    }

    pub fn get(&self, key_type: KeyType) -> usize {
        match key_type {
            KeyType::Pgp => self.pgp,
            KeyType::X509 => self.x509,
        }
    }
}

/// A request issued for a given filter generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    query: KeyListQuery,
}

impl FetchTicket {
    pub fn query(&self) -> &KeyListQuery {
        &self.query
    }
}

/// One visibility scope's table.
///
/// Every filter or paging mutation bumps a generation counter. A response is
/// only applied if it was requested for the current generation, so a slow
/// answer to an older filter never overwrites newer rows.
#[derive(Debug, Clone)]
pub struct KeyListState {
    visibility: Visibility,
    pagination: Pagination,
    rows: Vec<DataKey>,
    counts: TypeCounts,
    total_source: TotalSource,
    generation: u64,
}

impl KeyListState {
    pub fn new(visibility: Visibility) -> Self {
        Self {
            visibility,
            pagination: Pagination::default(),
            rows: Vec::new(),
            counts: TypeCounts::default(),
            total_source: TotalSource::default(),
            generation: 0,
        }
    }

    pub fn with_total_source(mut self, source: TotalSource) -> Self {
        self.total_source = source;
        self
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    pub fn pagination(&self) -> &Pagination {
        &self.pagination
    }

    pub fn counts(&self) -> TypeCounts {
        self.counts
    }

    pub fn total_count(&self) -> u64 {
        self.pagination.total_count
    }

    /// All rows of the last applied response.
    pub fn rows(&self) -> &[DataKey] {
        &self.rows
    }

    /// Rows to show for the current page.
    ///
    /// With [`TotalSource::LocalSlice`] the rows are sliced by page only when
    /// the server returned more than a page; a response that fits one page
    /// is taken as already paged.
    pub fn displayed(&self) -> &[DataKey] {
        match self.total_source {
            TotalSource::ServerMeta => &self.rows,
            TotalSource::LocalSlice => {
                let size = self.pagination.page_size as usize;
                if self.rows.len() <= size {
                    return &self.rows;
                }
                let start = (self.pagination.current_page.saturating_sub(1) as usize).saturating_mul(size);
                if start >= self.rows.len() {
                    return &[];
                }
                let end = start.saturating_add(size).min(self.rows.len());
                &self.rows[start..end]
            }
        }
    }

    /// Number of pages for the current total.
    pub fn page_count(&self) -> u64 {
        if self.pagination.page_size == 0 {
            return 0;
        }
        self.pagination.total_count.div_ceil(self.pagination.page_size)
    }

    /// Request parameters for the current fields: scope and paging, plus the
    /// search text keyed by the selected field when the text is non-blank.
    pub fn request_params(&self) -> KeyListQuery {
        KeyListQuery::page(
            self.visibility,
            self.pagination.page_size,
            self.pagination.current_page,
        )
        .with_search(self.pagination.select, &self.pagination.search_input)
    }

    pub fn set_page(&mut self, page: u64) {
        self.pagination.current_page = page.max(1);
        self.touch();
    }

    /// Changes the page size and returns to the first page.
    pub fn set_page_size(&mut self, size: u64) {
        self.pagination.page_size = size.max(1);
        self.pagination.current_page = 1;
        self.touch();
    }

    /// Changes the search text and returns to the first page.
    pub fn set_search(&mut self, text: impl Into<String>) {
        self.pagination.search_input = text.into();
        self.pagination.current_page = 1;
        self.touch();
    }

    /// Changes which field the search text matches and returns to the first page.
    pub fn set_select(&mut self, field: SearchField) {
        self.pagination.select = field;
        self.pagination.current_page = 1;
        self.touch();
    }

    /// Snapshot of the request for the current generation.
    pub fn begin_fetch(&self) -> FetchTicket {
        FetchTicket {
            generation: self.generation,
            query: self.request_params(),
        }
    }

    /// Applies a response. Returns `false` and leaves state untouched when the
    /// ticket belongs to an older generation.
    pub fn apply(&mut self, ticket: FetchTicket, page: PagedKeys) -> bool {
        if ticket.generation != self.generation {
            debug!(
                visibility = %self.visibility,
                stale = ticket.generation,
                current = self.generation,
                "discarding stale key page"
            );
            return false;
        }
        self.rows = page.data;
        self.pagination.total_count = match self.total_source {
            TotalSource::ServerMeta => page.meta.total_count,
            TotalSource::LocalSlice => self.rows.len() as u64,
        };
        self.counts = TypeCounts::from_keys(&self.rows);
        true
    }

    /// Fetches and applies the page for the current fields. Errors leave the
    /// previous rows in place.
    pub async fn fetch(&mut self, keys: &dyn KeyService) -> ApiResult<bool> {
        let ticket = self.begin_fetch();
        let page = keys.list_keys(ticket.query()).await?;
        Ok(self.apply(ticket, page))
    }

    fn touch(&mut self) {
        self.generation = self.generation.wrapping_add(1);
    }
}

/// Both scopes of the key list view.
#[derive(Debug, Clone)]
pub struct KeyTableState {
    pub public: KeyListState,
    pub private: KeyListState,
}

impl KeyTableState {
    pub fn new() -> Self {
        Self {
            public: KeyListState::new(Visibility::Public),
            private: KeyListState::new(Visibility::Private),
        }
    }

    pub fn with_total_source(source: TotalSource) -> Self {
        Self {
            public: KeyListState::new(Visibility::Public).with_total_source(source),
            private: KeyListState::new(Visibility::Private).with_total_source(source),
        }
    }

    pub fn scope(&self, visibility: Visibility) -> &KeyListState {
        match visibility {
            Visibility::Public => &self.public,
            Visibility::Private => &self.private,
        }
    }

    pub fn scope_mut(&mut self, visibility: Visibility) -> &mut KeyListState {
        match visibility {
            Visibility::Public => &mut self.public,
            Visibility::Private => &mut self.private,
        }
    }

    /// Refreshes both scopes, public first.
    pub async fn fetch_all(&mut self, keys: &dyn KeyService) -> ApiResult<()> {
        self.public.fetch(keys).await?;
        self.private.fetch(keys).await?;
        Ok(())
    }
}

impl Default for KeyTableState {
    fn default() -> Self {
        Self::new()
    }
}
