//! Task list query state
//!
//! `QueryState` is the closed record of filters, sort and pagination that
//! describes one request to `GET /tasks/`.

use crate::api::models::{TaskPriority, TaskStatus};
use crate::config::{DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    DueDate,
    Priority,
    Title,
}

impl SortField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::DueDate => "due_date",
            SortField::Priority => "priority",
            SortField::Title => "title",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFilters {
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub search: Option<String>,
    pub tags: Option<Vec<String>>,
    pub assigned_to: Option<String>,
}

impl TaskFilters {
    pub fn is_active(&self) -> bool {
        self.status.is_some()
            || self.priority.is_some()
            || self.search.is_some()
            || self.tags.is_some()
            || self.assigned_to.is_some()
    }
}

/// Change to a single filter field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterUpdate<T> {
    Keep,
    Set(T),
    Clear,
}

impl<T> Default for FilterUpdate<T> {
    fn default() -> Self {
        FilterUpdate::Keep
    }
}

impl<T> FilterUpdate<T> {
    fn apply(self, field: &mut Option<T>) {
        match self {
            FilterUpdate::Keep => {}
            FilterUpdate::Set(value) => *field = Some(value),
            FilterUpdate::Clear => *field = None,
        }
    }
}

impl<T> From<Option<T>> for FilterUpdate<T> {
    /// `Some` sets the filter, `None` clears it
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => FilterUpdate::Set(v),
            None => FilterUpdate::Clear,
        }
    }
}

/// Partial filter change merged by `QueryStateManager::set_filters`
#[derive(Debug, Clone, Default)]
pub struct FilterPatch {
    pub status: FilterUpdate<TaskStatus>,
    pub priority: FilterUpdate<TaskPriority>,
    pub search: FilterUpdate<String>,
    pub tags: FilterUpdate<Vec<String>>,
    pub assigned_to: FilterUpdate<String>,
}

impl FilterPatch {
    pub fn status(status: impl Into<FilterUpdate<TaskStatus>>) -> Self {
        Self {
            status: status.into(),
            ..Self::default()
        }
    }

    pub fn priority(priority: impl Into<FilterUpdate<TaskPriority>>) -> Self {
        Self {
            priority: priority.into(),
            ..Self::default()
        }
    }

    /// Blank input clears the search
    pub fn search(text: &str) -> Self {
        let text = text.trim();
        Self {
            search: if text.is_empty() {
                FilterUpdate::Clear
            } else {
                FilterUpdate::Set(text.to_string())
            },
            ..Self::default()
        }
    }

    /// An empty tag list clears the tag filter
    pub fn tags(tags: Vec<String>) -> Self {
        let tags: Vec<String> = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
        Self {
            tags: if tags.is_empty() {
                FilterUpdate::Clear
            } else {
                FilterUpdate::Set(tags)
            },
            ..Self::default()
        }
    }

    pub fn assigned_to(user_id: impl Into<FilterUpdate<String>>) -> Self {
        Self {
            assigned_to: user_id.into(),
            ..Self::default()
        }
    }

    pub(crate) fn apply_to(self, filters: &mut TaskFilters) {
        self.status.apply(&mut filters.status);
        self.priority.apply(&mut filters.priority);
        self.search.apply(&mut filters.search);
        self.tags.apply(&mut filters.tags);
        self.assigned_to.apply(&mut filters.assigned_to);
    }
}

/// Filters, sort and pagination of the task list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawQueryState")]
pub struct QueryState {
    pub filters: TaskFilters,
    pub sort_by: SortField,
    pub order: SortOrder,
    page: u32,
    limit: u32,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            filters: TaskFilters::default(),
            sort_by: SortField::default(),
            order: SortOrder::default(),
            page: 1,
            limit: DEFAULT_PAGE_LIMIT,
        }
    }
}

impl QueryState {
    /// First page with default sort; `limit` must be in `1..=100`
    pub fn new(limit: u32) -> Result<Self> {
        validate_limit(limit)?;
        Ok(Self {
            limit,
            ..Self::default()
        })
    }

    pub fn page(&self) -> u32 {
        self.page
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub(crate) fn set_page(&mut self, page: u32) {
        self.page = page;
    }

    pub(crate) fn set_limit(&mut self, limit: u32) -> Result<()> {
        validate_limit(limit)?;
        self.limit = limit;
        self.page = 1;
        Ok(())
    }

    pub(crate) fn merge_filters(&mut self, patch: FilterPatch) {
        patch.apply_to(&mut self.filters);
        self.page = 1;
    }

    pub(crate) fn set_sort(&mut self, sort_by: SortField, order: SortOrder) {
        self.sort_by = sort_by;
        self.order = order;
        self.page = 1;
    }

    /// Back to default filters and sort, keeping the page size
    pub(crate) fn reset(&mut self) {
        *self = Self {
            limit: self.limit,
            ..Self::default()
        };
    }

    /// Query string pairs for `GET /tasks/`; unset filters are omitted
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        let f = &self.filters;

        if let Some(status) = f.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(priority) = f.priority {
            params.push(("priority", priority.as_str().to_string()));
        }
        if let Some(search) = &f.search {
            params.push(("search", search.clone()));
        }
        if let Some(tags) = &f.tags {
            params.push(("tags", tags.join(",")));
        }
        if let Some(assigned_to) = &f.assigned_to {
            params.push(("assigned_to", assigned_to.clone()));
        }

        params.push(("sort_by", self.sort_by.as_str().to_string()));
        params.push(("order", self.order.as_str().to_string()));
        params.push(("page", self.page.to_string()));
        params.push(("limit", self.limit.to_string()));
        params
    }
}

/// Unchecked wire form of `QueryState`
#[derive(Deserialize)]
struct RawQueryState {
    #[serde(default)]
    filters: TaskFilters,
    #[serde(default)]
    sort_by: SortField,
    #[serde(default)]
    order: SortOrder,
    #[serde(default = "first_page")]
    page: u32,
    #[serde(default = "default_limit")]
    limit: u32,
}

fn first_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    DEFAULT_PAGE_LIMIT
}

impl TryFrom<RawQueryState> for QueryState {
    type Error = AppError;

    fn try_from(raw: RawQueryState) -> Result<Self> {
        validate_limit(raw.limit)?;
        if raw.page == 0 {
            return Err(AppError::Validation("page numbers start at 1".to_string()));
        }
        Ok(Self {
            filters: raw.filters,
            sort_by: raw.sort_by,
            order: raw.order,
            page: raw.page,
            limit: raw.limit,
        })
    }
}

fn validate_limit(limit: u32) -> Result<()> {
    if limit == 0 || limit > MAX_PAGE_LIMIT {
        return Err(AppError::Validation(format!(
            "page size must be between 1 and {}, got {}",
            MAX_PAGE_LIMIT, limit
        )));
    }
    Ok(())
}
