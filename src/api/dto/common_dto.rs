//! Shared DTO types used across multiple endpoints.

use futures_util::TryStreamExt;
use futures_util::stream::BoxStream;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::CrmError;
use crate::persistence::DeletePolicy;

/// Largest accepted `per_page`.
pub const MAX_PER_PAGE: u32 = 100;

/// Pagination query parameters for list endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PaginationParams {
    /// Page number (1-indexed). Defaults to 1.
    #[serde(default = "default_page")]
    pub page: u32,
    /// Items per page (max 100). Defaults to 20.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

/// Pagination metadata included in list responses.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PaginationMeta {
    /// Current page number.
    pub page: u32,
    /// Items per page.
    pub per_page: u32,
    /// Total number of matching items.
    pub total: u64,
    /// Total number of pages.
    pub total_pages: u64,
}

/// One page of a list endpoint.
#[derive(Debug, Serialize, ToSchema)]
pub struct Page<T> {
    /// Items on this page.
    pub data: Vec<T>,
    /// Position of this page in the full result.
    pub pagination: PaginationMeta,
}

impl<T> Page<T> {
    /// Converts every item, keeping the pagination metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            data: self.data.into_iter().map(f).collect(),
            pagination: self.pagination,
        }
    }
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

impl Default for PaginationParams {
    fn default() -> Self {
        Self {
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

impl PaginationParams {
    /// Clamps `per_page` to the allowed maximum of 100.
    #[must_use]
    pub fn clamped(&self) -> Self {
        Self {
            page: self.page.max(1),
            per_page: self.per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Drains `rows`, keeping only the items on the requested page.
    ///
    /// # Errors
    ///
    /// Returns the first error yielded by the stream.
    pub async fn collect<T>(
        &self,
        mut rows: BoxStream<'_, Result<T, CrmError>>,
    ) -> Result<Page<T>, CrmError> {
        let params = self.clamped();
        let per_page = u64::from(params.per_page);
        let start = u64::from(params.page - 1) * per_page;
        let end = start + per_page;

        let mut data = Vec::new();
        let mut total: u64 = 0;
        while let Some(row) = rows.try_next().await? {
            if (start..end).contains(&total) {
                data.push(row);
            }
            total += 1;
        }

        Ok(Page {
            data,
            pagination: PaginationMeta {
                page: params.page,
                per_page: params.per_page,
                total,
                total_pages: total.div_ceil(per_page),
            },
        })
    }
}

/// Query parameters for `DELETE` on entities that own other rows.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteParams {
    /// Delete dependent rows too instead of refusing.
    #[serde(default)]
    pub cascade: bool,
}

impl From<DeleteParams> for DeletePolicy {
    fn from(params: DeleteParams) -> Self {
        if params.cascade {
            Self::Cascade
        } else {
            Self::Restrict
        }
    }
}

/// Query parameters for `GET /clients/{id}/profile`.
#[derive(Debug, Clone, Copy, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ProfileParams {
    /// Manager viewing the profile, recorded in the audit log.
    #[serde(default)]
    pub viewer_id: Option<i64>,
}
