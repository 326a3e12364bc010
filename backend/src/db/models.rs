//! Query and result shapes exchanged with repository backends.

use serde::{Deserialize, Serialize};

use crate::models::{OfferingId, ScheduleKind};

/// A resolved block listing query. Paging values are already clamped by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockQuery {
    pub offering_id: Option<OfferingId>,
    pub kind: Option<ScheduleKind>,
    /// 1-based page number
    pub page: u32,
    pub limit: u32,
}

impl BlockQuery {
    /// Rows skipped before this page.
    pub fn offset(&self) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.limit)
    }
}

/// One page of a listing, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub last_page: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, page: u32, limit: u32) -> Self {
        let limit_u64 = u64::from(limit.max(1));
        let pages = total.div_ceil(limit_u64).max(1);
        Self {
            items,
            total,
            page,
            limit,
            last_page: u32::try_from(pages).unwrap_or(u32::MAX),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_last_page_rounds_up_and_never_zero() {
        assert_eq!(Page::<i32>::new(Vec::new(), 0, 1, 20).last_page, 1);
        assert_eq!(Page::<i32>::new(Vec::new(), 20, 1, 20).last_page, 1);
        assert_eq!(Page::<i32>::new(Vec::new(), 21, 1, 20).last_page, 2);
    }

    #[test]
    fn test_offset() {
        let q = BlockQuery {
            offering_id: None,
            kind: None,
            page: 3,
            limit: 10,
        };
        assert_eq!(q.offset(), 20);
    }
}
