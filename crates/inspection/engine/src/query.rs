//! Listing filters, ordering and pagination

use chrono::{DateTime, Utc};
use inspection_types::{Inspection, InspectionStatus, PlantId, ShippingLineId, UserId};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Default page size for listings
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Largest page a caller may request
pub const MAX_PAGE_SIZE: u32 = 100;

/// Filters shared by listing, dashboards and exports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionFilter {
    /// Case-insensitive substring of container number or code
    pub q: Option<String>,
    pub plant_id: Option<PlantId>,
    pub shipping_line_id: Option<ShippingLineId>,
    pub status: Option<InspectionStatus>,
    pub inspector_id: Option<UserId>,
    /// Inclusive lower bound on `inspected_at`
    pub from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on `inspected_at`
    pub to: Option<DateTime<Utc>>,
}

impl InspectionFilter {
    pub fn matches(&self, inspection: &Inspection) -> bool {
        if let Some(q) = self.search_term() {
            let hit = inspection.container_number.to_lowercase().contains(&q)
                || inspection.code.as_str().to_lowercase().contains(&q);
            if !hit {
                return false;
            }
        }
        if self.plant_id.is_some_and(|p| p != inspection.plant_id) {
            return false;
        }
        if self
            .shipping_line_id
            .is_some_and(|l| l != inspection.shipping_line_id)
        {
            return false;
        }
        if self.status.is_some_and(|s| s != inspection.status) {
            return false;
        }
        if self.inspector_id.is_some_and(|u| u != inspection.inspector_id) {
            return false;
        }
        if self.from.is_some_and(|from| inspection.inspected_at < from) {
            return false;
        }
        if self.to.is_some_and(|to| inspection.inspected_at > to) {
            return false;
        }
        true
    }

    /// Trimmed, lowercased search term; blank terms are ignored
    pub fn search_term(&self) -> Option<String> {
        self.q
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .map(str::to_lowercase)
    }
}

/// Sortable columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    InspectedAt,
    ContainerNumber,
    Status,
}

impl SortField {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "inspected_at" | "inspeccionado_en" => Some(SortField::InspectedAt),
            "container_number" | "numero_contenedor" => Some(SortField::ContainerNumber),
            "status" | "estado" => Some(SortField::Status),
            _ => None,
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
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Some(SortOrder::Asc),
            "desc" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Requested page, already validated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub page_size: u32,
    pub sort: SortField,
    pub order: SortOrder,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortField::default(),
            order: SortOrder::default(),
        }
    }
}

impl PageRequest {
    /// Validate raw paging input; `None` means "use the default"
    pub fn new(page: Option<u32>, page_size: Option<u32>) -> Result<Self, String> {
        let page = page.unwrap_or(1);
        let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page == 0 {
            return Err("page must be >= 1".to_string());
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(format!("page_size must be between 1 and {MAX_PAGE_SIZE}"));
        }
        Ok(Self {
            page,
            page_size,
            ..Self::default()
        })
    }

    pub fn sorted_by(mut self, sort: SortField, order: SortOrder) -> Self {
        self.sort = sort;
        self.order = order;
        self
    }

    pub fn offset(&self) -> usize {
        (self.page as usize - 1) * self.page_size as usize
    }

    /// Order two inspections according to this request
    ///
    /// Ties fall back to creation time so pages are stable.
    pub fn compare(&self, a: &Inspection, b: &Inspection) -> Ordering {
        let primary = match self.sort {
            SortField::InspectedAt => a.inspected_at.cmp(&b.inspected_at),
            SortField::ContainerNumber => a.container_number.cmp(&b.container_number),
            SortField::Status => a.status.as_str().cmp(b.status.as_str()),
        };
        let ordering = primary.then_with(|| a.created_at.cmp(&b.created_at));
        match self.order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    }
}

/// One page of results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u32,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> Self {
        let total_pages = total.div_ceil(request.page_size as u64) as u32;
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            total_pages,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            page_size: self.page_size,
            total_pages: self.total_pages,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn inspection(container: &str) -> Inspection {
        Inspection::new(
            container.to_string(),
            PlantId::generate(),
            ShippingLineId::generate(),
            UserId::generate(),
            Utc::now(),
        )
    }

    #[test]
    fn test_page_request_bounds() {
        assert!(PageRequest::new(Some(0), None).is_err());
        assert!(PageRequest::new(None, Some(0)).is_err());
        assert!(PageRequest::new(None, Some(101)).is_err());

        let req = PageRequest::new(None, None).unwrap();
        assert_eq!(req.page, 1);
        assert_eq!(req.page_size, DEFAULT_PAGE_SIZE);

        let req = PageRequest::new(Some(3), Some(10)).unwrap();
        assert_eq!(req.offset(), 20);
    }

    #[test]
    fn test_total_pages() {
        let req = PageRequest::new(Some(1), Some(20)).unwrap();
        assert_eq!(Page::<()>::new(vec![], 0, &req).total_pages, 0);
        assert_eq!(Page::<()>::new(vec![], 20, &req).total_pages, 1);
        assert_eq!(Page::<()>::new(vec![], 21, &req).total_pages, 2);
    }

    #[test]
    fn test_filter_search_and_dates() {
        let insp = inspection("ABCD1234567");

        let by_q = InspectionFilter {
            q: Some(" abcd ".into()),
            ..Default::default()
        };
        assert!(by_q.matches(&insp));

        let by_code = InspectionFilter {
            q: Some("ins_".into()),
            ..Default::default()
        };
        assert!(by_code.matches(&insp));

        let miss = InspectionFilter {
            q: Some("zzz".into()),
            ..Default::default()
        };
        assert!(!miss.matches(&insp));

        let future = InspectionFilter {
            from: Some(Utc::now() + Duration::hours(1)),
            ..Default::default()
        };
        assert!(!future.matches(&insp));

        let blank = InspectionFilter {
            q: Some("   ".into()),
            ..Default::default()
        };
        assert!(blank.matches(&insp));
    }

    #[test]
    fn test_compare_by_container() {
        let a = inspection("AAA1");
        let b = inspection("BBB1");
        let req = PageRequest::default().sorted_by(SortField::ContainerNumber, SortOrder::Asc);
        assert_eq!(req.compare(&a, &b), Ordering::Less);
        let req = req.sorted_by(SortField::ContainerNumber, SortOrder::Desc);
        assert_eq!(req.compare(&a, &b), Ordering::Greater);
    }
}
