use serde::Deserialize;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminOrderQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub status: Option<String>,
    pub sort_order: Option<SortOrder>,
}

impl AdminOrderQuery {
    /// Clamped (page, per_page, offset).
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1) * per_page;
        (page, per_page, offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<i64>, per_page: Option<i64>) -> AdminOrderQuery {
        AdminOrderQuery {
            page,
            per_page,
            status: None,
            sort_order: None,
        }
    }

    #[test]
    fn pagination_normalizes_bounds() {
        assert_eq!(query(None, None).normalize(), (1, 20, 0));
        assert_eq!(query(Some(0), Some(1000)).normalize(), (1, 100, 0));
        assert_eq!(query(Some(3), Some(10)).normalize(), (3, 10, 20));
    }

    #[test]
    fn sort_order_maps_to_fixed_sql() {
        assert_eq!(SortOrder::Asc.as_sql(), "ASC");
        assert_eq!(SortOrder::Desc.as_sql(), "DESC");
    }
}
