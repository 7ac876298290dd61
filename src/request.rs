use serde::Deserialize;

fn default_page() -> i64 {
    1
}

fn default_size() -> i64 {
    50
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_size")]
    pub size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page: default_page(),
            size: default_size(),
        }
    }
}

impl Pagination {
    pub fn limit(&self) -> i64 {
        self.size.clamp(1, 200)
    }

    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1).saturating_mul(self.limit())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Next {
    pub next: Option<String>,
}

impl Next {
    /// Only same-site absolute paths are followed after login.
    pub fn safe(&self) -> Option<&str> {
        self.next.as_deref().filter(|n| n.starts_with('/') && !n.starts_with("//") && !n.contains('\\'))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use actix_web::web::Query;

    #[test]
    fn test_pagination_bounds() {
        let p = Pagination { page: 0, size: 1000 };
        assert_eq!(p.limit(), 200);
        assert_eq!(p.offset(), 0);
        let p = Pagination { page: 3, size: 20 };
        assert_eq!(p.offset(), 40);
    }

    #[test]
    fn test_huge_page_saturates() {
        let p = Pagination { page: i64::MAX, size: 50 };
        assert_eq!(p.offset(), i64::MAX);
        let p = Query::<Pagination>::from_query("page=9223372036854775807&size=-5").unwrap().into_inner();
        assert_eq!(p.limit(), 1);
        assert_eq!(p.offset(), i64::MAX - 1);
    }

    #[test]
    fn test_next_rejects_offsite() {
        assert_eq!(Next { next: Some("/workspaces/".into()) }.safe(), Some("/workspaces/"));
        assert_eq!(Next { next: Some("//evil.example".into()) }.safe(), None);
        assert_eq!(Next { next: Some("https://evil.example".into()) }.safe(), None);
        assert_eq!(Next::default().safe(), None);
    }
}
