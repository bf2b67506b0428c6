use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: usize,
    pub page_size: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            page_size: self.page_size,
            total_items: self.total_items,
            total_pages: self.total_pages,
        }
    }
}

/// Slices one 1-based page out of `items`. Page 0 is read as page 1; pages
/// past the end come back empty.
pub fn paginate<T>(items: Vec<T>, page: Option<usize>, page_size: Option<usize>) -> Page<T> {
    let page = page.unwrap_or(1).max(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(page_size);

    let start = (page - 1).saturating_mul(page_size);
    let items = items.into_iter().skip(start).take(page_size).collect();

    Page { items, page, page_size, total_items, total_pages }
}

/// Case-insensitive substring match over any of `fields`. A blank needle
/// matches everything.
pub fn matches_search(fields: &[&str], needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    fields.iter().any(|f| f.to_lowercase().contains(&needle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_page_holds_the_remainder() {
        let items: Vec<u32> = (1..=25).collect();
        let page = paginate(items, Some(3), Some(10));
        assert_eq!(page.items, vec![21, 22, 23, 24, 25]);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_items, 25);
    }

    #[test]
    fn out_of_range_pages_are_empty() {
        let items: Vec<u32> = (1..=25).collect();
        assert!(paginate(items, Some(4), Some(10)).items.is_empty());
        assert_eq!(paginate(Vec::<u32>::new(), None, None).total_pages, 0);
    }

    #[test]
    fn defaults_and_clamping() {
        let items: Vec<u32> = (1..=300).collect();
        let page = paginate(items.clone(), Some(0), None);
        assert_eq!(page.page, 1);
        assert_eq!(page.items.len(), DEFAULT_PAGE_SIZE);

        let page = paginate(items.clone(), None, Some(1000));
        assert_eq!(page.page_size, MAX_PAGE_SIZE);

        let page = paginate(items, None, Some(0));
        assert_eq!(page.page_size, 1);
        assert_eq!(page.total_pages, 300);
    }

    #[test]
    fn search_is_case_insensitive() {
        assert!(matches_search(&["Flower Pots", "FW-1"], "pots"));
        assert!(matches_search(&["Flower Pots", "FW-1"], "fw-"));
        assert!(matches_search(&["Flower Pots"], "  "));
        assert!(!matches_search(&["Flower Pots"], "rocket"));
    }
}
