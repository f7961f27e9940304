pub struct Paginator<'a, T> {
    items: &'a [T],
    page_size: u32,
    page_count: u32,
}

impl<'a, T> Paginator<'a, T> {
    pub fn from(items: &'a [T], page_size: u32) -> Self {
        if items.is_empty() {
            return Paginator {
                items,
                page_size,
                page_count: 0,
            };
        }
        let item_count = items.len() as u32;
        let upper_bound = item_count - 1;
        let page_count = (upper_bound / page_size) + 1;

        Paginator {
            items,
            page_size,
            page_count,
        }
    }

    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Pages are 1-based. The last page may be short; out of range pages
    /// are an error, not an empty slice.
    pub fn get_page(&self, page: u32) -> Result<&'a [T], String> {
        match page {
            0 => return Err("Page has to be greater than 0".to_string()),
            x if x > self.page_count => {
                return Err(format!("Page has to be less than page_count ({})", self.page_count))
            }
            _ => {}
        };

        let start = ((page - 1) * self.page_size) as usize;
        let mut end = (self.page_size as usize) + start;
        if end > self.items.len() {
            end = self.items.len();
        }
        Ok(&self.items[start..end])
    }
}
