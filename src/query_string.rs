use std::collections::HashMap;
use std::string::ToString;

#[derive(PartialEq, Debug)]
pub struct QueryString {
    items: HashMap<String, String>,
}

impl QueryString {
    pub fn from(buf: &str) -> Self {
        let vs: Vec<(String, String)> = serde_urlencoded::from_str(buf).unwrap_or_else(|_| vec![]);
        let items: HashMap<String, String> = vs.into_iter().collect();

        QueryString { items }
    }

    /// Page number from `?page=N`. Anything missing or unparseable is page 1.
    pub fn get_page(&self) -> u32 {
        let one = "1".to_string();
        let val = self.items.get("page").unwrap_or(&one);
        let val: u32 = val.parse().unwrap_or(1);
        if val == 0 {
            return 1;
        }
        val
    }
}
