use chrono::{DateTime, FixedOffset, NaiveDate};
use unidecode::unidecode;

/// Date and time strings the way list and post templates show them,
/// in the offset the post was written in.
pub fn format_date_time(date_time: &DateTime<FixedOffset>) -> (String, String) {
    let date = date_time.format("%Y-%m-%d").to_string();
    let time = date_time.format("%H:%M:%S").to_string();
    (date, time)
}

/// Builds a post link from its title: date prefix, lowercase ascii,
/// underscores for spaces.
pub fn post_slug(date: &NaiveDate, post_title: &str) -> String {
    let title: String = post_title
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == ' ')
        .collect();
    let mut slug = title.replace(' ', "_").to_lowercase();
    slug = slug.trim_matches('_').to_string();
    while slug.contains("__") {
        slug = slug.replace("__", "_");
    }
    let date_str = date.format("%Y%m%d").to_string();
    format!("{}_{}", date_str, unidecode(&slug))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_format_date_time() {
        let date_time = FixedOffset::west_opt(3 * 3600)
            .unwrap()
            .with_ymd_and_hms(2017, 9, 10, 10, 42, 32)
            .unwrap();
        let (date, time) = format_date_time(&date_time);
        assert_eq!(date, "2017-09-10");
        assert_eq!(time, "10:42:32");
    }

    #[test]
    fn test_post_slug() {
        let date = NaiveDate::from_ymd_opt(2024, 2, 29).unwrap();
        let slug = post_slug(&date, "Post title of mine ábaco - dir2");
        assert_eq!(slug, "20240229_post_title_of_mine_abaco_dir2");
    }

    #[test]
    fn test_post_slug_trims_separators() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let slug = post_slug(&date, "  spaced   out title ");
        assert_eq!(slug, "20240101_spaced_out_title");
    }
}
