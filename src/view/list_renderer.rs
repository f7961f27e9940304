use std::io;
use std::io::ErrorKind;
use std::sync::Arc;

use ramhorns::Template;

use crate::category_index::CategoryIndex;
use crate::content::Content;
use crate::text_utils::format_date_time;

#[derive(ramhorns::Content)]
struct ListPage<'a> {
    post_list: Vec<PostItem>,
    categories: Vec<ViewCategory<'a>>,
    page_list: Vec<ViewPagination>,
    show_pagination: bool,
}

#[derive(ramhorns::Content)]
struct PostItem {
    date: String,
    time: String,
    link: String,
    title: String,
    author: String,
    summary: String,
}

#[derive(ramhorns::Content)]
struct ViewCategory<'a> {
    name: &'a str,
    count: u32,
}

#[derive(ramhorns::Content)]
struct ViewPagination {
    current: bool,
    number: u32,
    href: String,
}

/// How pagination links are written. The live server keeps the path and
/// varies the query; the static build points into the baked directory tree.
pub enum PageLinkStyle {
    Query,
    Path { base: String },
}

impl PageLinkStyle {
    fn page_href(&self, page: u32) -> String {
        match self {
            PageLinkStyle::Query => format!("?page={}", page),
            PageLinkStyle::Path { base } => {
                if page == 1 {
                    format!("{}/", base)
                } else {
                    format!("{}/page/{}/", base, page)
                }
            }
        }
    }
}

pub struct ListRenderer<'a> {
    pub template: Template<'a>,
    pub page_count: u32,
}

impl ListRenderer<'_> {
    pub fn new(list_tpl_src: &str, page_count: u32) -> io::Result<ListRenderer> {
        let template = match Template::new(list_tpl_src) {
            Ok(x) => x,
            Err(e) => {
                return Err(io::Error::new(
                    ErrorKind::InvalidInput,
                    format!("Error parsing list template: {}", e),
                ));
            }
        };

        Ok(ListRenderer {
            template,
            page_count,
        })
    }

    pub fn render(
        &self,
        contents: &[Arc<Content>],
        cur_page: u32,
        categories: &CategoryIndex,
        link_style: &PageLinkStyle,
    ) -> String {
        let mut post_list = vec![];
        for content in contents {
            let (date, time) = format_date_time(&content.front_matter.date);
            let post_item = PostItem {
                date,
                time,
                link: format!("/view/{}/", &content.link),
                title: content.front_matter.title.clone(),
                author: content.front_matter.author.clone(),
                summary: content.rendered.clone(),
            };
            post_list.push(post_item);
        }

        let mut page_list: Vec<ViewPagination> = Vec::with_capacity(self.page_count as usize);
        for i in 1..=self.page_count {
            page_list.push(ViewPagination {
                current: i == cur_page,
                number: i,
                href: link_style.page_href(i),
            })
        }

        let category_names = categories.by_frequency();
        let categories: Vec<_> = category_names
            .iter()
            .map(|name| ViewCategory {
                name: name.as_str(),
                count: categories.count(name),
            })
            .collect();

        self.template.render(&ListPage {
            post_list,
            categories,
            page_list,
            show_pagination: self.page_count > 1,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use chrono::{FixedOffset, TimeZone};

    use crate::content::front_matter::FrontMatter;

    use super::*;

    fn create_cont(link: &str, day: u32, category: &str) -> Arc<Content> {
        Arc::new(Content {
            front_matter: FrontMatter {
                layout: "post".to_string(),
                title: format!("title-of-{}", link),
                date: FixedOffset::east_opt(0)
                    .unwrap()
                    .with_ymd_and_hms(2024, 1, day, 5, 6, 7)
                    .unwrap(),
                categories: vec![category.to_string()],
                author: "ana".to_string(),
            },
            link: link.to_string(),
            file_path: PathBuf::from(format!("posts/{}/index.md", link)),
            rendered: format!("summary-of-{}", link),
        })
    }

    #[test]
    fn render_list_page() {
        let template_src = r##"{{#post_list}}[{{date}} {{link}} {{title}} by {{author}}: {{{summary}}}]{{/post_list}}
CATS=[{{#categories}}({{name}}:{{count}}){{/categories}}]
PAGES=[{{#show_pagination}}{{#page_list}}<{{number}}{{#current}}*{{/current}} {{href}}>{{/page_list}}{{/show_pagination}}]"##;
        let contents = vec![create_cont("post-a", 2, "rust"), create_cont("post-b", 3, "cooking")];
        let mut categories = CategoryIndex::new();
        categories.add_post(&contents[0].front_matter.categories);
        categories.add_post(&contents[1].front_matter.categories);

        let renderer = ListRenderer::new(template_src, 3).unwrap();
        let res = renderer.render(&contents, 2, &categories, &PageLinkStyle::Query);
        println!("{}", res);
        assert_eq!(
            res,
            r##"[2024-01-02 /view/post-a/ title-of-post-a by ana: summary-of-post-a][2024-01-03 /view/post-b/ title-of-post-b by ana: summary-of-post-b]
CATS=[(cooking:1)(rust:1)]
PAGES=[<1 ?page=1><2* ?page=2><3 ?page=3>]"##
        );
    }

    #[test]
    fn render_single_page_hides_pagination() {
        let template_src = "{{#show_pagination}}PAGES{{/show_pagination}}";
        let renderer = ListRenderer::new(template_src, 1).unwrap();
        let res = renderer.render(&[], 1, &CategoryIndex::new(), &PageLinkStyle::Query);
        assert_eq!(res, "");
    }

    #[test]
    fn page_href_styles() {
        assert_eq!(PageLinkStyle::Query.page_href(4), "?page=4");
        let path = PageLinkStyle::Path {
            base: "/list/rust".to_string(),
        };
        assert_eq!(path.page_href(1), "/list/rust/");
        assert_eq!(path.page_href(2), "/list/rust/page/2/");
    }
}
