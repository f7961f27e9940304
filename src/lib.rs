pub mod checker;
pub mod config;
pub mod content;
pub mod logger;
pub mod server;
pub mod site_builder;
pub mod text_utils;

mod category_index;
mod metrics;
mod paginator;
mod post_list;
mod post_processor;
mod query_string;
mod render_cache;
mod test_data;
mod view;
