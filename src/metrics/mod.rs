pub mod event_slot;
pub mod metric_aggregator;
pub mod metric_handler;
pub mod metric_publisher;
pub mod metric_sender;
pub mod metric_types;
pub mod metric_writer;

pub use metric_handler::MetricHandler;
pub use metric_sender::MetricSender;
pub use metric_writer::MetricWriter;
