use spdlog::error;
use tokio::sync::mpsc::Sender;

use crate::metrics::metric_types::EventApi::{Feed, Index, List, View};
use crate::metrics::metric_types::{ListDetail, MetricEvent, ViewDetail};

/// Handler-facing side of the metrics channel. The no-op variant keeps the
/// call sites unchanged when metrics are turned off.
pub struct MetricSender {
    sender_ch: Option<Sender<MetricEvent>>,
}

impl MetricSender {
    pub fn new(sender_ch: Sender<MetricEvent>) -> Self {
        Self {
            sender_ch: Some(sender_ch),
        }
    }

    pub fn no_op() -> Self {
        Self { sender_ch: None }
    }

    pub async fn view(&self, link: String, origin: String) {
        if let Some(ref sender) = self.sender_ch {
            if let Err(e) = sender
                .send(MetricEvent {
                    api: View(ViewDetail { link }),
                    origin,
                })
                .await
            {
                error!("Error writing view metrics: {}", e);
            }
        }
    }

    pub async fn list(&self, category: Option<String>, origin: String) {
        if let Some(ref sender) = self.sender_ch {
            if let Err(e) = sender
                .send(MetricEvent {
                    api: List(ListDetail { category }),
                    origin,
                })
                .await
            {
                error!("Error writing list metrics: {}", e);
            }
        }
    }

    pub async fn feed(&self, origin: String) {
        if let Some(ref sender) = self.sender_ch {
            if let Err(e) = sender.send(MetricEvent { api: Feed, origin }).await {
                error!("Error writing feed metrics: {}", e);
            }
        }
    }

    pub async fn index(&self, origin: String) {
        if let Some(ref sender) = self.sender_ch {
            if let Err(e) = sender.send(MetricEvent { api: Index, origin }).await {
                error!("Error writing index metrics: {}", e);
            }
        }
    }
}
