pub struct ViewDetail {
    pub link: String,
}

pub struct ListDetail {
    pub category: Option<String>,
}

pub enum EventApi {
    View(ViewDetail),
    List(ListDetail),
    Index,
    Feed,
}

pub struct MetricEvent {
    pub api: EventApi,
    pub origin: String,
}
