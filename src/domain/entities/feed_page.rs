use serde::Serialize;

/// A ranked post identifier; full payloads are hydrated by the serving
/// layer from the posting subsystem.
#[derive(Debug, Clone, Serialize)]
pub struct RankedPostRef {
    pub post_id: String,
    pub score: f64,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub has_more: bool,
}

/// One page of the personalized timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelinePage {
    pub posts: Vec<RankedPostRef>,
    pub pagination: Pagination,
}

impl TimelinePage {
    pub fn empty(page: u32, page_size: u32) -> Self {
        Self {
            posts: Vec::new(),
            pagination: Pagination {
                page,
                page_size,
                total_count: 0,
                has_more: false,
            },
        }
    }
}

/// One page of the chronological following feed (post ids, newest first).
#[derive(Debug, Clone, Serialize)]
pub struct FollowingPage {
    pub posts: Vec<String>,
    pub pagination: Pagination,
}

/// Timeframe over which trending velocity is measured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendingTimeframe {
    Hour,
    Day,
    Week,
}

impl TrendingTimeframe {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" | "1h" => Some(Self::Hour),
            "day" | "24h" => Some(Self::Day),
            "week" | "7d" => Some(Self::Week),
            _ => None,
        }
    }

    pub fn hours(&self) -> i64 {
        match self {
            Self::Hour => 1,
            Self::Day => 24,
            Self::Week => 168,
        }
    }
}
