use url::form_urlencoded;

use crate::error::Result;
use crate::gateway::RequestGateway;
use crate::types::{AnalyticsSnapshot, DateRange, UserId};

/// `/analytics` 接口，结果不做缓存
#[derive(Debug, Clone)]
pub struct AnalyticsClient {
    gateway: RequestGateway,
}

impl AnalyticsClient {
    #[must_use]
    pub const fn new(gateway: RequestGateway) -> Self {
        Self { gateway }
    }

    fn path(user_id: UserId, range: DateRange) -> String {
        let mut query = form_urlencoded::Serializer::new(String::new());
        if let Some(from) = range.from {
            query.append_pair("date_from", &from.format("%Y-%m-%d").to_string());
        }
        if let Some(to) = range.to {
            query.append_pair("date_to", &to.format("%Y-%m-%d").to_string());
        }
        let query = query.finish();

        let user_segment = urlencoding::encode(&user_id.to_string()).into_owned();
        if query.is_empty() {
            format!("/analytics/{user_segment}")
        } else {
            format!("/analytics/{user_segment}?{query}")
        }
    }

    /// `GET /analytics/{user_id}?date_from=&date_to=`
    pub async fn get(&self, user_id: UserId, range: DateRange) -> Result<AnalyticsSnapshot> {
        range.validate()?;
        self.gateway
            .get(&Self::path(user_id, range))
            .await?
            .into_body()
    }
}
