use serde::{Deserialize, Serialize};

/// Query parameters checked, in order, for the session's click identifier.
pub const CLICK_ID_PARAMS: [&str; 3] = ["clickid", "gclid", "fbclid"];

/// Marketing attribution captured once when a funnel session starts.
///
/// The record is immutable after capture: the funnel never writes to it and
/// the store only fills attribution columns that are still empty.
#[derive(Debug, Default, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribution {
    pub utm_source: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_medium: Option<String>,
    pub click_id: Option<String>,
    pub referrer: Option<String>,
    pub campaign_id: Option<String>,
    pub adset_id: Option<String>,
    pub creative_id: Option<String>,
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl Attribution {
    /// Builds the record from a raw query string (with or without the
    /// leading `?`) and the document referrer. Absent or empty parameters
    /// map to `None`; nothing here can fail.
    pub fn capture(query: &str, referrer: Option<&str>) -> Self {
        let query = query.trim_start_matches('?');
        let pairs: Vec<(String, String)> =
            url::form_urlencoded::parse(query.as_bytes())
                .into_owned()
                .collect();

        let get = |key: &str| {
            present(
                pairs
                    .iter()
                    .find(|(k, v)| k == key && !v.trim().is_empty())
                    .map(|(_, v)| v.clone()),
            )
        };

        let click_id = CLICK_ID_PARAMS.iter().find_map(|key| get(*key));

        Self {
            utm_source: get("utm_source"),
            utm_campaign: get("utm_campaign"),
            utm_medium: get("utm_medium"),
            click_id,
            referrer: present(referrer.map(str::to_string)),
            campaign_id: get("campaign_id"),
            adset_id: get("adset_id"),
            creative_id: get("creative_id"),
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// One-line description of the tracking parameters, used when no
    /// generated summary is available for the CRM.
    pub fn describe(&self) -> String {
        let fields = [
            ("utm_source", &self.utm_source),
            ("utm_campaign", &self.utm_campaign),
            ("utm_medium", &self.utm_medium),
            ("clickid", &self.click_id),
            ("referrer", &self.referrer),
            ("campaign_id", &self.campaign_id),
            ("adset_id", &self.adset_id),
            ("creative_id", &self.creative_id),
        ];

        fields
            .iter()
            .filter_map(|(name, value)| {
                value.as_ref().map(|v| format!("{}={}", name, v))
            })
            .collect::<Vec<_>>()
            .join("; ")
    }
}
