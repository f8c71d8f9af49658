//! Campaign attribution parameters

/// UTM parameters carried by a query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
}

impl UtmParams {
    /// Fill every missing field from `other`.
    pub fn or(self, other: UtmParams) -> UtmParams {
        UtmParams {
            utm_source: self.utm_source.or(other.utm_source),
            utm_medium: self.utm_medium.or(other.utm_medium),
            utm_campaign: self.utm_campaign.or(other.utm_campaign),
        }
    }
}

/// Parse UTM parameters from a raw query string (leading `?` optional).
///
/// Keys are matched case-insensitively, values are percent-decoded and empty
/// values are treated as absent. The first occurrence of a key wins.
pub fn parse_utm_params(query_string: &str) -> UtmParams {
    let mut params = UtmParams::default();

    for pair in query_string.trim_start_matches('?').split('&') {
        let mut parts = pair.splitn(2, '=');
        let Some(key) = parts.next() else {
            continue;
        };
        let value = parts.next().unwrap_or("").replace('+', " ");
        let Ok(decoded) = urlencoding::decode(&value) else {
            continue;
        };
        if decoded.is_empty() {
            continue;
        }

        let slot = match key.to_lowercase().as_str() {
            "utm_source" => &mut params.utm_source,
            "utm_medium" => &mut params.utm_medium,
            "utm_campaign" => &mut params.utm_campaign,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(decoded.into_owned());
        }
    }

    params
}
