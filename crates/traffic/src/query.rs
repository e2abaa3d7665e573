//! GraphQL request construction and response parsing.

use crate::error::{TrafficError, TrafficResult};
use bastion_core::{Granularity, TrafficCounters, TrafficPoint};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// A GraphQL request body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    pub query: String,
    pub variables: Value,
}

/// Build the grouped-requests query for the window ending at `until`.
pub fn build_request(
    granularity: Granularity,
    zone_id: &str,
    until: OffsetDateTime,
) -> TrafficResult<GraphqlRequest> {
    let since = until - time::Duration::seconds(granularity.window_secs() as i64);
    let format = |t: OffsetDateTime| {
        t.format(&Rfc3339)
            .map_err(|e| TrafficError::InvalidResponse(format!("timestamp format: {e}")))
    };

    let query = format!(
        r#"query Traffic($zoneTag: String!, $since: DateTime!, $until: DateTime!) {{
  viewer {{
    zones(filter: {{ zoneTag: $zoneTag }}) {{
      {field}(
        limit: {limit}
        filter: {{ datetime_geq: $since, datetime_lt: $until }}
      ) {{
        dimensions {{ datetime }}
        sum {{
          requests
          bytes
          cachedRequests
          cachedBytes
        }}
      }}
    }}
  }}
}}"#,
        field = granularity.field_name(),
        limit = granularity.max_buckets(),
    );

    Ok(GraphqlRequest {
        query,
        variables: json!({
            "zoneTag": zone_id,
            "since": format(since)?,
            "until": format(until)?,
        }),
    })
}

#[derive(Deserialize)]
struct Group {
    #[serde(default)]
    dimensions: Option<Dimensions>,
    #[serde(default)]
    sum: Option<TrafficCounters>,
}

#[derive(Deserialize)]
struct Dimensions {
    #[serde(default)]
    datetime: Option<String>,
}

/// Extract the time series from a successful response body.
///
/// A missing zone or field yields an empty series.
pub fn parse_series(body: &Value, granularity: Granularity) -> TrafficResult<Vec<TrafficPoint>> {
    let groups = body
        .pointer("/data/viewer/zones/0")
        .and_then(|zone| zone.get(granularity.field_name()))
        .cloned()
        .unwrap_or(Value::Null);
    if groups.is_null() {
        return Ok(Vec::new());
    }

    let groups: Vec<Group> = serde_json::from_value(groups)
        .map_err(|e| TrafficError::InvalidResponse(format!("traffic groups: {e}")))?;
    Ok(groups
        .into_iter()
        .map(|group| {
            TrafficPoint::new(
                group.dimensions.and_then(|d| d.datetime),
                group.sum.unwrap_or_default(),
                granularity,
            )
        })
        .collect())
}
