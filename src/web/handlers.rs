use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
};
use serde_json::Value;

use super::{
    Result, WebError,
    models::{GetRecordQuery, HealthResponse, OkResponse, SetDayRequest},
    state::AppState,
};
use crate::core::UserRecord;
use crate::plan::SupplementPlan;

pub async fn healthcheck() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn get_plan(State(state): State<AppState>) -> Json<SupplementPlan> {
    Json(state.plan.as_ref().clone())
}

pub async fn get_record(
    State(state): State<AppState>,
    Query(query): Query<GetRecordQuery>,
) -> Result<Json<UserRecord>> {
    let user = query
        .user
        .filter(|u| !u.is_empty())
        .ok_or_else(|| WebError::Input("User required".to_string()))?;

    let record = state.gateway.get_visible(&user).await?;
    Ok(Json(record))
}

pub async fn set_day(State(state): State<AppState>, body: Bytes) -> Result<Json<OkResponse>> {
    let request = parse_set_day(&body)?;

    state
        .gateway
        .set_day(&request.user, &request.date, request.supplements)
        .await?;

    Ok(Json(OkResponse { ok: true }))
}

pub async fn method_not_allowed() -> WebError {
    WebError::MethodNotAllowed
}

/// Validates the body by hand so shape errors surface as 400 rather than the
/// extractor's 422.
fn parse_set_day(body: &[u8]) -> Result<SetDayRequest> {
    let payload: Value = serde_json::from_slice(body)
        .map_err(|_| WebError::Input("Request body must be a JSON object".to_string()))?;

    let text_field = |name: &str| {
        payload
            .get(name)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    };
    let (Some(user), Some(date)) = (text_field("user"), text_field("date")) else {
        return Err(WebError::Input("User and date required".to_string()));
    };

    let Some(items) = payload.get("supplements").and_then(Value::as_array) else {
        return Err(WebError::Input("Supplements must be an array".to_string()));
    };
    let supplements = items
        .iter()
        .map(|item| item.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| WebError::Input("Supplements must be strings".to_string()))?;

    Ok(SetDayRequest {
        user,
        date,
        supplements,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input_message(result: Result<SetDayRequest>) -> String {
        match result {
            Err(WebError::Input(msg)) => msg,
            other => panic!("expected input error, got {other:?}"),
        }
    }

    #[test]
    fn parse_accepts_well_formed_body() {
        let parsed =
            parse_set_day(br#"{"user":"A","date":"2025-06-15","supplements":["X","Y"]}"#)
                .unwrap();
        assert_eq!(parsed.user, "A");
        assert_eq!(parsed.supplements, vec!["X", "Y"]);
    }

    #[test]
    fn parse_rejects_missing_fields_and_bad_shapes() {
        assert_eq!(
            input_message(parse_set_day(br#"{"date":"2025-06-15","supplements":[]}"#)),
            "User and date required"
        );
        assert_eq!(
            input_message(parse_set_day(br#"{"user":"A","date":"","supplements":[]}"#)),
            "User and date required"
        );
        assert_eq!(
            input_message(parse_set_day(
                br#"{"user":"A","date":"2025-06-15","supplements":"X"}"#
            )),
            "Supplements must be an array"
        );
        assert_eq!(
            input_message(parse_set_day(
                br#"{"user":"A","date":"2025-06-15","supplements":[1]}"#
            )),
            "Supplements must be strings"
        );
        assert_eq!(
            input_message(parse_set_day(b"not json")),
            "Request body must be a JSON object"
        );
    }
}
