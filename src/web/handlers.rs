//! Form handlers

use super::templates::{render_page, Outcome};
use crate::error::{Result, ScoringError};
use crate::scoring::ScoringContext;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, warn};

pub(super) async fn index(State(context): State<Arc<ScoringContext>>) -> Html<String> {
    Html(render_page(context.feature_names(), &HashMap::new(), &Outcome::Empty))
}

pub(super) async fn submit(
    State(context): State<Arc<ScoringContext>>,
    Form(fields): Form<Vec<(String, String)>>,
) -> Response {
    let submitted: HashMap<String, String> = first_occurrences(&fields);

    let result = parse_form(&fields).and_then(|values| context.score(&values));
    match result {
        Ok(prediction) => {
            info!(
                "Scored request: probability={:.4}, prediction={}",
                prediction.probability, prediction.prediction
            );
            let page = render_page(context.feature_names(), &submitted, &Outcome::Scored(prediction));
            (StatusCode::OK, Html(page)).into_response()
        }
        Err(e) if e.is_client_error() => {
            warn!("Rejected request: {}", e);
            let page = render_page(context.feature_names(), &submitted, &Outcome::Rejected(e.to_string()));
            (StatusCode::BAD_REQUEST, Html(page)).into_response()
        }
        Err(e) => {
            error!("Scoring failed: {}", e);
            let page = render_page(
                context.feature_names(),
                &submitted,
                &Outcome::Rejected("Internal scoring error".to_string()),
            );
            (StatusCode::INTERNAL_SERVER_ERROR, Html(page)).into_response()
        }
    }
}

fn first_occurrences(fields: &[(String, String)]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for (key, value) in fields {
        map.entry(key.clone()).or_insert_with(|| value.clone());
    }
    map
}

/// Parse every submitted field as `f64`
///
/// A repeated key keeps its first value. Any value that is not a number
/// fails the whole form, naming every offending field.
pub fn parse_form(fields: &[(String, String)]) -> Result<HashMap<String, f64>> {
    let mut seen = HashSet::new();
    let mut values = HashMap::new();
    let mut invalid = Vec::new();

    for (key, raw) in fields {
        if !seen.insert(key.as_str()) {
            continue;
        }
        match raw.trim().parse::<f64>() {
            Ok(v) => {
                values.insert(key.clone(), v);
            }
            Err(_) => invalid.push((key.clone(), raw.clone())),
        }
    }

    if invalid.is_empty() {
        Ok(values)
    } else {
        let detail: Vec<String> = invalid.iter().map(|(k, v)| format!("{}={:?}", k, v)).collect();
        Err(ScoringError::InvalidData(format!(
            "non-numeric form value(s): {}",
            detail.join(", ")
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_parse_numbers() {
        let values = parse_form(&fields(&[("age", " 45 "), ("DebtRatio", "0.3"), ("x", "1e3")])).unwrap();
        assert_eq!(values["age"], 45.0);
        assert_eq!(values["DebtRatio"], 0.3);
        assert_eq!(values["x"], 1000.0);
    }

    #[test]
    fn test_non_numeric_rejects_whole_form() {
        let err = parse_form(&fields(&[("age", "abc"), ("DebtRatio", "0.3"), ("MonthlyIncome", "")])).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("age"));
        assert!(msg.contains("MonthlyIncome"));
        assert!(!msg.contains("DebtRatio"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_first_value_wins() {
        let values = parse_form(&fields(&[("age", "30"), ("age", "70")])).unwrap();
        assert_eq!(values["age"], 30.0);
        assert_eq!(first_occurrences(&fields(&[("a", "1"), ("a", "2")]))["a"], "1");
    }

    #[test]
    fn test_nan_parses_as_missing() {
        let values = parse_form(&fields(&[("MonthlyIncome", "NaN")])).unwrap();
        assert!(values["MonthlyIncome"].is_nan());
    }
}
