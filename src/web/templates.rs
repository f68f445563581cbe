//! HTML rendering for the scoring form

use crate::scoring::Prediction;
use std::collections::HashMap;
use std::fmt::Write;

/// What to show under the form
pub(super) enum Outcome {
    Empty,
    Scored(Prediction),
    Rejected(String),
}

pub(super) fn render_page(feature_names: &[String], submitted: &HashMap<String, String>, outcome: &Outcome) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>Credit Risk Scoring</title>\n</head>\n<body>\n",
    );
    html.push_str("<h1>Credit Risk Scoring</h1>\n<form method=\"post\" action=\"/\">\n");

    for raw in feature_names {
        let name = escape(raw);
        let value = submitted.get(raw).map(|v| escape(v)).unwrap_or_default();
        let _ = writeln!(
            html,
            "  <label>{name}<br><input type=\"text\" name=\"{name}\" value=\"{value}\" required></label><br>"
        );
    }
    html.push_str("  <button type=\"submit\">Predict</button>\n</form>\n");

    match outcome {
        Outcome::Empty => {}
        Outcome::Scored(p) => {
            let _ = writeln!(
                html,
                "<div class=\"result\">\n  <p>Probability of default: {:.4}</p>\n  <p>Prediction: {}</p>\n</div>",
                p.probability, p.prediction
            );
        }
        Outcome::Rejected(message) => {
            let _ = writeln!(html, "<div class=\"error\"><p>{}</p></div>", escape(message));
        }
    }

    html.push_str("</body>\n</html>\n");
    html
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<String> {
        vec!["age".to_string(), "DebtRatio".to_string()]
    }

    #[test]
    fn test_form_has_input_per_feature() {
        let html = render_page(&names(), &HashMap::new(), &Outcome::Empty);
        assert!(html.contains("name=\"age\""));
        assert!(html.contains("name=\"DebtRatio\""));
        assert!(!html.contains("class=\"result\""));
    }

    #[test]
    fn test_result_is_rendered() {
        let outcome = Outcome::Scored(Prediction::from_probability(0.7312));
        let html = render_page(&names(), &HashMap::new(), &outcome);
        assert!(html.contains("0.7312"));
        assert!(html.contains("Prediction: 1"));
    }

    #[test]
    fn test_submitted_values_are_escaped() {
        let mut submitted = HashMap::new();
        submitted.insert("age".to_string(), "<script>".to_string());
        let html = render_page(&names(), &submitted, &Outcome::Rejected("bad \"age\"".to_string()));
        assert!(html.contains("value=\"&lt;script&gt;\""));
        assert!(html.contains("bad &quot;age&quot;"));
        assert!(!html.contains("<script>"));
    }
}
