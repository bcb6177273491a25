//! REST annotator client
use ontoreport_core::{Annotation, Annotator, ServiceError};
use reqwest::blocking::Client;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnnotationBody {
    annotated_class: AnnotatedClass,
    #[serde(default)]
    annotations: Vec<Span>,
}

#[derive(Deserialize)]
struct AnnotatedClass {
    #[serde(rename = "@id")]
    id: String,
}

#[derive(Deserialize)]
struct Span {
    from: u32,
    to: u32,
}

pub struct HttpAnnotator {
    client: Client,
    endpoint: String,
    apikey: Option<String>,
}

impl HttpAnnotator {
    pub fn new(endpoint: &str, apikey: Option<String>, timeout: Duration) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
            apikey,
        })
    }
}

impl Annotator for HttpAnnotator {
    fn annotate(&self, text: &str, ontologies: &[String]) -> Result<Vec<Annotation>, ServiceError> {
        let ontologies = ontologies.join(",");
        let mut params = vec![("text", text), ("ontologies", ontologies.as_str())];
        if let Some(key) = &self.apikey {
            params.push(("apikey", key.as_str()));
        }

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&params)
            .send()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .map_err(|e| ServiceError::Unavailable(e.to_string()))?;
        if !status.is_success() {
            return Err(ServiceError::Query(format!("annotator returned {}: {}", status, body)));
        }
        parse_annotations(&body)
    }
}

/// Flatten the annotator payload into one entry per matched span.
pub fn parse_annotations(body: &str) -> Result<Vec<Annotation>, ServiceError> {
    let classes: Vec<AnnotationBody> =
        serde_json::from_str(body).map_err(|e| ServiceError::Decode(e.to_string()))?;
    Ok(classes
        .into_iter()
        .flat_map(|class| {
            let id = class.annotated_class.id;
            class.annotations.into_iter().map(move |span| Annotation {
                class_id: id.clone(),
                from: span.from,
                to: span.to,
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_annotations_flattens_spans() {
        let body = r#"[
            {"annotatedClass": {"@id": "http://purl.example.org/HEART", "links": {}},
             "annotations": [{"from": 1, "to": 5, "matchType": "PREF", "text": "HEART"},
                             {"from": 30, "to": 34, "matchType": "PREF", "text": "HEART"}]},
            {"annotatedClass": {"@id": "http://purl.example.org/LUNG"},
             "annotations": [{"from": 9, "to": 12}]}
        ]"#;
        let spans = parse_annotations(body).unwrap();

        assert_eq!(spans.len(), 3);
        assert_eq!(spans[2].class_id, "http://purl.example.org/LUNG");
        assert_eq!((spans[1].from, spans[1].to), (30, 34));
    }

    #[test]
    fn test_parse_annotations_empty_and_invalid() {
        assert!(parse_annotations("[]").unwrap().is_empty());
        assert!(matches!(
            parse_annotations(r#"{"errors":["bad apikey"]}"#),
            Err(ServiceError::Decode(_))
        ));
    }
}
