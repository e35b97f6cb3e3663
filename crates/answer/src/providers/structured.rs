//! Structured answer engine client (Wolfram|Alpha-style XML query API)
//!
//! The answer is the plaintext of the first subpod of the pod flagged
//! `primary="true"`, reduced to its first line with `|` separators spelled
//! out as "and".

use super::StructuredAnswerEngine;
use async_trait::async_trait;
use serde::Deserialize;
use whoqa_common::config::StructuredConfig;
use whoqa_common::errors::{AppError, Result};

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(rename = "@success", default)]
    success: Option<String>,
    #[serde(rename = "@error", default)]
    error: Option<String>,
    #[serde(rename = "pod", default)]
    pods: Vec<Pod>,
}

#[derive(Debug, Deserialize)]
struct Pod {
    #[serde(rename = "@primary", default)]
    primary: Option<String>,
    #[serde(rename = "subpod", default)]
    subpods: Vec<Subpod>,
}

#[derive(Debug, Deserialize)]
struct Subpod {
    #[serde(default)]
    plaintext: Option<String>,
}

/// Extract the primary answer from a query result document
pub fn parse_primary_answer(xml: &str) -> Result<Option<String>> {
    let result: QueryResult = quick_xml::de::from_str(xml).map_err(|e| AppError::Retrieval {
        service: "structured".to_string(),
        message: format!("Failed to parse XML: {}", e),
    })?;

    if result.error.as_deref() == Some("true") {
        return Err(AppError::Retrieval {
            service: "structured".to_string(),
            message: "Engine reported an error".to_string(),
        });
    }
    if result.success.as_deref() == Some("false") {
        return Ok(None);
    }

    let answer = result
        .pods
        .iter()
        .find(|pod| pod.primary.as_deref() == Some("true"))
        .and_then(|pod| pod.subpods.first())
        .and_then(|subpod| subpod.plaintext.as_deref())
        .and_then(|text| text.lines().next())
        .map(|line| line.replace('|', "and"))
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty());

    Ok(answer)
}

/// HTTP client for the structured answer engine
pub struct StructuredEngineClient {
    http: reqwest::Client,
    endpoint: String,
    app_id: String,
}

impl StructuredEngineClient {
    pub fn new(config: &StructuredConfig) -> Result<Self> {
        let app_id = config.app_id.clone().ok_or_else(|| AppError::Configuration {
            message: "structured.app_id is required for the structured engine".to_string(),
        })?;

        let http = reqwest::Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            app_id,
        })
    }
}

#[async_trait]
impl StructuredAnswerEngine for StructuredEngineClient {
    async fn ask(&self, question: &str) -> Result<Option<String>> {
        let response = self
            .http
            .get(&self.endpoint)
            .query(&[
                ("input", question),
                ("appid", self.app_id.as_str()),
                ("format", "plaintext"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Retrieval {
                service: "structured".to_string(),
                message: format!("Request failed: {}", e),
            })?;

        if !response.status().is_success() {
            return Err(AppError::Retrieval {
                service: "structured".to_string(),
                message: format!("API error {}", response.status()),
            });
        }

        let body = response.text().await.map_err(|e| AppError::Retrieval {
            service: "structured".to_string(),
            message: format!("Failed to read response: {}", e),
        })?;

        parse_primary_answer(&body)
    }

    fn name(&self) -> &str {
        "structured_engine"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ILIAD: &str = r#"<?xml version='1.0' encoding='UTF-8'?>
<queryresult success='true' error='false' numpods='2'>
 <pod title='Input interpretation' scanner='Identity' id='Input' position='100' numsubpods='1'>
  <subpod title=''>
   <plaintext>The Iliad | author</plaintext>
  </subpod>
 </pod>
 <pod title='Result' scanner='Data' id='Result' position='200' numsubpods='1' primary='true'>
  <subpod title=''>
   <plaintext>Homer   |  (attributed)
(8th century BC)</plaintext>
  </subpod>
  <states count='1'>
   <state name='More' input='Result__More' />
  </states>
 </pod>
 <assumptions count='0' />
</queryresult>"#;

    #[test]
    fn test_primary_pod_first_line() {
        assert_eq!(
            parse_primary_answer(ILIAD).unwrap(),
            Some("Homer and (attributed)".to_string())
        );
    }

    #[test]
    fn test_no_primary_pod_means_no_answer() {
        let xml = "<queryresult success='true' error='false'>\
            <pod title='Input' id='Input'><subpod title=''><plaintext>x</plaintext></subpod></pod>\
            </queryresult>";
        assert_eq!(parse_primary_answer(xml).unwrap(), None);
    }

    #[test]
    fn test_unsuccessful_query_means_no_answer() {
        let xml = "<queryresult success='false' error='false' numpods='0'></queryresult>";
        assert_eq!(parse_primary_answer(xml).unwrap(), None);
    }

    #[test]
    fn test_engine_error_is_a_retrieval_error() {
        let xml = "<queryresult success='false' error='true'><error><code>1</code></error></queryresult>";
        assert!(matches!(
            parse_primary_answer(xml),
            Err(AppError::Retrieval { .. })
        ));
    }

    #[test]
    fn test_missing_app_id() {
        assert!(matches!(
            StructuredEngineClient::new(&StructuredConfig::default()),
            Err(AppError::Configuration { .. })
        ));
    }
}
