use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, Url};
use serde_json::Value;
use toolgate_core::config::{ModuleConfig, ToolConfig};
use toolgate_core::{Module, ModuleError, Params, ToolDef};

use crate::compact;

const BODY_PREVIEW_LIMIT: usize = 512;

/// A module whose tools are HTTP endpoints declared in configuration.
///
/// `{name}` segments in a tool's path are filled from the parameter of the
/// same name, which is then not sent again. Remaining parameters go into
/// the query string for `GET`/`DELETE` and into a JSON body otherwise.
pub struct HttpModule {
    name: String,
    description: String,
    base_url: Url,
    token: Option<String>,
    tools: Vec<ToolConfig>,
    http: reqwest::Client,
}

impl HttpModule {
    pub fn from_config(cfg: &ModuleConfig) -> anyhow::Result<Self> {
        let base_url = Url::parse(cfg.base_url.trim())
            .map_err(|e| anyhow::anyhow!("module '{}': invalid base_url: {e}", cfg.name))?;
        if base_url.cannot_be_a_base() {
            anyhow::bail!("module '{}': base_url '{}' cannot carry a path", cfg.name, base_url);
        }

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()?;

        let token = match cfg.token_env.as_deref() {
            Some(var) => match std::env::var(var) {
                Ok(v) if !v.trim().is_empty() => Some(v),
                _ => {
                    tracing::warn!(module = %cfg.name, env = var, "token env var not set");
                    None
                }
            },
            None => None,
        };

        for tool in &cfg.tools {
            tool.method
                .to_ascii_uppercase()
                .parse::<Method>()
                .map_err(|_| {
                    anyhow::anyhow!(
                        "module '{}' tool '{}': invalid method '{}'",
                        cfg.name,
                        tool.name,
                        tool.method
                    )
                })?;
        }

        Ok(Self {
            name: cfg.name.clone(),
            description: cfg.description.clone(),
            base_url,
            token,
            tools: cfg.tools.clone(),
            http,
        })
    }

    fn auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }
}

#[async_trait]
impl Module for HttpModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn tools(&self) -> Vec<ToolDef> {
        self.tools
            .iter()
            .map(|t| ToolDef {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t.input_schema.clone(),
            })
            .collect()
    }

    async fn execute_tool(&self, tool: &str, params: &Params) -> Result<String, ModuleError> {
        let tool_cfg = self
            .tools
            .iter()
            .find(|t| t.name == tool)
            .ok_or_else(|| ModuleError::UnknownTool(tool.to_string()))?;
        let method = tool_cfg
            .method
            .to_ascii_uppercase()
            .parse::<Method>()
            .map_err(|_| ModuleError::Other(format!("invalid method '{}'", tool_cfg.method)))?;

        let (segments, rest) = fill_path(&tool_cfg.path, params)?;
        let url = endpoint_url(&self.base_url, &segments)?;

        tracing::debug!(
            module = %self.name,
            tool,
            url = %url,
            method = %method,
            "http tool request"
        );

        let mut req = self.http.request(method.clone(), url);
        if method == Method::GET || method == Method::DELETE {
            let query: Vec<(String, String)> = rest
                .iter()
                .map(|(k, v)| (k.clone(), query_value(v)))
                .collect();
            req = req.query(&query);
        } else {
            req = req.json(&rest);
        }

        let resp = self
            .auth(req)
            .send()
            .await
            .map_err(|e| ModuleError::Request(e.to_string()))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| ModuleError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ModuleError::Status {
                status: status.as_u16(),
                body: preview_body(&body),
            });
        }

        Ok(normalize_body(body))
    }

    fn to_compact(&self, _tool: &str, json: &str) -> Option<String> {
        compact::to_compact(json)
    }
}

/// Split a path template into segments with `{param}` placeholders filled
/// in, returning the segments and the params that were not consumed.
fn fill_path(template: &str, params: &Params) -> Result<(Vec<String>, Params), ModuleError> {
    let mut rest = params.clone();
    let mut segments = Vec::new();

    for raw in template.split('/').filter(|s| !s.is_empty()) {
        let mut segment = String::with_capacity(raw.len());
        let mut remaining = raw;
        while let Some(open) = remaining.find('{') {
            let Some(len) = remaining[open..].find('}') else {
                break;
            };
            segment.push_str(&remaining[..open]);
            let key = &remaining[open + 1..open + len];
            let value = rest.remove(key).ok_or_else(|| {
                ModuleError::InvalidParams(format!("missing path parameter '{key}'"))
            })?;
            let value = query_value(&value);
            if value.is_empty() || value == "." || value == ".." {
                return Err(ModuleError::InvalidParams(format!(
                    "path parameter '{key}' must not be empty, '.' or '..'"
                )));
            }
            segment.push_str(&value);
            remaining = &remaining[open + len + 1..];
        }
        segment.push_str(remaining);
        segments.push(segment);
    }

    Ok((segments, rest))
}

/// Append segments to the base URL. Each segment is percent-encoded, so `/`,
/// `?` and `#` inside a parameter value stay within that segment.
fn endpoint_url(base: &Url, segments: &[String]) -> Result<Url, ModuleError> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ModuleError::Other(format!("base url '{base}' cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Bodies that are not JSON are returned as a JSON string so callers always
/// receive JSON text.
fn normalize_body(body: String) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "null".to_string();
    }
    if serde_json::from_str::<serde::de::IgnoredAny>(trimmed).is_ok() {
        return body;
    }
    Value::String(body).to_string()
}

fn preview_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "<empty body>".to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_PREVIEW_LIMIT).collect();
    if trimmed.chars().count() > BODY_PREVIEW_LIMIT {
        out.push_str("...");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn config(base_url: &str) -> ModuleConfig {
        toml::from_str::<ModuleConfig>(&format!(
            r#"
name = "notes"
base_url = "{base_url}/"

[[tools]]
name = "search"
path = "/search"
input_schema = {{ required = ["query"], properties = {{ query = {{ type = "string" }} }} }}

[[tools]]
name = "get"
method = "get"
path = "/pages/{{id}}"
"#
        ))
        .unwrap()
    }

    fn params(v: Value) -> Params {
        v.as_object().cloned().unwrap()
    }

    fn path_for(base: &str, template: &str, p: Value) -> String {
        let (segments, _) = fill_path(template, &params(p)).unwrap();
        endpoint_url(&Url::parse(base).unwrap(), &segments)
            .unwrap()
            .path()
            .to_string()
    }

    #[test]
    fn fills_path_parameters_and_keeps_the_rest() {
        let (segments, rest) =
            fill_path("/pages/{id}/blocks", &params(json!({ "id": "p1", "depth": 2 }))).unwrap();
        assert_eq!(segments, ["pages", "p1", "blocks"]);
        assert_eq!(Value::Object(rest), json!({ "depth": 2 }));

        let err = fill_path("/pages/{id}", &Params::new()).unwrap_err();
        assert_eq!(err.to_string(), "invalid params: missing path parameter 'id'");
    }

    #[test]
    fn path_parameter_values_are_encoded_into_one_segment() {
        assert_eq!(
            path_for("http://h/", "/pages/{id}", json!({ "id": "../admin?x=1#" })),
            "/pages/..%2Fadmin%3Fx=1%23"
        );
        assert_eq!(
            path_for("http://h/api", "/pages/{id}/blocks", json!({ "id": "a/b" })),
            "/api/pages/a%2Fb/blocks"
        );
        assert_eq!(path_for("http://h", "/pages/{id}", json!({ "id": 7 })), "/pages/7");
    }

    #[test]
    fn dot_segments_are_rejected() {
        for bad in ["..", ".", ""] {
            let err = fill_path("/pages/{id}", &params(json!({ "id": bad }))).unwrap_err();
            assert!(matches!(err, ModuleError::InvalidParams(_)), "value {bad:?}");
        }
    }

    #[test]
    fn exposes_declared_tools() {
        let module = HttpModule::from_config(&config("http://localhost")).unwrap();
        let tools = module.tools();
        assert_eq!(tools.len(), 2);
        assert!(tools[0].input_schema.is_some());
        assert!(tools[1].input_schema.is_none());
    }

    #[tokio::test]
    async fn posts_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/search")
            .match_body(Matcher::Json(json!({ "query": "design" })))
            .with_status(200)
            .with_body(r#"{"results":[{"id":"p1"}]}"#)
            .create_async()
            .await;

        let module = HttpModule::from_config(&config(&server.url())).unwrap();
        let out = module
            .execute_tool("search", &params(json!({ "query": "design" })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out, r#"{"results":[{"id":"p1"}]}"#);
        assert_eq!(module.to_compact("search", &out).unwrap(), "id\np1\n");
    }

    #[tokio::test]
    async fn get_uses_path_and_query() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/pages/p1")
            .match_query(Matcher::UrlEncoded("depth".into(), "2".into()))
            .with_status(200)
            .with_body("plain text")
            .create_async()
            .await;

        let module = HttpModule::from_config(&config(&server.url())).unwrap();
        let out = module
            .execute_tool("get", &params(json!({ "id": "p1", "depth": 2 })))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(out, r#""plain text""#);
    }

    #[tokio::test]
    async fn non_success_status_is_a_module_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/search")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let module = HttpModule::from_config(&config(&server.url())).unwrap();
        let err = module
            .execute_tool("search", &params(json!({ "query": "x" })))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "remote returned status 429: slow down");
    }
}
