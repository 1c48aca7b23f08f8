use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A named set of scenarios, runnable as one session. The builtin
/// e-commerce suite and YAML suite files both deserialize into this.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuiteSpec {
    pub name: String,
    pub scenarios: Vec<ScenarioSpec>,
}

/// An ordered chain of probe steps sharing one Scenario State. Scenarios
/// are independent of each other; chaining only happens inside one.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSpec {
    pub name: String,
    pub steps: Vec<StepSpec>,
}

/// One probe: a request, its checks, and bindings it saves for later steps.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepSpec {
    pub name: String,

    pub request: RequestSpec,

    /// Bindings that must exist in Scenario State before this step may run.
    /// A missing binding records a deterministic prerequisite failure
    /// without issuing the request.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<String>,

    /// Checks are written as single-key maps in YAML (`- equals: {...}`),
    /// which needs the singleton-map representation for enum variants.
    #[serde(
        default,
        skip_serializing_if = "Vec::is_empty",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub checks: Vec<CheckSpec>,

    /// Binding name -> dot path into the response body ("$" for the whole
    /// body). Written into Scenario State when the step passes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub save: BTreeMap<String, String>,
}

impl StepSpec {
    /// Short display form, e.g. `GET /products`
    pub fn display(&self) -> String {
        format!(
            "{} /{}",
            self.request.method,
            self.request.path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestSpec {
    pub method: HttpMethod,

    /// Path under the `/api` prefix; may contain `${binding}` placeholders
    pub path: String,

    /// JSON body for POST; string values may contain `${binding}`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// Structural and value assertions applied to a 200 JSON body. On list
/// bodies, `nonEmptyList` and `listIncludes` look at the whole list;
/// every other check inspects the first element.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum CheckSpec {
    /// Every named field must be present in the top-level object
    RequiredFields(Vec<String>),

    /// A storage-internal field that must not leak into the response
    ForbidField(String),

    /// Exact-match assertion. The expected value may be a `${binding}`
    /// placeholder, resolved against Scenario State before comparison.
    Equals { field: String, value: Value },

    /// Substring match on a string field
    Contains { field: String, needle: String },

    /// Body must be a list with at least one element
    NonEmptyList,

    /// At least one list element must carry the value in the named field
    ListIncludes { field: String, value: Value },
}
