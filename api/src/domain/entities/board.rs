//! Board descriptor entity
//!
//! A board is a named subscription source. Its descriptor carries the
//! parameter schema that requests are validated against and the help
//! payload returned alongside validation errors.

use indexmap::IndexMap;
use serde::Serialize;

use super::{QueryParams, ValidatedParams};
use crate::error::ErrorDetail;

/// Only method boards are served over
pub const BOARD_METHOD: &str = "GET";

/// Schema entry for one query parameter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParamSpec {
    pub required: bool,
    pub example: Option<String>,
    pub default: Option<String>,
    pub available: Option<Vec<String>>,
    pub description: Option<String>,
}

impl ParamSpec {
    pub fn required() -> Self {
        Self {
            required: true,
            ..Self::default()
        }
    }

    pub fn optional() -> Self {
        Self::default()
    }

    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = Some(example.into());
        self
    }

    pub fn with_available(mut self, values: &[&str]) -> Self {
        self.available = Some(values.iter().map(|v| v.to_string()).collect());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Static description of a board, built once at startup
#[derive(Debug, Clone)]
pub struct BoardDescriptor {
    pub id: String,
    pub description: String,
    pub params: IndexMap<String, ParamSpec>,
}

/// Help payload returned to callers alongside board errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoardHelp {
    pub name: String,
    pub description: String,
    pub method: &'static str,
    pub endpoint: String,
    pub query_params: IndexMap<String, ParamSpec>,
    pub example: String,
}

impl BoardDescriptor {
    pub fn new(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            params: IndexMap::new(),
        }
    }

    /// Declare a parameter. Declaration order is validation and help order.
    pub fn param(mut self, name: impl Into<String>, spec: ParamSpec) -> Self {
        self.params.insert(name.into(), spec);
        self
    }

    pub fn endpoint(&self) -> String {
        format!("/board/{}", self.id)
    }

    /// Example request URL built from the required parameters.
    ///
    /// Each value is the parameter's example, else its default, else `<name>`.
    pub fn example_url(&self) -> String {
        let query = self
            .params
            .iter()
            .filter(|(_, spec)| spec.required)
            .map(|(name, spec)| {
                let value = spec
                    .example
                    .clone()
                    .or_else(|| spec.default.clone())
                    .unwrap_or_else(|| format!("<{}>", name));
                format!("{}={}", name, value)
            })
            .collect::<Vec<_>>()
            .join("&");

        format!("{}?{}", self.endpoint(), query)
    }

    pub fn help(&self) -> BoardHelp {
        BoardHelp {
            name: self.id.clone(),
            description: self.description.clone(),
            method: BOARD_METHOD,
            endpoint: self.endpoint(),
            query_params: self.params.clone(),
            example: self.example_url(),
        }
    }

    /// Check a request's query against the schema.
    ///
    /// Every declared parameter is checked; all problems are reported together.
    /// Undeclared parameters are dropped.
    pub fn validate(&self, query: &QueryParams) -> Result<ValidatedParams, Vec<ErrorDetail>> {
        let mut validated = ValidatedParams::default();
        let mut errors = Vec::new();

        for (name, spec) in &self.params {
            let Some(value) = query.get(name) else {
                if spec.required {
                    errors.push(ErrorDetail::missing(name));
                } else if let Some(default) = &spec.default {
                    validated.insert(name.as_str(), default.as_str());
                }
                continue;
            };

            if let Some(available) = &spec.available {
                if !available.iter().any(|a| a == value) {
                    errors.push(ErrorDetail::invalid(name, value, available));
                    continue;
                }
            }

            validated.insert(name.as_str(), value);
        }

        if errors.is_empty() {
            Ok(validated)
        } else {
            Err(errors)
        }
    }
}
