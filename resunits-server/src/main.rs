//! Resunits Server
//!
//! Line-based JSON-RPC 2.0 over stdio: one request per line on stdin, one
//! response per line on stdout. Logs go to stderr.
//!
//! Methods:
//! - ping
//! - systems/list: Names and sizes of the loaded unit systems
//! - systems/equal: Structural comparison of two systems
//! - dimensions/list: Registered dimension names of a system
//! - dimension/get: Exact-name lookup
//! - dimension/parse: Evaluate an expression without caching it
//! - dimension/resolve: Get-or-create an expression, caching the composite
//! - dimension/add: Register or replace an atomic dimension
//!
//! Environment:
//! - RESUNITS_LOG: max log level (default "info")
//! - RESUNITS_TABLES: JSON file mapping system names to conversion tables

use resunits::{ConversionTable, Dimension, UnitError, UnitSystem};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};
use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, error, info, warn, Level};

const SERVER_NAME: &str = "resunits";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const UNIT_ERROR: i32 = -32001;
const UNKNOWN_SYSTEM: i32 = -32002;

/// Max log level from the environment
fn log_level() -> Level {
    env::var("RESUNITS_LOG")
        .ok()
        .and_then(|s| Level::from_str(s.trim()).ok())
        .unwrap_or(Level::INFO)
}

/// Path of the extra conversion tables, if configured
fn tables_path() -> Option<PathBuf> {
    env::var_os("RESUNITS_TABLES").map(PathBuf::from)
}

#[derive(Debug, Error)]
enum ConfigError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid conversion tables in '{path}': {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parse a JSON object of `name -> ConversionTable` into unit systems
fn parse_tables(content: &str) -> Result<Vec<UnitSystem>, serde_json::Error> {
    let tables: BTreeMap<String, ConversionTable> = serde_json::from_str(content)?;
    Ok(tables
        .into_iter()
        .map(|(name, table)| UnitSystem::from_table(name, &table))
        .collect())
}

fn load_tables(path: &Path) -> Result<Vec<UnitSystem>, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_tables(&content).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })
}

// JSON-RPC protocol types
#[derive(Debug, Deserialize)]
struct RpcRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<JsonValue>,
    method: String,
    #[serde(default)]
    params: Option<JsonValue>,
}

#[derive(Debug, Serialize)]
struct RpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<RpcError>,
}

#[derive(Debug, Serialize)]
struct RpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<JsonValue>,
}

impl RpcError {
    fn invalid_params(message: impl Into<String>) -> Self {
        RpcError {
            code: INVALID_PARAMS,
            message: message.into(),
            data: None,
        }
    }

    fn unknown_system(name: &str) -> Self {
        RpcError {
            code: UNKNOWN_SYSTEM,
            message: format!("Unit system '{}' not loaded", name),
            data: Some(json!({
                "code": "UNKNOWN_SYSTEM",
                "suggestion": "Use systems/list for the available systems"
            })),
        }
    }
}

impl From<UnitError> for RpcError {
    fn from(err: UnitError) -> Self {
        RpcError {
            code: UNIT_ERROR,
            message: err.to_string(),
            data: Some(json!({
                "code": err.code(),
                "suggestion": err.suggestion()
            })),
        }
    }
}

fn dimension_json(dim: &Dimension) -> JsonValue {
    json!({
        "name": dim.name(),
        "si_scaling": (!dim.is_context_dependent()).then_some(dim.si_scaling()),
        "context_dependent": dim.is_context_dependent()
    })
}

fn param_str<'a>(params: &'a Option<JsonValue>, key: &str) -> Result<&'a str, RpcError> {
    params
        .as_ref()
        .and_then(|p| p.get(key))
        .and_then(|v| v.as_str())
        .ok_or_else(|| RpcError::invalid_params(format!("Missing string parameter '{}'", key)))
}

/// Numeric parameter; an explicit null means "context dependent" (NaN)
fn param_factor(params: &Option<JsonValue>, key: &str) -> Result<f64, RpcError> {
    match params.as_ref().and_then(|p| p.get(key)) {
        Some(JsonValue::Null) => Ok(f64::NAN),
        Some(v) => v
            .as_f64()
            .ok_or_else(|| RpcError::invalid_params(format!("Parameter '{}' must be a number or null", key))),
        None => Err(RpcError::invalid_params(format!("Missing numeric parameter '{}'", key))),
    }
}

/// The loaded unit systems, keyed by name
struct Server {
    systems: HashMap<String, UnitSystem>,
}

impl Server {
    fn new() -> Self {
        let mut server = Server {
            systems: HashMap::new(),
        };
        server.insert(UnitSystem::new_metric());
        server.insert(UnitSystem::new_field());
        server
    }

    fn insert(&mut self, system: UnitSystem) {
        if self.systems.contains_key(system.name()) {
            warn!(system = %system.name(), "replacing unit system");
        }
        self.systems.insert(system.name().to_string(), system);
    }

    fn system(&self, name: &str) -> Result<&UnitSystem, RpcError> {
        self.systems.get(name).ok_or_else(|| RpcError::unknown_system(name))
    }

    fn system_mut(&mut self, name: &str) -> Result<&mut UnitSystem, RpcError> {
        self.systems.get_mut(name).ok_or_else(|| RpcError::unknown_system(name))
    }

    fn handle_request(&mut self, request: &RpcRequest) -> RpcResponse {
        let params = &request.params;
        let result = match request.method.as_str() {
            "ping" => Ok(json!({})),
            "systems/list" => Ok(self.handle_systems_list()),
            "systems/equal" => self.handle_systems_equal(params),
            "dimensions/list" => self.handle_dimensions_list(params),
            "dimension/get" => self.handle_dimension_get(params),
            "dimension/parse" => self.handle_dimension_parse(params),
            "dimension/resolve" => self.handle_dimension_resolve(params),
            "dimension/add" => self.handle_dimension_add(params),
            _ => Err(RpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {}", request.method),
                data: None,
            }),
        };

        match result {
            Ok(r) => RpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id.clone(),
                result: Some(r),
                error: None,
            },
            Err(e) => RpcResponse {
                jsonrpc: "2.0".to_string(),
                id: request.id.clone(),
                result: None,
                error: Some(e),
            },
        }
    }

    fn handle_systems_list(&self) -> JsonValue {
        let mut systems: Vec<(&str, usize)> = self
            .systems
            .values()
            .map(|s| (s.name(), s.len()))
            .collect();
        systems.sort_unstable();

        json!({
            "systems": systems
                .into_iter()
                .map(|(name, count)| json!({ "name": name, "dimensions": count }))
                .collect::<Vec<_>>()
        })
    }

    fn handle_systems_equal(&self, params: &Option<JsonValue>) -> Result<JsonValue, RpcError> {
        let left = self.system(param_str(params, "left")?)?;
        let right = self.system(param_str(params, "right")?)?;
        Ok(json!({ "equal": left.equal(right) }))
    }

    fn handle_dimensions_list(&self, params: &Option<JsonValue>) -> Result<JsonValue, RpcError> {
        let system = self.system(param_str(params, "system")?)?;
        Ok(json!({ "system": system.name(), "dimensions": system.dimension_names() }))
    }

    fn handle_dimension_get(&self, params: &Option<JsonValue>) -> Result<JsonValue, RpcError> {
        let system = self.system(param_str(params, "system")?)?;
        let dim = system.get_dimension(param_str(params, "name")?)?;
        Ok(dimension_json(&dim))
    }

    fn handle_dimension_parse(&self, params: &Option<JsonValue>) -> Result<JsonValue, RpcError> {
        let system = self.system(param_str(params, "system")?)?;
        let dim = system.parse(param_str(params, "expression")?)?;
        Ok(dimension_json(&dim))
    }

    fn handle_dimension_resolve(&mut self, params: &Option<JsonValue>) -> Result<JsonValue, RpcError> {
        let expression = param_str(params, "expression")?;
        let system = self.system_mut(param_str(params, "system")?)?;
        let dim = system.get_new_dimension(expression)?;
        Ok(dimension_json(&dim))
    }

    fn handle_dimension_add(&mut self, params: &Option<JsonValue>) -> Result<JsonValue, RpcError> {
        let name = param_str(params, "name")?;
        let si_scaling = param_factor(params, "si_scaling")?;
        let system = self.system_mut(param_str(params, "system")?)?;
        system.add_dimension_with(name, si_scaling)?;
        let dim = system.get_dimension(name)?;
        Ok(dimension_json(&dim))
    }
}

fn write_response(response: &RpcResponse) -> io::Result<()> {
    let response_json = serde_json::to_string(response)?;
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{}", response_json)?;
    stdout.flush()
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(log_level())
        .init();

    info!(version = SERVER_VERSION, "{} server started", SERVER_NAME);

    let mut server = Server::new();
    if let Some(path) = tables_path() {
        match load_tables(&path) {
            Ok(systems) => {
                for system in systems {
                    info!(system = %system.name(), path = %path.display(), "loaded conversion table");
                    server.insert(system);
                }
            }
            Err(e) => {
                error!("{}", e);
                return ExitCode::FAILURE;
            }
        }
    }

    let stdin = io::stdin();
    let mut reader = io::BufReader::new(stdin.lock());

    info!(systems = server.systems.len(), "ready, waiting for requests");

    loop {
        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                info!("client disconnected (EOF)");
                break;
            }
            Ok(_) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let request: RpcRequest = match serde_json::from_str(line) {
                    Ok(r) => r,
                    Err(e) => {
                        warn!("error parsing request: {}", e);
                        let response = RpcResponse {
                            jsonrpc: "2.0".to_string(),
                            id: None,
                            result: None,
                            error: Some(RpcError {
                                code: PARSE_ERROR,
                                message: format!("Parse error: {}", e),
                                data: None,
                            }),
                        };
                        if let Err(e) = write_response(&response) {
                            error!("error writing response: {}", e);
                            break;
                        }
                        continue;
                    }
                };

                debug!(method = %request.method, "processing");
                let response = server.handle_request(&request);

                // Notifications (no id) get no response
                if request.id.is_none() {
                    continue;
                }

                if let Err(e) = write_response(&response) {
                    error!("error writing response: {}", e);
                    break;
                }
            }
            Err(e) => {
                error!("error reading input: {}", e);
                break;
            }
        }
    }

    info!("server shutting down");
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    fn call(server: &mut Server, method: &str, params: JsonValue) -> RpcResponse {
        let request = RpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: method.to_string(),
            params: Some(params),
        };
        server.handle_request(&request)
    }

    fn ok(response: RpcResponse) -> JsonValue {
        assert!(response.error.is_none(), "unexpected error: {:?}", response.error);
        response.result.unwrap()
    }

    fn err(response: RpcResponse) -> RpcError {
        assert!(response.result.is_none());
        response.error.unwrap()
    }

    #[test]
    fn test_systems_list() {
        let mut server = Server::new();
        let result = ok(call(&mut server, "systems/list", json!({})));
        assert_eq!(
            result,
            json!({ "systems": [
                { "name": "Field", "dimensions": 15 },
                { "name": "Metric", "dimensions": 15 }
            ]})
        );
    }

    #[test]
    fn test_dimension_get() {
        let mut server = Server::new();
        let result = ok(call(&mut server, "dimension/get", json!({ "system": "Field", "name": "Length" })));
        assert_eq!(result["name"], "Length");
        assert_eq!(result["si_scaling"], 0.3048);
        assert_eq!(result["context_dependent"], false);

        let result = ok(call(&mut server, "dimension/get", json!({ "system": "Metric", "name": "ContextDependent" })));
        assert!(result["si_scaling"].is_null());
        assert_eq!(result["context_dependent"], true);
    }

    #[test]
    fn test_unknown_dimension_error() {
        let mut server = Server::new();
        let error = err(call(&mut server, "dimension/get", json!({ "system": "Metric", "name": "Volume" })));
        assert_eq!(error.code, UNIT_ERROR);
        assert_eq!(error.data.unwrap()["code"], "UNKNOWN_DIMENSION");
    }

    #[test]
    fn test_parse_does_not_cache() {
        let mut server = Server::new();
        let result = ok(call(&mut server, "dimension/parse", json!({ "system": "Metric", "expression": "Mass/Length*Time" })));
        assert_eq!(result["name"], "Mass/Length*Time");
        assert!(!server.systems["Metric"].has_dimension("Mass/Length*Time"));
    }

    #[test]
    fn test_resolve_caches() {
        let mut server = Server::new();
        ok(call(&mut server, "dimension/resolve", json!({ "system": "Metric", "expression": "Length/Time" })));
        ok(call(&mut server, "dimension/resolve", json!({ "system": "Metric", "expression": "Length/Time" })));
        assert_eq!(server.systems["Metric"].len(), 16);
        assert_eq!(server.systems["Field"].len(), 15);
    }

    #[test]
    fn test_malformed_expression_error() {
        let mut server = Server::new();
        let error = err(call(&mut server, "dimension/resolve", json!({ "system": "Metric", "expression": "Mass/Length/Time" })));
        assert_eq!(error.data.unwrap()["code"], "MALFORMED_EXPRESSION");
        assert_eq!(server.systems["Metric"].len(), 15);
    }

    #[test]
    fn test_add_and_equal() {
        let mut server = Server::new();
        let result = ok(call(&mut server, "systems/equal", json!({ "left": "Metric", "right": "Field" })));
        assert_eq!(result["equal"], false);

        let result = ok(call(&mut server, "dimension/add", json!({ "system": "Metric", "name": "Length", "si_scaling": 0.3048 })));
        assert_eq!(result["si_scaling"], 0.3048);

        let result = ok(call(&mut server, "dimension/add", json!({ "system": "Metric", "name": "Sentinel", "si_scaling": null })));
        assert_eq!(result["context_dependent"], true);

        let error = err(call(&mut server, "dimension/add", json!({ "system": "Metric", "name": "Bad Name", "si_scaling": 1.0 })));
        assert_eq!(error.data.unwrap()["code"], "INVALID_NAME");
    }

    #[test]
    fn test_invalid_params_and_unknowns() {
        let mut server = Server::new();
        assert_eq!(err(call(&mut server, "dimension/get", json!({ "system": "Metric" }))).code, INVALID_PARAMS);
        assert_eq!(err(call(&mut server, "dimension/get", json!({ "system": "Lab", "name": "Length" }))).code, UNKNOWN_SYSTEM);
        assert_eq!(err(call(&mut server, "dimension/add", json!({ "system": "Metric", "name": "X", "si_scaling": "big" }))).code, INVALID_PARAMS);
        assert_eq!(err(call(&mut server, "convert", json!({}))).code, METHOD_NOT_FOUND);
    }

    #[test]
    fn test_dimensions_list() {
        let mut server = Server::new();
        let result = ok(call(&mut server, "dimensions/list", json!({ "system": "Field" })));
        let names = result["dimensions"].as_array().unwrap();
        assert_eq!(names.len(), 15);
        assert_eq!(names[0], "1");
    }

    #[test]
    fn test_parse_tables() {
        let systems = parse_tables(&format!(
            r#"{{ "Copy": {} }}"#,
            serde_json::to_string(&resunits::METRIC).unwrap()
        ))
        .unwrap();
        assert_eq!(systems.len(), 1);
        assert_eq!(systems[0].name(), "Copy");
        assert_eq!(systems[0], UnitSystem::new_metric());

        assert!(parse_tables(r#"{ "Broken": { "Length": 1.0 } }"#).is_err());
    }

    #[test]
    fn test_load_tables_missing_file() {
        let err = load_tables(Path::new("/nonexistent/resunits-tables.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
