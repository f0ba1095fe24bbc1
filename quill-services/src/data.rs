//! Data service: CSV loading and parsing
//!
//! Rows come back as a list of objects keyed by the header row. Fields that
//! parse as numbers become `Number`, empty fields become `Null`, everything
//! else stays `Text`.

use quill_registry::prelude::*;
use std::collections::HashMap;

pub struct DataService;

static LOAD_PARAMS: [ParamMeta; 1] =
    [ParamMeta::required("path", "Text", "Path to a CSV file with a header row")];
static PARSE_PARAMS: [ParamMeta; 1] =
    [ParamMeta::required("text", "Text", "CSV content with a header row")];

static DATA_METHODS: [MethodMeta; 2] = [
    MethodMeta::new(
        "load_csv",
        "Reads a CSV file and returns its rows as objects keyed by header",
        "rows = data.load_csv('report.csv')",
        "Data",
        &LOAD_PARAMS,
        "List",
    )
    .with_permission(Permission::FileAccess),
    MethodMeta::new(
        "parse_csv",
        "Parses CSV text and returns its rows as objects keyed by header",
        "rows = data.parse_csv(host.active_doc)",
        "Data",
        &PARSE_PARAMS,
        "List",
    ),
];

impl ScriptService for DataService {
    fn meta(&self) -> ServiceMeta {
        ServiceMeta {
            name: "data",
            version: "1.0.0",
            description: "Tabular data helpers: CSV loading and parsing",
            core: false,
            methods: &DATA_METHODS,
            properties: &[],
        }
    }

    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ServiceError> {
        match method {
            "load_csv" => {
                let path = text_arg("load_csv", "path", args)?;
                let content = std::fs::read_to_string(path).map_err(|err| {
                    ServiceError::failed(format!("load_csv: cannot read '{}': {}", path, err))
                })?;
                parse_csv(&content)
            }
            "parse_csv" => {
                let text = text_arg("parse_csv", "text", args)?;
                parse_csv(text)
            }
            other => Err(ServiceError::unknown_method("data", other)),
        }
    }
}

fn text_arg<'a>(method: &str, param: &str, args: &'a [Value]) -> Result<&'a str, ServiceError> {
    if args.len() != 1 {
        return Err(ServiceError::arg_count(method, 1, args.len()));
    }
    args[0]
        .as_text()
        .ok_or_else(|| ServiceError::arg_type(method, param, "Text", args[0].type_name()))
}

fn parse_csv(content: &str) -> Result<Value, ServiceError> {
    let mut lines = content.lines().filter(|line| !line.trim().is_empty());
    let Some(header_line) = lines.next() else {
        return Err(ServiceError::failed("parse_csv: missing header row"));
    };
    let headers = split_fields(header_line)?;
    if headers.iter().any(|h| h.trim().is_empty()) {
        return Err(ServiceError::failed("parse_csv: empty column name in header"));
    }

    let mut rows = Vec::new();
    for (index, line) in lines.enumerate() {
        let fields = split_fields(line)?;
        if fields.len() != headers.len() {
            return Err(ServiceError::failed(format!(
                "parse_csv: row {} has {} fields, header has {}",
                index + 1,
                fields.len(),
                headers.len()
            )));
        }
        let mut row = HashMap::with_capacity(headers.len());
        for (header, field) in headers.iter().zip(fields) {
            row.insert(header.clone(), field_value(field));
        }
        rows.push(Value::Object(row));
    }
    Ok(Value::List(rows))
}

/// One CSV record. Double quotes wrap fields containing commas; a doubled
/// quote inside a quoted field is a literal quote.
fn split_fields(line: &str) -> Result<Vec<String>, ServiceError> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut quoted = false;

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    current.push('"');
                }
                '"' => quoted = false,
                other => current.push(other),
            }
        } else {
            match c {
                '"' if current.is_empty() => quoted = true,
                ',' => fields.push(std::mem::take(&mut current)),
                other => current.push(other),
            }
        }
    }
    if quoted {
        return Err(ServiceError::failed("parse_csv: unterminated quoted field"));
    }
    fields.push(current);
    Ok(fields)
}

fn field_value(field: String) -> Value {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return Value::Null;
    }
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(field),
    }
}
