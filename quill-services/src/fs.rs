//! File system service
//!
//! File and directory operations for scripts. Mutating methods declare the
//! `FileAccess` permission; pure queries stay at `Standard`. Directory
//! listings come back sorted so script output is stable.

use quill_registry::prelude::*;
use std::collections::HashMap;
use std::path::Path;
use std::time::SystemTime;

pub struct FsService;

static READ_PARAMS: [ParamMeta; 1] =
    [ParamMeta::required("path", "Text", "Path of the file to read")];
static WRITE_PARAMS: [ParamMeta; 2] = [
    ParamMeta::required("path", "Text", "Path of the file to write"),
    ParamMeta::required("content", "Text", "Text content to write"),
];
static FILE_PARAMS: [ParamMeta; 1] = [ParamMeta::required("path", "Text", "File path")];
static DIR_PARAMS: [ParamMeta; 1] = [ParamMeta::required("path", "Text", "Directory path")];
static LIST_FILES_PARAMS: [ParamMeta; 2] = [
    ParamMeta::required("path", "Text", "Directory path"),
    ParamMeta::optional("pattern", "Text", "File name pattern, * and ? wildcards", "*"),
];
static COPY_PARAMS: [ParamMeta; 3] = [
    ParamMeta::required("source", "Text", "Source file path"),
    ParamMeta::required("dest", "Text", "Destination file path"),
    ParamMeta::optional("overwrite", "Bool", "Replace an existing destination", "false"),
];

static FS_METHODS: [MethodMeta; 10] = [
    MethodMeta::new(
        "read_text",
        "Reads the full content of a text file",
        "content = fs.read_text('readme.txt')",
        "File Operations",
        &READ_PARAMS,
        "Text",
    )
    .with_permission(Permission::FileAccess),
    MethodMeta::new(
        "write_text",
        "Writes text content to a file, creating parent directories",
        "fs.write_text('output.txt', 'Hello World!')",
        "File Operations",
        &WRITE_PARAMS,
        "Null",
    )
    .with_permission(Permission::FileAccess),
    MethodMeta::new(
        "file_exists",
        "Checks whether a file exists at the given path",
        "found = fs.file_exists('data.txt')",
        "File Operations",
        &FILE_PARAMS,
        "Bool",
    ),
    MethodMeta::new(
        "dir_exists",
        "Checks whether a directory exists at the given path",
        "found = fs.dir_exists('reports')",
        "Directory Operations",
        &DIR_PARAMS,
        "Bool",
    ),
    MethodMeta::new(
        "create_dir",
        "Creates a directory if it does not exist",
        "fs.create_dir('reports/archive')",
        "Directory Operations",
        &DIR_PARAMS,
        "Null",
    )
    .with_permission(Permission::FileAccess),
    MethodMeta::new(
        "list_files",
        "Lists files in a directory, optionally filtered by a name pattern",
        "files = fs.list_files('reports', '*.csv')",
        "Directory Operations",
        &LIST_FILES_PARAMS,
        "List",
    ),
    MethodMeta::new(
        "list_dirs",
        "Lists subdirectories of a directory",
        "dirs = fs.list_dirs('reports')",
        "Directory Operations",
        &DIR_PARAMS,
        "List",
    ),
    MethodMeta::new(
        "delete_file",
        "Deletes a file if it exists",
        "fs.delete_file('temp.txt')",
        "File Operations",
        &FILE_PARAMS,
        "Null",
    )
    .with_permission(Permission::FileAccess),
    MethodMeta::new(
        "copy_file",
        "Copies a file to a new location",
        "fs.copy_file('source.txt', 'backup.txt')",
        "File Operations",
        &COPY_PARAMS,
        "Null",
    )
    .with_permission(Permission::FileAccess),
    MethodMeta::new(
        "get_file_info",
        "Returns name, path, size and timestamps of a file",
        "info = fs.get_file_info('data.txt')",
        "File Operations",
        &FILE_PARAMS,
        "Object",
    ),
];

impl ScriptService for FsService {
    fn meta(&self) -> ServiceMeta {
        ServiceMeta {
            name: "fs",
            version: "1.0.0",
            description: "File system access: file and directory operations",
            core: false,
            methods: &FS_METHODS,
            properties: &[],
        }
    }

    fn call(&self, method: &str, args: &[Value]) -> Result<Value, ServiceError> {
        match method {
            "read_text" => {
                let path = one_text("read_text", "path", args)?;
                let content = std::fs::read_to_string(path)
                    .map_err(|err| io_failed("read_text", path, err))?;
                Ok(Value::Text(content))
            }
            "write_text" => {
                if args.len() != 2 {
                    return Err(ServiceError::arg_count("write_text", 2, args.len()));
                }
                let path = text_at("write_text", "path", args, 0)?;
                let content = text_at("write_text", "content", args, 1)?;
                if let Some(parent) = Path::new(path).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .map_err(|err| io_failed("write_text", path, err))?;
                    }
                }
                std::fs::write(path, content).map_err(|err| io_failed("write_text", path, err))?;
                Ok(Value::Null)
            }
            "file_exists" => {
                let path = one_text("file_exists", "path", args)?;
                Ok(Value::Bool(Path::new(path).is_file()))
            }
            "dir_exists" => {
                let path = one_text("dir_exists", "path", args)?;
                Ok(Value::Bool(Path::new(path).is_dir()))
            }
            "create_dir" => {
                let path = one_text("create_dir", "path", args)?;
                std::fs::create_dir_all(path).map_err(|err| io_failed("create_dir", path, err))?;
                Ok(Value::Null)
            }
            "list_files" => {
                if args.is_empty() || args.len() > 2 {
                    return Err(ServiceError::arg_count("list_files", 1, args.len()));
                }
                let path = text_at("list_files", "path", args, 0)?;
                let pattern = match args.get(1) {
                    Some(value) => value.as_text().ok_or_else(|| {
                        ServiceError::arg_type("list_files", "pattern", "Text", value.type_name())
                    })?,
                    None => "*",
                };
                let names = list_entries(path, "list_files", |t| t.is_file())?;
                let matched = names
                    .into_iter()
                    .filter(|name| wildcard_match(pattern, name))
                    .map(Value::Text)
                    .collect();
                Ok(Value::List(matched))
            }
            "list_dirs" => {
                let path = one_text("list_dirs", "path", args)?;
                let names = list_entries(path, "list_dirs", |t| t.is_dir())?;
                Ok(Value::List(names.into_iter().map(Value::Text).collect()))
            }
            "delete_file" => {
                let path = one_text("delete_file", "path", args)?;
                if Path::new(path).is_file() {
                    std::fs::remove_file(path)
                        .map_err(|err| io_failed("delete_file", path, err))?;
                }
                Ok(Value::Null)
            }
            "copy_file" => {
                if args.len() < 2 || args.len() > 3 {
                    return Err(ServiceError::arg_count("copy_file", 2, args.len()));
                }
                let source = text_at("copy_file", "source", args, 0)?;
                let dest = text_at("copy_file", "dest", args, 1)?;
                let overwrite = match args.get(2) {
                    Some(value) => value.as_bool().ok_or_else(|| {
                        ServiceError::arg_type("copy_file", "overwrite", "Bool", value.type_name())
                    })?,
                    None => false,
                };
                if !Path::new(source).is_file() {
                    return Err(ServiceError::failed(format!(
                        "copy_file: source '{}' does not exist",
                        source
                    )));
                }
                if !overwrite && Path::new(dest).exists() {
                    return Err(ServiceError::failed(format!(
                        "copy_file: destination '{}' already exists",
                        dest
                    )));
                }
                if let Some(parent) = Path::new(dest).parent() {
                    if !parent.as_os_str().is_empty() {
                        std::fs::create_dir_all(parent)
                            .map_err(|err| io_failed("copy_file", dest, err))?;
                    }
                }
                std::fs::copy(source, dest).map_err(|err| io_failed("copy_file", source, err))?;
                Ok(Value::Null)
            }
            "get_file_info" => {
                let path = one_text("get_file_info", "path", args)?;
                let metadata = std::fs::metadata(path)
                    .map_err(|err| io_failed("get_file_info", path, err))?;
                if !metadata.is_file() {
                    return Err(ServiceError::failed(format!(
                        "get_file_info: '{}' is not a file",
                        path
                    )));
                }
                let as_path = Path::new(path);
                let mut info = HashMap::new();
                info.insert(
                    "name".to_string(),
                    text_or_null(as_path.file_name().and_then(|n| n.to_str())),
                );
                info.insert("full_path".to_string(), Value::Text(path.to_string()));
                info.insert("size".to_string(), Value::Number(metadata.len() as f64));
                info.insert(
                    "extension".to_string(),
                    text_or_null(as_path.extension().and_then(|e| e.to_str())),
                );
                info.insert(
                    "is_readonly".to_string(),
                    Value::Bool(metadata.permissions().readonly()),
                );
                info.insert(
                    "modified".to_string(),
                    epoch_seconds(metadata.modified().ok()),
                );
                info.insert(
                    "created".to_string(),
                    epoch_seconds(metadata.created().ok()),
                );
                Ok(Value::Object(info))
            }
            other => Err(ServiceError::unknown_method("fs", other)),
        }
    }
}

fn one_text<'a>(method: &str, param: &str, args: &'a [Value]) -> Result<&'a str, ServiceError> {
    if args.len() != 1 {
        return Err(ServiceError::arg_count(method, 1, args.len()));
    }
    text_at(method, param, args, 0)
}

fn text_at<'a>(
    method: &str,
    param: &str,
    args: &'a [Value],
    index: usize,
) -> Result<&'a str, ServiceError> {
    args[index]
        .as_text()
        .ok_or_else(|| ServiceError::arg_type(method, param, "Text", args[index].type_name()))
}

fn io_failed(method: &str, path: &str, err: std::io::Error) -> ServiceError {
    ServiceError::failed(format!("{}: '{}': {}", method, path, err))
}

/// Entry names under `path` matching the type filter, sorted
fn list_entries(
    path: &str,
    method: &str,
    keep: impl Fn(&std::fs::FileType) -> bool,
) -> Result<Vec<String>, ServiceError> {
    let entries = std::fs::read_dir(path).map_err(|err| io_failed(method, path, err))?;
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|err| io_failed(method, path, err))?;
        let file_type = entry.file_type().map_err(|err| io_failed(method, path, err))?;
        if keep(&file_type) {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

fn text_or_null(value: Option<&str>) -> Value {
    match value {
        Some(text) => Value::Text(text.to_string()),
        None => Value::Null,
    }
}

fn epoch_seconds(time: Option<SystemTime>) -> Value {
    match time.and_then(|t| t.duration_since(SystemTime::UNIX_EPOCH).ok()) {
        Some(duration) => Value::Number(duration.as_secs_f64()),
        None => Value::Null,
    }
}

/// File name match with `*` (any run) and `?` (any single char)
fn wildcard_match(pattern: &str, name: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let name: Vec<char> = name.chars().collect();

    fn matches(pattern: &[char], name: &[char]) -> bool {
        match pattern.first() {
            None => name.is_empty(),
            Some('*') => {
                (0..=name.len()).any(|skip| matches(&pattern[1..], &name[skip..]))
            }
            Some('?') => !name.is_empty() && matches(&pattern[1..], &name[1..]),
            Some(c) => name.first() == Some(c) && matches(&pattern[1..], &name[1..]),
        }
    }

    matches(&pattern, &name)
}
