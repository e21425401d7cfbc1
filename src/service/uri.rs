//! Request addressing: `isa://` resource URIs and tool calls.

use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// URI scheme prefix of every resource.
pub const SCHEME: &str = "isa://";

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resource {
    /// `isa://architectures`
    Architectures,
    /// `isa://architecture/{name}`
    Architecture(String),
    /// `isa://instructions/{arch}`
    Instructions(String),
    /// `isa://instruction/{arch}/{name}`
    Instruction { arch: String, name: String },
    /// `isa://architectures/{arch}/instruction-groups`
    InstructionGroups(String),
    /// `isa://architectures/{arch}/registers`
    Registers(String),
}

impl Resource {
    /// Parse an `isa://` URI. Path segments must be non-empty.
    pub fn parse(uri: &str) -> Result<Self, String> {
        let path = uri
            .trim()
            .strip_prefix(SCHEME)
            .ok_or_else(|| format!("'{}' is not an {} URI", uri, SCHEME))?;
        let segments: Vec<&str> = path.trim_end_matches('/').split('/').collect();
        if segments.iter().any(|s| s.is_empty()) {
            return Err(format!("'{}' has an empty path segment", uri));
        }

        let resource = match segments.as_slice() {
            ["architectures"] => Resource::Architectures,
            ["architecture", name] => Resource::Architecture(name.to_string()),
            ["instructions", arch] => Resource::Instructions(arch.to_string()),
            ["instruction", arch, name] => Resource::Instruction {
                arch: arch.to_string(),
                name: name.to_string(),
            },
            ["architectures", arch, "instruction-groups"] => {
                Resource::InstructionGroups(arch.to_string())
            }
            ["architectures", arch, "registers"] => Resource::Registers(arch.to_string()),
            _ => return Err(format!("Unknown resource '{}'", uri)),
        };
        Ok(resource)
    }

    /// Whether the resource body is JSON rather than plain text.
    pub fn is_json(&self) -> bool {
        matches!(
            self,
            Resource::Architectures | Resource::InstructionGroups(_) | Resource::Registers(_)
        )
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Architectures => write!(f, "{}architectures", SCHEME),
            Resource::Architecture(name) => write!(f, "{}architecture/{}", SCHEME, name),
            Resource::Instructions(arch) => write!(f, "{}instructions/{}", SCHEME, arch),
            Resource::Instruction { arch, name } => {
                write!(f, "{}instruction/{}/{}", SCHEME, arch, name)
            }
            Resource::InstructionGroups(arch) => {
                write!(f, "{}architectures/{}/instruction-groups", SCHEME, arch)
            }
            Resource::Registers(arch) => write!(f, "{}architectures/{}/registers", SCHEME, arch),
        }
    }
}

/// Arguments of `search_instructions`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchArgs {
    pub query: String,
    #[serde(default)]
    pub architecture: Option<String>,
}

/// Arguments of `compare_instructions`.
#[derive(Debug, Clone, Deserialize)]
pub struct CompareArgs {
    pub mnemonic: String,
    #[serde(default)]
    pub architectures: Option<Vec<String>>,
}

/// Arguments of `list_instructions_paginated`.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPageArgs {
    pub arch: String,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
    #[serde(default = "default_sort_by")]
    pub sort_by: String,
    #[serde(default = "default_sort_direction")]
    pub sort_direction: String,
}

/// Arguments of `search_instructions_paginated`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchPageArgs {
    pub query: String,
    #[serde(default)]
    pub architecture: Option<String>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    crate::resolver::DEFAULT_PAGE_SIZE as i64
}

fn default_sort_by() -> String {
    "mnemonic".to_string()
}

fn default_sort_direction() -> String {
    "asc".to_string()
}

/// A decoded tool invocation.
#[derive(Debug, Clone)]
pub enum ToolCall {
    Search(SearchArgs),
    Compare(CompareArgs),
    ListPage(ListPageArgs),
    SearchPage(SearchPageArgs),
}

impl ToolCall {
    /// Decode a tool call from its name and JSON argument object.
    /// `null` arguments are treated as `{}`.
    pub fn parse(name: &str, arguments: &Value) -> Result<Self, String> {
        let arguments = match arguments {
            Value::Null => Value::Object(Default::default()),
            other => other.clone(),
        };
        let decode_err = |e: serde_json::Error| format!("Invalid arguments for '{}': {}", name, e);
        let call = match name {
            "search_instructions" => {
                ToolCall::Search(serde_json::from_value(arguments).map_err(decode_err)?)
            }
            "compare_instructions" => {
                ToolCall::Compare(serde_json::from_value(arguments).map_err(decode_err)?)
            }
            "list_instructions_paginated" => {
                ToolCall::ListPage(serde_json::from_value(arguments).map_err(decode_err)?)
            }
            "search_instructions_paginated" => {
                ToolCall::SearchPage(serde_json::from_value(arguments).map_err(decode_err)?)
            }
            _ => return Err(format!("Unknown tool '{}'", name)),
        };
        Ok(call)
    }

    pub fn name(&self) -> &'static str {
        match self {
            ToolCall::Search(_) => "search_instructions",
            ToolCall::Compare(_) => "compare_instructions",
            ToolCall::ListPage(_) => "list_instructions_paginated",
            ToolCall::SearchPage(_) => "search_instructions_paginated",
        }
    }

    /// Whether the reply body is JSON rather than plain text.
    pub fn is_json(&self) -> bool {
        matches!(self, ToolCall::ListPage(_) | ToolCall::SearchPage(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_resources() {
        assert_eq!(
            Resource::parse("isa://architectures").unwrap(),
            Resource::Architectures
        );
        assert_eq!(
            Resource::parse("isa://instruction/x86_64/mov").unwrap(),
            Resource::Instruction {
                arch: "x86_64".into(),
                name: "mov".into()
            }
        );
        assert_eq!(
            Resource::parse("isa://architectures/aarch64/registers").unwrap(),
            Resource::Registers("aarch64".into())
        );
        assert!(Resource::parse("isa://architecture/").is_err());
        assert!(Resource::parse("http://architectures").is_err());
        assert!(Resource::parse("isa://opcodes/x86_64").is_err());
    }

    #[test]
    fn test_resource_display_is_parseable() {
        let r = Resource::InstructionGroups("riscv64".into());
        assert_eq!(Resource::parse(&r.to_string()).unwrap(), r);
    }

    #[test]
    fn test_tool_defaults() {
        let call = ToolCall::parse("list_instructions_paginated", &json!({"arch": "x86_64"})).unwrap();
        match call {
            ToolCall::ListPage(args) => {
                assert_eq!(args.page, 1);
                assert_eq!(args.page_size, 50);
                assert_eq!(args.sort_by, "mnemonic");
                assert_eq!(args.sort_direction, "asc");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_tool_argument_errors() {
        assert!(ToolCall::parse("search_instructions", &Value::Null).is_err());
        assert!(ToolCall::parse("assemble", &json!({})).is_err());
        let err = ToolCall::parse("compare_instructions", &json!({"mnemonic": 5})).unwrap_err();
        assert!(err.contains("compare_instructions"));
    }
}
