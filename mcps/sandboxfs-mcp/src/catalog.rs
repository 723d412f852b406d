//! Static catalog of the exposed operations

use std::str::FromStr;

use serde::Serialize;
use serde_json::{json, Map, Value};

use crate::types::FsError;

/// The five filesystem operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    ReadFile,
    WriteFile,
    ListDirectory,
    CreateDirectory,
    DeleteFile,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::ReadFile,
        Operation::WriteFile,
        Operation::ListDirectory,
        Operation::CreateDirectory,
        Operation::DeleteFile,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Operation::ReadFile => "read_file",
            Operation::WriteFile => "write_file",
            Operation::ListDirectory => "list_directory",
            Operation::CreateDirectory => "create_directory",
            Operation::DeleteFile => "delete_file",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Operation::ReadFile => "Read the complete contents of a file from the filesystem",
            Operation::WriteFile => "Write content to a file (overwrites existing content)",
            Operation::ListDirectory => "List the contents of a directory",
            Operation::CreateDirectory => "Create a new directory",
            Operation::DeleteFile => "Delete a file or directory",
        }
    }

    /// `(name, description, required)` for each parameter
    fn parameters(self) -> &'static [(&'static str, &'static str, bool)] {
        match self {
            Operation::ReadFile => &[("path", "Path to the file to read", true)],
            Operation::WriteFile => &[
                ("path", "Path to the file to write", true),
                ("content", "Content to write to the file", true),
            ],
            Operation::ListDirectory => &[("path", "Path to the directory to list", true)],
            Operation::CreateDirectory => &[("path", "Path to the directory to create", true)],
            Operation::DeleteFile => &[("path", "Path to the file or directory to delete", true)],
        }
    }

    pub fn descriptor(self) -> OperationDescriptor {
        let mut properties = Map::new();
        let mut required = Vec::new();
        for &(name, description, is_required) in self.parameters() {
            properties.insert(
                name.to_string(),
                json!({ "type": "string", "description": description }),
            );
            if is_required {
                required.push(name);
            }
        }

        OperationDescriptor {
            name: self.name(),
            description: self.description(),
            input_schema: json!({
                "type": "object",
                "properties": properties,
                "required": required,
            }),
        }
    }
}

impl FromStr for Operation {
    type Err = FsError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Operation::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| FsError::UnknownOperation(name.to_string()))
    }
}

/// Entry of the `capabilities/list` answer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

/// All descriptors, in catalog order
pub fn descriptors() -> Vec<OperationDescriptor> {
    Operation::ALL.into_iter().map(Operation::descriptor).collect()
}
