// src/server/tools.rs

//! Tool catalogue advertised through `tools/list`.

use serde_json::{Value, json};

pub const CHECK_INSTALLATION: &str = "check_installation";
pub const LIST_BOARDS: &str = "list_boards";
pub const GET_BOARD_INFO: &str = "get_board_info";
pub const LIST_DEVICES: &str = "list_devices";
pub const INIT_PROJECT: &str = "init_project";
pub const BUILD_PROJECT: &str = "build_project";
pub const CLEAN_PROJECT: &str = "clean_project";
pub const UPLOAD_FIRMWARE: &str = "upload_firmware";
pub const START_MONITOR: &str = "start_monitor";
pub const SEARCH_LIBRARIES: &str = "search_libraries";
pub const INSTALL_LIBRARY: &str = "install_library";
pub const LIST_INSTALLED_LIBRARIES: &str = "list_installed_libraries";

pub const TOOL_NAMES: &[&str] = &[
    CHECK_INSTALLATION,
    LIST_BOARDS,
    GET_BOARD_INFO,
    LIST_DEVICES,
    INIT_PROJECT,
    BUILD_PROJECT,
    CLEAN_PROJECT,
    UPLOAD_FIRMWARE,
    START_MONITOR,
    SEARCH_LIBRARIES,
    INSTALL_LIBRARY,
    LIST_INSTALLED_LIBRARIES,
];

fn project_dir_schema() -> Value {
    json!({
        "type": "string",
        "description": "Absolute path of the PlatformIO project directory. Must be inside one of the server's allowed roots."
    })
}

fn environment_schema() -> Value {
    json!({
        "type": "string",
        "description": "Environment name from platformio.ini ([env:NAME]). Defaults to all environments."
    })
}

fn port_schema() -> Value {
    json!({
        "type": "string",
        "description": "Serial port as reported by list_devices, e.g. /dev/ttyUSB0 or COM3."
    })
}

fn empty_schema() -> Value {
    json!({
        "type": "object",
        "properties": {},
        "additionalProperties": false
    })
}

pub fn tools_list() -> Vec<Value> {
    vec![
        json!({
            "name": CHECK_INSTALLATION,
            "description": "Check that PlatformIO Core is installed and report its version and location.",
            "inputSchema": empty_schema()
        }),
        json!({
            "name": LIST_BOARDS,
            "description": "List boards supported by PlatformIO, optionally filtered by a search term (id, name, MCU, vendor).",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "filter": {
                        "type": "string",
                        "description": "Free-text filter, e.g. 'esp32' or 'uno'"
                    }
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": GET_BOARD_INFO,
            "description": "Get details (MCU, clock, RAM/flash size, frameworks) for one board by its exact, case-sensitive id.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "board": {
                        "type": "string",
                        "description": "Board id, e.g. 'uno' or 'esp32dev'"
                    }
                },
                "required": ["board"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": LIST_DEVICES,
            "description": "List serial devices currently attached to this machine.",
            "inputSchema": empty_schema()
        }),
        json!({
            "name": INIT_PROJECT,
            "description": "Create a PlatformIO project for a board. The directory is created if it does not exist.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "board": {
                        "type": "string",
                        "description": "Board id, e.g. 'uno'"
                    },
                    "projectDir": project_dir_schema(),
                    "framework": {
                        "type": "string",
                        "description": "Framework, e.g. 'arduino', 'espidf'. Defaults to the board's default."
                    }
                },
                "required": ["board", "projectDir"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": BUILD_PROJECT,
            "description": "Compile a PlatformIO project and report RAM/flash usage.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "projectDir": project_dir_schema(),
                    "environment": environment_schema()
                },
                "required": ["projectDir"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": CLEAN_PROJECT,
            "description": "Remove build artifacts of a PlatformIO project.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "projectDir": project_dir_schema(),
                    "environment": environment_schema()
                },
                "required": ["projectDir"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": UPLOAD_FIRMWARE,
            "description": "Build the project if needed and flash it to a connected board.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "projectDir": project_dir_schema(),
                    "environment": environment_schema(),
                    "port": port_schema()
                },
                "required": ["projectDir"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": START_MONITOR,
            "description": "Prepare the command that opens a serial monitor. The monitor is interactive, so the command is returned for the user to run in a terminal.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "port": port_schema(),
                    "baud": {
                        "type": "integer",
                        "description": "Baud rate (default 9600), e.g. 115200"
                    },
                    "projectDir": project_dir_schema()
                },
                "additionalProperties": false
            }
        }),
        json!({
            "name": SEARCH_LIBRARIES,
            "description": "Search the PlatformIO library registry.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search text, e.g. 'json' or 'header:DHT.h'"
                    },
                    "page": {
                        "type": "integer",
                        "minimum": 1,
                        "description": "Result page (1-based)"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": INSTALL_LIBRARY,
            "description": "Install a library into a project or into global storage.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "library": {
                        "type": "string",
                        "description": "Library spec, e.g. 'bblanchon/ArduinoJson@^6.21.0'"
                    },
                    "projectDir": project_dir_schema(),
                    "global": {
                        "type": "boolean",
                        "description": "Install into global storage instead of a project"
                    }
                },
                "required": ["library"],
                "additionalProperties": false
            }
        }),
        json!({
            "name": LIST_INSTALLED_LIBRARIES,
            "description": "List libraries installed in a project or in global storage.",
            "inputSchema": {
                "type": "object",
                "properties": {
                    "projectDir": project_dir_schema(),
                    "global": {
                        "type": "boolean",
                        "description": "List global storage instead of a project"
                    }
                },
                "additionalProperties": false
            }
        }),
    ]
}
