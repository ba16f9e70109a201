// tests/handlers_fake_executor.rs

mod common;
use crate::common::{FAKE_PIO, FakeExecutor, Sandbox, Scripted, TestResult};

use std::path::Path;
use std::time::Duration;

use serde_json::json;

use pio_mcp::diagnostic::ErrorKind;
use pio_mcp::handlers::{
    self, BoardInfoParams, BuildParams, InitParams, InstallLibraryParams, ListBoardsParams,
    ListInstalledParams, MonitorParams, SearchLibrariesParams, UploadParams,
};
use pio_mcp::handlers::payload::LibraryScope;

fn boards_json() -> serde_json::Value {
    json!([
        {
            "id": "uno",
            "name": "Arduino Uno",
            "platform": "atmelavr",
            "mcu": "ATMEGA328P",
            "fcpu": 16000000,
            "ram": 2048,
            "rom": 32256,
            "frameworks": ["arduino"],
            "vendor": "Arduino",
            "url": "https://www.arduino.cc/en/Main/ArduinoBoardUno",
            "connectivity": []
        },
        {
            "id": "unowifi",
            "name": "Arduino Uno WiFi",
            "platform": "atmelavr",
            "mcu": "ATMEGA328P",
            "fcpu": 16000000,
            "ram": 2048,
            "rom": 31744,
            "frameworks": ["arduino"],
            "vendor": "Arduino"
        }
    ])
}

const BUILD_STDOUT: &str = "\
Processing uno (platform: atmelavr; board: uno; framework: arduino)
--------------------------------------------------------------------------------
Checking size .pio/build/uno/firmware.elf
Advanced Memory Usage is available via \"PlatformIO Home > Project Inspect\"
RAM:   [=         ]   9.2% (used 188 bytes from 2048 bytes)
Flash: [=         ]   3.0% (used 962 bytes from 32256 bytes)
========================= [SUCCESS] Took 0.79 seconds =========================

Environment    Status    Duration
-------------  --------  ------------
uno            SUCCESS   00:00:00.790
========================= 1 succeeded in 00:00:00.790 =========================
";

// ---------------------------------------------------------------------------
// init_project
// ---------------------------------------------------------------------------

#[tokio::test]
async fn init_project_creates_dir_and_passes_typed_args() -> TestResult {
    let sb = Sandbox::new();
    let dir = sb.path("proj1");

    let result = handlers::init_project(
        &sb.ctx,
        InitParams {
            board: "uno".into(),
            project_dir: dir.clone(),
            framework: Some("arduino".into()),
        },
    )
    .await?;

    assert_eq!(result.project_dir.to_string(), dir);
    assert_eq!(result.board.as_str(), "uno");
    assert!(Path::new(&dir).is_dir());

    let calls = sb.fake.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].program, Path::new(FAKE_PIO));
    assert_eq!(calls[0].cwd, Path::new(&dir));
    assert_eq!(
        calls[0].args,
        vec![
            "project",
            "init",
            "--board",
            "uno",
            "--project-option",
            "framework=arduino",
            "--project-dir",
            dir.as_str(),
        ]
    );
    assert_eq!(calls[0].timeout, Duration::from_secs(30));
    Ok(())
}

/// The literal scenario from the tool description: `/tmp/proj1` with `/tmp`
/// allowed, and `/tmp/../etc` refused before anything runs.
#[cfg(unix)]
#[tokio::test]
async fn tmp_project_accepted_and_parent_escape_refused() -> TestResult {
    use pio_mcp_test_utils::{ConfigFileBuilder, fake_context};
    use std::sync::Arc;

    let fake = Arc::new(FakeExecutor::new());
    let config = ConfigFileBuilder::new().allowed_root("/tmp").build();
    let ctx = fake_context(config, &fake);

    let ok = handlers::init_project(
        &ctx,
        InitParams {
            board: "uno".into(),
            project_dir: "/tmp/proj1".into(),
            framework: None,
        },
    )
    .await?;
    assert_eq!(ok.project_dir.as_path(), Path::new("/tmp/proj1"));
    assert_eq!(fake.call_count(), 1);

    let err = handlers::init_project(
        &ctx,
        InitParams {
            board: "uno".into(),
            project_dir: "/tmp/../etc".into(),
            framework: None,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidPath);
    assert_eq!(fake.call_count(), 1, "no process may start for a rejected path");
    Ok(())
}

#[tokio::test]
async fn init_project_rejects_injected_board_without_spawning() -> TestResult {
    let sb = Sandbox::new();

    let err = handlers::init_project(
        &sb.ctx,
        InitParams {
            board: "uno; rm -rf ~".into(),
            project_dir: sb.path("p"),
            framework: None,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidIdentifier);
    assert_eq!(err.context.get("board").map(String::as_str), Some("uno; rm -rf ~"));
    assert_eq!(sb.fake.call_count(), 0);
    assert!(!Path::new(&sb.path("p")).exists(), "nothing may be created");
    Ok(())
}

// ---------------------------------------------------------------------------
// build / clean / upload
// ---------------------------------------------------------------------------

#[tokio::test]
async fn build_reports_memory_usage_and_environments() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::ok(BUILD_STDOUT)));
    let dir = sb.project("blink");

    let result = handlers::build_project(
        &sb.ctx,
        BuildParams {
            project_dir: dir.clone(),
            environment: Some("uno".into()),
        },
    )
    .await?;

    assert_eq!(result.memory.len(), 2);
    assert_eq!(result.memory[0].region, "RAM");
    assert_eq!(result.memory[0].used_bytes, 188);
    assert_eq!(result.memory[0].total_bytes, 2048);
    assert!((result.memory[0].percent - 9.2).abs() < 1e-9);
    assert_eq!(result.memory[1].region, "Flash");
    assert_eq!(result.memory[1].total_bytes, 32256);

    assert_eq!(result.environments.len(), 1);
    assert_eq!(result.environments[0].environment, "uno");
    assert_eq!(result.environments[0].status, "SUCCESS");

    let call = &sb.fake.calls()[0];
    assert_eq!(
        call.args,
        vec!["run", "--project-dir", dir.as_str(), "--environment", "uno"]
    );
    assert_eq!(call.timeout, Duration::from_secs(600));
    Ok(())
}

#[tokio::test]
async fn build_of_missing_project_is_not_found_without_spawning() -> TestResult {
    let sb = Sandbox::new();
    let err = handlers::build_project(
        &sb.ctx,
        BuildParams {
            project_dir: sb.path("nope"),
            environment: None,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.context.get("operation").map(String::as_str), Some("build_project"));
    assert_eq!(sb.fake.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn build_dir_without_platformio_ini_is_not_found() -> TestResult {
    let sb = Sandbox::new();
    std::fs::create_dir_all(sb.root_path().join("plain"))?;

    let err = handlers::build_project(
        &sb.ctx,
        BuildParams {
            project_dir: sb.path("plain"),
            environment: None,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert!(err.message.contains("platformio.ini"));
    assert_eq!(sb.fake.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn build_failure_carries_compiler_lines_and_context() -> TestResult {
    let stdout = "src/main.cpp:3:1: error: 'x' does not name a type\n*** [.pio/build/uno/src/main.cpp.o] Error 1\n";
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::Exit {
        code: 1,
        stdout: stdout.into(),
        stderr: String::new(),
    }));
    let dir = sb.project("broken");

    let err = handlers::build_project(
        &sb.ctx,
        BuildParams {
            project_dir: dir.clone(),
            environment: None,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::OperationFailed);
    assert_eq!(err.diagnostics.len(), 2);
    assert_eq!(err.context.get("project_dir"), Some(&dir));
    assert_eq!(err.context.get("operation").map(String::as_str), Some("build_project"));
    Ok(())
}

#[tokio::test]
async fn build_timeout_is_reported_as_timeout() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::Timeout));
    let dir = sb.project("slow");

    let err = handlers::build_project(
        &sb.ctx,
        BuildParams {
            project_dir: dir,
            environment: None,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Timeout);
    assert!(err.context.contains_key("elapsed_ms"));
    Ok(())
}

#[tokio::test]
async fn clean_uses_clean_target_and_short_timeout() -> TestResult {
    let sb = Sandbox::new();
    let dir = sb.project("blink");

    let result = handlers::clean_project(
        &sb.ctx,
        BuildParams {
            project_dir: dir.clone(),
            environment: None,
        },
    )
    .await?;
    assert!(result.cleaned);

    let call = &sb.fake.calls()[0];
    assert_eq!(call.args, vec!["run", "--target", "clean", "--project-dir", dir.as_str()]);
    assert_eq!(call.timeout, Duration::from_secs(30));
    Ok(())
}

#[tokio::test]
async fn upload_passes_port_and_uses_flash_timeout() -> TestResult {
    let sb = Sandbox::new();
    let dir = sb.project("blink");

    let result = handlers::upload_firmware(
        &sb.ctx,
        UploadParams {
            project_dir: dir.clone(),
            environment: None,
            port: Some("/dev/ttyUSB0".into()),
        },
    )
    .await?;
    assert_eq!(result.port.map(|p| p.to_string()).as_deref(), Some("/dev/ttyUSB0"));

    let call = &sb.fake.calls()[0];
    assert_eq!(
        call.args,
        vec![
            "run",
            "--target",
            "upload",
            "--project-dir",
            dir.as_str(),
            "--upload-port",
            "/dev/ttyUSB0"
        ]
    );
    assert_eq!(call.timeout, Duration::from_secs(300));
    Ok(())
}

#[tokio::test]
async fn upload_with_bad_port_is_rejected_before_spawning() -> TestResult {
    let sb = Sandbox::new();
    let dir = sb.project("blink");

    let err = handlers::upload_firmware(
        &sb.ctx,
        UploadParams {
            project_dir: dir,
            environment: None,
            port: Some("/dev/ttyUSB0 && reboot".into()),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::InvalidPort);
    assert_eq!(sb.fake.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn upload_port_failure_gets_port_hint() -> TestResult {
    let sb = Sandbox::with_fake(
        FakeExecutor::new().with_response(Scripted::fail(1, "Error: Could not open port /dev/ttyUSB0\n")),
    );
    let dir = sb.project("blink");

    let err = handlers::upload_firmware(
        &sb.ctx,
        UploadParams {
            project_dir: dir,
            environment: None,
            port: Some("/dev/ttyUSB0".into()),
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::OperationFailed);
    assert!(err.hint.unwrap_or_default().contains("port"));
    assert_eq!(err.context.get("port").map(String::as_str), Some("/dev/ttyUSB0"));
    Ok(())
}

#[tokio::test]
async fn monitor_returns_command_without_running_it() -> TestResult {
    let sb = Sandbox::new();

    let cmd = handlers::start_monitor(
        &sb.ctx,
        MonitorParams {
            port: Some("COM3".into()),
            baud: Some(115200),
            project_dir: None,
        },
    )
    .await?;

    assert_eq!(sb.fake.call_count(), 0);
    assert_eq!(
        cmd.argv,
        vec![FAKE_PIO, "device", "monitor", "--port", "COM3", "--baud", "115200"]
    );
    assert!(cmd.command_line.ends_with("device monitor --port COM3 --baud 115200"));
    Ok(())
}

#[tokio::test]
async fn monitor_defaults_baud_and_rejects_odd_rates() -> TestResult {
    let sb = Sandbox::new();

    let cmd = handlers::start_monitor(&sb.ctx, MonitorParams::default()).await?;
    assert_eq!(cmd.baud.get(), 9600);
    assert!(cmd.port.is_none());

    let err = handlers::start_monitor(
        &sb.ctx,
        MonitorParams {
            baud: Some(12345),
            ..MonitorParams::default()
        },
    )
    .await
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::InvalidArgument);
    Ok(())
}

// ---------------------------------------------------------------------------
// discovery
// ---------------------------------------------------------------------------

#[tokio::test]
async fn board_info_matches_exact_case_sensitive_id() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::json(boards_json())));

    let board = handlers::get_board_info(&sb.ctx, BoardInfoParams { board: "uno".into() }).await?;
    assert_eq!(board.id, "uno");
    assert_eq!(board.mcu.as_deref(), Some("ATMEGA328P"));
    assert_eq!(board.rom, Some(32256));
    assert_eq!(sb.fake.single_args(), vec!["boards", "--json-output", "uno"]);
    Ok(())
}

#[tokio::test]
async fn board_info_with_wrong_case_is_not_found() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::json(boards_json())));

    let err = handlers::get_board_info(&sb.ctx, BoardInfoParams { board: "Uno".into() })
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NotFound);
    assert_eq!(err.context.get("board").map(String::as_str), Some("Uno"));
    Ok(())
}

#[tokio::test]
async fn list_boards_decodes_and_forwards_filter() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::json(boards_json())));

    let boards = handlers::list_boards(
        &sb.ctx,
        ListBoardsParams {
            filter: Some("uno".into()),
        },
    )
    .await?;

    assert_eq!(boards.len(), 2);
    assert_eq!(boards[1].id, "unowifi");
    assert_eq!(boards[1].url, None);
    assert_eq!(sb.fake.single_args(), vec!["boards", "--json-output", "uno"]);
    assert_eq!(sb.fake.calls()[0].cwd, sb.root_path());
    Ok(())
}

#[tokio::test]
async fn list_boards_skips_notice_printed_before_json() -> TestResult {
    let stdout = format!(
        "Please upgrade to the latest PlatformIO Core.\n{}",
        boards_json()
    );
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::ok(stdout)));

    let boards = handlers::list_boards(&sb.ctx, ListBoardsParams::default()).await?;
    assert_eq!(boards.len(), 2);
    Ok(())
}

#[tokio::test]
async fn unexpected_json_shape_is_malformed_output() -> TestResult {
    let sb = Sandbox::with_fake(
        FakeExecutor::new().with_response(Scripted::json(json!({"boards": "not a list"}))),
    );

    let err = handlers::list_boards(&sb.ctx, ListBoardsParams::default())
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::MalformedOutput);
    assert!(err.context.contains_key("output_excerpt"));
    Ok(())
}

#[tokio::test]
async fn list_devices_decodes_ports() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::json(json!([
        {"port": "/dev/ttyUSB0", "description": "CP2102 USB to UART Bridge Controller", "hwid": "USB VID:PID=10C4:EA60"},
        {"port": "/dev/ttyS0", "description": "n/a", "hwid": "n/a"}
    ]))));

    let devices = handlers::list_devices(&sb.ctx).await?;
    assert_eq!(devices.len(), 2);
    assert_eq!(devices[0].port, "/dev/ttyUSB0");
    assert_eq!(sb.fake.single_args(), vec!["device", "list", "--json-output"]);
    Ok(())
}

#[tokio::test]
async fn check_installation_reports_version_and_path() -> TestResult {
    let sb = Sandbox::with_fake(
        FakeExecutor::new().with_response(Scripted::ok("PlatformIO Core, version 6.1.15\n")),
    );

    let info = handlers::check_installation(&sb.ctx).await?;
    assert!(info.installed);
    assert_eq!(info.version, "6.1.15");
    assert_eq!(info.path, FAKE_PIO);
    assert_eq!(sb.fake.single_args(), vec!["--version"]);
    Ok(())
}

// ---------------------------------------------------------------------------
// libraries
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_libraries_decodes_page() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::json(json!({
        "page": 1,
        "perpage": 10,
        "total": 1,
        "items": [{
            "id": 64,
            "name": "ArduinoJson",
            "description": "A simple and efficient JSON library",
            "keywords": ["json", "rest"],
            "authornames": ["Benoit Blanchon"],
            "frameworks": [{"name": "arduino", "title": "Arduino"}],
            "versionname": "7.0.4"
        }]
    }))));

    let page = handlers::search_libraries(
        &sb.ctx,
        SearchLibrariesParams {
            query: "json".into(),
            page: None,
        },
    )
    .await?;

    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "ArduinoJson");
    assert_eq!(page.items[0].authors, vec!["Benoit Blanchon"]);
    assert_eq!(page.items[0].version.as_deref(), Some("7.0.4"));
    assert_eq!(sb.fake.single_args(), vec!["lib", "search", "--json-output", "json"]);
    Ok(())
}

#[tokio::test]
async fn install_library_into_project() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::ok(
        "Resolving uno dependencies...\nLibrary Manager: Installing bblanchon/ArduinoJson @ ^6.21.0\nLibrary Manager: ArduinoJson@6.21.5 has been installed!\n",
    )));
    let dir = sb.project("blink");

    let result = handlers::install_library(
        &sb.ctx,
        InstallLibraryParams {
            library: "bblanchon/ArduinoJson@^6.21.0".into(),
            project_dir: Some(dir.clone()),
            global: false,
        },
    )
    .await?;

    assert_eq!(result.scope, LibraryScope::Project);
    assert!(result.output.last().is_some_and(|l| l.contains("has been installed")));
    assert_eq!(
        sb.fake.single_args(),
        vec![
            "pkg",
            "install",
            "--library",
            "bblanchon/ArduinoJson@^6.21.0",
            "--project-dir",
            dir.as_str()
        ]
    );
    Ok(())
}

#[tokio::test]
async fn install_library_requires_exactly_one_target() -> TestResult {
    let sb = Sandbox::new();

    let neither = handlers::install_library(
        &sb.ctx,
        InstallLibraryParams {
            library: "ArduinoJson".into(),
            project_dir: None,
            global: false,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(neither.kind, ErrorKind::InvalidArgument);

    let both = handlers::install_library(
        &sb.ctx,
        InstallLibraryParams {
            library: "ArduinoJson".into(),
            project_dir: Some(sb.path("x")),
            global: true,
        },
    )
    .await
    .unwrap_err();
    assert_eq!(both.kind, ErrorKind::InvalidArgument);
    assert_eq!(sb.fake.call_count(), 0);
    Ok(())
}

#[tokio::test]
async fn install_library_globally() -> TestResult {
    let sb = Sandbox::new();

    let result = handlers::install_library(
        &sb.ctx,
        InstallLibraryParams {
            library: "PubSubClient".into(),
            project_dir: None,
            global: true,
        },
    )
    .await?;

    assert_eq!(result.scope, LibraryScope::Global);
    assert!(result.project_dir.is_none());
    assert_eq!(
        sb.fake.single_args(),
        vec!["pkg", "install", "--library", "PubSubClient", "--global"]
    );
    Ok(())
}

#[tokio::test]
async fn installed_libraries_grouped_by_storage_are_flattened() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::json(json!({
        "/home/dev/blink/.pio/libdeps/uno": [
            {"name": "ArduinoJson", "version": "6.21.5", "description": "JSON"},
            {"name": "PubSubClient", "version": "2.8"}
        ]
    }))));
    let dir = sb.project("blink");

    let listed = handlers::list_installed_libraries(
        &sb.ctx,
        ListInstalledParams {
            project_dir: Some(dir.clone()),
            global: false,
        },
    )
    .await?;

    assert_eq!(listed.libraries.len(), 2);
    assert_eq!(
        listed.libraries[1].storage.as_deref(),
        Some("/home/dev/blink/.pio/libdeps/uno")
    );
    assert_eq!(
        sb.fake.single_args(),
        vec!["lib", "-d", dir.as_str(), "list", "--json-output"]
    );
    Ok(())
}

#[tokio::test]
async fn installed_libraries_flat_global_listing() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::json(json!([
        {"name": "OneWire", "version": "2.3.8"}
    ]))));

    let listed = handlers::list_installed_libraries(
        &sb.ctx,
        ListInstalledParams {
            project_dir: None,
            global: true,
        },
    )
    .await?;

    assert_eq!(listed.scope, LibraryScope::Global);
    assert_eq!(listed.libraries[0].name, "OneWire");
    assert_eq!(listed.libraries[0].storage, None);
    assert_eq!(
        sb.fake.single_args(),
        vec!["lib", "--global", "list", "--json-output"]
    );
    Ok(())
}

#[tokio::test]
async fn package_not_found_on_install() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::fail(
        1,
        "Error: Could not find the package with 'nosuchlib' requirements for your system 'linux_x86_64'\n",
    )));

    let err = handlers::install_library(
        &sb.ctx,
        InstallLibraryParams {
            library: "nosuchlib".into(),
            project_dir: None,
            global: true,
        },
    )
    .await
    .unwrap_err();

    assert_eq!(err.kind, ErrorKind::OperationFailed);
    assert_eq!(err.context.get("signature").map(String::as_str), Some("package not found"));
    assert_eq!(err.context.get("library").map(String::as_str), Some("nosuchlib"));
    Ok(())
}

#[tokio::test]
async fn cancelled_execution_surfaces_as_cancelled() -> TestResult {
    let sb = Sandbox::with_fake(FakeExecutor::new().with_response(Scripted::Cancelled));
    let err = handlers::list_devices(&sb.ctx).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Cancelled);
    Ok(())
}
