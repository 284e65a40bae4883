//! Unit tests for the GDB and CDB dialects and the `DriverRegistry`.

use std::collections::HashMap;
use std::sync::Arc;

use debugger_session::config::GlobalConfig;
use debugger_session::breakpoints::RemoveMode;
use debugger_session::driver::{
    CdbDriver, CommandQueue, DebuggerDriver, Dialect, DriverRegistry, GdbDriver,
};
use debugger_session::models::breakpoint::Breakpoint;
use debugger_session::observer::TracingObserver;
use debugger_session::session::SessionController;
use debugger_session::AppError;

use crate::support::RecordingDriver;

fn numbered(filename: &str, line: u32, temporary: bool, index: u32) -> Breakpoint {
    let mut bp = Breakpoint::new(filename, line, temporary);
    bp.index = index;
    bp
}

// ── GDB ───────────────────────────────────────────────────────────────────────

#[test]
fn gdb_prepare_disables_interactive_prompts() {
    let mut driver = GdbDriver::new();
    driver.prepare();

    assert_eq!(
        driver.drain_commands(),
        [
            "set confirm off",
            "set width 0",
            "set height 0",
            "set breakpoint pending on",
        ]
    );
}

#[test]
fn gdb_breakpoint_commands() {
    let mut driver = GdbDriver::new();

    driver.add_breakpoint(&numbered("src/main.c", 10, false, 1));
    driver.add_breakpoint(&numbered(r"C:\src\util.c", 7, true, 2));
    driver.remove_breakpoint(Some(&numbered("src/main.c", 10, false, 1)));
    driver.remove_breakpoint(None);

    assert_eq!(driver.pending_commands(), 4);
    assert_eq!(
        driver.drain_commands(),
        [
            "break \"src/main.c:10\"",
            "tbreak \"C:/src/util.c:7\"",
            "clear \"src/main.c:10\"",
            "delete",
        ]
    );
    assert_eq!(driver.pending_commands(), 0);
}

/// Reconciling re-adds in reverse, so GDB's own numbering no longer matches
/// the registry; a single removal must name the location instead.
#[test]
fn gdb_removal_after_reconcile_targets_location() {
    let mut session = SessionController::new(
        DriverRegistry::with_builtins(),
        TracingObserver::shared(),
    );
    session.add_breakpoint("a.c", 10, false, "");
    session.add_breakpoint("b.c", 20, false, "");
    session.start(Some("gdb")).unwrap();

    session.apply_breakpoints();
    session.remove_breakpoint("a.c", 10, RemoveMode::Destroy);

    assert_eq!(
        session.driver_mut().unwrap().drain_commands(),
        [
            "delete",
            "break \"b.c:20\"",
            "break \"a.c:10\"",
            "clear \"a.c:10\"",
        ]
    );
}

#[test]
fn gdb_execution_commands() {
    let mut driver = GdbDriver::new();

    driver.run();
    driver.resume();
    driver.step();
    driver.next();
    driver.send_raw("info registers");
    driver.quit();

    assert_eq!(
        driver.drain_commands(),
        ["run", "continue", "step", "next", "info registers", "quit"]
    );
}

#[test]
fn gdb_command_line_quotes_arguments() {
    let driver = GdbDriver::new();
    let args = vec!["-nx".to_owned(), "-args".to_owned()];

    assert_eq!(
        driver.command_line("gdb", &args, "/tmp/my prog"),
        "gdb -nx -args '/tmp/my prog'"
    );
}

// ── CDB ───────────────────────────────────────────────────────────────────────

#[test]
fn cdb_breakpoint_commands_use_registry_index() {
    let mut driver = CdbDriver::new();

    driver.prepare();
    driver.add_breakpoint(&numbered("main.c", 10, false, 3));
    driver.add_breakpoint(&numbered("main.c", 12, true, 4));
    driver.remove_breakpoint(Some(&numbered("main.c", 10, false, 3)));
    driver.remove_breakpoint(None);

    assert_eq!(
        driver.drain_commands(),
        [
            ".lines",
            "bu3 `main.c:10`",
            "bu4 /1 `main.c:12`",
            "bc 3",
            "bc *",
        ]
    );
}

#[test]
fn cdb_execution_commands() {
    let mut driver = CdbDriver::new();

    driver.run();
    driver.resume();
    driver.step();
    driver.next();
    driver.quit();

    assert_eq!(driver.drain_commands(), ["g", "g", "t", "p", "q"]);
}

#[test]
fn command_line_skips_empty_parts() {
    let driver = CdbDriver::new();

    assert_eq!(driver.command_line("cdb", &[], "app.exe"), "cdb app.exe");
    assert_eq!(driver.command_line("cdb", &[String::new()], ""), "cdb");
}

#[test]
fn command_queue_is_fifo() {
    let mut queue = CommandQueue::new();
    assert!(queue.is_empty());

    queue.push("first");
    queue.push(String::from("second"));

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.drain(), ["first", "second"]);
    assert!(queue.is_empty());
}

// ── Dialect ───────────────────────────────────────────────────────────────────

#[test]
fn dialect_tokens_round_trip() {
    for dialect in Dialect::ALL {
        assert_eq!(Dialect::from_token(dialect.token()), Some(dialect));
        assert_eq!(dialect.to_string(), dialect.token());
    }
    assert_eq!(Dialect::from_token("lldb"), None);
}

#[test]
fn platform_default_matches_target() {
    let expected = if cfg!(target_env = "msvc") {
        Dialect::Cdb
    } else {
        Dialect::Gdb
    };
    assert_eq!(Dialect::platform_default(), expected);
}

// ── DriverRegistry ────────────────────────────────────────────────────────────

#[test]
fn builtins_resolve_known_tokens() {
    let registry = DriverRegistry::with_builtins();

    assert_eq!(registry.build(Some("gdb")).unwrap().name(), "gdb");
    assert_eq!(registry.build(Some("cdb")).unwrap().name(), "cdb");
    assert_eq!(registry.build(Some("msvctk")).unwrap().name(), "cdb");
}

#[test]
fn absent_or_unknown_token_falls_back_to_default() {
    let mut registry = DriverRegistry::with_builtins();
    registry.set_default("cdb");

    assert_eq!(registry.default_token(), "cdb");
    assert_eq!(registry.build(None).unwrap().name(), "cdb");
    assert_eq!(registry.build(Some("lldb")).unwrap().name(), "cdb");
}

#[test]
fn missing_default_is_a_driver_error() {
    let registry = DriverRegistry::new("nothing");

    let err = registry.build(Some("gdb")).err().expect("no factories");
    assert!(matches!(err, AppError::Driver(_)));
    assert!(err.to_string().contains("nothing"));
}

#[test]
fn registered_factory_is_used_for_its_token() {
    let mut registry = DriverRegistry::with_builtins();
    registry.register(
        "recording",
        Arc::new(|| Box::new(RecordingDriver::new()) as Box<dyn DebuggerDriver>),
    );

    assert!(registry.contains("recording"));
    assert_eq!(registry.build(Some("recording")).unwrap().name(), "recording");
}

#[test]
fn alias_points_at_existing_factory() {
    let mut registry = DriverRegistry::with_builtins();

    registry.alias("windbg", "cdb").unwrap();
    assert_eq!(registry.build(Some("windbg")).unwrap().name(), "cdb");

    let err = registry.alias("x", "missing").unwrap_err();
    assert!(matches!(err, AppError::Driver(_)));
    assert!(!registry.contains("x"));
}

#[test]
fn from_config_applies_default_and_aliases() {
    let config = GlobalConfig {
        default_dialect: Some(Dialect::Cdb),
        aliases: HashMap::from([("mingw".to_owned(), Dialect::Gdb)]),
        ..GlobalConfig::default()
    };

    let registry = DriverRegistry::from_config(&config);

    assert_eq!(registry.default_token(), "cdb");
    assert_eq!(registry.build(Some("mingw")).unwrap().name(), "gdb");
    assert_eq!(registry.build(Some("unknown")).unwrap().name(), "cdb");
}

#[test]
fn debug_lists_sorted_tokens() {
    let registry = DriverRegistry::with_builtins();
    let rendered = format!("{registry:?}");

    assert!(rendered.contains(r#"["cdb", "gdb", "msvctk"]"#), "{rendered}");
}
