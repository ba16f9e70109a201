// tests/validate_args.rs

use pio_mcp::validate::{
    BaudRate, MAX_IDENTIFIER_LEN, ValidationError, validate_baud_rate, validate_identifier,
    validate_library_spec, validate_port, validate_search_query,
};

#[test]
fn board_ids_keep_their_case() {
    let lower = validate_identifier("board", "uno").unwrap();
    let upper = validate_identifier("board", "Uno").unwrap();
    assert_eq!(lower.as_str(), "uno");
    assert_eq!(upper.as_str(), "Uno");
    assert_ne!(lower, upper);
}

#[test]
fn identifiers_accept_real_board_and_env_names() {
    for id in ["esp32dev", "nodemcuv2", "bluepill_f103c8", "teensy41", "env-1.2"] {
        assert!(validate_identifier("board", id).is_ok(), "{id} should be accepted");
    }
}

#[test]
fn identifiers_reject_unsafe_or_malformed_values() {
    let too_long = "a".repeat(MAX_IDENTIFIER_LEN + 1);
    for bad in ["", "uno; rm -rf /", "--board", "-x", "a b", "uno$", "ü", too_long.as_str()] {
        match validate_identifier("board", bad) {
            Err(ValidationError::InvalidIdentifier { field, .. }) => assert_eq!(field, "board"),
            other => panic!("{bad:?}: expected InvalidIdentifier, got {other:?}"),
        }
    }
}

#[test]
fn identifier_at_length_limit_is_accepted() {
    let id = "b".repeat(MAX_IDENTIFIER_LEN);
    assert!(validate_identifier("environment", &id).is_ok());
}

#[test]
fn common_port_names_are_accepted() {
    for port in [
        "/dev/ttyUSB0",
        "/dev/ttyACM1",
        "/dev/cu.usbserial-0001",
        "/dev/tty.SLAB_USBtoUART",
        "/dev/serial/by-id/usb-Silicon_Labs_CP2102-if00-port0",
        "COM3",
        "com12",
    ] {
        assert!(validate_port(port).is_ok(), "{port} should be accepted");
    }
}

#[test]
fn malformed_ports_are_rejected() {
    for port in [
        "",
        "/dev/sda",
        "/etc/passwd",
        "/dev/ttyUSB0; reboot",
        "COM0",
        "COM",
        "/dev/../dev/ttyUSB0",
        "ttyUSB0",
    ] {
        assert!(
            matches!(validate_port(port), Err(ValidationError::InvalidPort { .. })),
            "{port:?} should be rejected"
        );
    }
}

#[test]
fn library_specs_with_owner_and_version_are_accepted() {
    for spec in [
        "ArduinoJson",
        "bblanchon/ArduinoJson@^6.21.0",
        "knolleary/PubSubClient @ ~2.8",
        "Adafruit NeoPixel",
    ] {
        let parsed = validate_library_spec(spec).unwrap();
        assert_eq!(parsed.as_str(), spec);
    }
}

#[test]
fn library_specs_with_metacharacters_are_invalid_arguments() {
    for spec in ["", "lib;rm", "--global", "lib|x", "$(id)", "lib\nx"] {
        match validate_library_spec(spec) {
            Err(ValidationError::InvalidArgument { field, .. }) => assert_eq!(field, "library"),
            other => panic!("{spec:?}: expected InvalidArgument, got {other:?}"),
        }
    }
}

#[test]
fn search_queries_allow_free_text_but_not_control_or_shell_chars() {
    assert!(validate_search_query("header:DHT.h").is_ok());
    assert!(validate_search_query("json parser \"fast\"").is_ok());
    assert!(validate_search_query("a\tb").is_err());
    assert!(validate_search_query("x; y").is_err());
    assert!(validate_search_query("-v").is_err());
    assert!(validate_search_query(" ").is_err());
}

#[test]
fn baud_rates_come_from_the_standard_set() {
    assert_eq!(validate_baud_rate(115200).unwrap().get(), 115200);
    assert_eq!(BaudRate::DEFAULT.get(), 9600);
    assert!(matches!(
        validate_baud_rate(12345),
        Err(ValidationError::InvalidArgument { field: "baud", .. })
    ));
    assert!(validate_baud_rate(0).is_err());
}
