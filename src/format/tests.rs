use super::*;
use pretty_assertions::assert_eq;

const NOT_FORMATTED: &str = r#"
type Request struct {
  Name string `path:"name,options=you|me"`
}
type Response struct {
  Message string `json:"message"`
  Students []Student `json:"students"`
}
service A-api {
@server(
handler: GreetHandler
  )
  get /greet/from/:name(Request) returns (Response)

@server(
handler: GreetHandler2
  )
  get /greet/from2/:name(Request) returns (Response)
}
"#;

const FORMATTED: &str = r#"type Request {
	Name string `path:"name,options=you|me"`
}
type Response {
	Message  string    `json:"message"`
	Students []Student `json:"students"`
}
service A-api {
	@server(
		handler: GreetHandler
	)
	get /greet/from/:name(Request) returns (Response)

	@server(
		handler: GreetHandler2
	)
	get /greet/from2/:name(Request) returns (Response)
}"#;

fn no_validation(_: &str) -> Result<(), ApiFormatError> {
    Ok(())
}

#[test]
fn test_format_with_gofmt() {
    let gofmt = Gofmt::from_env();
    if !gofmt.is_available() {
        println!("Skipping test: gofmt not available");
        return;
    }
    let formatted = format_api(NOT_FORMATTED, &DelimiterValidator, &gofmt).unwrap();
    assert_eq!(formatted, FORMATTED);
}

#[test]
fn test_type_blocks_get_struct_keyword_for_the_formatter() {
    let seen = std::cell::RefCell::new(Vec::new());
    let recorder = |s: &str| -> anyhow::Result<String> {
        seen.borrow_mut().push(s.to_string());
        Ok(s.to_string())
    };
    let raw = "type (\n  CreateReq {\n  name string `json:\"name\"`\n  }\n  EmptyResp {}\n)\n";
    let formatted = post_format(raw, &recorder).unwrap();

    assert_eq!(
        seen.borrow().as_slice(),
        ["type (\n  CreateReq struct {\nName string `json:\"name\"`\n  }\n  EmptyResp struct {}\n)\n"]
    );
    assert_eq!(formatted, "type (\n  CreateReq {\nName string `json:\"name\"`\n  }\n  EmptyResp {}\n)");
}

#[test]
fn test_indentation_outside_type_blocks() {
    let raw = "info (\ntitle: \"t\"\n    )\n@server (\n  prefix: /api\n)\nservice s {\n  @doc \"get\"\n      get /a (Req) returns (Resp)\n}\n";
    let formatted = post_format(raw, &Verbatim).unwrap();
    assert_eq!(
        formatted,
        "info (\n\ttitle: \"t\"\n)\n@server (\n\tprefix: /api\n)\nservice s {\n\t@doc \"get\"\n\tget /a (Req) returns (Resp)\n}"
    );
}

#[test]
fn test_blank_lines_collapse_and_follow_lone_braces() {
    let raw = "service s {\n\n\n\nget /a (A) returns (B)\n}\n@server (\n)\n";
    let formatted = post_format(raw, &Verbatim).unwrap();
    assert_eq!(formatted, "service s {\n\n\tget /a (A) returns (B)\n}\n\n@server (\n)");
}

#[test]
fn test_inline_closer_does_not_dedent() {
    let raw = "service s {\nget /a (A) returns (B) }\nget /b (A) returns (B)\n";
    let formatted = post_format(raw, &Verbatim).unwrap();
    assert_eq!(
        formatted,
        "service s {\n\tget /a (A) returns (B) }\n\tget /b (A) returns (B)"
    );
}

#[test]
fn test_extra_closer_clamps_at_zero() {
    let raw = "}\n)\nservice s {\nget /a (A) returns (B)\n}\n}\n@server (\nprefix: /x\n)\n";
    let formatted = post_format(raw, &Verbatim).unwrap();
    assert_eq!(
        formatted,
        "}\n\n)\nservice s {\n\tget /a (A) returns (B)\n}\n\n}\n\n@server (\n\tprefix: /x\n)"
    );
}

#[test]
fn test_balanced_input_ends_at_depth_zero() {
    let raw = "service s {\n@server (\ngroup: g\n)\nget /a (A) returns (B)\n}\nservice t {\nget /b (A) returns (B)\n}\n";
    let formatted = post_format(raw, &Verbatim).unwrap();
    for line in formatted.lines().filter(|l| l.starts_with("service") || *l == "}") {
        assert!(!line.starts_with('\t'), "{line:?}");
    }
}

#[test]
fn test_comments_do_not_open_blocks() {
    let raw = "service s { // handlers (\nget /a (A) returns (B) // {\n}\n";
    let formatted = post_format(raw, &Verbatim).unwrap();
    assert_eq!(
        formatted,
        "service s { // handlers (\n\tget /a (A) returns (B) // {\n}"
    );
}

#[test]
fn test_validator_rejection_aborts() {
    let err = format_api("service s {\nget /a (A returns (B)\n", &DelimiterValidator, &Verbatim).unwrap_err();
    assert!(matches!(err, ApiFormatError::Validation { .. }));

    let err = format_api("anything", &|_: &str| -> Result<(), ApiFormatError> {
        Err(ApiFormatError::Validation {
            line: 1,
            column: 1,
            message: "nope".to_string(),
        })
    }, &Verbatim)
    .unwrap_err();
    assert_eq!(err.to_string(), "route document rejected at 1:1: nope");
}

#[test]
fn test_source_error_carries_buffer() {
    let failing = |_: &str| -> anyhow::Result<String> { anyhow::bail!("expected ';'") };
    let err = format_api("type User {\nName string\n}\n", &no_validation, &failing).unwrap_err();
    match err {
        ApiFormatError::Source { message, buffer } => {
            assert_eq!(message, "expected ';'");
            assert_eq!(buffer, "type User struct {\nName string\n}\n");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_strip_comment_respects_quotes() {
    assert_eq!(strip_comment("get /a // note"), "get /a");
    assert_eq!(strip_comment("A string `json:\"a//b\"` // c"), "A string `json:\"a//b\"`");
    assert_eq!(strip_comment("@doc \"http://x\""), "@doc \"http://x\"");
    assert_eq!(strip_comment("  plain  "), "plain");
}
