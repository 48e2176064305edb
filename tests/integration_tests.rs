use pretty_assertions::assert_eq;
use toon_syntax::{
    encode, parse, try_parse, AstNode, ErrorCode, ParseStatus, ParserOptions, Property,
};

fn document_properties(result: &toon_syntax::ParseResult) -> Vec<Property> {
    result
        .document
        .as_ref()
        .and_then(AstNode::as_object_properties)
        .expect("document")
        .to_vec()
}

#[test]
fn test_simple_object() {
    let result = parse("name: John\nage: 30").unwrap();
    assert!(result.is_success());

    let props = document_properties(&result);
    assert_eq!(props.len(), 2);
    assert_eq!(props[0].key, "name");
    assert_eq!(props[0].value.as_str(), Some("John"));
    assert_eq!(props[1].key, "age");
    match &props[1].value {
        AstNode::Number {
            value,
            is_integer,
            raw,
            ..
        } => {
            assert_eq!(*value, 30.0);
            assert!(*is_integer);
            assert_eq!(raw, "30");
        }
        other => panic!("expected a number, got {}", other.kind_name()),
    }
}

#[test]
fn test_table_array() {
    let result = parse("users[2]{id,name}:\n  1,Alice\n  2,Bob").unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);

    let props = document_properties(&result);
    match &props[0].value {
        AstNode::TableArray {
            declared_size,
            schema,
            rows,
            ..
        } => {
            assert_eq!(*declared_size, Some(2));
            assert_eq!(schema, &["id", "name"]);
            assert_eq!(rows.len(), 2);
            assert!(matches!(rows[0][0], AstNode::Number { value, .. } if value == 1.0));
            assert_eq!(rows[0][1].as_str(), Some("Alice"));
            assert!(matches!(rows[1][0], AstNode::Number { value, .. } if value == 2.0));
            assert_eq!(rows[1][1].as_str(), Some("Bob"));
        }
        other => panic!("expected a table array, got {}", other.kind_name()),
    }
}

#[test]
fn test_pipe_delimited_inline_array() {
    let result = parse("tags[3|]: reading|gaming|coding").unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);

    let props = document_properties(&result);
    let (declared, elements) = props[0].value.as_array().expect("array");
    assert_eq!(declared, Some(3));
    let values: Vec<&str> = elements.iter().filter_map(AstNode::as_str).collect();
    assert_eq!(values, ["reading", "gaming", "coding"]);
}

#[test]
fn test_leading_zero_integer_reclassified_as_string() {
    let result = parse("code: 05").unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);

    let props = document_properties(&result);
    assert_eq!(props[0].value.as_str(), Some("05"));
    assert!(props[0].value.as_f64().is_none());
}

#[test]
fn test_unterminated_quoted_string_is_resilient() {
    let result = parse("name: \"John").unwrap();
    assert!(result.has_errors());
    assert!(!result.is_success());

    let err = result
        .errors
        .iter()
        .find(|e| e.code == Some(ErrorCode::UnterminatedString))
        .expect("unterminated string diagnostic");
    assert_eq!(err.line, 1);

    // The property still exists with the recovered value.
    let props = document_properties(&result);
    assert_eq!(props[0].key, "name");
    assert_eq!(props[0].value.as_str(), Some("John"));
}

#[test]
fn test_canonical_number_emission() {
    let toon = encode(
        r#"{"large":1e6,"small":1e-6,"trailing":1.5000,"zeroFrac":1.0,"negZero":-0.0}"#,
    )
    .unwrap();

    let lines: Vec<&str> = toon.lines().collect();
    assert!(lines.contains(&"large: 1000000"));
    assert!(lines.contains(&"small: 0.000001"));
    assert!(lines.contains(&"trailing: 1.5"));
    assert!(lines.contains(&"zeroFrac: 1"));
    assert!(lines.contains(&"negZero: 0"));
    // No exponent survives in any emitted number.
    for line in &lines {
        let value = line.split(": ").nth(1).unwrap_or("");
        assert!(
            !value.contains(|c| c == 'e' || c == 'E'),
            "exponent leaked: {line}"
        );
    }
    assert!(!toon.contains('\r'));
}

#[test]
fn test_table_emission() {
    let toon = encode(r#"{"users":[{"id":1,"name":"Alice"},{"id":2,"name":"Bob"}]}"#).unwrap();
    assert_eq!(toon, "users[2]{id,name}:\n  1,Alice\n  2,Bob");
}

#[test]
fn test_input_size_boundary() {
    let source = "key: 1234"; // 9 bytes
    let at_limit = ParserOptions::new().with_max_input_size(source.len());
    assert!(toon_syntax::parse_with_options(source, at_limit).is_ok());

    let below = ParserOptions::new().with_max_input_size(source.len() - 1);
    assert!(matches!(
        toon_syntax::parse_with_options(source, below),
        Err(toon_syntax::Error::InputTooLarge { .. })
    ));
}

#[test]
fn test_first_token_position() {
    let result = parse("a: 1").unwrap();
    let first = &result.tokens[0];
    assert_eq!(first.line, 1);
    assert_eq!(first.column, 1);
    assert_eq!(first.offset, 0);
}

#[test]
fn test_zero_row_table_is_success() {
    let result = parse("users[0]{id,name}:").unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);
    let props = document_properties(&result);
    let (schema, rows) = props[0].value.as_table().expect("table");
    assert_eq!(schema, ["id", "name"]);
    assert!(rows.is_empty());
}

#[test]
fn test_declared_size_invariant_on_success() {
    let sources = [
        "xs[3]: 1,2,3",
        "ys[2]:\n  - a\n  - b",
        "zs[2]{id}:\n  1\n  2",
    ];
    for source in sources {
        let result = parse(source).unwrap();
        assert!(result.is_success(), "{source}: {:?}", result.errors);
        let doc = result.document.unwrap();
        doc.walk(&mut |node| match node {
            AstNode::Array {
                declared_size: Some(declared),
                elements,
                ..
            } => assert_eq!(*declared, elements.len(), "{source}"),
            AstNode::TableArray {
                declared_size: Some(declared),
                schema,
                rows,
                ..
            } => {
                assert_eq!(*declared, rows.len(), "{source}");
                for row in rows {
                    assert_eq!(row.len(), schema.len(), "{source}");
                }
            }
            _ => {}
        });
    }
}

#[test]
fn test_spans_are_ordered_and_nested() {
    let source = "user:\n  name: Alice\n  tags[2]: a,b\nitems[2]:\n  - x\n  - y: 1";
    let result = parse(source).unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);

    let doc = result.document.unwrap();
    let doc_span = doc.span();
    doc.walk(&mut |node| {
        let span = node.span();
        assert!(span.start.offset <= span.end.offset);
        assert!(doc_span.start.offset <= span.start.offset);
        assert!(span.end.offset <= doc_span.end.offset);
    });
}

#[test]
fn test_token_length_matches_raw_source() {
    let source = "name: \"A B\"\ncount: 42";
    let result = parse(source).unwrap();
    for token in &result.tokens {
        let end = token.offset + token.length;
        assert!(end <= source.len());
        let raw = &source[token.offset..end];
        assert_eq!(raw.len(), token.length);
    }
}

#[test]
fn test_round_trip_shapes_match() {
    let json = r#"{
        "name": "Ada Lovelace",
        "born": 1815,
        "languages": ["analytical", "poetical"],
        "address": {"city": "London", "country": "UK"},
        "notes": [{"id": 1, "text": "first"}, {"id": 2, "text": "second"}]
    }"#;

    let toon = encode(json).unwrap();
    let result = parse(&toon).unwrap();
    assert!(result.is_success(), "toon:\n{toon}\nerrors: {:?}", result.errors);

    let props = document_properties(&result);
    let keys: Vec<&str> = props.iter().map(|p| p.key.as_str()).collect();
    assert_eq!(keys, ["name", "born", "languages", "address", "notes"]);

    assert_eq!(props[0].value.as_str(), Some("Ada Lovelace"));
    assert_eq!(props[1].value.as_f64(), Some(1815.0));
    let (_, languages) = props[2].value.as_array().expect("array");
    assert_eq!(languages.len(), 2);
    let address = props[3].value.as_object_properties().expect("object");
    assert_eq!(address[0].value.as_str(), Some("London"));
    let (schema, rows) = props[4].value.as_table().expect("table");
    assert_eq!(schema, ["id", "text"]);
    assert_eq!(rows.len(), 2);
}

#[test]
fn test_unquoted_string_appears_verbatim() {
    for value in ["Alice", "alice@example.com", "v1.2.3", "x|y"] {
        let json = format!(r#"{{"k":"{value}"}}"#);
        let toon = encode(&json).unwrap();
        assert!(
            toon.lines().any(|line| line == format!("k: {value}")),
            "expected bare value in {toon:?}"
        );

        let result = parse(&toon).unwrap();
        let props = document_properties(&result);
        assert_eq!(props[0].value.as_str(), Some(value));
    }
}

#[test]
fn test_try_parse_contract() {
    let (ok, result) = try_parse("a: 1");
    assert!(ok);
    assert_eq!(result.status, ParseStatus::Success);

    let (ok, result) = try_parse("broken\na: 1");
    assert!(ok, "errors still mean a usable result");
    assert!(result.has_errors());

    let (ok, result) = try_parse("  \n ");
    assert!(!ok);
    assert_eq!(result.status, ParseStatus::Failure);
    assert!(result.document.is_none());
    assert_eq!(result.errors.len(), 1);
}

#[test]
fn test_error_display_format() {
    let result = parse("nums[3]: 1,2").unwrap();
    let err = result
        .errors
        .iter()
        .find(|e| e.code == Some(ErrorCode::ArraySizeMismatch))
        .expect("size mismatch");
    let rendered = err.to_string();
    assert!(rendered.starts_with("[ArraySizeMismatch] "));
    assert!(rendered.contains("(line 1, column "));
    assert!(rendered.contains("position "));
    assert!(rendered.contains("length "));
}

#[test]
fn test_multiword_values_round_trip_documents() {
    let source = "name: John Doe\nemail: alice@example.com\nmotto: carpe diem omnia";
    let result = parse(source).unwrap();
    assert!(result.is_success());
    let props = document_properties(&result);
    assert_eq!(props[0].value.as_str(), Some("John Doe"));
    assert_eq!(props[1].value.as_str(), Some("alice@example.com"));
    assert_eq!(props[2].value.as_str(), Some("carpe diem omnia"));
}

#[test]
fn test_deeply_nested_document() {
    let source = "a:\n  b:\n    c:\n      d:\n        leaf: 1";
    let result = parse(source).unwrap();
    assert!(result.is_success(), "errors: {:?}", result.errors);

    let mut node = result.document.clone().unwrap();
    for key in ["a", "b", "c", "d"] {
        let props = node.as_object_properties().unwrap().to_vec();
        assert_eq!(props[0].key, key);
        node = props[0].value.clone();
    }
    let leaf = node.as_object_properties().unwrap();
    assert_eq!(leaf[0].key, "leaf");
    assert_eq!(leaf[0].value.as_f64(), Some(1.0));
}

#[test]
fn test_expanded_list_of_objects_round_trip() {
    let json = r#"{"people":[{"name":"Alice","emails":["a@x.com","b@x.com"]},{"name":"Bob","emails":[]}]}"#;
    let toon = encode(json).unwrap();
    let result = parse(&toon).unwrap();
    assert!(result.is_success(), "toon:\n{toon}\nerrors: {:?}", result.errors);

    let props = document_properties(&result);
    let (declared, elements) = props[0].value.as_array().expect("array");
    assert_eq!(declared, Some(2));
    let alice = elements[0].as_object_properties().expect("object");
    assert_eq!(alice[0].value.as_str(), Some("Alice"));
    let (_, emails) = alice[1].value.as_array().expect("array");
    assert_eq!(emails.len(), 2);
}
