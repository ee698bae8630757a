use chrono::{TimeZone, Utc};
use rql::coerce::{percent_decode, percent_encode};
use rql::{Converter, ParseError, Value};

fn auto(text: &str) -> Value {
    Converter::Auto.convert(text).unwrap()
}

fn regex_source(converter: Converter, text: &str) -> (String, bool) {
    match converter.convert(text).unwrap() {
        Value::Regex(p) => (p.source().to_string(), p.case_insensitive()),
        other => panic!("expected a regex, got {:?}", other),
    }
}

#[test]
fn test_converter_names() {
    for name in ["auto", "number", "epoch", "isodate", "date", "boolean", "string", "re", "RE", "glob"] {
        let converter = Converter::from_name(name).unwrap();
        assert_eq!(converter.name(), name);
    }
    assert_eq!(Converter::from_name("Re"), None);
    assert_eq!(Converter::from_name("json"), None);
}

#[test]
fn test_auto_keywords() {
    assert_eq!(auto("true"), Value::Boolean(true));
    assert_eq!(auto("false"), Value::Boolean(false));
    assert_eq!(auto("null"), Value::Null);
    assert_eq!(auto("undefined"), Value::Null);
    assert_eq!(auto("Infinity"), Value::Float(f64::INFINITY));
    assert_eq!(auto("-Infinity"), Value::Float(f64::NEG_INFINITY));
}

#[test]
fn test_auto_numbers_must_be_canonical() {
    assert_eq!(auto("10"), Value::Integer(10));
    assert_eq!(auto("-5"), Value::Integer(-5));
    assert_eq!(auto("1.5"), Value::Float(1.5));
    assert_eq!(auto("1.50"), Value::from("1.50"));
    assert_eq!(auto("010"), Value::from("010"));
    assert_eq!(auto("10.0"), Value::from("10.0"));
    assert_eq!(auto("1e3"), Value::from("1e3"));
}

#[test]
fn test_auto_strings() {
    assert_eq!(auto("ten"), Value::from("ten"));
    assert_eq!(auto("a%20b"), Value::from("a b"));
    assert_eq!(auto("%27a%20b%27"), Value::from("a b"));
    assert_eq!(auto(""), Value::from(""));
}

#[test]
fn test_number() {
    let number = |text| Converter::Number.convert(text).unwrap();
    assert_eq!(number(""), Value::Integer(0));
    assert_eq!(number("10"), Value::Integer(10));
    assert_eq!(number("10.0"), Value::Float(10.0));
    assert_eq!(number("1e3"), Value::Float(1000.0));
    assert!(matches!(
        Converter::Number.convert("abc"),
        Err(ParseError::InvalidLiteral(_))
    ));
}

#[test]
fn test_string_and_boolean() {
    assert_eq!(Converter::String.convert("10").unwrap(), Value::from("10"));
    assert_eq!(Converter::String.convert("a%2Fb").unwrap(), Value::from("a/b"));
    assert_eq!(Converter::Boolean.convert("true").unwrap(), Value::Boolean(true));
    assert_eq!(Converter::Boolean.convert("yes").unwrap(), Value::Boolean(false));
}

#[test]
fn test_dates() {
    assert_eq!(
        Converter::Epoch.convert("0").unwrap(),
        Value::Date(Utc.timestamp_millis_opt(0).unwrap())
    );
    assert_eq!(
        Converter::IsoDate.convert("2009").unwrap(),
        Value::Date(Utc.with_ymd_and_hms(2009, 1, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
        Converter::IsoDate.convert("2009-05").unwrap(),
        Value::Date(Utc.with_ymd_and_hms(2009, 5, 1, 0, 0, 0).unwrap())
    );
    assert_eq!(
        Converter::Date.convert("2009-05-06T07:08:09Z").unwrap(),
        Value::Date(Utc.with_ymd_and_hms(2009, 5, 6, 7, 8, 9).unwrap())
    );
    assert!(Converter::Date.convert("yesterday").is_err());
    assert!(Converter::Epoch.convert("soon").is_err());
}

#[test]
fn test_regexes() {
    assert_eq!(regex_source(Converter::Regex, "%5Et"), ("^t".to_string(), true));
    assert_eq!(regex_source(Converter::RegexCaseSensitive, "^T"), ("^T".to_string(), false));

    let Value::Regex(ci) = Converter::Regex.convert("^T").unwrap() else {
        panic!("expected a regex");
    };
    assert!(ci.is_match("ten"));
    let Value::Regex(cs) = Converter::RegexCaseSensitive.convert("^T").unwrap() else {
        panic!("expected a regex");
    };
    assert!(!cs.is_match("ten"));

    assert!(Converter::Regex.convert("(").is_err());
}

#[test]
fn test_glob() {
    assert_eq!(regex_source(Converter::Glob, "t*"), ("^t".to_string(), true));
    assert_eq!(regex_source(Converter::Glob, "*x"), ("x$".to_string(), true));
    assert_eq!(regex_source(Converter::Glob, "a?c"), ("^a.?c$".to_string(), true));
    assert_eq!(regex_source(Converter::Glob, "a.b"), (r"^a\.b$".to_string(), true));
}

#[test]
fn test_percent_codec() {
    assert_eq!(percent_encode("a b(c)"), "a%20b%28c%29");
    assert_eq!(percent_encode("x-y_z.w*"), "x-y_z.w*");
    assert_eq!(percent_encode("é"), "%C3%A9");
    assert_eq!(percent_decode("%C3%A9").unwrap(), "é");
    assert_eq!(percent_decode("plain").unwrap(), "plain");
    assert!(percent_decode("%zz").is_err());
    assert!(percent_decode("%4").is_err());
}
