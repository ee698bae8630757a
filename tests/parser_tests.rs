use chrono::{Duration, TimeZone, Utc};
use rql::{Arg, ParseError, Parser, ParserConfig, Query, Value, parse, parse_gently, parse_with_parameters};

fn call(name: &str, args: Vec<Arg>) -> Arg {
    Arg::Call(Query::call(name, args))
}

fn root(name: &str, args: Vec<Arg>) -> Query {
    Query::call(name, args)
}

fn s(text: &str) -> Arg {
    Arg::from(text)
}

fn tuple(items: Vec<Arg>) -> Arg {
    Arg::Tuple(items)
}

fn parses_to(input: &str, expected: Query) {
    let actual = parse(input).unwrap_or_else(|e| panic!("{} failed: {}", input, e));
    assert_eq!(actual.without_cache(), expected, "parsing {}", input);
}

fn same_tree(a: &str, b: &str) {
    assert_eq!(parse(a).unwrap(), parse(b).unwrap(), "{} vs {}", a, b);
}

#[test]
fn test_empty_query() {
    let query = parse("").unwrap();
    assert_eq!(query.name, "and");
    assert!(query.args.is_empty());
    assert!(query.cache.is_empty());
}

#[test]
fn test_bare_values_and_tuples() {
    parses_to("a", root("and", vec![s("a")]));
    parses_to("(a)", root("and", vec![tuple(vec![s("a")])]));
    parses_to("a,b,c", root("and", vec![s("a"), s("b"), s("c")]));
    parses_to("(a,b,c)", root("and", vec![tuple(vec![s("a"), s("b"), s("c")])]));
}

#[test]
fn test_calls() {
    parses_to("a(b)", root("and", vec![call("a", vec![s("b")])]));
    parses_to("a(b,c)", root("and", vec![call("a", vec![s("b"), s("c")])]));
    parses_to(
        "a((b),c)",
        root("and", vec![call("a", vec![tuple(vec![s("b")]), s("c")])]),
    );
    parses_to(
        "a((b,c),d)",
        root("and", vec![call("a", vec![tuple(vec![s("b"), s("c")]), s("d")])]),
    );
    parses_to(
        "a(b)&c(d(e))",
        root(
            "and",
            vec![
                call("a", vec![s("b")]),
                call("c", vec![call("d", vec![s("e")])]),
            ],
        ),
    );
}

#[test]
fn test_slash_paths_become_tuples() {
    parses_to(
        "a(b/c,d)",
        root("and", vec![call("a", vec![tuple(vec![s("b"), s("c")]), s("d")])]),
    );
    parses_to(
        "nested/property=value",
        root(
            "and",
            vec![call("eq", vec![tuple(vec![s("nested"), s("property")]), s("value")])],
        ),
    );
}

#[test]
fn test_dotted_names_stay_single_tokens() {
    parses_to(
        "foo.bar=3",
        root("and", vec![call("eq", vec![s("foo.bar"), Arg::from(3)])]),
    );
}

#[test]
fn test_fiql_equivalence() {
    parses_to("a=b", root("and", vec![call("eq", vec![s("a"), s("b")])]));
    same_tree("a=b", "eq(a,b)");
    same_tree("a=eq=b", "eq(a,b)");
    same_tree("a==b", "eq(a,b)");
    same_tree("a!=b", "ne(a,b)");
    same_tree("a=ne=b", "ne(a,b)");
    same_tree("a<b", "lt(a,b)");
    same_tree("a<=b", "le(a,b)");
    same_tree("a>b", "gt(a,b)");
    same_tree("a>=b", "ge(a,b)");
}

#[test]
fn test_escaped_angle_brackets() {
    same_tree("a%3Cb", "lt(a,b)");
    same_tree("a%3C=b", "le(a,b)");
    same_tree("a%3Eb", "gt(a,b)");
    same_tree("a%3E=b", "ge(a,b)");
}

#[test]
fn test_escaped_angle_brackets_can_be_disabled() {
    let parser = Parser::new(ParserConfig {
        json_query_compatible: false,
        ..ParserConfig::default()
    });
    let query = parser.parse("eq(a,b%3Cc)", None).unwrap();
    assert_eq!(query.args, vec![call("eq", vec![s("a"), s("b<c")])]);
}

#[test]
fn test_nested_comparisons() {
    same_tree("a(b(c=le=d))", "a(b(le(c,d)))");
    same_tree("a(b(c<=d))", "a(b(le(c,d)))");
    parses_to(
        "a(b(c<d,e(f=g)))",
        root(
            "and",
            vec![call(
                "a",
                vec![call(
                    "b",
                    vec![
                        call("lt", vec![s("c"), s("d")]),
                        call("e", vec![call("eq", vec![s("f"), s("g")])]),
                    ],
                )],
            )],
        ),
    );
}

#[test]
fn test_arbitrary_fiql_operator() {
    parses_to("a=b=c", root("and", vec![call("b", vec![s("a"), s("c")])]));
    parses_to(
        "a(b=cd=e)",
        root("and", vec![call("a", vec![call("cd", vec![s("b"), s("e")])])]),
    );
}

#[test]
fn test_and_grouping() {
    parses_to("a&b&c", root("and", vec![s("a"), s("b"), s("c")]));
    parses_to("a(b)&c", root("and", vec![call("a", vec![s("b")]), s("c")]));
    parses_to(
        "a&(b&c)",
        root("and", vec![s("a"), call("and", vec![s("b"), s("c")])]),
    );
}

#[test]
fn test_or_grouping() {
    parses_to(
        "(a|b|c)",
        root("and", vec![call("or", vec![s("a"), s("b"), s("c")])]),
    );
    parses_to(
        "(a(b)|c)",
        root("and", vec![call("or", vec![call("a", vec![s("b")]), s("c")])]),
    );
}

#[test]
fn test_complex_grouping() {
    parses_to(
        "a&(b|c)",
        root("and", vec![s("a"), call("or", vec![s("b"), s("c")])]),
    );
    parses_to(
        "a|(b&c)",
        root("or", vec![s("a"), call("and", vec![s("b"), s("c")])]),
    );
    parses_to(
        "(a=b|c=d)&(e=f|g=1)",
        root(
            "and",
            vec![
                call(
                    "or",
                    vec![
                        call("eq", vec![s("a"), s("b")]),
                        call("eq", vec![s("c"), s("d")]),
                    ],
                ),
                call(
                    "or",
                    vec![
                        call("eq", vec![s("e"), s("f")]),
                        call("eq", vec![s("g"), Arg::from(1)]),
                    ],
                ),
            ],
        ),
    );
}

#[test]
fn test_mixed_conjunctions_fail() {
    let err = parse("a&b|c").unwrap_err();
    assert!(matches!(err, ParseError::Syntax(ref msg) if msg.starts_with("Can not mix conjunctions")));
}

#[test]
fn test_syntax_errors() {
    assert_eq!(
        parse("?a=b").unwrap_err(),
        ParseError::Syntax("Query must not start with ?".to_string())
    );
    assert_eq!(
        parse("a(b").unwrap_err(),
        ParseError::Syntax("Opening parenthesis without a closing parenthesis".to_string())
    );
    assert_eq!(
        parse("a)b").unwrap_err(),
        ParseError::Syntax("Closing parenthesis without an opening parenthesis".to_string())
    );
    assert!(matches!(parse("a b").unwrap_err(), ParseError::Syntax(ref msg) if msg.contains("Illegal character")));
}

#[test]
fn test_string_coercion() {
    parses_to("a(string)", root("and", vec![call("a", vec![s("string")])]));
    parses_to("a(string:b)", root("and", vec![call("a", vec![s("b")])]));
    parses_to("a(string:1)", root("and", vec![call("a", vec![s("1")])]));
}

#[test]
fn test_number_coercion() {
    parses_to("a(number)", root("and", vec![call("a", vec![s("number")])]));
    parses_to("a(number:1)", root("and", vec![call("a", vec![Arg::from(1)])]));
    assert!(matches!(parse("a(number:b)").unwrap_err(), ParseError::InvalidLiteral(_)));
}

#[test]
fn test_date_coercion() {
    let date = |y, mo, d, h, mi, sec| Arg::from(Utc.with_ymd_and_hms(y, mo, d, h, mi, sec).unwrap());

    parses_to("a(date)", root("and", vec![call("a", vec![s("date")])]));
    parses_to("a(date:2009)", root("and", vec![call("a", vec![date(2009, 1, 1, 0, 0, 0)])]));
    parses_to(
        "a(date:1989-11-21)",
        root("and", vec![call("a", vec![date(1989, 11, 21, 0, 0, 0)])]),
    );
    parses_to(
        "a(date:1989-11-21T00:21:00Z)",
        root("and", vec![call("a", vec![date(1989, 11, 21, 0, 21, 0)])]),
    );

    let with_millis = Utc.with_ymd_and_hms(1989, 11, 21, 0, 21, 0).unwrap() + Duration::milliseconds(21);
    parses_to(
        "a(date:1989-11-21T00:21:00.21Z)",
        root("and", vec![call("a", vec![Arg::from(with_millis)])]),
    );
}

#[test]
fn test_boolean_and_null_coercion() {
    parses_to("a(true)", root("and", vec![call("a", vec![Arg::from(true)])]));
    parses_to("a(false)", root("and", vec![call("a", vec![Arg::from(false)])]));
    parses_to("a(boolean:true)", root("and", vec![call("a", vec![Arg::from(true)])]));
    parses_to("a(null)", root("and", vec![call("a", vec![Arg::Value(Value::Null)])]));
    parses_to("a(auto:null)", root("and", vec![call("a", vec![Arg::Value(Value::Null)])]));
    parses_to("a(string:null)", root("and", vec![call("a", vec![s("null")])]));
}

#[test]
fn test_unknown_converter() {
    assert_eq!(
        parse("a(foo:b)").unwrap_err(),
        ParseError::InvalidLiteral("Unknown converter foo".to_string())
    );
}

#[test]
fn test_cache_records_last_seen_arguments() {
    let query = parse("select(sub.name)").unwrap();
    assert_eq!(query.cache.get("select"), Some(&[s("sub.name")][..]));

    let query = parse("sort(-price)&limit(10)&sort(name)").unwrap();
    assert_eq!(query.cache.get("sort"), Some(&[s("name")][..]));
    assert_eq!(query.cache.get("limit"), Some(&[Arg::from(10)][..]));
    assert_eq!(query.cache.get("values"), None);
}

#[test]
fn test_cached_operators_are_configurable() {
    let parser = Parser::new(ParserConfig {
        cached_operators: vec!["aggregate".to_string()],
        ..ParserConfig::default()
    });
    let query = parser.parse("sort(name)&aggregate(name)", None).unwrap();
    assert_eq!(query.cache.get("sort"), None);
    assert_eq!(query.cache.get("aggregate"), Some(&[s("name")][..]));
}

#[test]
fn test_bound_parameters() {
    let params = [Value::from(vec!["a", "b", "c"])];
    let query = parse_with_parameters("in(id,$1)", &params).unwrap();
    assert_eq!(
        query,
        root(
            "and",
            vec![call("in", vec![s("id"), tuple(vec![s("a"), s("b"), s("c")])])],
        )
    );

    let query = parse_with_parameters("eq(id,$1)", &[Value::from("a")]).unwrap();
    assert_eq!(query.args, vec![call("eq", vec![s("id"), s("a")])]);
    assert_eq!(query.cache.primary_key(), Some("a"));
}

#[test]
fn test_bound_nested_arrays_become_tuples() {
    let params = [Value::Array(vec![Value::from(1), Value::from(vec![2, 3])])];
    let query = parse_with_parameters("in(id,$1)", &params).unwrap();
    let two_three = tuple(vec![Arg::from(2), Arg::from(3)]);
    assert_eq!(
        query.args,
        vec![call("in", vec![s("id"), tuple(vec![Arg::from(1), two_three])])]
    );
}

#[test]
fn test_missing_parameter_is_null() {
    let query = parse_with_parameters("eq(a,$2)", &[Value::from("x")]).unwrap();
    assert_eq!(query.args, vec![call("eq", vec![s("a"), Arg::Value(Value::Null)])]);
}

#[test]
fn test_unbound_parameters_stay_in_tree() {
    let query = parse("price=lt=$1").unwrap();
    assert_eq!(query.args, vec![call("lt", vec![s("price"), Arg::Param(1)])]);
}

#[test]
fn test_primary_key_cache() {
    let query = parse("id=5").unwrap();
    assert_eq!(query.cache.primary_key(), Some("5"));
    assert_eq!(query.cache.primary_key_field(), Some("id"));

    let query = parse("(id=7|name=x)").unwrap();
    assert_eq!(query.cache.primary_key(), Some("7"));

    let query = parse("id=re:abc").unwrap();
    assert_eq!(query.cache.primary_key(), None);

    let parser = Parser::new(ParserConfig {
        primary_key: "_id".to_string(),
        ..ParserConfig::default()
    });
    assert_eq!(parser.parse("_id=x&id=y", None).unwrap().cache.primary_key(), Some("x"));
}

#[test]
fn test_gentle_parse() {
    let query = parse_gently("a(b");
    assert_eq!(query.name, "and");
    assert!(query.args.is_empty());
    assert_eq!(
        query.error.as_deref(),
        Some("Syntax error: Opening parenthesis without a closing parenthesis")
    );

    let query = parse_gently("a=b");
    assert_eq!(query.error, None);
    assert_eq!(query.args, vec![call("eq", vec![s("a"), s("b")])]);
}

#[test]
fn test_shorthand() {
    let query = Parser::default().parse_shorthand([("id", Value::from("a")), ("price", Value::from(10))]);
    assert_eq!(
        query.args,
        vec![
            call("eq", vec![s("id"), s("a")]),
            call("eq", vec![s("price"), Arg::from(10)]),
        ]
    );
    assert_eq!(query.cache.primary_key(), Some("a"));
}

#[test]
fn test_walk_visits_leaf_terms() {
    let query = parse("(a=1|b=2)&sort(c)").unwrap();
    let mut seen = Vec::new();
    query.walk(&mut |name: &str, args: &[Arg]| seen.push((name.to_string(), args.len())));
    assert_eq!(
        seen,
        vec![
            ("eq".to_string(), 2),
            ("eq".to_string(), 2),
            ("sort".to_string(), 1),
        ]
    );
}
