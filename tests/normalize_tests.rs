use rql::{Arg, NormalizeOptions, Normalized, normalize, parse};

fn normalized(query: &str) -> Normalized {
    normalize(&parse(query).unwrap(), &NormalizeOptions::default())
}

fn weights(pairs: &[(&str, i8)]) -> Vec<(String, i8)> {
    pairs.iter().map(|(field, weight)| (field.to_string(), *weight)).collect()
}

#[test]
fn test_empty_query() {
    let n = normalized("");
    assert_eq!(n, Normalized::default());
    assert_eq!(n.limit, None);
    assert!(!n.needs_count);
}

#[test]
fn test_sort() {
    let n = normalized("sort(-price,+name,date)");
    assert_eq!(n.sort, vec![Arg::from("-price"), Arg::from("+name"), Arg::from("date")]);
    assert_eq!(n.sort_ordered, weights(&[("price", -1), ("name", 1), ("date", 1)]));
    assert_eq!(n.sort_by_field.get("price"), Some(&-1));
    assert_eq!(n.sort_by_field.get("name"), Some(&1));
}

#[test]
fn test_sort_on_nested_paths() {
    let n = normalized("sort(-a/b)");
    assert_eq!(n.sort_ordered, weights(&[("a.b", -1)]));
}

#[test]
fn test_select_and_unselect() {
    let n = normalized("select(name,-tags)&unselect(secret)");
    assert_eq!(n.select_ordered, weights(&[("name", 1), ("tags", 0), ("secret", 0)]));
    assert_eq!(n.select_by_field.get("name"), Some(&1));
    assert_eq!(n.select_by_field.get("tags"), Some(&0));
    assert_eq!(n.select_by_field.get("secret"), Some(&0));
}

#[test]
fn test_limit() {
    let n = normalized("limit(10,20,100)");
    assert_eq!(n.limit, Some(10));
    assert_eq!(n.skip, 20);
    assert_eq!(n.total_count_cap, Some(100));
    assert!(n.needs_count);

    let n = normalized("limit(abc)");
    assert_eq!(n.limit, Some(0));
    assert_eq!(n.skip, 0);
}

#[test]
fn test_hard_limit_caps_requested_limit() {
    let options = NormalizeOptions {
        hard_limit: Some(5),
        ..NormalizeOptions::default()
    };
    let n = normalize(&parse("limit(10,3)").unwrap(), &options);
    assert_eq!(n.limit, Some(5));
    assert_eq!(n.skip, 3);

    let n = normalize(&parse("limit(2)").unwrap(), &options);
    assert_eq!(n.limit, Some(2));
}

#[test]
fn test_values_flag() {
    assert!(normalized("values(name)").values);
    assert!(!normalized("select(name)").values);
}

#[test]
fn test_primary_key_equality() {
    assert_eq!(normalized("id=abc").primary_key_equality.as_deref(), Some("abc"));
    assert_eq!(normalized("id=5").primary_key_equality.as_deref(), Some("5"));
    assert_eq!(normalized("id=true").primary_key_equality, None);
    assert_eq!(normalized("name=abc").primary_key_equality, None);
    assert_eq!(normalized("(a=1|id=7)&sort(name)").primary_key_equality.as_deref(), Some("7"));

    let options = NormalizeOptions {
        primary_key: "_id".to_string(),
        ..NormalizeOptions::default()
    };
    let n = normalize(&parse("_id=x&id=y").unwrap(), &options);
    assert_eq!(n.primary_key_equality.as_deref(), Some("x"));
}

#[test]
fn test_nested_groups_are_walked() {
    let n = normalized("and(sort(name),limit(3))");
    assert_eq!(n.sort_ordered, weights(&[("name", 1)]));
    assert_eq!(n.limit, Some(3));
}

#[test]
fn test_normalize_is_stable() {
    let query = parse("sort(-price)&select(name)&limit(10,20)&id=1").unwrap();
    let options = NormalizeOptions::default();
    assert_eq!(normalize(&query, &options), normalize(&query, &options));
}
