//! Documentation content for the rql CLI

use super::CliError;

/// Available documentation categories
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocCategory {
    Grammar,
    Operators,
    Converters,
    Paging,
}

impl DocCategory {
    /// Parse category name from string
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "grammar" | "syntax" => Some(Self::Grammar),
            "operators" | "ops" => Some(Self::Operators),
            "converters" | "literals" | "types" => Some(Self::Converters),
            "paging" | "limit" | "normalize" => Some(Self::Paging),
            _ => None,
        }
    }
}

/// Get the docs overview (category listing)
pub fn get_docs_overview() -> &'static str {
    r#"RQL DOCUMENTATION

RQL is a URL-safe query language for filtering, sorting, projecting and
aggregating collections of JSON records. Queries are plain text that fits in
a URL query string.

DOCUMENTATION CATEGORIES

  grammar           Calls, conjunctions, tuples and the FIQL shorthand
  operators         Filtering, projection, sorting, aggregation and reducers
  converters        How literal text becomes typed values
  paging            limit(), page metadata and normalized descriptors

QUICK REFERENCE

  price=lt=10             Comparison (FIQL form of lt(price,10))
  a=1&b=2                 Both must hold
  (a=1|b=2)&c=3           Group alternatives with parentheses
  in(price,(5,10))        Tuple literal
  sort(-price)&limit(10)  Order and page
  count()                 Scalar result

Run 'rql doc <category>' for detailed documentation.
"#
}

/// Get documentation for a specific category
pub fn get_doc_category(name: &str) -> Result<&'static str, CliError> {
    match DocCategory::from_name(name) {
        Some(DocCategory::Grammar) => Ok(GRAMMAR_DOC),
        Some(DocCategory::Operators) => Ok(OPERATORS_DOC),
        Some(DocCategory::Converters) => Ok(CONVERTERS_DOC),
        Some(DocCategory::Paging) => Ok(PAGING_DOC),
        None => Err(CliError::UnknownCategory(name.to_string())),
    }
}

const GRAMMAR_DOC: &str = r#"GRAMMAR - Calls, Conjunctions and Shorthand

CALLS
  name(arg,arg,...)
    Every term is a call. Arguments are literals, tuples or nested calls.

    Example:
      Query:  and(eq(name,ten),lt(price,20))

CONJUNCTIONS
  a&b     and(a,b)
  a|b     or(a,b)

    '&' and '|' may not be mixed within one group. Use parentheses:

      (a=1|b=2)&c=3       and(or(eq(a,1),eq(b,2)),eq(c,3))
      a=1&b=2|c=3         syntax error

TUPLES
  (a,b,c)
    An unnamed parenthesized list is a literal array, not a call.

    Example:
      Query:  in(price,(5,10,15))

COMPARISONS (FIQL)
  property=value          eq(property,value)
  property==value         eq(property,value)
  property!=value         ne(property,value)
  property<value          lt(property,value)
  property<=value         le(property,value)
  property>value          gt(property,value)
  property>=value         ge(property,value)
  property=name=value     name(property,value)

    %3C and %3E (escaped < and >) are accepted in place of < and >.

PROPERTY PATHS
  nested/property=value   eq((nested,property),value)
    Slash-separated names become a tuple path into nested records.
    A dotted name such as path.1 is a single key.

PARAMETERS
  eq(id,$1)
    $N refers to the N-th parameter (1-based), given with --param.
"#;

const OPERATORS_DOC: &str = r#"OPERATORS - Filtering, Projection and Reducers

COMPARISON
  eq ne lt le gt ge       eq(price,10)   lt(price,10)
    Records whose property is absent never match.

FILTERS
  match(prop,pattern)     Regular-expression test (match(name,glob:t*))
  in(prop,(v,...))        Property is one of the values
  out(prop,(v,...))       Property is none of the values
  between(prop,(lo,hi))   lo <= property < hi
  contains(prop,value)    Array property holds the value
  contains(prop,term)     Some element satisfies term: contains(tags,ne(fun))
  excludes(prop,value)    Array property does not hold the value

    With a single argument the whole record is compared: contains(fun)

COMBINATORS
  and(term,...)           Each term filters the result of the previous one
  or(term,...)            Union of each term over the original records

PROJECTION
  select(a,b)             Keep only the named fields
  unselect(a,b)           Drop the named fields
  values(a)               Emit the raw value of one field per record
  values(a,b)             Emit [a,b] per record

ORDERING AND SHAPE
  sort(-price,+name)      Stable multi-key sort (- descending)
  distinct()              Drop duplicate records
  recurse(children)       Flatten a nested chain into one list
  aggregate(name,sum(price))
                          One record per distinct name, with each
                          aggregator's result under "0", "1", ...

REDUCERS (scalar results)
  sum(prop) mean(prop) max(prop) min(prop)
  count() first() one()

    one() fails when more than one record remains.
"#;

const CONVERTERS_DOC: &str = r#"CONVERTERS - Typed Literals

Every literal is converted by a named converter. Prefix a literal with
'name:' to pick one; otherwise 'auto' applies.

  auto        true false null undefined Infinity -Infinity, numbers
              written canonically (10, 1.5), 'quoted' strings, else text
  number      number:10.0           any numeric text
  string      string:10             text, never reinterpreted
  boolean     boolean:true          true only for 'true'
  date        date:2009-01-01       ISO-8601 date or timestamp (UTC)
  isodate     isodate:2009          partial ISO date, completed with zeros
  epoch       epoch:1230768000000   milliseconds since the epoch
  re          re:^t                 case-insensitive regular expression
  RE          RE:^T                 case-sensitive regular expression
  glob        glob:t*               shell-style pattern, case-insensitive

Literals are percent-decoded: with%2Fslash is the text 'with/slash'.
"#;

const PAGING_DOC: &str = r#"PAGING - limit() and Normalized Descriptors

LIMIT
  limit(count)                First count records
  limit(count,skip)           count records after skipping skip
  limit(count,skip,max)       Also report the page position:

    {"items": [...], "start": skip, "end": last index, "totalCount": n}

    totalCount is capped at max.

NORMALIZE
  rql normalize 'sort(-price)&select(name)&limit(10,20)'

    Extracts what a storage backend needs: sort and select fields with
    their weights, limit, skip, the total-count cap, whether values() was
    requested and the id of an eq(id,...) lookup.

    --hard-limit N caps the requested limit.
    --primary-key K names the id field (default: id).
"#;
