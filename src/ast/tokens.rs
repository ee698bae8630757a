/// Token produced by the scanner after the textual desugaring passes.
///
/// By the time the scanner runs, comparisons such as `a=b` have already been
/// rewritten to call syntax, so only four kinds of token remain.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// Opening parenthesis, starts a call (after a word) or a tuple/group
    ///
    /// # Examples
    /// ```text
    /// in(
    /// (
    /// ```
    LParen,

    /// Closing parenthesis
    RParen,

    /// Argument or term separator
    ///
    /// # Examples
    /// ```text
    /// a&b
    /// a|b
    /// f(a,b)
    /// ```
    Delimiter(Delimiter),

    /// Bare token: call name, property name or literal text
    ///
    /// Made of letters, digits and `+ * $ - : % . _`. The literal form may
    /// carry a `converter:` prefix or be a `$N` parameter reference.
    ///
    /// # Examples
    /// ```text
    /// price
    /// string:10
    /// $1
    /// %3Dvalue
    /// ```
    Word(String),

    /// End of input
    Eof,
}

/// Separators recognized between terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    /// `&` - the enclosing group is an `and`
    And,
    /// `|` - the enclosing group is an `or`
    Or,
    /// `,` - plain argument separator
    Comma,
}

impl Delimiter {
    /// Conjunction name implied by this delimiter
    pub fn conjunction(self) -> Option<&'static str> {
        match self {
            Delimiter::And => Some("and"),
            Delimiter::Or => Some("or"),
            Delimiter::Comma => None,
        }
    }
}
