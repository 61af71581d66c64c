/// Lexical tokens of the query language.
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Literals
    /// Integer
    ///
    /// # Examples
    /// ```text
    /// 42
    /// -1
    /// ```
    Integer(i64),

    /// Floating point number
    ///
    /// # Examples
    /// ```text
    /// 3.14
    /// 1e3
    /// ```
    Float(f64),

    /// String literal in single or double quotes
    ///
    /// # Examples
    /// ```text
    /// 'store'
    /// "item #1"
    /// ```
    String(String),

    /// Boolean values
    Boolean(bool),

    /// Null value
    Null,

    /// Regular expression literal with optional flags
    ///
    /// # Examples
    /// ```text
    /// /^h/
    /// /book/i
    /// ```
    Regex { pattern: String, flags: String },

    /// Bare member name
    ///
    /// Letters, digits, underscores and dashes, not starting with a digit or
    /// a dash.
    Identifier(String),

    // References
    /// Root (`$`)
    Dollar,
    /// Current value (`@`)
    At,

    // Structure
    /// `.`
    Dot,
    /// `..`
    DotDot,
    /// `*`
    Star,
    /// `^`
    Caret,
    /// `?`
    Question,
    /// `,`
    Comma,
    /// `:`
    Colon,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `(`
    LParen,
    /// `)`
    RParen,

    // Operators
    /// `!`
    Exclamation,
    /// `==`
    EqEq,
    /// `!=`
    NotEq,
    /// `<`
    Lt,
    /// `<=`
    LtEq,
    /// `>`
    Gt,
    /// `>=`
    GtEq,
    /// `&&`
    And,
    /// `||`
    Or,
    /// `=~`
    Match,

    /// End of input
    Eof,
}
