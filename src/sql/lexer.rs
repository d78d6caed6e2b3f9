// SQL Lexer
use crate::error::{Error, Result};
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Select,
    Distinct,
    Top,
    From,
    Where,
    Group,
    By,
    Having,
    Order,
    Asc,
    Desc,
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Create,
    Drop,
    Alter,
    Table,
    Database,
    Add,
    Column,
    Use,
    Join,
    Inner,
    Left,
    Right,
    Full,
    Outer,
    Cross,
    On,
    As,
    And,
    Or,
    Not,
    In,
    Between,
    Like,
    Is,
    Null,
    True,
    False,
    Primary,
    Key,
    Identity,
    Default,
    Constraint,
    Case,
    When,
    Then,
    Else,
    End,
    If,
    Exists,
    Cast,

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Equal,
    NotEqual,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,

    // Delimiters
    LeftParen,
    RightParen,
    Comma,
    Semicolon,
    Dot,

    // Literals
    IntegerLiteral(i64),
    DecimalLiteral(f64),
    StringLiteral(String),
    Identifier(String),
    /// `[name]` or `"name"`; never treated as a keyword
    QuotedIdentifier(String),

    Eof,
}

impl Token {
    /// Source-like rendering used in syntax error messages.
    pub fn describe(&self) -> String {
        match self {
            Token::Identifier(s) => s.clone(),
            Token::QuotedIdentifier(s) => format!("[{}]", s),
            Token::IntegerLiteral(n) => n.to_string(),
            Token::DecimalLiteral(n) => n.to_string(),
            Token::StringLiteral(s) => format!("'{}'", s),
            Token::Plus => "+".to_string(),
            Token::Minus => "-".to_string(),
            Token::Star => "*".to_string(),
            Token::Slash => "/".to_string(),
            Token::Percent => "%".to_string(),
            Token::Equal => "=".to_string(),
            Token::NotEqual => "<>".to_string(),
            Token::Less => "<".to_string(),
            Token::Greater => ">".to_string(),
            Token::LessEqual => "<=".to_string(),
            Token::GreaterEqual => ">=".to_string(),
            Token::LeftParen => "(".to_string(),
            Token::RightParen => ")".to_string(),
            Token::Comma => ",".to_string(),
            Token::Semicolon => ";".to_string(),
            Token::Dot => ".".to_string(),
            Token::Eof => "end of input".to_string(),
            keyword => format!("{:?}", keyword).to_uppercase(),
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// A token plus the 1-based line/column and the byte offset where it starts.
#[derive(Debug, Clone, PartialEq)]
pub struct Spanned {
    pub token: Token,
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

fn keyword(word: &str) -> Option<Token> {
    let token = match word.to_uppercase().as_str() {
        "SELECT" => Token::Select,
        "DISTINCT" => Token::Distinct,
        "TOP" => Token::Top,
        "FROM" => Token::From,
        "WHERE" => Token::Where,
        "GROUP" => Token::Group,
        "BY" => Token::By,
        "HAVING" => Token::Having,
        "ORDER" => Token::Order,
        "ASC" => Token::Asc,
        "DESC" => Token::Desc,
        "INSERT" => Token::Insert,
        "INTO" => Token::Into,
        "VALUES" => Token::Values,
        "UPDATE" => Token::Update,
        "SET" => Token::Set,
        "DELETE" => Token::Delete,
        "CREATE" => Token::Create,
        "DROP" => Token::Drop,
        "ALTER" => Token::Alter,
        "TABLE" => Token::Table,
        "DATABASE" => Token::Database,
        "ADD" => Token::Add,
        "COLUMN" => Token::Column,
        "USE" => Token::Use,
        "JOIN" => Token::Join,
        "INNER" => Token::Inner,
        "LEFT" => Token::Left,
        "RIGHT" => Token::Right,
        "FULL" => Token::Full,
        "OUTER" => Token::Outer,
        "CROSS" => Token::Cross,
        "ON" => Token::On,
        "AS" => Token::As,
        "AND" => Token::And,
        "OR" => Token::Or,
        "NOT" => Token::Not,
        "IN" => Token::In,
        "BETWEEN" => Token::Between,
        "LIKE" => Token::Like,
        "IS" => Token::Is,
        "NULL" => Token::Null,
        "TRUE" => Token::True,
        "FALSE" => Token::False,
        "PRIMARY" => Token::Primary,
        "KEY" => Token::Key,
        "IDENTITY" => Token::Identity,
        "DEFAULT" => Token::Default,
        "CONSTRAINT" => Token::Constraint,
        "CASE" => Token::Case,
        "WHEN" => Token::When,
        "THEN" => Token::Then,
        "ELSE" => Token::Else,
        "END" => Token::End,
        "IF" => Token::If,
        "EXISTS" => Token::Exists,
        "CAST" => Token::Cast,
        _ => return None,
    };
    Some(token)
}

pub struct Lexer {
    input: Vec<char>,
    position: usize,
    offset: usize,
    current_char: Option<char>,
    line: usize,
    column: usize,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Lexer {
            input: chars,
            position: 0,
            offset: 0,
            current_char,
            line: 1,
            column: 1,
        }
    }

    fn advance(&mut self) {
        if self.current_char == Some('\n') {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        self.offset += self.current_char.map_or(0, char::len_utf8);
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn peek(&self, offset: usize) -> Option<char> {
        self.input.get(self.position + offset).copied()
    }

    fn error(&self, near: impl Into<String>, line: usize, column: usize, message: &str) -> Error {
        Error::Syntax {
            message: message.to_string(),
            near: near.into(),
            line,
            column,
        }
    }

    /// Skip whitespace, `--` line comments and `/* */` block comments.
    fn skip_trivia(&mut self) -> Result<()> {
        loop {
            match self.current_char {
                Some(ch) if ch.is_whitespace() => self.advance(),
                Some('-') if self.peek(1) == Some('-') => {
                    while let Some(ch) = self.current_char {
                        if ch == '\n' {
                            break;
                        }
                        self.advance();
                    }
                }
                Some('/') if self.peek(1) == Some('*') => {
                    let (line, column) = (self.line, self.column);
                    self.advance();
                    self.advance();
                    loop {
                        match self.current_char {
                            None => {
                                return Err(self.error("/*", line, column, "unterminated comment"))
                            }
                            Some('*') if self.peek(1) == Some('/') => {
                                self.advance();
                                self.advance();
                                break;
                            }
                            Some(_) => self.advance(),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        let mut num_str = String::new();
        let mut is_decimal = false;

        while let Some(ch) = self.current_char {
            if ch.is_ascii_digit() {
                num_str.push(ch);
                self.advance();
            } else if ch == '.' && !is_decimal {
                is_decimal = true;
                num_str.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        if is_decimal {
            num_str
                .parse()
                .map(Token::DecimalLiteral)
                .map_err(|_| self.error(num_str.clone(), line, column, "invalid number"))
        } else {
            num_str
                .parse()
                .map(Token::IntegerLiteral)
                .map_err(|_| self.error(num_str.clone(), line, column, "integer literal out of range"))
        }
    }

    fn read_string(&mut self) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        let mut string = String::new();
        self.advance(); // opening quote

        loop {
            match self.current_char {
                None => {
                    return Err(self.error(
                        format!("'{}", string),
                        line,
                        column,
                        "unclosed quotation mark after the character string",
                    ))
                }
                Some('\'') if self.peek(1) == Some('\'') => {
                    string.push('\'');
                    self.advance();
                    self.advance();
                }
                Some('\'') => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    string.push(ch);
                    self.advance();
                }
            }
        }

        Ok(Token::StringLiteral(string))
    }

    fn read_quoted_identifier(&mut self, close: char) -> Result<Token> {
        let (line, column) = (self.line, self.column);
        let mut ident = String::new();
        self.advance();

        loop {
            match self.current_char {
                None => {
                    return Err(self.error(ident, line, column, "unterminated quoted identifier"))
                }
                Some(ch) if ch == close => {
                    self.advance();
                    break;
                }
                Some(ch) => {
                    ident.push(ch);
                    self.advance();
                }
            }
        }

        if ident.is_empty() {
            return Err(self.error("", line, column, "empty identifier"));
        }
        Ok(Token::QuotedIdentifier(ident))
    }

    fn read_identifier(&mut self) -> Token {
        let mut ident = String::new();

        while let Some(ch) = self.current_char {
            if ch.is_alphanumeric() || ch == '_' || ch == '@' || ch == '#' {
                ident.push(ch);
                self.advance();
            } else {
                break;
            }
        }

        keyword(&ident).unwrap_or(Token::Identifier(ident))
    }

    fn single(&mut self, token: Token) -> Token {
        self.advance();
        token
    }

    pub fn next_token(&mut self) -> Result<Spanned> {
        self.skip_trivia()?;
        let (line, column, offset) = (self.line, self.column, self.offset);

        let token = match self.current_char {
            None => Token::Eof,
            Some(ch) => match ch {
                '+' => self.single(Token::Plus),
                '-' => self.single(Token::Minus),
                '*' => self.single(Token::Star),
                '/' => self.single(Token::Slash),
                '%' => self.single(Token::Percent),
                '=' => self.single(Token::Equal),
                '(' => self.single(Token::LeftParen),
                ')' => self.single(Token::RightParen),
                ',' => self.single(Token::Comma),
                ';' => self.single(Token::Semicolon),
                '.' if !self.peek(1).is_some_and(|c| c.is_ascii_digit()) => self.single(Token::Dot),
                '<' => {
                    self.advance();
                    match self.current_char {
                        Some('=') => self.single(Token::LessEqual),
                        Some('>') => self.single(Token::NotEqual),
                        _ => Token::Less,
                    }
                }
                '>' => {
                    self.advance();
                    if self.current_char == Some('=') {
                        self.single(Token::GreaterEqual)
                    } else {
                        Token::Greater
                    }
                }
                '!' => {
                    self.advance();
                    if self.current_char == Some('=') {
                        self.single(Token::NotEqual)
                    } else {
                        return Err(self.error("!", line, column, "unexpected character"));
                    }
                }
                '\'' => self.read_string()?,
                '[' => self.read_quoted_identifier(']')?,
                '"' => self.read_quoted_identifier('"')?,
                _ if ch.is_ascii_digit() || ch == '.' => self.read_number()?,
                _ if ch.is_alphabetic() || ch == '_' || ch == '@' || ch == '#' => {
                    self.read_identifier()
                }
                _ => {
                    return Err(self.error(ch.to_string(), line, column, "unexpected character"));
                }
            },
        };

        Ok(Spanned {
            token,
            line,
            column,
            offset,
        })
    }

    pub fn tokenize(&mut self) -> Result<Vec<Spanned>> {
        let mut tokens = Vec::new();

        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                break;
            }
        }

        Ok(tokens)
    }
}
