//! GML graph file loading
//!
//! Reads the `graph [ node [ ... ] edge [ ... ] ]` subset of the Graph
//! Modelling Language into a [`CompressedGraph`]. Edges are always treated
//! as undirected.

use std::fmt;
use std::fs;
use std::io;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use thiserror::Error;

use crate::config::Config;
use crate::graph::{BuildError, CompressedGraph, EdgeInsert, GraphBuilder};

/// Longest numeric literal accepted by the scanner
pub const MAX_DIGITS: usize = 1024;

/// Stable, machine-readable failure kinds for graph loading
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum GmlErrorCode {
    FileNotFound,
    Io,
    TooManyBrackets,
    OpenBracket,
    TooManyDigits,
    PrematureEof,
    Syntax,
    Unexpected,
}

impl GmlErrorCode {
    /// Return the stable string form of this code.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FileNotFound => "file_not_found",
            Self::Io => "io",
            Self::TooManyBrackets => "too_many_brackets",
            Self::OpenBracket => "open_bracket",
            Self::TooManyDigits => "too_many_digits",
            Self::PrematureEof => "premature_eof",
            Self::Syntax => "syntax",
            Self::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for GmlErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised while loading a GML graph
#[derive(Debug, Error)]
pub enum GmlError {
    /// The input file does not exist
    #[error("a file with that name doesn't exist: {}", .path.display())]
    FileNotFound { path: PathBuf },

    /// The input file exists but could not be read
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A `]` appeared without a matching `[`
    #[error("line {line}: too many closing brackets (])")]
    TooManyBrackets { line: usize },

    /// Input ended while lists were still open
    #[error("line {line}: input ended with {open} unclosed opening bracket(s) ([)")]
    OpenBracket { line: usize, open: usize },

    /// A numeric literal was too long or out of range
    #[error("line {line}: numeric literal exceeds 1024 characters or the integer range")]
    TooManyDigits { line: usize },

    /// Input ended in the middle of a token or key-value pair
    #[error("line {line}: unexpected end of input {context}")]
    PrematureEof { line: usize, context: &'static str },

    /// Well-formed tokens in an invalid arrangement
    #[error("line {line}: {message}")]
    Syntax { line: usize, message: String },

    /// A character that cannot start any token
    #[error("line {line}: unexpected character {ch:?}")]
    Unexpected { line: usize, ch: char },

    /// The graph structure described by the file is invalid
    #[error("line {line}: {source}")]
    Graph {
        line: usize,
        #[source]
        source: BuildError,
    },
}

impl GmlError {
    /// Retrieve the stable [`GmlErrorCode`] for this error.
    pub const fn code(&self) -> GmlErrorCode {
        match self {
            Self::FileNotFound { .. } => GmlErrorCode::FileNotFound,
            Self::Io { .. } => GmlErrorCode::Io,
            Self::TooManyBrackets { .. } => GmlErrorCode::TooManyBrackets,
            Self::OpenBracket { .. } => GmlErrorCode::OpenBracket,
            Self::TooManyDigits { .. } => GmlErrorCode::TooManyDigits,
            Self::PrematureEof { .. } => GmlErrorCode::PrematureEof,
            Self::Syntax { .. } | Self::Graph { .. } => GmlErrorCode::Syntax,
            Self::Unexpected { .. } => GmlErrorCode::Unexpected,
        }
    }

    fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Key(String),
    Int(i64),
    Real(f64),
    Str(String),
    Open,
    Close,
}

#[derive(Debug, Clone, PartialEq)]
enum Value {
    Int(i64),
    Real(f64),
    Str(String),
    List(Vec<Pair>),
}

#[derive(Debug, Clone, PartialEq)]
struct Pair {
    key: String,
    value: Value,
    line: usize,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch == Some('\n') {
            self.line += 1;
        }
        ch
    }

    fn skip_trivia(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch == '#' {
                while let Some(c) = self.bump() {
                    if c == '\n' {
                        break;
                    }
                }
            } else if ch.is_whitespace() {
                self.bump();
            } else {
                break;
            }
        }
    }

    /// Next token with the line it started on
    fn next_token(&mut self) -> Result<Option<(Token, usize)>, GmlError> {
        self.skip_trivia();
        let line = self.line;
        let Some(&ch) = self.chars.peek() else {
            return Ok(None);
        };

        let token = match ch {
            '[' => {
                self.bump();
                Token::Open
            }
            ']' => {
                self.bump();
                Token::Close
            }
            '"' => {
                self.bump();
                self.string(line)?
            }
            c if c.is_ascii_digit() || matches!(c, '+' | '-' | '.') => self.number(line)?,
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut key = String::new();
                while let Some(&c) = self.chars.peek() {
                    if c.is_ascii_alphanumeric() || c == '_' {
                        key.push(c);
                        self.bump();
                    } else {
                        break;
                    }
                }
                Token::Key(key)
            }
            other => return Err(GmlError::Unexpected { line, ch: other }),
        };

        Ok(Some((token, line)))
    }

    fn string(&mut self, line: usize) -> Result<Token, GmlError> {
        let mut raw = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(Token::Str(decode_entities(&raw))),
                Some(c) => raw.push(c),
                None => {
                    return Err(GmlError::PrematureEof {
                        line,
                        context: "inside a string",
                    })
                }
            }
        }
    }

    fn number(&mut self, line: usize) -> Result<Token, GmlError> {
        let mut literal = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E') {
                if literal.len() == MAX_DIGITS {
                    return Err(GmlError::TooManyDigits { line });
                }
                literal.push(c);
                self.bump();
            } else {
                break;
            }
        }

        let is_real = literal.contains(|c: char| matches!(c, '.' | 'e' | 'E'));
        if is_real {
            return literal
                .parse::<f64>()
                .map(Token::Real)
                .map_err(|_| GmlError::syntax(line, format!("malformed number {literal:?}")));
        }

        match literal.parse::<i64>() {
            Ok(value) => Ok(Token::Int(value)),
            Err(_) => {
                let digits = literal.trim_start_matches(|c: char| c == '+' || c == '-');
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    Err(GmlError::TooManyDigits { line })
                } else {
                    Err(GmlError::syntax(line, format!("malformed number {literal:?}")))
                }
            }
        }
    }
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// Parse key-value pairs up to the matching `]` (or end of input at depth 0)
fn parse_list(lexer: &mut Lexer<'_>, depth: usize) -> Result<Vec<Pair>, GmlError> {
    let mut pairs = Vec::new();
    loop {
        let Some((token, line)) = lexer.next_token()? else {
            if depth > 0 {
                return Err(GmlError::OpenBracket {
                    line: lexer.line,
                    open: depth,
                });
            }
            return Ok(pairs);
        };

        let key = match token {
            Token::Key(key) => key,
            Token::Close if depth == 0 => return Err(GmlError::TooManyBrackets { line }),
            Token::Close => return Ok(pairs),
            other => {
                return Err(GmlError::syntax(
                    line,
                    format!("expected a key, found {}", describe(&other)),
                ))
            }
        };

        let value = match lexer.next_token()? {
            None => {
                return Err(GmlError::PrematureEof {
                    line: lexer.line,
                    context: "while expecting a value",
                })
            }
            Some((Token::Int(v), _)) => Value::Int(v),
            Some((Token::Real(v), _)) => Value::Real(v),
            Some((Token::Str(v), _)) => Value::Str(v),
            Some((Token::Open, _)) => Value::List(parse_list(lexer, depth + 1)?),
            Some((other, value_line)) => {
                return Err(GmlError::syntax(
                    value_line,
                    format!("key `{key}` has no value, found {}", describe(&other)),
                ))
            }
        };

        pairs.push(Pair { key, value, line });
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Key(key) => format!("key `{key}`"),
        Token::Int(v) => format!("integer {v}"),
        Token::Real(v) => format!("number {v}"),
        Token::Str(v) => format!("string {v:?}"),
        Token::Open => "`[`".to_string(),
        Token::Close => "`]`".to_string(),
    }
}

fn find<'a>(pairs: &'a [Pair], key: &str) -> Option<&'a Pair> {
    pairs.iter().find(|pair| pair.key == key)
}

fn required_id(pairs: &[Pair], key: &str, line: usize, owner: &str) -> Result<i64, GmlError> {
    match find(pairs, key) {
        Some(Pair { value: Value::Int(id), .. }) => Ok(*id),
        Some(pair) => Err(GmlError::syntax(
            pair.line,
            format!("{owner} `{key}` must be an integer"),
        )),
        None => Err(GmlError::syntax(line, format!("{owner} has no `{key}`"))),
    }
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Int(v) => Some(*v as f64),
        Value::Real(v) => Some(*v),
        Value::Str(s) => s.trim().parse::<f64>().ok(),
        Value::List(_) => None,
    }
}

fn edge_weight(pairs: &[Pair], config: &Config) -> Result<f64, GmlError> {
    if let Some(pair) = find(pairs, &config.weight_key) {
        return numeric(&pair.value).ok_or_else(|| {
            GmlError::syntax(
                pair.line,
                format!("edge `{}` is not a number", config.weight_key),
            )
        });
    }

    if config.label_weights {
        if let Some(weight) = find(pairs, "label").and_then(|pair| numeric(&pair.value)) {
            return Ok(weight);
        }
    }

    Ok(config.default_weight)
}

fn build_graph(root: &[Pair], config: &Config) -> Result<CompressedGraph, GmlError> {
    let graph = match find(root, "graph") {
        Some(Pair { value: Value::List(graph), .. }) => graph,
        Some(pair) => return Err(GmlError::syntax(pair.line, "`graph` must be a list")),
        None => return Err(GmlError::syntax(1, "missing top-level `graph` list")),
    };

    if let Some(Pair { value: Value::Int(directed), .. }) = find(graph, "directed") {
        if *directed != 0 {
            log::warn!("Graph is marked directed; edges will be treated as undirected");
        }
    }

    let node_count = graph.iter().filter(|pair| pair.key == "node").count();
    let mut builder = GraphBuilder::with_capacity(node_count);

    for pair in graph.iter().filter(|pair| pair.key == "node") {
        let Value::List(attrs) = &pair.value else {
            return Err(GmlError::syntax(pair.line, "`node` must be a list"));
        };
        let id = required_id(attrs, "id", pair.line, "node")?;
        let label = match find(attrs, "label").map(|label| &label.value) {
            Some(Value::Str(label)) => Some(label.clone()),
            Some(Value::Int(label)) => Some(label.to_string()),
            Some(Value::Real(label)) => Some(label.to_string()),
            Some(Value::List(_)) | None => None,
        };
        builder
            .add_node(id, label)
            .map_err(|source| GmlError::Graph { line: pair.line, source })?;
    }

    for pair in graph.iter().filter(|pair| pair.key == "edge") {
        let Value::List(attrs) = &pair.value else {
            return Err(GmlError::syntax(pair.line, "`edge` must be a list"));
        };
        let line = pair.line;
        let source_id = required_id(attrs, "source", line, "edge")?;
        let target_id = required_id(attrs, "target", line, "edge")?;
        let weight = edge_weight(attrs, config)?;

        let graph_err = |source| GmlError::Graph { line, source };
        let source = builder.node_index(source_id).map_err(graph_err)?;
        let target = builder.node_index(target_id).map_err(graph_err)?;

        match builder.add_edge(source, target, weight).map_err(graph_err)? {
            EdgeInsert::Added(_) => {}
            EdgeInsert::SelfLoop => {
                log::warn!("line {}: skipping self-loop on node {}", line, source_id);
            }
            EdgeInsert::Duplicate(existing) => {
                log::warn!(
                    "line {}: skipping repeated edge {} -- {} (keeping edge #{})",
                    line, source_id, target_id, existing
                );
            }
        }
    }

    Ok(builder.build())
}

/// Parse GML text into a weighted undirected graph
pub fn parse_graph(text: &str, config: &Config) -> Result<CompressedGraph, GmlError> {
    let mut lexer = Lexer::new(text);
    let root = parse_list(&mut lexer, 0)?;
    build_graph(&root, config)
}

/// Load a GML file into a weighted undirected graph
pub fn load_graph(path: impl AsRef<Path>, config: &Config) -> Result<CompressedGraph, GmlError> {
    let path = path.as_ref();
    log::info!("Reading GML file: {}", path.display());

    let text = fs::read_to_string(path).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => GmlError::FileNotFound {
            path: path.to_path_buf(),
        },
        _ => GmlError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    let graph = parse_graph(&text, config)?;
    log::debug!(
        "Graph uses roughly {} bytes in memory",
        graph.memory_usage()
    );

    Ok(graph)
}
