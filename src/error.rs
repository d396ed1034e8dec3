use std::fmt;

/// Category of a failure raised by the engine.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum JSErrorKind {
    #[error("SyntaxError: {message}")]
    SyntaxError { message: String },

    #[error("TypeError: {message}")]
    TypeError { message: String },

    #[error("ReferenceError: {message}")]
    ReferenceError { message: String },

    #[error("RangeError: {message}")]
    RangeError { message: String },

    #[error("URIError: {message}")]
    UriError { message: String },

    #[error("EvalError: {message}")]
    EvaluationError { message: String },

    #[error("Infinite loop detected (executed {iterations} iterations)")]
    InfiniteLoopError { iterations: usize },

    #[error("Uncaught {0}")]
    Throw(String),
}

impl JSErrorKind {
    /// Name of the script-visible error constructor for this kind.
    pub fn constructor_name(&self) -> &'static str {
        match self {
            JSErrorKind::SyntaxError { .. } => "SyntaxError",
            JSErrorKind::TypeError { .. } => "TypeError",
            JSErrorKind::ReferenceError { .. } => "ReferenceError",
            JSErrorKind::RangeError { .. } | JSErrorKind::InfiniteLoopError { .. } => "RangeError",
            JSErrorKind::UriError { .. } => "URIError",
            JSErrorKind::EvaluationError { .. } => "EvalError",
            JSErrorKind::Throw(_) => "Error",
        }
    }
}

#[derive(Debug, Clone)]
pub struct JSErrorData {
    pub kind: JSErrorKind,
    /// Rust source location that raised the error.
    pub file: &'static str,
    pub line: u32,
    pub method: String,
    /// Script location, when known.
    pub js_file: Option<String>,
    pub js_line: Option<usize>,
    pub js_column: Option<usize>,
    /// Offending source line with a caret under the cursor.
    pub excerpt: Option<String>,
    pub stack: Vec<String>,
}

impl fmt::Display for JSErrorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        match (&self.js_file, self.js_line) {
            (Some(file), Some(line)) => write!(f, " ({file}:{line})")?,
            (None, Some(line)) => write!(f, " (line {line})")?,
            _ => {}
        }
        if let Some(excerpt) = &self.excerpt {
            write!(f, "\n{excerpt}")?;
        }
        for frame in &self.stack {
            write!(f, "\n    {frame}")?;
        }
        Ok(())
    }
}

#[derive(thiserror::Error, Debug, Clone)]
#[error("{inner}")]
pub struct JSError {
    pub(crate) inner: Box<JSErrorData>,
}

impl JSError {
    pub fn new(kind: JSErrorKind, file: &'static str, line: u32, method: &str) -> Self {
        JSError {
            inner: Box::new(JSErrorData {
                kind,
                file,
                line,
                method: method.to_string(),
                js_file: None,
                js_line: None,
                js_column: None,
                excerpt: None,
                stack: Vec::new(),
            }),
        }
    }

    pub fn kind(&self) -> &JSErrorKind {
        &self.inner.kind
    }

    /// The message without the kind prefix.
    pub fn message(&self) -> String {
        match &self.inner.kind {
            JSErrorKind::SyntaxError { message }
            | JSErrorKind::TypeError { message }
            | JSErrorKind::ReferenceError { message }
            | JSErrorKind::RangeError { message }
            | JSErrorKind::UriError { message }
            | JSErrorKind::EvaluationError { message } => message.clone(),
            JSErrorKind::InfiniteLoopError { .. } => self.inner.kind.to_string(),
            JSErrorKind::Throw(rendered) => rendered.clone(),
        }
    }

    pub fn js_file(&self) -> Option<&str> {
        self.inner.js_file.as_deref()
    }

    pub fn js_line(&self) -> Option<usize> {
        self.inner.js_line
    }

    pub fn js_column(&self) -> Option<usize> {
        self.inner.js_column
    }

    pub fn excerpt(&self) -> Option<&str> {
        self.inner.excerpt.as_deref()
    }

    pub fn stack(&self) -> &[String] {
        &self.inner.stack
    }

    /// Records the script location unless one is already present.
    pub fn set_js_location(&mut self, file: Option<&str>, line: usize, column: Option<usize>) {
        if self.inner.js_line.is_none() {
            self.inner.js_line = Some(line);
            self.inner.js_column = column;
        }
        if self.inner.js_file.is_none() {
            self.inner.js_file = file.map(str::to_string);
        }
    }

    pub fn set_excerpt(&mut self, excerpt: String) {
        self.inner.excerpt = Some(excerpt);
    }

    pub fn push_frame(&mut self, frame: String) {
        self.inner.stack.push(frame);
    }
}

impl From<JSError> for std::io::Error {
    fn from(err: JSError) -> std::io::Error {
        std::io::Error::other(err.to_string())
    }
}

#[macro_export]
macro_rules! function_name {
    () => {{
        fn f() {}
        fn type_name_of<T>(_: T) -> &'static str {
            std::any::type_name::<T>()
        }
        let name = type_name_of(f);
        // remove the trailing "::f"
        &name[..name.len() - 3]
    }};
}

// The raise macros capture `file!()`/`line!()` at the invocation site.
#[macro_export]
macro_rules! make_js_error {
    ($kind:expr) => {
        $crate::JSError::new($kind, file!(), line!(), $crate::function_name!())
    };
}

#[macro_export]
macro_rules! raise_syntax_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::SyntaxError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_type_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::TypeError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_reference_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::ReferenceError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_range_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::RangeError { message: $msg.to_string() })
    };
}

#[macro_export]
macro_rules! raise_eval_error {
    ($msg:expr) => {
        $crate::make_js_error!($crate::JSErrorKind::EvaluationError { message: $msg.to_string() })
    };
}
