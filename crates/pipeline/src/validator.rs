//! User input screening before a message reaches the graph.

use regex::Regex;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputRejected {
    Empty,
    TooLong { max: usize },
    Unsafe,
}

impl std::fmt::Display for InputRejected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InputRejected::Empty => write!(f, "Input cannot be empty"),
            InputRejected::TooLong { max } => {
                write!(f, "Input exceeds maximum length of {max} characters")
            }
            InputRejected::Unsafe => write!(f, "Input contains potentially unsafe content"),
        }
    }
}

impl std::error::Error for InputRejected {}

pub struct InputValidator {
    max_chars: usize,
    dangerous: Vec<Regex>,
}

impl InputValidator {
    pub fn new(max_chars: usize) -> Self {
        // Literal patterns; compilation cannot fail.
        let dangerous = [r"(?is)<script[^>]*>.*?</script>", r"(?i)javascript:", r"(?i)on\w+\s*="]
            .iter()
            .filter_map(|p| Regex::new(p).ok())
            .collect();
        Self {
            max_chars,
            dangerous,
        }
    }

    /// Returns the sanitized message: NUL bytes removed, surrounding
    /// whitespace trimmed.
    pub fn validate(&self, input: &str) -> Result<String, InputRejected> {
        if input.chars().count() > self.max_chars {
            return Err(InputRejected::TooLong {
                max: self.max_chars,
            });
        }
        if input.trim().is_empty() {
            return Err(InputRejected::Empty);
        }
        if self.dangerous.iter().any(|re| re.is_match(input)) {
            return Err(InputRejected::Unsafe);
        }
        Ok(input.replace('\0', "").trim().to_owned())
    }
}
