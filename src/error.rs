use thiserror::Error;

/// Provider-level failure. Every variant is absorbed by the provider chain
/// and resolved into "try the next provider"; none of them reach callers of
/// the public operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Gemini API error: {0}")]
    Gemini(#[from] GeminiError),
    #[error("OpenAI-compatible API error: {0}")]
    OpenAi(#[from] OpenAiError),
    /// Required configuration is absent. A routing signal, not a fault.
    #[error("provider not configured")]
    NotConfigured,
    #[error("mock error: {0}")]
    Mock(String),
}

#[derive(Error, Debug)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

#[derive(Error, Debug)]
pub enum OpenAiError {
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("API error: {0}")]
    Api(String),
    #[error("Rate limit exceeded")]
    RateLimit,
    #[error("Authentication failed")]
    Authentication,
}

/// A parsed payload that deserialized but does not satisfy its structure
/// contract.
#[derive(Error, Debug)]
pub enum ContractViolation {
    #[error("expected {expected} {unit}, found {found}")]
    WrongCount {
        unit: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("empty {0}")]
    EmptyField(&'static str),
    #[error("question {id} has {found} correct choices, expected exactly one")]
    CorrectChoiceCount { id: String, found: usize },
    #[error("duplicate {unit} id {id}")]
    DuplicateId { unit: &'static str, id: String },
    #[error("message exceeds {limit} characters (found {found})")]
    TooLong { limit: usize, found: usize },
}

/// Why a single generation attempt was rejected. Logged and converted into a
/// repair turn; never crosses the generator's boundary.
#[derive(Error, Debug)]
pub enum GenerationFailure {
    #[error("no provider produced output")]
    NoProviderOutput,
    #[error("no JSON payload matching the expected shape")]
    Unparseable,
    #[error("contract violation: {0}")]
    Contract(#[from] ContractViolation),
}
