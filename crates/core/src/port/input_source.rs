// Input Source Port
// Where a worker process reads its raw input envelope from

use crate::domain::Framing;

/// Source of the raw input envelope text
///
/// Implementations:
/// - EnvInputSource: a named environment variable (plain mapping)
/// - ReaderInputSource: standard input or any reader (`{"inputs": ...}`)
pub trait InputSource: Send + Sync {
    /// Read the raw envelope text
    ///
    /// Returns `Ok(None)` when the source is absent (variable unset,
    /// interactive terminal).
    fn read_raw(&self) -> std::io::Result<Option<String>>;

    /// Framing of the text returned by `read_raw`
    fn framing(&self) -> Framing;

    /// Human readable name for logs
    fn describe(&self) -> String;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;

    /// Input source returning fixed text
    pub struct StaticInputSource {
        raw: Option<String>,
        framing: Framing,
    }

    impl StaticInputSource {
        pub fn plain(raw: impl Into<String>) -> Self {
            Self {
                raw: Some(raw.into()),
                framing: Framing::Plain,
            }
        }

        pub fn wrapped(raw: impl Into<String>) -> Self {
            Self {
                raw: Some(raw.into()),
                framing: Framing::Wrapped,
            }
        }

        pub fn absent() -> Self {
            Self {
                raw: None,
                framing: Framing::Plain,
            }
        }
    }

    impl InputSource for StaticInputSource {
        fn read_raw(&self) -> std::io::Result<Option<String>> {
            Ok(self.raw.clone())
        }

        fn framing(&self) -> Framing {
            self.framing
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    /// Input source whose read always fails
    pub struct FailingInputSource;

    impl InputSource for FailingInputSource {
        fn read_raw(&self) -> std::io::Result<Option<String>> {
            Err(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "mock read failure",
            ))
        }

        fn framing(&self) -> Framing {
            Framing::Wrapped
        }

        fn describe(&self) -> String {
            "failing".to_string()
        }
    }
}
