/// Trait for handling interpreter output on standard out.
///
/// Everything the interpreted program writes to stdout flows through this
/// trait: the `print` builtin and the raise-time diagnostic line. Implement
/// it to capture or redirect output from embedded scripts; the default
/// implementation `StdPrint` writes to the real stdout.
pub trait PrintWriter {
    /// Writes one chunk of text, without separators or a trailing newline.
    ///
    /// Separators (such as spaces between `print` arguments) and the final
    /// newline are emitted via [`PrintWriter::stdout_push`].
    fn stdout_write(&mut self, output: &str);

    /// Writes a single character, generally a space or newline.
    fn stdout_push(&mut self, end: char);
}

/// Default `PrintWriter` that writes to stdout.
#[derive(Debug)]
pub struct StdPrint;

impl PrintWriter for StdPrint {
    fn stdout_write(&mut self, output: &str) {
        print!("{output}");
    }

    fn stdout_push(&mut self, end: char) {
        print!("{end}");
    }
}

/// A `PrintWriter` that collects all output into a string.
///
/// Useful for testing or capturing program output programmatically.
#[derive(Debug, Default)]
pub struct CollectStringPrint(String);

impl CollectStringPrint {
    /// Creates a new empty `CollectStringPrint`.
    #[must_use]
    pub fn new() -> Self {
        Self(String::new())
    }

    /// Returns the collected output as a string slice.
    #[must_use]
    pub fn output(&self) -> &str {
        self.0.as_str()
    }

    /// Consumes the writer and returns the collected output.
    #[must_use]
    pub fn into_output(self) -> String {
        self.0
    }
}

impl PrintWriter for CollectStringPrint {
    fn stdout_write(&mut self, output: &str) {
        self.0.push_str(output);
    }

    fn stdout_push(&mut self, end: char) {
        self.0.push(end);
    }
}

/// `PrintWriter` that ignores all output.
#[derive(Debug, Default)]
pub struct NoPrint;

impl PrintWriter for NoPrint {
    fn stdout_write(&mut self, _output: &str) {}

    fn stdout_push(&mut self, _end: char) {}
}
