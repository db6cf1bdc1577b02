/// The observable state of a single asynchronous result.
///
/// `ResultState` is the tri-state counterpart of [`Result`]: a value is
/// either still `Pending`, or settled as `Succeeded` or `Failed`. It is what
/// [`SingleValueSubject::state`](crate::SingleValueSubject::state) reports
/// without waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultState<T, E> {
    /// No result has been produced yet.
    Pending,

    /// The result is a success.
    Succeeded(T),

    /// The result is a failure.
    Failed(E),
}

impl<T, E> ResultState<T, E> {
    /// Returns `true` while no result has been produced.
    pub fn is_pending(&self) -> bool {
        matches!(self, ResultState::Pending)
    }

    /// Returns `true` once a success or a failure has been recorded.
    pub fn is_settled(&self) -> bool {
        !self.is_pending()
    }

    /// Converts into a `Result`, or `None` while pending.
    pub fn into_result(self) -> Option<Result<T, E>> {
        match self {
            ResultState::Pending => None,
            ResultState::Succeeded(value) => Some(Ok(value)),
            ResultState::Failed(error) => Some(Err(error)),
        }
    }

    /// Borrows the settled result, or `None` while pending.
    pub fn as_result(&self) -> Option<Result<&T, &E>> {
        match self {
            ResultState::Pending => None,
            ResultState::Succeeded(value) => Some(Ok(value)),
            ResultState::Failed(error) => Some(Err(error)),
        }
    }
}

impl<T, E> Default for ResultState<T, E> {
    fn default() -> Self {
        ResultState::Pending
    }
}

impl<T, E> From<Result<T, E>> for ResultState<T, E> {
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(value) => ResultState::Succeeded(value),
            Err(error) => ResultState::Failed(error),
        }
    }
}

impl<T, E> From<Option<Result<T, E>>> for ResultState<T, E> {
    fn from(result: Option<Result<T, E>>) -> Self {
        result.map_or(ResultState::Pending, ResultState::from)
    }
}
