use std::{
  error::Error as StdError,
  fmt::{Display, Formatter, Result as FmtResult},
};

/// The error taxonomy for color-space setup, linearization, and CCM fitting.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
  /// An option was unrecognized, or two options contradict each other (e.g. a
  /// gray-patch linearizer requested against a chart with no gray patches).
  Configuration { message: String },
  /// A tensor's shape didn't match what an operation required.
  Shape { message: String },
  /// A linear solve produced a singular system, or a computed loss was non-finite.
  Numeric { message: String },
  /// A value fell outside the domain an operation is defined on (e.g. a negative
  /// input to a log-polynomial linearizer).
  Domain { message: String },
}

impl Error {
  pub fn configuration(message: impl Into<String>) -> Self {
    Self::Configuration { message: message.into() }
  }

  pub fn shape(message: impl Into<String>) -> Self {
    Self::Shape { message: message.into() }
  }

  pub fn numeric(message: impl Into<String>) -> Self {
    Self::Numeric { message: message.into() }
  }

  pub fn domain(message: impl Into<String>) -> Self {
    Self::Domain { message: message.into() }
  }
}

impl Display for Error {
  fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
    match self {
      Self::Configuration { message } => write!(f, "configuration error: {message}"),
      Self::Shape { message } => write!(f, "shape error: {message}"),
      Self::Numeric { message } => write!(f, "numeric error: {message}"),
      Self::Domain { message } => write!(f, "domain error: {message}"),
    }
  }
}

impl StdError for Error {}

pub type Result<T> = std::result::Result<T, Error>;
