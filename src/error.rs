#[derive(Debug)]
pub enum Error {
    InvalidParameters(String),
    InvalidDecomposition {
        width: usize,
        height: usize,
        num_ranks: usize,
        msg: String,
    },
}

impl Error {
    pub fn invalid_parameters(msg: &str) -> Self {
        Error::InvalidParameters(msg.to_string())
    }

    pub fn invalid_decomposition(width: usize, height: usize, num_ranks: usize, msg: &str) -> Self {
        Error::InvalidDecomposition {
            width,
            height,
            num_ranks,
            msg: msg.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidParameters(msg) => write!(f, "Invalid parameters: {}", msg),
            Error::InvalidDecomposition {
                width,
                height,
                num_ranks,
                msg,
            } => {
                write!(
                    f,
                    "Invalid decomposition ({}x{} over {} ranks): {}",
                    width, height, num_ranks, msg
                )
            }
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::InvalidParameters(_) => None,
            Error::InvalidDecomposition { .. } => None,
        }
    }
}
