/// Display global error message in unified format
#[derive(Clone, Debug)]
pub struct Error(String, Option<String>);

impl Error {
    pub fn new(message: &str, details: Option<&str>) -> Self {
        Error(message.to_string(), details.map(|d| d.to_string()))
    }
}

/// Display the message and details, as sort of a hint
impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "{}\n\n{}",
            self.0,
            console::style(self.1.clone().unwrap_or("".into())).dim()
        )
    }
}

impl std::error::Error for Error {}

/// Automatically convert all eyre error reports
///
/// The full cause chain is flattened into the message, so a wrapped AWS
/// service error still names the failed call
impl From<eyre::ErrReport> for Error {
    fn from(error: eyre::ErrReport) -> Self {
        error
            .downcast::<Error>()
            .unwrap_or_else(|report| Error::new(&format!("{report:#}"), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eyre::WrapErr;

    #[test]
    fn flattens_the_cause_chain() {
        let report = Err::<(), _>(eyre::eyre!("socket closed"))
            .wrap_err("Could not create the queue")
            .unwrap_err();

        let error = Error::from(report);
        let message = format!("{error}");

        assert!(message.contains("Could not create the queue"));
        assert!(message.contains("socket closed"));
    }

    #[test]
    fn keeps_a_wrapped_error_intact() {
        let report = eyre::ErrReport::new(Error::new("Missing configuration", Some("See .env")));
        let error = Error::from(report);

        assert!(format!("{error}").contains("Missing configuration"));
    }
}
