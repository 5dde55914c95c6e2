/// Formats an error and the whole chain of its sources.
///
/// Used to implement `Debug` on our error types: logging an error with `?error`
/// then shows every underlying cause, one per line.
pub fn error_chain_fmt(
    e: &impl std::error::Error,
    f: &mut std::fmt::Formatter<'_>,
) -> std::fmt::Result {
    writeln!(f, "{}\n", e)?;
    let mut current = e.source();
    while let Some(cause) = current {
        writeln!(f, "Caused by:\n\t{}", cause)?;
        current = cause.source();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(thiserror::Error, Debug)]
    #[error("storage is down")]
    struct RootError;

    #[derive(thiserror::Error)]
    #[error("could not save artifact")]
    struct TopError(#[source] RootError);

    impl std::fmt::Debug for TopError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            error_chain_fmt(self, f)
        }
    }

    #[test]
    fn debug_output_contains_every_cause() {
        let output = format!("{:?}", TopError(RootError));

        assert!(output.starts_with("could not save artifact"));
        assert!(output.contains("Caused by:\n\tstorage is down"));
    }
}
