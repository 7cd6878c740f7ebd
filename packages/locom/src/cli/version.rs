//! `locom version`

use std::io::Write;

use crate::error::CliError;

/// Print `locom version <version>`
pub fn handle_version(out: &mut impl Write) -> Result<(), CliError> {
    writeln!(
        out,
        "{} version {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_line() {
        let mut out = Vec::new();
        handle_version(&mut out).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("locom version {}\n", env!("CARGO_PKG_VERSION"))
        );
    }
}
