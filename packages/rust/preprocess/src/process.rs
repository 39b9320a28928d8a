//! External tool invocation.

use std::ffi::OsStr;
use std::path::Path;
use std::process::Stdio;

use koaton_shared::{KoatonError, Result};
use tokio::process::Command;
use tracing::debug;

/// Run `program` to completion and return its stdout.
///
/// Spawn failures and non-zero exits become compile errors attributed to
/// `source`.
pub(crate) async fn run_tool<I, S>(program: &str, args: I, source: &Path) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null());
    debug!(?command, "running external tool");

    let output = command.output().await.map_err(|e| {
        KoatonError::compile(
            source,
            format!("failed to spawn {program}: {e}. Is `{program}` installed?"),
        )
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(KoatonError::compile(
            source,
            format!(
                "{program} exited with status {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            ),
        ));
    }

    String::from_utf8(output.stdout).map_err(|e| {
        KoatonError::compile(source, format!("{program} produced non-UTF-8 output: {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_program_is_compile_error() {
        let err = run_tool("koaton-no-such-tool-1f2e", ["--version"], Path::new("a.less"))
            .await
            .unwrap_err();
        assert!(matches!(err, KoatonError::Compile { .. }));
        assert!(err.to_string().contains("Is `koaton-no-such-tool-1f2e` installed?"));
    }
}
