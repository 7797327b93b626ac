use anyhow::{ensure, Context, Result};
use std::process::{Command, Output};

/// Mirrors `dylint_internal::CommandExt`: logs the command before running it and turns a
/// nonzero exit status into an `anyhow::Error` carrying stdout/stderr.
pub trait CommandExt {
    fn logged_output(&mut self, require_success: bool) -> Result<Output>;
    fn success(&mut self) -> Result<()>;
}

impl CommandExt for Command {
    fn logged_output(&mut self, require_success: bool) -> Result<Output> {
        log::debug!("{:?}", self.get_envs().collect::<Vec<_>>());
        log::debug!("{:?}", self.get_current_dir());
        log::debug!("{self:?}");

        let output = self
            .output()
            .with_context(|| format!("could not get output of `{self:?}`"))?;

        ensure!(
            !require_success || output.status.success(),
            "command failed: {:?}\nstdout: {:?}\nstderr: {:?}",
            self,
            std::str::from_utf8(&output.stdout).unwrap_or_default(),
            std::str::from_utf8(&output.stderr).unwrap_or_default()
        );

        Ok(output)
    }

    fn success(&mut self) -> Result<()> {
        log::debug!("{self:?}");

        let status = self
            .status()
            .with_context(|| format!("could not get status of `{self:?}`"))?;

        ensure!(status.success(), "command failed: {self:?}");

        Ok(())
    }
}
