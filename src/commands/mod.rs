pub mod custom;
pub mod db;
pub mod definition;
pub mod hosts;
pub mod loader;
pub mod meta;
pub mod registrar;
pub mod stack;
pub mod storage;

use crate::context::Context;
use crate::error::{Result, StackctlError};
use crate::exec::ExecOptions;

/// Run a wrapped tool inside a service with inherited terminal I/O,
/// turning a non-zero exit into a command error.
pub(crate) fn run_wrapped_tool(
    ctx: &Context,
    service: &str,
    program: &str,
    args: &[String],
) -> Result<()> {
    let executor = ctx.executor()?;
    let result = executor.run_in_service(service, program, args, &ExecOptions::interactive())?;
    if result.success() {
        Ok(())
    } else {
        Err(StackctlError::Other(format!(
            "{} exited with status {}",
            program, result.exit_code
        )))
    }
}
