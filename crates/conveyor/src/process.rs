use std::process::Stdio;

use tokio::{
    io::{AsyncRead, AsyncReadExt},
    process::{Child, Command},
};
use tracing::debug;

use crate::{pipeline::Conveyor, ConveyorError};

pub(crate) fn spawn_source(conveyor: &Conveyor) -> Result<Child, ConveyorError> {
    let mut command = Command::new(&conveyor.command);
    command
        .args(&conveyor.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(dir) = conveyor.current_dir.as_ref() {
        command.current_dir(dir);
    }
    for (key, value) in &conveyor.env {
        command.env(key, value);
    }

    command.spawn().map_err(|source| ConveyorError::Spawn {
        binary: conveyor.command.clone(),
        source,
    })
}

/// Reads stderr to completion so the source can never block on a full pipe.
/// Chunks are mirrored to the log when `mirror` is set; they are otherwise
/// discarded.
pub(crate) async fn drain_stderr<R>(mut reader: R, mirror: bool) -> Result<(), std::io::Error>
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 4096];
    loop {
        let n = reader.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        if mirror {
            debug!(chunk = %String::from_utf8_lossy(&chunk[..n]), "stderr chunk");
        }
    }
}
